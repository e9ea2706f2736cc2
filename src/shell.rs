//! REPL command parsing and dispatch, kept in the library so it can be unit
//! tested without a live terminal. `src/bin/rvsim.rs` wires this to
//! `rustyline` and the process's stdin/stdout.

use itertools::Itertools;
use thiserror::Error;

use crate::disasm::disassemble;
use crate::decode::decode;
use crate::memory::TEXT_BASE;
use crate::simulator::Simulator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("Invalid Command.")]
    UnknownCommand,
    #[error("wrong number of arguments for '{command}': expected {expected}, got {got}")]
    WrongArgCount {
        command: String,
        expected: usize,
        got: usize,
    },
    #[error("could not parse '{text}' as a number")]
    BadNumber { text: String },
}

/// A value accepted for `input r v`: signed decimal, or `0x`/`0X`-prefixed
/// hex, stored as its 32-bit bit pattern.
fn parse_value(text: &str) -> Result<u32, ShellError> {
    let trimmed = text.trim();
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|_| ShellError::BadNumber {
            text: text.to_string(),
        });
    }
    trimmed
        .parse::<i64>()
        .map(|v| v as u32)
        .map_err(|_| ShellError::BadNumber {
            text: text.to_string(),
        })
}

fn parse_hex_arg(text: &str) -> Result<u32, ShellError> {
    let trimmed = text.trim().trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(trimmed, 16).map_err(|_| ShellError::BadNumber {
        text: text.to_string(),
    })
}

/// Outcome of dispatching one command line: user-facing text to print
/// (possibly multi-line, already newline-joined), and whether the shell
/// should terminate.
pub struct Dispatch {
    pub output: String,
    pub quit: bool,
}

fn ok(output: impl Into<String>) -> Dispatch {
    Dispatch {
        output: output.into(),
        quit: false,
    }
}

const HELP_TEXT: &str = "\
sim, s                  run until the program halts
run n, r n              run for at most n cycles
rdump                   print the pc, all 32 registers, and instruction count
mdump a b               print memory words in [a, b] (hex addresses)
input r v               set register r to v (decimal or 0x-prefixed hex)
reset                   reload the program and restart
print                   disassemble the loaded program
?                       this help text
quit, q                 exit";

/// Parse and run one command line against `sim`. Never panics; malformed
/// input is reported as a one-line diagnostic and does not touch `sim`.
pub fn dispatch(line: &str, sim: &mut Simulator) -> Dispatch {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return ok("");
    };
    let rest: Vec<&str> = tokens.collect();

    match command {
        "sim" | "s" => {
            sim.run(None);
            ok(format!("{}", sim.rdump().pc))
        }
        "run" | "r" => match rest.as_slice() {
            [n] => match n.parse::<i64>() {
                Ok(n) => {
                    let cycles = if n <= 0 { 0 } else { n as u32 };
                    sim.run(Some(cycles));
                    ok(format!("{}", sim.rdump().pc))
                }
                Err(_) => ok(format!("{}", ShellError::BadNumber { text: n.to_string() })),
            },
            _ => ok(format!(
                "{}",
                ShellError::WrongArgCount {
                    command: "run".to_string(),
                    expected: 1,
                    got: rest.len(),
                }
            )),
        },
        "rdump" => ok(format_rdump(sim)),
        "mdump" => match rest.as_slice() {
            [a, b] => match (parse_hex_arg(a), parse_hex_arg(b)) {
                (Ok(start), Ok(stop)) => ok(format_mdump(sim, start, stop)),
                (Err(e), _) | (_, Err(e)) => ok(format!("{e}")),
            },
            _ => ok(format!(
                "{}",
                ShellError::WrongArgCount {
                    command: "mdump".to_string(),
                    expected: 2,
                    got: rest.len(),
                }
            )),
        },
        "input" => match rest.as_slice() {
            [r, v] => match (r.parse::<u8>(), parse_value(v)) {
                (Ok(reg), Ok(value)) if reg < 32 => {
                    sim.set_register(reg, value);
                    ok("")
                }
                (Ok(_), Ok(_)) => ok(format!("{}", ShellError::BadNumber { text: r.to_string() })),
                (Err(_), _) => ok(format!("{}", ShellError::BadNumber { text: r.to_string() })),
                (_, Err(e)) => ok(format!("{e}")),
            },
            _ => ok(format!(
                "{}",
                ShellError::WrongArgCount {
                    command: "input".to_string(),
                    expected: 2,
                    got: rest.len(),
                }
            )),
        },
        "reset" => {
            let words = sim.program_words();
            sim.reset(&words);
            ok("")
        }
        "print" => ok(format_print(sim)),
        "?" => ok(HELP_TEXT),
        "quit" | "q" => Dispatch {
            output: String::new(),
            quit: true,
        },
        _ => ok(format!("{}", ShellError::UnknownCommand)),
    }
}

fn format_rdump(sim: &Simulator) -> String {
    let dump = sim.rdump();
    let mut lines = vec![
        format!("PC: 0x{:08x}", dump.pc),
        format!("Instructions executed: {}", dump.instruction_count),
    ];
    // Four registers per line keeps a 32-register dump to a readable height.
    let register_chunks = dump.regs.iter().enumerate().chunks(4);
    for row in &register_chunks {
        let cells: Vec<String> = row
            .map(|(n, value)| format!("R{n}: 0x{value:08x}"))
            .collect();
        lines.push(cells.join("  "));
    }
    lines.join("\n")
}

fn format_mdump(sim: &Simulator, start: u32, stop: u32) -> String {
    sim.mdump(start, stop)
        .into_iter()
        .map(|(addr, value)| format!("0x{addr:08x}: 0x{value:08x}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_print(sim: &Simulator) -> String {
    sim.program_words()
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let addr = TEXT_BASE.wrapping_add((i as u32) * 4);
            format!("0x{addr:08x}: {}", disassemble(&decode(*word)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_runs_to_completion() {
        let mut sim = Simulator::new();
        sim.initialize(&[0x0010_0093, 0x0000_0073]);
        let d = dispatch("sim", &mut sim);
        assert!(!d.quit);
        assert!(!sim.is_running());
    }

    #[test]
    fn run_with_non_positive_n_is_a_no_op() {
        let mut sim = Simulator::new();
        sim.initialize(&[0x0010_0093, 0x0000_0073]);
        dispatch("run -5", &mut sim);
        assert_eq!(sim.instruction_count(), 0);
    }

    #[test]
    fn run_with_missing_argument_is_reported_and_ignored() {
        let mut sim = Simulator::new();
        sim.initialize(&[0x0010_0093]);
        let d = dispatch("run", &mut sim);
        assert_eq!(d.output, format!("{}", ShellError::WrongArgCount {
            command: "run".to_string(),
            expected: 1,
            got: 0,
        }));
        assert_eq!(sim.instruction_count(), 0);
    }

    #[test]
    fn input_accepts_decimal_and_hex_and_ignores_x0() {
        let mut sim = Simulator::new();
        sim.initialize(&[]);
        dispatch("input 5 -1", &mut sim);
        assert_eq!(sim.rdump().regs[5], 0xFFFF_FFFF);
        dispatch("input 6 0xFF", &mut sim);
        assert_eq!(sim.rdump().regs[6], 0xFF);
        dispatch("input 0 42", &mut sim);
        assert_eq!(sim.rdump().regs[0], 0);
    }

    #[test]
    fn mdump_accepts_bare_hex_addresses() {
        let mut sim = Simulator::new();
        sim.initialize(&[0xDEAD_BEEF]);
        let d = dispatch("mdump 10000 10000", &mut sim);
        assert_eq!(d.output, "0x00010000: 0xdeadbeef");
    }

    #[test]
    fn unknown_command_reports_invalid() {
        let mut sim = Simulator::new();
        sim.initialize(&[]);
        let d = dispatch("frobnicate", &mut sim);
        assert_eq!(d.output, "Invalid Command.");
    }

    #[test]
    fn quit_sets_the_quit_flag() {
        let mut sim = Simulator::new();
        sim.initialize(&[]);
        assert!(dispatch("quit", &mut sim).quit);
        assert!(dispatch("q", &mut sim).quit);
    }

    #[test]
    fn print_disassembles_the_loaded_program() {
        let mut sim = Simulator::new();
        sim.initialize(&[0x0050_0093, 0x0000_0073]);
        let d = dispatch("print", &mut sim);
        assert!(d.output.contains("addi x1, x0, 5"));
        assert!(d.output.contains("ecall"));
    }

    #[test]
    fn reset_reloads_the_current_program() {
        let mut sim = Simulator::new();
        sim.initialize(&[0x0010_0093, 0x0000_0073]);
        sim.run(None);
        assert_eq!(sim.rdump().regs[1], 1);
        dispatch("reset", &mut sim);
        assert_eq!(sim.rdump().regs[1], 0);
        assert!(sim.is_running());
    }
}
