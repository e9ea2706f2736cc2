use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rv32im_sim::loader::load_program_text;
use rv32im_sim::shell::dispatch;
use rv32im_sim::Simulator;

/// Simulate and disassemble programs for a base RV32I + M core.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a program file: one hexadecimal 32-bit word per line.
    program: String,

    /// Raise logging verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let loaded = match load_program_text(std::path::Path::new(&args.program)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some((line, text)) = &loaded.stopped_at {
        log::warn!("stopped loading at line {line} (\"{text}\"): not valid hex");
    }
    log::info!("loaded {} words from {}", loaded.program_size(), args.program);

    let mut sim = Simulator::new();
    sim.initialize(&loaded.words);

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("could not start line editor: {e}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match editor.readline("rvsim> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                let result = dispatch(&line, &mut sim);
                if !result.output.is_empty() {
                    println!("{}", result.output);
                }
                if result.quit {
                    return ExitCode::SUCCESS;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("readline error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
}
