//! The simulator driver: owns architectural state and memory, and runs the
//! fetch/decode/execute/commit loop.

use crate::decode::decode;
use crate::exec::{execute, StepOutcome};
use crate::memory::{Memory, TEXT_BASE};
use crate::state::CpuState;

/// Immutable snapshot of committed state, for `rdump`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDump {
    pub pc: u32,
    pub regs: [u32; 32],
    pub instruction_count: u64,
}

/// Owns one hart's worth of state: the committed registers/pc, the memory
/// it executes against, the run flag, and the instruction counter.
pub struct Simulator {
    current: CpuState,
    memory: Memory,
    running: bool,
    instruction_count: u64,
    program_size: usize,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            current: CpuState::default(),
            memory: Memory::new(),
            running: false,
            instruction_count: 0,
            program_size: 0,
        }
    }

    /// Zero state, load `words` into the text region, set `pc` to the text
    /// base, set the run flag, and reset the instruction counter.
    pub fn initialize(&mut self, words: &[u32]) {
        self.memory.reset();
        self.memory.load_words(words);
        self.current = CpuState {
            pc: TEXT_BASE,
            regs: [0; 32],
        };
        self.running = true;
        self.instruction_count = 0;
        self.program_size = words.len();
    }

    /// Same as `initialize`, named separately because the shell's `reset`
    /// command reloads the same program rather than accepting a new one.
    pub fn reset(&mut self, words: &[u32]) {
        self.initialize(words);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn program_size(&self) -> usize {
        self.program_size
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn pc(&self) -> u32 {
        self.current.pc
    }

    /// Fetch at `current.pc`, decode, execute, and commit the result.
    /// Returns the outcome of the committed instruction.
    pub fn step(&mut self) -> StepOutcome {
        let word = self.memory.read_word(self.current.pc);
        let instr = decode(word);
        let (next, outcome) = execute(&self.current, &instr, &mut self.memory);
        self.current = next;
        self.instruction_count += 1;
        if outcome == StepOutcome::Ecall {
            self.running = false;
        }
        outcome
    }

    /// Step while the run flag is set, until `max_cycles` is reached (if
    /// given) or the run flag clears. `max_cycles == Some(0)` or any
    /// non-positive bound surfaced from the shell performs zero iterations.
    pub fn run(&mut self, max_cycles: Option<u32>) {
        let mut remaining = max_cycles;
        while self.running {
            if let Some(n) = remaining {
                if n == 0 {
                    break;
                }
                remaining = Some(n - 1);
            }
            self.step();
        }
    }

    /// Write `value` to register `n` in the committed state. `n == 0` is a
    /// silent no-op, matching the final-step zero-register enforcement that
    /// would otherwise discard it on the very next `step`.
    pub fn set_register(&mut self, n: u8, value: u32) {
        if n == 0 {
            return;
        }
        self.current.set_x(n, value);
    }

    pub fn rdump(&self) -> RegisterDump {
        RegisterDump {
            pc: self.current.pc,
            regs: self.current.regs,
            instruction_count: self.instruction_count,
        }
    }

    /// Committed memory words for every address in `[start, stop]`, stepped
    /// by 4. `start` and `stop` are taken as given; a `start > stop` yields
    /// an empty result.
    pub fn mdump(&self, start: u32, stop: u32) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        let mut addr = start;
        while addr <= stop {
            out.push((addr, self.memory.read_word(addr)));
            match addr.checked_add(4) {
                Some(next) => addr = next,
                None => break,
            }
        }
        out
    }

    /// Words of the loaded program, starting at the text base, for `print`.
    pub fn program_words(&self) -> Vec<u32> {
        (0..self.program_size)
            .map(|i| self.memory.read_word(TEXT_BASE.wrapping_add((i as u32) * 4)))
            .collect()
    }
}
