//! Text commands for console style frontends.
//!
//! Each command has a small handler struct borrowing the session, the
//! [`Command`] enum is what the parser produces.

mod backtrace;
mod r#break;
mod memory;
pub mod parser;
mod register;
mod run;
mod step;

pub use backtrace::Backtrace;
pub use memory::{Memory, MemoryDump};
pub use r#break::{Break, Command as BreakpointCommand, HandlingResult as BreakpointHandlingResult};
pub use register::{Register, RegisterValue};
pub use run::{Quit, Run, StartDebug};
pub use step::{Continue, StepInto, StepOut, StepOver};

use crate::debugger::error::Error;
use crate::debugger::{backtrace as bt, Debugger, Engine};
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    StartDebug,
    Continue,
    StepInto,
    StepOver,
    StepOut,
    Breakpoint(BreakpointCommand),
    /// All registers, or one by name.
    PrintRegister(Option<String>),
    PrintMemory { addr: u32, len: usize },
    PrintBacktrace,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Command::parse(input)
    }
}

/// Result of a dispatched command.
pub enum Output {
    /// Session state changed, read it from the debugger.
    Done,
    Breakpoint(BreakpointHandlingResult),
    Registers(Vec<RegisterValue>),
    Memory(MemoryDump),
    Backtrace(bt::Backtrace),
}

/// Dispatch `cmd` to its handler. `source` is the program text used by
/// commands that build.
pub fn execute<E: Engine>(
    dbg: &mut Debugger<E>,
    cmd: &Command,
    source: &str,
) -> CommandResult<Output> {
    let output = match cmd {
        Command::Run => {
            Run::new(dbg).handle(source)?;
            Output::Done
        }
        Command::StartDebug => {
            StartDebug::new(dbg).handle(source)?;
            Output::Done
        }
        Command::Continue => {
            Continue::new(dbg).handle()?;
            Output::Done
        }
        Command::StepInto => {
            StepInto::new(dbg).handle()?;
            Output::Done
        }
        Command::StepOver => {
            StepOver::new(dbg).handle()?;
            Output::Done
        }
        Command::StepOut => {
            StepOut::new(dbg).handle()?;
            Output::Done
        }
        Command::Quit => {
            Quit::new(dbg).handle();
            Output::Done
        }
        Command::Breakpoint(brkpt_cmd) => Output::Breakpoint(Break::new(dbg).handle(brkpt_cmd)),
        Command::PrintRegister(name) => {
            Output::Registers(Register::new(dbg).handle(name.as_deref())?)
        }
        Command::PrintMemory { addr, len } => Output::Memory(Memory::new(dbg).handle(*addr, *len)?),
        Command::PrintBacktrace => Output::Backtrace(Backtrace::new(dbg).handle()?),
    };
    Ok(output)
}
