use crate::debugger::command::CommandResult;
use crate::debugger::error::Error;
use crate::debugger::{backtrace, Debugger, Engine};

/// Call stack of the paused (or faulted) program.
pub struct Backtrace<'a, E: Engine> {
    dbg: &'a Debugger<E>,
}

impl<'a, E: Engine> Backtrace<'a, E> {
    pub fn new(debugger: &'a Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    /// Frames innermost first, the way backtraces are printed.
    pub fn handle(&self) -> CommandResult<backtrace::Backtrace> {
        let frames = self
            .dbg
            .backtrace()
            .ok_or(Error::NotInDebugMode(self.dbg.status()))?;
        Ok(frames.iter().rev().cloned().collect())
    }
}
