use crate::debugger::command::CommandResult;
use crate::debugger::{Debugger, Engine};

/// Execute exactly one instruction.
pub struct StepInto<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> StepInto<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self) -> CommandResult<()> {
        Ok(self.dbg.step_into()?)
    }
}

/// Step program, proceeding through subroutine calls.
/// Unlike "step", if the current instruction calls a subroutine,
/// this command does not enter the subroutine, but instead steps over
/// the call, in effect treating it as a single instruction.
pub struct StepOver<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> StepOver<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self) -> CommandResult<()> {
        Ok(self.dbg.step_over()?)
    }
}

/// Run until the current subroutine returns.
pub struct StepOut<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> StepOut<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self) -> CommandResult<()> {
        Ok(self.dbg.step_out()?)
    }
}

pub struct Continue<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> Continue<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self) -> CommandResult<()> {
        Ok(self.dbg.continue_execution()?)
    }
}
