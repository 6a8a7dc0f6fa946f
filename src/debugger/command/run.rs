use crate::debugger::command::CommandResult;
use crate::debugger::{Debugger, Engine};

/// Build the program and run it to completion, breakpoints ignored.
pub struct Run<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> Run<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, source: &str) -> CommandResult<()> {
        Ok(self.dbg.run(source)?)
    }
}

/// Build the program and pause before the first instruction.
pub struct StartDebug<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> StartDebug<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, source: &str) -> CommandResult<()> {
        Ok(self.dbg.start_debug(source)?)
    }
}

pub struct Quit<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

impl<'a, E: Engine> Quit<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self) {
        self.dbg.quit()
    }
}
