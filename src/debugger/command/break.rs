use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::{Debugger, Engine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(u32),
    Remove(u32),
    Info,
}

pub struct Break<'a, E: Engine> {
    dbg: &'a mut Debugger<E>,
}

pub enum HandlingResult {
    /// Marker placed, resolved against the current build.
    New(Breakpoint),
    /// Marker removed, `false` if the line had none.
    Removed(u32, bool),
    Dump(Vec<Breakpoint>),
}

impl<'a, E: Engine> Break<'a, E> {
    pub fn new(debugger: &'a mut Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: &Command) -> HandlingResult {
        match *cmd {
            Command::Add(line) => {
                self.dbg.add_breakpoint(line);
                let brkpt = self
                    .dbg
                    .breakpoints()
                    .into_iter()
                    .find(|b| b.line == line)
                    .unwrap_or(Breakpoint {
                        line,
                        addresses: Default::default(),
                    });
                HandlingResult::New(brkpt)
            }
            Command::Remove(line) => HandlingResult::Removed(line, self.dbg.remove_breakpoint(line)),
            Command::Info => HandlingResult::Dump(self.dbg.breakpoints()),
        }
    }
}
