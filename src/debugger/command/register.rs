use crate::debugger::command::CommandResult;
use crate::debugger::register::Register as Reg;
use crate::debugger::{Debugger, Engine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue {
    pub register_name: &'static str,
    pub value: u32,
}

pub struct Register<'a, E: Engine> {
    dbg: &'a Debugger<E>,
}

impl<'a, E: Engine> Register<'a, E> {
    pub fn new(debugger: &'a Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    /// Read one register (ABI or `xN` name) or all of them.
    pub fn handle(&self, name: Option<&str>) -> CommandResult<Vec<RegisterValue>> {
        match name {
            Some(name) => {
                let register = Reg::from_name(name)?;
                Ok(vec![RegisterValue {
                    register_name: register.into(),
                    value: self.dbg.read_register(register)?,
                }])
            }
            None => {
                let snapshot = self
                    .dbg
                    .state()
                    .snapshot()
                    .ok_or(crate::debugger::Error::NotAssembled)?;
                Ok(snapshot
                    .registers
                    .iter()
                    .map(|(register, value)| RegisterValue {
                        register_name: register.into(),
                        value,
                    })
                    .collect())
            }
        }
    }
}
