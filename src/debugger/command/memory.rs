use crate::debugger::command::CommandResult;
use crate::debugger::{Debugger, Engine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDump {
    pub addr: u32,
    pub bytes: Vec<u8>,
}

impl MemoryDump {
    /// Little endian words of the dump, a trailing partial word is dropped.
    pub fn words(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bytes.chunks_exact(4).enumerate().map(|(i, w)| {
            (
                self.addr.wrapping_add(i as u32 * 4),
                u32::from_le_bytes([w[0], w[1], w[2], w[3]]),
            )
        })
    }
}

/// Read target memory through the engine.
pub struct Memory<'a, E: Engine> {
    dbg: &'a Debugger<E>,
}

impl<'a, E: Engine> Memory<'a, E> {
    pub fn new(debugger: &'a Debugger<E>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, addr: u32, len: usize) -> CommandResult<MemoryDump> {
        let bytes = self.dbg.read_memory(addr, len)?;
        Ok(MemoryDump { addr, bytes })
    }
}
