//! The only place that knows RISC-V encodings: classification of call instructions
//! for step-over.

use crate::debugger::address::INSTRUCTION_SIZE;
use crate::debugger::register::Register;

const OPCODE_JAL: u32 = 0x6F;
const OPCODE_JALR: u32 = 0x67;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `jal ra, offset`
    Jal,
    /// `jalr ra, offset(rs1)`
    Jalr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    /// Register receiving the return address.
    pub link: Register,
}

impl Call {
    /// Address execution resumes at when the callee returns.
    pub fn return_address(&self, pc: u32) -> u32 {
        pc.wrapping_add(INSTRUCTION_SIZE)
    }
}

fn opcode(word: u32) -> u32 {
    word & 0x7F
}

fn rd(word: u32) -> usize {
    ((word >> 7) & 0x1F) as usize
}

fn funct3(word: u32) -> u32 {
    (word >> 12) & 0x7
}

/// Decode `word` as a subroutine call: `jal` or `jalr` (funct3 = 0) that writes
/// the return address into the link register. Plain jumps (`j`, `jr`, `ret`) and
/// jumps linking into any other register are not calls.
pub fn decode_call(word: u32) -> Option<Call> {
    let kind = match opcode(word) {
        OPCODE_JAL => CallKind::Jal,
        OPCODE_JALR if funct3(word) == 0 => CallKind::Jalr,
        _ => return None,
    };
    let link = Register::from_index(rd(word))?;
    (link == Register::Ra).then_some(Call { kind, link })
}
