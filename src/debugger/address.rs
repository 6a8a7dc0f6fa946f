//! Target machine address space layout.

use std::fmt::{Display, Formatter};
use strum::IntoEnumIterator;

pub const TEXT_BASE: u32 = 0x0040_0000;
pub const TEXT_END: u32 = 0x1000_0000;
pub const DATA_BASE: u32 = 0x1000_0000;
pub const DATA_END: u32 = 0x7000_0000;
pub const STACK_TOP: u32 = 0x7FFF_F000;
pub const STACK_LEN: u32 = 4096;

/// Every instruction is 4 bytes wide.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Address of the instruction with number `index` in the text segment.
pub fn text_address(index: usize) -> u32 {
    TEXT_BASE + index as u32 * INSTRUCTION_SIZE
}

/// Instruction number of a text segment address, `None` if `addr` is outside
/// the text segment or not instruction aligned.
pub fn text_index(addr: u32) -> Option<usize> {
    if !(TEXT_BASE..TEXT_END).contains(&addr) || addr % INSTRUCTION_SIZE != 0 {
        return None;
    }
    Some(((addr - TEXT_BASE) / INSTRUCTION_SIZE) as usize)
}

/// Named region of the target address space, used by memory panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Region {
    Text,
    Data,
    Stack,
}

impl Region {
    pub fn start(&self) -> u32 {
        match self {
            Region::Text => TEXT_BASE,
            Region::Data => DATA_BASE,
            Region::Stack => STACK_TOP - STACK_LEN,
        }
    }

    pub fn end(&self) -> u32 {
        match self {
            Region::Text => TEXT_END,
            Region::Data => DATA_END,
            Region::Stack => STACK_TOP,
        }
    }

    pub fn of(addr: u32) -> Option<Region> {
        Region::iter().find(|r| (r.start()..r.end()).contains(&addr))
    }
}

/// Target address printed the way the memory panel shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u32);

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Address(value)
    }
}

impl From<Address> for u32 {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:#010x}", self.0))
    }
}
