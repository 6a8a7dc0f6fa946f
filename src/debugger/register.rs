use crate::debugger::error::Error;
use std::str::FromStr;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Number of registers published by the engine (x1..x31, x0 is hardwired).
pub const GPR_COUNT: usize = 31;

/// RV32 general purpose registers by ABI name.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Register {
    Zero,
    Ra,
    Sp,
    Gp,
    Tp,
    T0,
    T1,
    T2,
    #[strum(to_string = "s0", serialize = "fp")]
    S0,
    S1,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    T3,
    T4,
    T5,
    T6,
}

const BY_INDEX: [Register; 32] = [
    Register::Zero,
    Register::Ra,
    Register::Sp,
    Register::Gp,
    Register::Tp,
    Register::T0,
    Register::T1,
    Register::T2,
    Register::S0,
    Register::S1,
    Register::A0,
    Register::A1,
    Register::A2,
    Register::A3,
    Register::A4,
    Register::A5,
    Register::A6,
    Register::A7,
    Register::S2,
    Register::S3,
    Register::S4,
    Register::S5,
    Register::S6,
    Register::S7,
    Register::S8,
    Register::S9,
    Register::S10,
    Register::S11,
    Register::T3,
    Register::T4,
    Register::T5,
    Register::T6,
];

impl Register {
    /// Architectural register number (`x<index>`).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Register> {
        BY_INDEX.get(index).copied()
    }

    /// Parse either an ABI name (`a0`, `fp`) or an architectural one (`x10`).
    pub fn from_name(name: &str) -> Result<Register, Error> {
        let not_found = || Error::RegisterNameNotFound(name.to_string());
        if let Some(num) = name.strip_prefix('x') {
            if let Ok(idx) = num.parse::<usize>() {
                return Register::from_index(idx).ok_or_else(not_found);
            }
        }
        Register::from_str(name).map_err(|_| not_found())
    }
}

/// Snapshot of x1..x31 as published by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterFile([u32; GPR_COUNT]);

impl RegisterFile {
    pub fn from_slice(values: &[u32]) -> Self {
        let mut regs = [0; GPR_COUNT];
        let n = values.len().min(GPR_COUNT);
        regs[..n].copy_from_slice(&values[..n]);
        Self(regs)
    }

    pub fn value(&self, register: Register) -> u32 {
        match register.index() {
            0 => 0,
            idx => self.0[idx - 1],
        }
    }

    /// Raw x1..x31 values.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Iterate over `(register, value)` pairs, x0 excluded.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u32)> + '_ {
        BY_INDEX[1..].iter().copied().zip(self.0.iter().copied())
    }
}
