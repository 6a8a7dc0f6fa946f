use crate::debugger::engine::EngineAbort;
use crate::debugger::memory::MemoryError;
use crate::debugger::state::Status;
use std::str::Utf8Error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error("session configuration: {0}")]
    Config(#[from] toml::de::Error),

    // --------------------------------- session errors --------------------------------------------
    #[error("assemble: {0}")]
    Assemble(#[from] AssembleError),
    #[error("program is not assembled")]
    NotAssembled,
    #[error("session is {0}, debug mode required")]
    NotInDebugMode(Status),
    #[error("unknown register {0:?}")]
    RegisterNameNotFound(String),
    #[error("memory read of {len} bytes exceeds the limit of {max} bytes")]
    MemoryReadTooLarge { len: usize, max: usize },

    // --------------------------------- linear memory errors --------------------------------------
    #[error(transparent)]
    Memory(#[from] MemoryError),

    // --------------------------------- execution engine errors -----------------------------------
    #[error("execution engine load: {0:#}")]
    EngineLoad(anyhow::Error),
    #[error(transparent)]
    EngineAbort(#[from] EngineAbort),
}

impl Error {
    /// Return a hint to an interface - continue debugging after error or drop the session.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Utf8(_) => false,
            Error::Config(_) => false,
            Error::Assemble(_) => false,
            Error::NotAssembled => false,
            Error::NotInDebugMode(_) => false,
            Error::RegisterNameNotFound(_) => false,
            Error::MemoryReadTooLarge { .. } => false,

            // engine state is unknown after these
            Error::Memory(_) => true,
            Error::EngineLoad(_) => true,
            Error::EngineAbort(_) => true,
        }
    }
}

/// Build failure reported by the assembler, anchored at a source line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct AssembleError {
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    FetchFault,
    LoadFault,
    StoreFault,
    UnimplementedInstruction,
    /// Instruction ceiling reached, value is the ceiling.
    InstructionLimitExceeded(u64),
    /// Fault code the engine published but this crate does not know.
    Unknown(u32),
}

impl RuntimeErrorKind {
    /// Map an engine fault code, `None` for "no fault".
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(RuntimeErrorKind::FetchFault),
            2 => Some(RuntimeErrorKind::LoadFault),
            3 => Some(RuntimeErrorKind::StoreFault),
            4 => Some(RuntimeErrorKind::UnimplementedInstruction),
            other => Some(RuntimeErrorKind::Unknown(other)),
        }
    }
}

/// Fault that terminated a run. The session stays inspectable after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Faulting target address, if the fault has one.
    pub address: Option<u32>,
    pub pc: u32,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pc = self.pc;
        let addr = self.address.unwrap_or(pc);
        match self.kind {
            RuntimeErrorKind::FetchFault => {
                write!(f, "cannot fetch instruction from PC={addr:#x}")
            }
            RuntimeErrorKind::LoadFault => {
                write!(f, "cannot load from address {addr:#x} at PC={pc:#x}")
            }
            RuntimeErrorKind::StoreFault => {
                write!(f, "cannot store to address {addr:#x} at PC={pc:#x}")
            }
            RuntimeErrorKind::UnimplementedInstruction => {
                write!(f, "unhandled instruction at PC={pc:#x}")
            }
            RuntimeErrorKind::InstructionLimitExceeded(limit) => {
                write!(f, "instruction limit of {limit} exceeded at PC={pc:#x}")
            }
            RuntimeErrorKind::Unknown(_) => write!(f, "PC={pc:#x}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: $crate::log::SESSION_TARGET, "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: $crate::log::SESSION_TARGET, concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
