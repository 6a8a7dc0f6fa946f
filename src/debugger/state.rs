use crate::debugger::backtrace::Backtrace;
use crate::debugger::engine::LastWrite;
use crate::debugger::error::RuntimeError;
use crate::debugger::register::RegisterFile;
use strum_macros::{Display, IntoStaticStr};

/// Session status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Idle,
    Running,
    Debug,
    Error,
    Stopped,
}

/// Target state captured once at the end of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub console: String,
    pub pc: u32,
    pub registers: RegisterFile,
    /// Present for the `debug` and `error` states.
    pub call_stack: Option<Backtrace>,
    pub last_write: LastWrite,
    /// Instructions executed since the build.
    pub instructions: u64,
    /// Bumped by every transition, lets pollers detect a change cheaply.
    pub version: u64,
}

/// The one authoritative session state. Frontends are a projection of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugState {
    Idle,
    /// Program runs without breakpoints.
    Running(Snapshot),
    /// Program is paused under debugger control.
    Debug(Snapshot),
    /// Run terminated by a fault.
    Error(Snapshot, RuntimeError),
    /// Program exited.
    Stopped(Snapshot),
}

impl DebugState {
    pub fn status(&self) -> Status {
        match self {
            DebugState::Idle => Status::Idle,
            DebugState::Running(_) => Status::Running,
            DebugState::Debug(_) => Status::Debug,
            DebugState::Error(_, _) => Status::Error,
            DebugState::Stopped(_) => Status::Stopped,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            DebugState::Idle => None,
            DebugState::Running(s)
            | DebugState::Debug(s)
            | DebugState::Error(s, _)
            | DebugState::Stopped(s) => Some(s),
        }
    }

    pub(super) fn snapshot_mut(&mut self) -> Option<&mut Snapshot> {
        match self {
            DebugState::Idle => None,
            DebugState::Running(s)
            | DebugState::Debug(s)
            | DebugState::Error(s, _)
            | DebugState::Stopped(s) => Some(s),
        }
    }

    pub fn fault(&self) -> Option<&RuntimeError> {
        match self {
            DebugState::Error(_, err) => Some(err),
            _ => None,
        }
    }

    /// Whether a program is loaded into a live run or debug session.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DebugState::Running(_) | DebugState::Debug(_) | DebugState::Error(_, _)
        )
    }
}
