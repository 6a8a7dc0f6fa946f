//! Boundary to the external execution engine (assembler and interpreter).
//!
//! The engine lives on top of the same [`LinearMemory`] the debugger reads.
//! It publishes a set of cells at fixed offsets ([`Exports`]); the debugger never
//! interprets instructions itself, it only calls the entry points of [`Engine`]
//! and reads the cells back.

mod binding;

pub use binding::{Build, Console, EngineBinding, EngineLoader, LastWrite, Ready, StepOutcome};

use crate::debugger::memory::LinearMemory;

/// Unrecoverable failure inside the engine (trap, panic callback).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("execution engine aborted: {0}")]
pub struct EngineAbort(pub String);

/// Offsets of the cells an engine publishes into linear memory.
///
/// Pointer cells (`error`, `text_by_linenum`, `shadow_stack`, `label_txt`) hold an
/// offset into linear memory, the engine may move the pointee between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Exports {
    /// Start of the source staging area.
    pub heap_base: u32,
    /// Cell receiving the staged source size (8 byte aligned).
    pub heap_size: u32,
    /// Register file, 32 words, x0 first.
    pub regs: u32,
    pub pc: u32,
    /// Register written by the last step, 0 if none.
    pub reg_written: u32,
    pub mem_written_addr: u32,
    pub mem_written_len: u32,
    /// Pointer to a NUL terminated assemble error message, 0 on success.
    pub error: u32,
    pub error_line: u32,
    pub runtime_error_type: u32,
    pub runtime_error_addr: u32,
    /// Pointer to a word table: source line of each instruction.
    pub text_by_linenum: u32,
    pub text_by_linenum_len: u32,
    /// Pointer to the shadow stack entries, see [`crate::debugger::backtrace`].
    pub shadow_stack: u32,
    pub shadow_stack_len: u32,
    /// Pointer to the text produced by the last label lookup.
    pub label_txt: u32,
    pub label_len: u32,
}

/// Callbacks an engine invokes while executing a step.
pub trait Host {
    /// Program wrote a byte to the console.
    fn putchar(&mut self, byte: u8);
    /// Program requested termination.
    fn exit(&mut self);
}

/// Entry points of an execution engine.
pub trait Engine {
    fn exports(&self) -> &Exports;

    /// Assemble `len` bytes of source staged at `offset`. The result (error cells,
    /// line table, initial registers) is published into memory.
    fn assemble(&mut self, memory: &mut LinearMemory, offset: u32, len: u32)
        -> Result<(), EngineAbort>;

    /// Execute exactly one target instruction.
    fn step(&mut self, memory: &mut LinearMemory, host: &mut dyn Host) -> Result<(), EngineAbort>;

    /// Read `size` bytes (1, 2 or 4) at target address `addr` without side effects.
    /// Unmapped addresses read as zero.
    fn load(&self, memory: &LinearMemory, addr: u32, size: u32) -> u32;

    /// Publish the label covering `addr` into the label cells (empty if none).
    fn resolve_label(&mut self, memory: &mut LinearMemory, addr: u32) -> Result<(), EngineAbort>;
}
