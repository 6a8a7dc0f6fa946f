//! Call stack view built from the engine shadow stack.
//!
//! The engine pushes one entry per call (`jal`/`jalr` linking into `ra`) and pops
//! it on `ret`. An entry is 24 words:
//!
//! | words  | content                              |
//! |--------|--------------------------------------|
//! | 0      | callee address                       |
//! | 1      | stack pointer at the call            |
//! | 2..10  | argument registers a0..a7            |
//! | 10..22 | saved registers s0..s11              |
//! | 22     | return address                       |
//! | 23     | bitmap of registers written in callee |

use crate::debugger::engine::{Engine, EngineBinding};
use crate::debugger::error::Error;
use crate::rvd_warn;

pub const SHADOW_ENTRY_WORDS: usize = 24;

const PC_WORD: usize = 0;
const SP_WORD: usize = 1;
const ARGS_WORD: usize = 2;
const RA_WORD: usize = 22;

/// One in-flight call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowFrame {
    /// Callee label, hexadecimal callee address if it has no label.
    pub label: String,
    /// Callee address.
    pub entry: u32,
    /// `a0`..`a7` at the moment of the call.
    pub args: [u32; 8],
    pub stack_pointer: u32,
    pub return_address: u32,
}

/// Call stack, oldest frame first.
pub type Backtrace = Vec<ShadowFrame>;

/// Decodes the shadow stack into frames. Keeps a scratch buffer between rebuilds.
pub struct Reconstructor {
    scratch: Vec<u32>,
    max_frames: usize,
}

impl Reconstructor {
    pub fn new(max_frames: usize) -> Self {
        Self {
            scratch: Vec::with_capacity(max_frames.min(64) * SHADOW_ENTRY_WORDS),
            max_frames,
        }
    }

    /// Decode the whole shadow stack. Deeper stacks than the frame limit are cut,
    /// the newest frames are kept.
    pub fn rebuild<E: Engine>(&mut self, binding: &mut EngineBinding<E>) -> Result<Backtrace, Error> {
        let total = binding.read_shadow_stack(self.max_frames, &mut self.scratch)?;
        if total > self.max_frames {
            rvd_warn!(
                "call stack depth {total} exceeds the limit, {} oldest frames dropped",
                total - self.max_frames
            );
        }

        let mut frames = Vec::with_capacity(self.scratch.len() / SHADOW_ENTRY_WORDS);
        for entry in self.scratch.chunks_exact(SHADOW_ENTRY_WORDS) {
            let mut args = [0; 8];
            args.copy_from_slice(&entry[ARGS_WORD..ARGS_WORD + 8]);
            frames.push(ShadowFrame {
                label: String::new(),
                entry: entry[PC_WORD],
                args,
                stack_pointer: entry[SP_WORD],
                return_address: entry[RA_WORD],
            });
        }
        for frame in frames.iter_mut() {
            frame.label = binding.resolve_label(frame.entry)?;
        }
        Ok(frames)
    }
}
