pub mod address;
pub mod backtrace;
pub mod breakpoint;
pub mod command;
pub mod engine;
pub mod error;
pub mod insn;
pub mod memory;
pub mod register;
pub mod state;
mod step;

pub use backtrace::{Backtrace, ShadowFrame};
pub use breakpoint::Breakpoint;
pub use engine::{Engine, EngineBinding, Exports, Host, LastWrite};
pub use error::{AssembleError, Error, RuntimeError, RuntimeErrorKind};
pub use register::{Register, RegisterFile};
pub use state::{DebugState, Snapshot, Status};

use crate::config::SessionConfig;
use crate::debugger::backtrace::Reconstructor;
use crate::debugger::breakpoint::{BreakpointIndex, TemporaryStop};
use crate::debugger::engine::Build;
use crate::debugger::memory::LinearMemory;
use crate::{rvd_debug, rvd_error};
use std::collections::BTreeSet;

/// Largest memory read served by [`Debugger::read_memory`], one page.
pub const MAX_MEMORY_READ: usize = memory::PAGE_SIZE;

/// Session observer. Frontends redraw from the state passed here.
pub trait EventHook {
    /// Called after every state transition.
    fn on_state_change(&self, state: &DebugState);

    /// Called when a build fails, line numbers are 1-based.
    fn on_assemble_error(&self, error: &AssembleError);
}

/// Hooks that do nothing.
#[derive(Default)]
pub struct NopHook;

impl EventHook for NopHook {
    fn on_state_change(&self, _: &DebugState) {}

    fn on_assemble_error(&self, _: &AssembleError) {}
}

pub struct DebuggerBuilder<H: EventHook + 'static = NopHook> {
    hooks: Option<H>,
    config: SessionConfig,
}

impl DebuggerBuilder<NopHook> {
    pub fn new() -> Self {
        Self {
            hooks: None,
            config: SessionConfig::default(),
        }
    }
}

impl Default for DebuggerBuilder<NopHook> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: EventHook + 'static> DebuggerBuilder<H> {
    pub fn with_hooks<H2: EventHook + 'static>(self, hooks: H2) -> DebuggerBuilder<H2> {
        DebuggerBuilder {
            hooks: Some(hooks),
            config: self.config,
        }
    }

    pub fn with_config(self, config: SessionConfig) -> Self {
        Self { config, ..self }
    }

    /// Create a session. `loader` instantiates the engine on top of the session
    /// memory, it runs on the first build.
    pub fn build<E, L>(self, loader: L) -> Debugger<E>
    where
        E: Engine,
        L: FnOnce(&mut LinearMemory) -> anyhow::Result<E> + 'static,
    {
        let hooks: Box<dyn EventHook> = match self.hooks {
            Some(hooks) => Box::new(hooks),
            None => Box::new(NopHook),
        };
        Debugger {
            binding: EngineBinding::new(
                Box::new(loader),
                self.config.initial_pages,
                self.config.instruction_limit,
            ),
            breakpoint_lines: BTreeSet::new(),
            breakpoints: BreakpointIndex::default(),
            temporary: None,
            reconstructor: Reconstructor::new(self.config.max_backtrace_frames),
            state: DebugState::Idle,
            version: 0,
            linted: None,
            hooks,
        }
    }
}

/// Interactive session over one program.
pub struct Debugger<E: Engine> {
    binding: EngineBinding<E>,
    /// Breakpoint markers as placed in the editor.
    breakpoint_lines: BTreeSet<u32>,
    breakpoints: BreakpointIndex,
    temporary: Option<TemporaryStop>,
    reconstructor: Reconstructor,
    state: DebugState,
    version: u64,
    /// Last linted source and its result.
    linted: Option<(String, Option<AssembleError>)>,
    hooks: Box<dyn EventHook>,
}

impl<E: Engine> Debugger<E> {
    pub fn state(&self) -> &DebugState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// Number of transitions made so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn transition(&mut self, mut state: DebugState) {
        self.version += 1;
        if let Some(snapshot) = state.snapshot_mut() {
            snapshot.version = self.version;
        }
        rvd_debug!(
            "session {} -> {} (v{})",
            self.state.status(),
            state.status(),
            self.version
        );
        self.state = state;
        self.hooks.on_state_change(&self.state);
    }

    /// Fatal errors leave the engine in an unknown state, drop the session.
    fn guard<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(ref e) = result {
            self.temporary = None;
            if e.is_fatal() {
                rvd_error!("session aborted: {e:#}");
                self.transition(DebugState::Idle);
            }
        }
        result
    }

    fn capture(&mut self, with_call_stack: bool) -> Result<Snapshot, Error> {
        let call_stack = if with_call_stack {
            Some(self.reconstructor.rebuild(&mut self.binding)?)
        } else {
            None
        };
        Ok(Snapshot {
            console: self.binding.console().text().to_string(),
            pc: self.binding.pc()?,
            registers: self.binding.registers()?,
            call_stack,
            last_write: self.binding.last_write()?,
            instructions: self.binding.instructions_executed(),
            version: self.version,
        })
    }

    fn build(&mut self, source: &str) -> Result<(), Error> {
        self.temporary = None;
        match self.binding.assemble(source)? {
            Build::Ready(ready) => {
                rvd_debug!("program built, entry {:#010x}", ready.pc);
                Ok(())
            }
            Build::Failed(err) => {
                self.hooks.on_assemble_error(&err);
                self.transition(DebugState::Idle);
                Err(Error::Assemble(err))
            }
        }
    }

    /// Build and run `source` to completion. Breakpoints are ignored.
    pub fn run(&mut self, source: &str) -> Result<(), Error> {
        let result = self.run_inner(source);
        self.guard(result)
    }

    fn run_inner(&mut self, source: &str) -> Result<(), Error> {
        self.build(source)?;
        let snapshot = self.capture(false)?;
        self.transition(DebugState::Running(snapshot));

        let outcome = self.run_free()?;
        self.settle(outcome)
    }

    /// Build `source` and pause at the first instruction.
    pub fn start_debug(&mut self, source: &str) -> Result<(), Error> {
        let result = self.start_debug_inner(source);
        self.guard(result)
    }

    fn start_debug_inner(&mut self, source: &str) -> Result<(), Error> {
        self.build(source)?;
        let snapshot = self.capture(true)?;
        self.transition(DebugState::Debug(snapshot));
        Ok(())
    }

    /// Leave any session and return to idle.
    pub fn quit(&mut self) {
        self.temporary = None;
        if self.state != DebugState::Idle {
            self.transition(DebugState::Idle);
        }
    }

    /// Build `source` for diagnostics only.
    ///
    /// Does nothing while a program is running or being debugged, and when
    /// `source` was already linted (the previous result is returned).
    /// A fresh build replaces the stopped program, so the session returns
    /// to idle.
    pub fn lint(&mut self, source: &str) -> Result<Option<AssembleError>, Error> {
        if self.state.is_active() {
            return Ok(None);
        }
        if let Some((text, result)) = &self.linted {
            if text == source {
                return Ok(result.clone());
            }
        }

        let build = self.binding.assemble(source);
        let result = match self.guard(build)? {
            Build::Ready(_) => None,
            Build::Failed(err) => {
                self.hooks.on_assemble_error(&err);
                Some(err)
            }
        };
        if result.is_some() || self.state != DebugState::Idle {
            self.transition(DebugState::Idle);
        }
        self.linted = Some((source.to_string(), result.clone()));
        Ok(result)
    }

    /// Replace all breakpoint markers.
    pub fn set_breakpoints(&mut self, lines: impl IntoIterator<Item = u32>) {
        self.breakpoint_lines = lines.into_iter().collect();
    }

    /// Add a breakpoint marker. Return `false` if line already marked.
    pub fn add_breakpoint(&mut self, line: u32) -> bool {
        self.breakpoint_lines.insert(line)
    }

    /// Remove a breakpoint marker. Return `false` if line was not marked.
    pub fn remove_breakpoint(&mut self, line: u32) -> bool {
        self.breakpoint_lines.remove(&line)
    }

    pub fn breakpoint_lines(&self) -> &BTreeSet<u32> {
        &self.breakpoint_lines
    }

    /// Markers resolved against the current build.
    pub fn breakpoints(&mut self) -> Vec<Breakpoint> {
        self.rebuild_breakpoints();
        self.breakpoints.breakpoints().cloned().collect()
    }

    fn rebuild_breakpoints(&mut self) {
        self.breakpoints
            .rebuild(&self.breakpoint_lines, self.binding.line_table());
    }

    /// Call stack of the current snapshot.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.state.snapshot()?.call_stack.as_ref()
    }

    /// Source line of the instruction at the current PC.
    pub fn current_line(&self) -> Option<u32> {
        let pc = self.state.snapshot()?.pc;
        self.binding.line_of(pc)
    }

    /// Source line of the instruction at `addr` in the current build.
    pub fn line_of(&self, addr: u32) -> Option<u32> {
        self.binding.line_of(addr)
    }

    /// Read register value of the current snapshot.
    pub fn read_register(&self, register: Register) -> Result<u32, Error> {
        let snapshot = self.state.snapshot().ok_or(Error::NotAssembled)?;
        Ok(snapshot.registers.value(register))
    }

    /// Read `len` bytes of target memory starting at `addr`. At most
    /// [`MAX_MEMORY_READ`] bytes are read at once.
    pub fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, Error> {
        if self.state == DebugState::Idle {
            return Err(Error::NotAssembled);
        }
        if len > MAX_MEMORY_READ {
            return Err(Error::MemoryReadTooLarge {
                len,
                max: MAX_MEMORY_READ,
            });
        }
        self.binding.read_memory(addr, len)
    }

    /// Instructions executed since the last build.
    pub fn instructions_executed(&self) -> u64 {
        self.binding.instructions_executed()
    }
}
