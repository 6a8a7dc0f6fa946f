use crate::debugger::address::text_index;
use crate::debugger::backtrace::SHADOW_ENTRY_WORDS;
use crate::debugger::engine::{Engine, Exports, Host};
use crate::debugger::error::{AssembleError, Error, RuntimeError, RuntimeErrorKind};
use crate::debugger::memory::{LinearMemory, WordWindow};
use crate::debugger::register::{Register, RegisterFile, GPR_COUNT};
use crate::{rvd_debug, weak_error};
use anyhow::anyhow;
use std::mem;

/// Instantiates an engine on top of the fresh linear memory.
pub type EngineLoader<E> = Box<dyn FnOnce(&mut LinearMemory) -> anyhow::Result<E>>;

enum Slot<E> {
    Pending(EngineLoader<E>),
    Loaded(E),
    Failed,
}

/// Windows onto the engine published cells. Replaced as a whole after every
/// assemble and after any engine call that grew the memory.
#[derive(Debug, Clone, Copy)]
struct EngineHandles {
    regs: WordWindow,
    pc: WordWindow,
    reg_written: WordWindow,
    mem_written_addr: WordWindow,
    mem_written_len: WordWindow,
    error: WordWindow,
    error_line: WordWindow,
    runtime_error_type: WordWindow,
    runtime_error_addr: WordWindow,
    text_by_linenum: WordWindow,
    text_by_linenum_len: WordWindow,
    shadow_stack: WordWindow,
    shadow_stack_len: WordWindow,
    label_txt: WordWindow,
    label_len: WordWindow,
}

impl EngineHandles {
    fn derive(exports: &Exports, memory: &LinearMemory) -> Self {
        Self {
            // x0 is never published
            regs: memory.word_window(exports.regs + 4),
            pc: memory.word_window(exports.pc),
            reg_written: memory.word_window(exports.reg_written),
            mem_written_addr: memory.word_window(exports.mem_written_addr),
            mem_written_len: memory.word_window(exports.mem_written_len),
            error: memory.word_window(exports.error),
            error_line: memory.word_window(exports.error_line),
            runtime_error_type: memory.word_window(exports.runtime_error_type),
            runtime_error_addr: memory.word_window(exports.runtime_error_addr),
            text_by_linenum: memory.word_window(exports.text_by_linenum),
            text_by_linenum_len: memory.word_window(exports.text_by_linenum_len),
            shadow_stack: memory.word_window(exports.shadow_stack),
            shadow_stack_len: memory.word_window(exports.shadow_stack_len),
            label_txt: memory.word_window(exports.label_txt),
            label_len: memory.word_window(exports.label_len),
        }
    }

    fn is_stale(&self, memory: &LinearMemory) -> bool {
        self.pc.is_stale(memory)
    }
}

/// Text the program printed plus the messages appended on exit or fault.
#[derive(Debug, Default, Clone)]
pub struct Console {
    text: String,
    exited: bool,
}

impl Console {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn exited(&self) -> bool {
        self.exited
    }

    fn append_line(&mut self, line: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.text.push('\n');
    }
}

impl Host for Console {
    fn putchar(&mut self, byte: u8) {
        self.text.push(char::from(byte));
    }

    fn exit(&mut self) {
        self.exited = true;
    }
}

/// Successfully built program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    pub pc: u32,
    pub registers: RegisterFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Build {
    Ready(Ready),
    Failed(AssembleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Program may continue.
    Continuing,
    /// Program called exit.
    Stopped,
    /// Run is over, the target state stays inspectable.
    Fault(RuntimeError),
}

/// Write diagnostics of the last executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LastWrite {
    pub register: Option<Register>,
    /// Target address and length of the last memory store.
    pub memory: Option<(u32, u32)>,
}

/// Owns the linear memory and drives an [`Engine`] through it.
pub struct EngineBinding<E: Engine> {
    slot: Slot<E>,
    exports: Exports,
    memory: LinearMemory,
    handles: Option<EngineHandles>,
    line_table: Vec<u32>,
    console: Console,
    instructions: u64,
    instruction_limit: u64,
}

impl<E: Engine> EngineBinding<E> {
    /// Create a binding, the engine itself is instantiated by the first build.
    pub fn new(loader: EngineLoader<E>, initial_pages: usize, instruction_limit: u64) -> Self {
        Self {
            slot: Slot::Pending(loader),
            exports: Exports::default(),
            memory: LinearMemory::new(initial_pages),
            handles: None,
            line_table: vec![],
            console: Console::default(),
            instructions: 0,
            instruction_limit,
        }
    }

    fn ensure_loaded(&mut self) -> Result<(), Error> {
        let loader = match mem::replace(&mut self.slot, Slot::Failed) {
            Slot::Pending(loader) => loader,
            loaded @ Slot::Loaded(_) => {
                self.slot = loaded;
                return Ok(());
            }
            Slot::Failed => {
                return Err(Error::EngineLoad(anyhow!(
                    "engine instantiation failed earlier"
                )))
            }
        };

        let engine = loader(&mut self.memory).map_err(Error::EngineLoad)?;
        self.exports = *engine.exports();
        self.memory.snapshot();
        self.slot = Slot::Loaded(engine);
        rvd_debug!(
            target: crate::log::ENGINE_TARGET,
            "engine instantiated, memory {} pages",
            self.memory.page_count()
        );
        Ok(())
    }

    fn engine(slot: &mut Slot<E>) -> Result<&mut E, Error> {
        match slot {
            Slot::Loaded(engine) => Ok(engine),
            _ => Err(Error::NotAssembled),
        }
    }

    fn handles(&self) -> Result<&EngineHandles, Error> {
        self.handles.as_ref().ok_or(Error::NotAssembled)
    }

    fn refresh_handles(&mut self) {
        if let Some(handles) = self.handles {
            if handles.is_stale(&self.memory) {
                rvd_debug!(target: crate::log::ENGINE_TARGET, "memory grown, re-derive windows");
                self.handles = Some(EngineHandles::derive(&self.exports, &self.memory));
            }
        }
    }

    /// Build `source` from a pristine engine image.
    ///
    /// Every call starts from scratch: memory restored, console and instruction
    /// counter reset.
    pub fn assemble(&mut self, source: &str) -> Result<Build, Error> {
        self.ensure_loaded()?;
        self.memory.restore()?;
        self.handles = None;
        self.line_table.clear();
        self.console = Console::default();
        self.instructions = 0;

        let src = source.as_bytes();
        let offset = self.exports.heap_base;
        self.memory.ensure_capacity(offset as usize + src.len());
        self.memory.write_bytes(offset as usize, src)?;
        let staged = (src.len() as u32 + 7) & !7;
        self.memory
            .write_u32(self.exports.heap_size as usize, staged)?;

        let engine = Self::engine(&mut self.slot)?;
        engine.assemble(&mut self.memory, offset, src.len() as u32)?;

        let handles = EngineHandles::derive(&self.exports, &self.memory);
        let error = handles.error.get(&self.memory, 0)?;
        if error != 0 {
            let message = self.memory.read_c_str(error as usize)?;
            let error = AssembleError {
                line: handles.error_line.get(&self.memory, 0)?,
                message: String::from_utf8_lossy(message).into_owned(),
            };
            rvd_debug!(target: crate::log::ENGINE_TARGET, "build failed: {error}");
            return Ok(Build::Failed(error));
        }

        let table_ptr = handles.text_by_linenum.get(&self.memory, 0)?;
        let table_len = handles.text_by_linenum_len.get(&self.memory, 0)? as usize;
        if table_ptr != 0 {
            self.memory
                .word_window(table_ptr)
                .read_into(&self.memory, table_len, &mut self.line_table)?;
        }
        self.handles = Some(handles);

        rvd_debug!(
            target: crate::log::ENGINE_TARGET,
            "build ready, {} instructions",
            self.line_table.len()
        );
        Ok(Build::Ready(Ready {
            pc: self.pc()?,
            registers: self.registers()?,
        }))
    }

    /// Execute one instruction and classify the result.
    ///
    /// Classification order: instruction ceiling, engine fault, exit, continue.
    pub fn step(&mut self) -> Result<StepOutcome, Error> {
        self.handles()?;
        let engine = Self::engine(&mut self.slot)?;
        engine.step(&mut self.memory, &mut self.console)?;
        self.refresh_handles();
        self.instructions += 1;

        let handles = self.handles()?;
        let pc = handles.pc.get(&self.memory, 0)?;
        let code = handles.runtime_error_type.get(&self.memory, 0)?;

        let outcome = if self.instructions >= self.instruction_limit {
            StepOutcome::Fault(RuntimeError {
                kind: RuntimeErrorKind::InstructionLimitExceeded(self.instruction_limit),
                address: None,
                pc,
            })
        } else if let Some(kind) = RuntimeErrorKind::from_code(code) {
            let address = match kind {
                RuntimeErrorKind::Unknown(_) => None,
                _ => Some(handles.runtime_error_addr.get(&self.memory, 0)?),
            };
            StepOutcome::Fault(RuntimeError { kind, address, pc })
        } else if self.console.exited {
            StepOutcome::Stopped
        } else {
            StepOutcome::Continuing
        };

        match outcome {
            StepOutcome::Continuing => {}
            StepOutcome::Stopped => self.console.append_line("Program exited"),
            StepOutcome::Fault(err) => self.console.append_line(&format!("ERROR: {err}")),
        }
        Ok(outcome)
    }

    pub fn pc(&self) -> Result<u32, Error> {
        Ok(self.handles()?.pc.get(&self.memory, 0)?)
    }

    pub fn registers(&self) -> Result<RegisterFile, Error> {
        let regs = self.handles()?.regs;
        let mut values = [0; GPR_COUNT];
        for (idx, value) in values.iter_mut().enumerate() {
            *value = regs.get(&self.memory, idx)?;
        }
        Ok(RegisterFile::from_slice(&values))
    }

    pub fn register(&self, register: Register) -> Result<u32, Error> {
        match register.index() {
            0 => Ok(0),
            idx => Ok(self.handles()?.regs.get(&self.memory, idx - 1)?),
        }
    }

    pub fn last_write(&self) -> Result<LastWrite, Error> {
        let handles = self.handles()?;
        let reg = handles.reg_written.get(&self.memory, 0)? as usize;
        let len = handles.mem_written_len.get(&self.memory, 0)?;
        let memory = if len != 0 {
            let addr = handles.mem_written_addr.get(&self.memory, 0)?;
            Some((addr, len))
        } else {
            None
        };
        Ok(LastWrite {
            register: Register::from_index(reg).filter(|r| *r != Register::Zero),
            memory,
        })
    }

    /// Peek `size` bytes at target address `addr`.
    pub fn load_word(&self, addr: u32, size: u32) -> Result<u32, Error> {
        match &self.slot {
            Slot::Loaded(engine) => Ok(engine.load(&self.memory, addr, size)),
            _ => Err(Error::NotAssembled),
        }
    }

    /// Peek `len` bytes starting at target address `addr`.
    pub fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, Error> {
        (0..len as u32)
            .map(|i| self.load_word(addr.wrapping_add(i), 1).map(|b| b as u8))
            .collect()
    }

    /// Name of the label at `addr`, hexadecimal address if there is none.
    pub fn resolve_label(&mut self, addr: u32) -> Result<String, Error> {
        self.handles()?;
        let engine = Self::engine(&mut self.slot)?;
        engine.resolve_label(&mut self.memory, addr)?;
        self.refresh_handles();

        let handles = self.handles()?;
        let ptr = handles.label_txt.get(&self.memory, 0)?;
        let len = handles.label_len.get(&self.memory, 0)?;
        let fallback = || format!("{addr:#010x}");
        if ptr == 0 || len == 0 {
            return Ok(fallback());
        }
        let bytes = self.memory.read_bytes(ptr as usize, len as usize)?;
        Ok(weak_error!(std::str::from_utf8(bytes), "label text:")
            .map(ToString::to_string)
            .unwrap_or_else(fallback))
    }

    /// Copy raw shadow stack words into `out`, at most `max_entries` newest
    /// entries. Returns the total number of entries the engine holds.
    pub fn read_shadow_stack(&self, max_entries: usize, out: &mut Vec<u32>) -> Result<usize, Error> {
        let handles = self.handles()?;
        let ptr = handles.shadow_stack.get(&self.memory, 0)?;
        let len = handles.shadow_stack_len.get(&self.memory, 0)? as usize;
        let take = len.min(max_entries);
        if ptr == 0 || take == 0 {
            out.clear();
            return Ok(len);
        }
        let skip = ((len - take) * SHADOW_ENTRY_WORDS * 4) as u32;
        self.memory
            .word_window(ptr + skip)
            .read_into(&self.memory, take * SHADOW_ENTRY_WORDS, out)?;
        Ok(len)
    }

    /// Source line of every instruction of the current build.
    pub fn line_table(&self) -> &[u32] {
        &self.line_table
    }

    /// Source line of the instruction at `addr`.
    pub fn line_of(&self, addr: u32) -> Option<u32> {
        text_index(addr).and_then(|idx| self.line_table.get(idx).copied())
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Instructions executed since the last build.
    pub fn instructions_executed(&self) -> u64 {
        self.instructions
    }

    pub fn is_assembled(&self) -> bool {
        self.handles.is_some()
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }
}
