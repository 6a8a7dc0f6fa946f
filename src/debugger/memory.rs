//! Flat, growable byte buffer backing the whole execution engine address space.
//!
//! Engine published cells are reached through [`ByteWindow`] and [`WordWindow`].
//! A window remembers the buffer generation it was issued for, any growth bumps
//! the generation and every window issued before it must be reacquired.

/// Growth granularity of the linear memory.
pub const PAGE_SIZE: usize = 65536;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("linear memory access out of bounds: offset {offset:#x}, len {len}, memory size {size:#x}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
    #[error("window issued at generation {window} used at generation {current}")]
    StaleWindow { window: u64, current: u64 },
    #[error("pristine image was not captured")]
    NoSnapshot,
}

pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Debug)]
pub struct LinearMemory {
    buf: Vec<u8>,
    generation: u64,
    pristine: Option<Box<[u8]>>,
}

impl LinearMemory {
    pub fn new(initial_pages: usize) -> Self {
        Self {
            buf: vec![0; initial_pages * PAGE_SIZE],
            generation: 0,
            pristine: None,
        }
    }

    /// Current size in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.buf.len() / PAGE_SIZE
    }

    /// Counter bumped on each growth, windows from older generations are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Grow memory by `delta` zeroed pages, return the previous page count.
    pub fn grow(&mut self, delta: usize) -> usize {
        let old = self.page_count();
        if delta > 0 {
            self.buf.resize(self.buf.len() + delta * PAGE_SIZE, 0);
            self.generation += 1;
        }
        old
    }

    /// Grow memory in whole pages until it holds at least `min_bytes`.
    /// Returns `true` if memory was grown (and all windows invalidated).
    pub fn ensure_capacity(&mut self, min_bytes: usize) -> bool {
        if min_bytes <= self.buf.len() {
            return false;
        }
        let missing = min_bytes - self.buf.len();
        self.grow(missing.div_ceil(PAGE_SIZE));
        true
    }

    /// Capture the pristine image restored before every build.
    pub fn snapshot(&mut self) {
        self.pristine = Some(self.buf.clone().into_boxed_slice());
    }

    /// Copy the pristine image back. Bytes grown after the snapshot are zeroed,
    /// memory never shrinks.
    pub fn restore(&mut self) -> Result<()> {
        let pristine = self.pristine.as_ref().ok_or(MemoryError::NoSnapshot)?;
        let (head, tail) = self.buf.split_at_mut(pristine.len());
        head.copy_from_slice(pristine);
        tail.fill(0);
        Ok(())
    }

    fn range(&self, offset: usize, len: usize) -> Result<std::ops::Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(offset..end),
            _ => Err(MemoryError::OutOfBounds {
                offset,
                len,
                size: self.buf.len(),
            }),
        }
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.buf[range])
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let range = self.range(offset, bytes.len())?;
        self.buf[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let bytes = self.read_bytes(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Read a NUL terminated byte string starting at `offset` (terminator excluded).
    pub fn read_c_str(&self, offset: usize) -> Result<&[u8]> {
        let tail = self.read_bytes(offset, self.buf.len().saturating_sub(offset))?;
        let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(&tail[..len])
    }

    pub fn byte_window(&self, offset: u32) -> ByteWindow {
        ByteWindow {
            offset: offset as usize,
            generation: self.generation,
        }
    }

    pub fn word_window(&self, offset: u32) -> WordWindow {
        WordWindow {
            offset: offset as usize,
            generation: self.generation,
        }
    }

    fn check(&self, generation: u64) -> Result<()> {
        debug_assert_eq!(
            generation, self.generation,
            "linear memory window used after growth"
        );
        if generation != self.generation {
            return Err(MemoryError::StaleWindow {
                window: generation,
                current: self.generation,
            });
        }
        Ok(())
    }
}

/// Byte view starting at a fixed offset, bounded only by the memory size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    offset: usize,
    generation: u64,
}

impl ByteWindow {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_stale(&self, memory: &LinearMemory) -> bool {
        self.generation != memory.generation
    }

    pub fn read<'a>(&self, memory: &'a LinearMemory, len: usize) -> Result<&'a [u8]> {
        memory.check(self.generation)?;
        memory.read_bytes(self.offset, len)
    }

    pub fn write(&self, memory: &mut LinearMemory, bytes: &[u8]) -> Result<()> {
        memory.check(self.generation)?;
        memory.write_bytes(self.offset, bytes)
    }
}

/// Little endian 32-bit word view starting at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordWindow {
    offset: usize,
    generation: u64,
}

impl WordWindow {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_stale(&self, memory: &LinearMemory) -> bool {
        self.generation != memory.generation
    }

    /// Read word number `index` of the window.
    pub fn get(&self, memory: &LinearMemory, index: usize) -> Result<u32> {
        memory.check(self.generation)?;
        memory.read_u32(self.offset + index * 4)
    }

    pub fn set(&self, memory: &mut LinearMemory, index: usize, value: u32) -> Result<()> {
        memory.check(self.generation)?;
        memory.write_u32(self.offset + index * 4, value)
    }

    /// Copy `count` consecutive words into `out` (cleared first).
    pub fn read_into(&self, memory: &LinearMemory, count: usize, out: &mut Vec<u32>) -> Result<()> {
        memory.check(self.generation)?;
        let bytes = memory.read_bytes(self.offset, count * 4)?;
        out.clear();
        out.extend(
            bytes
                .chunks_exact(4)
                .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]])),
        );
        Ok(())
    }
}
