use crate::debugger::address::text_address;
use crate::rvd_debug;
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Breakpoint marker resolved against the current build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub line: u32,
    /// Instructions generated from the line, pseudo instructions may expand
    /// into more than one.
    pub addresses: SmallVec<[u32; 2]>,
}

impl Breakpoint {
    pub fn is_resolved(&self) -> bool {
        !self.addresses.is_empty()
    }
}

/// Address set derived from breakpoint markers and the engine line table.
/// Never edited incrementally, always rebuilt before a run.
#[derive(Debug, Default)]
pub struct BreakpointIndex {
    by_line: BTreeMap<u32, Breakpoint>,
    addresses: HashSet<u32>,
}

impl BreakpointIndex {
    /// Resolve `lines` against `line_table` (source line of each instruction).
    pub fn rebuild(&mut self, lines: &BTreeSet<u32>, line_table: &[u32]) {
        self.by_line.clear();
        self.addresses.clear();

        for &line in lines {
            self.by_line.insert(
                line,
                Breakpoint {
                    line,
                    addresses: SmallVec::new(),
                },
            );
        }
        for (idx, line) in line_table.iter().enumerate() {
            if let Some(brkpt) = self.by_line.get_mut(line) {
                let addr = text_address(idx);
                brkpt.addresses.push(addr);
                self.addresses.insert(addr);
            }
        }

        let unresolved = self.unresolved().collect_vec();
        if !unresolved.is_empty() {
            rvd_debug!("breakpoints on lines without instructions: {unresolved:?}");
        }
    }

    /// Whether execution must stop at `addr`.
    pub fn contains(&self, addr: u32) -> bool {
        self.addresses.contains(&addr)
    }

    pub fn get(&self, line: u32) -> Option<&Breakpoint> {
        self.by_line.get(&line)
    }

    /// Breakpoints ordered by line.
    pub fn breakpoints(&self) -> impl Iterator<Item = &Breakpoint> {
        self.by_line.values()
    }

    /// Marked lines that produced no instruction. Such markers never trigger.
    pub fn unresolved(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_line
            .values()
            .filter(|b| !b.is_resolved())
            .map(|b| b.line)
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Single-use stop condition of step-over and step-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryStop {
    pub address: u32,
    /// When set, the stack pointer must match as well (recursion).
    pub stack_pointer: Option<u32>,
}

impl TemporaryStop {
    pub fn matches(&self, pc: u32, sp: u32) -> bool {
        pc == self.address && self.stack_pointer.map_or(true, |expected| expected == sp)
    }
}
