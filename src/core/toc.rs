//! Table of Constants (TOC) for one compilation unit.
//!
//! The TOC holds pointer-size constants reachable with a single load off the
//! TOC register. Slot allocation happens before snippets are emitted; the
//! publisher only ever fills a slot it was handed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PublishError, Result};

/// Index of a TOC slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TocIndex(i32);

impl TocIndex {
    /// Sentinel meaning "no slot, table full or unavailable".
    pub const FULL: TocIndex = TocIndex(i32::MIN);

    pub fn new(index: i32) -> Self {
        TocIndex(index)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_full(self) -> bool {
        self == Self::FULL
    }
}

impl fmt::Display for TocIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full() {
            write!(f, "FULL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Table-of-Constants collaborator.
pub trait TableOfConstants {
    /// Number of slots in the table.
    fn capacity(&self) -> usize;

    /// Store `value` in slot `index`.
    fn set_slot(&mut self, index: TocIndex, value: u64) -> Result<()>;

    /// Current contents of slot `index`, if written.
    fn slot(&self, index: TocIndex) -> Option<u64>;
}

/// Fixed-capacity, write-once constant pool.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    slots: Vec<Option<u64>>,
    next: usize,
}

impl ConstantPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            next: 0,
        }
    }

    /// Reserve the next free slot, or `TocIndex::FULL` when none is left.
    pub fn allocate(&mut self) -> TocIndex {
        if self.next >= self.slots.len() {
            return TocIndex::FULL;
        }
        match i32::try_from(self.next) {
            Ok(index) => {
                self.next += 1;
                TocIndex(index)
            }
            Err(_) => TocIndex::FULL,
        }
    }

    /// Number of slots handed out so far.
    pub fn allocated(&self) -> usize {
        self.next
    }

    fn position(&self, index: TocIndex) -> Result<usize> {
        usize::try_from(index.0)
            .ok()
            .filter(|&i| i < self.slots.len())
            .ok_or(PublishError::SlotOutOfRange {
                index: index.0,
                capacity: self.slots.len(),
            })
    }
}

impl TableOfConstants for ConstantPool {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn set_slot(&mut self, index: TocIndex, value: u64) -> Result<()> {
        let pos = self.position(index)?;
        if let Some(existing) = self.slots[pos] {
            return Err(PublishError::SlotAlreadyWritten {
                index: index.0,
                existing,
            });
        }
        self.slots[pos] = Some(value);
        Ok(())
    }

    fn slot(&self, index: TocIndex) -> Option<u64> {
        self.position(index).ok().and_then(|pos| self.slots[pos])
    }
}
