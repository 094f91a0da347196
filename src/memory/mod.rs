use crate::definitions::{Address, Word, KBD, MEM_SIZE, SCREEN_END, SCREEN_START};
pub use error::MemoryError;

use std::ops::Range;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod error;

pub type MemoryResult<T = ()> = Result<T, MemoryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    General,
    Screen,
    Keyboard,
}

/// A fixed, half open range of addresses with a role in the memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: Address,
    pub end: Address,
}

impl Region {
    pub const GENERAL: Region = Region::new(RegionKind::General, 0, SCREEN_START);
    pub const SCREEN: Region = Region::new(RegionKind::Screen, SCREEN_START, SCREEN_END + 1);
    pub const KEYBOARD: Region = Region::new(RegionKind::Keyboard, KBD, KBD + 1);

    pub const fn new(kind: RegionKind, start: Address, end: Address) -> Self {
        Self { kind, start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, address: Address) -> bool {
        self.range().contains(&address)
    }

    pub fn range(&self) -> Range<Address> {
        self.start..self.end
    }
}

/// The whole address space of the machine.
///
/// Every access is bounds checked. Writes have no side effects, reacting to a write into
/// the screen or keyboard region is up to the caller.
pub struct WordMemory {
    words: Box<[Word]>,
}

impl Default for WordMemory {
    fn default() -> Self {
        Self::new(MEM_SIZE)
    }
}

impl WordMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn read(&self, address: Address) -> MemoryResult<Word> {
        self.words
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfRange(address))
    }

    #[inline]
    pub fn write(&mut self, address: Address, value: Word) -> MemoryResult {
        *self
            .words
            .get_mut(address)
            .ok_or(MemoryError::OutOfRange(address))? = value;
        Ok(())
    }

    /// Swaps in a complete new backing array and hands back the old one.
    pub fn bulk_replace(&mut self, words: impl Into<Box<[Word]>>) -> MemoryResult<Box<[Word]>> {
        let words = words.into();
        if words.len() != self.capacity() {
            return Err(MemoryError::CapacityMismatch {
                expected: self.capacity(),
                actual: words.len(),
            });
        }
        Ok(std::mem::replace(&mut self.words, words))
    }

    pub fn slice(&self, region: Region) -> MemoryResult<&[Word]> {
        if region.end > self.capacity() {
            return Err(MemoryError::OutOfRange(region.end - 1));
        }
        if region.start > region.end {
            return Err(MemoryError::OutOfRange(region.start));
        }
        Ok(&self.words[region.range()])
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn region_of(&self, address: Address) -> MemoryResult<RegionKind> {
        if address >= self.capacity() {
            return Err(MemoryError::OutOfRange(address));
        }

        Ok(if Region::SCREEN.contains(address) {
            RegionKind::Screen
        } else if Region::KEYBOARD.contains(address) {
            RegionKind::Keyboard
        } else {
            RegionKind::General
        })
    }

    pub fn reset(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }
}

/// The memory as it is shared between the execution thread and the render thread.
///
/// A word is only ever read or written while holding the lock, so a reader can see a
/// stale frame but never half of a write.
#[derive(Clone, Default)]
pub struct SharedMemory {
    inner: Arc<RwLock<WordMemory>>,
}

impl SharedMemory {
    pub fn new(memory: WordMemory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(memory)),
        }
    }

    pub fn read(&self) -> MemoryResult<RwLockReadGuard<'_, WordMemory>> {
        self.inner.read().map_err(|_| MemoryError::Poisoned)
    }

    pub fn write(&self) -> MemoryResult<RwLockWriteGuard<'_, WordMemory>> {
        self.inner.write().map_err(|_| MemoryError::Poisoned)
    }
}
