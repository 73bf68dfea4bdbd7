//! In-memory register file for host tests
//!
//! Behaves like plain RAM: every register holds the last value written. Access
//! counters let tests assert how much a driver touched the hardware.

use core::cell::Cell;

use crate::register::{Register, RegisterAccess};

/// `N` word-sized registers backed by memory.
#[derive(Debug)]
pub struct RegisterFile<const N: usize> {
    words: [u32; N],
    reads: Cell<u32>,
    writes: u32,
}

impl<const N: usize> RegisterFile<N> {
    /// Create a register file with every register cleared
    pub const fn new() -> Self {
        Self {
            words: [0; N],
            reads: Cell::new(0),
            writes: 0,
        }
    }

    /// Value at a byte offset, bypassing the access counters
    pub fn peek(&self, offset: usize) -> u32 {
        self.words.get(offset / 4).copied().unwrap_or(0)
    }

    /// Store a value at a byte offset, bypassing the access counters
    pub fn poke(&mut self, offset: usize, value: u32) {
        if let Some(word) = self.words.get_mut(offset / 4) {
            *word = value;
        }
    }

    /// Number of register reads since creation or the last reset
    pub fn reads(&self) -> u32 {
        self.reads.get()
    }

    /// Number of register writes since creation or the last reset
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Total register operations
    pub fn operations(&self) -> u32 {
        self.reads() + self.writes()
    }

    /// Zero the access counters
    pub fn reset_counters(&mut self) {
        self.reads.set(0);
        self.writes = 0;
    }
}

impl<const N: usize> Default for RegisterFile<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Register, const N: usize> RegisterAccess<R> for RegisterFile<N> {
    fn read_register(&self, reg: R) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.peek(reg.offset())
    }

    fn write_register(&mut self, reg: R, value: u32) {
        self.writes += 1;
        self.poke(reg.offset(), value);
    }
}
