//! Register access shim
//!
//! Drivers never dereference peripheral addresses themselves. They are handed a
//! [`RegisterAccess`] capability at construction and name registers through a
//! small [`Register`] enum of their own, which keeps every driver testable
//! against an in-memory register file.

/// A register identifier within one peripheral block.
pub trait Register: Copy {
    /// Byte offset of the register from the peripheral base address
    fn offset(self) -> usize;
}

/// Read/write capability over the registers of one peripheral block.
pub trait RegisterAccess<R: Register> {
    /// Read the current register value
    fn read_register(&self, reg: R) -> u32;

    /// Overwrite the register value
    fn write_register(&mut self, reg: R, value: u32);

    /// Read-modify-write: set every bit in `mask`
    fn set_bits(&mut self, reg: R, mask: u32) {
        let value = self.read_register(reg);
        self.write_register(reg, value | mask);
    }

    /// Read-modify-write: clear every bit in `mask`
    fn clear_bits(&mut self, reg: R, mask: u32) {
        let value = self.read_register(reg);
        self.write_register(reg, value & !mask);
    }

    /// Read-modify-write: replace the bits in `mask` with those of `value`
    fn modify(&mut self, reg: R, mask: u32, value: u32) {
        let current = self.read_register(reg);
        self.write_register(reg, (current & !mask) | (value & mask));
    }

    /// Check whether every bit in `mask` is set
    fn bits_set(&self, reg: R, mask: u32) -> bool {
        self.read_register(reg) & mask == mask
    }
}

impl<R: Register, T: RegisterAccess<R> + ?Sized> RegisterAccess<R> for &mut T {
    fn read_register(&self, reg: R) -> u32 {
        (**self).read_register(reg)
    }

    fn write_register(&mut self, reg: R, value: u32) {
        (**self).write_register(reg, value)
    }
}

/// Memory-mapped register block at a fixed base address.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create a handle to the register block starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a peripheral register block that stays
    /// mapped for the lifetime of the handle, and the caller must not create a
    /// second handle to the same block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the block
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl<R: Register> RegisterAccess<R> for Mmio {
    fn read_register(&self, reg: R) -> u32 {
        let addr = (self.base + reg.offset()) as *const u32;
        // SAFETY: `Mmio::new` guarantees a mapped, exclusively owned block.
        unsafe { core::ptr::read_volatile(addr) }
    }

    fn write_register(&mut self, reg: R, value: u32) {
        let addr = (self.base + reg.offset()) as *mut u32;
        // SAFETY: see `read_register`.
        unsafe { core::ptr::write_volatile(addr, value) }
    }
}
