//! Peripheral clock gating and reset

use crate::register::{Register, RegisterAccess};

/// A register in the reset and clock control (RCC) block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RccRegister(pub usize);

impl RccRegister {
    /// AHB1 peripheral reset register
    pub const AHB1RSTR: Self = Self(0x10);
    /// APB1 peripheral reset register
    pub const APB1RSTR: Self = Self(0x20);
    /// APB2 peripheral reset register
    pub const APB2RSTR: Self = Self(0x24);
    /// AHB1 peripheral clock enable register
    pub const AHB1ENR: Self = Self(0x30);
    /// APB1 peripheral clock enable register
    pub const APB1ENR: Self = Self(0x40);
    /// APB2 peripheral clock enable register
    pub const APB2ENR: Self = Self(0x44);
}

impl Register for RccRegister {
    fn offset(self) -> usize {
        self.0
    }
}

/// Clock gate and reset line of one peripheral.
pub trait ClockGate {
    /// Enable the peripheral clock
    fn enable(&mut self);

    /// Disable the peripheral clock
    fn disable(&mut self);

    /// Pulse the peripheral reset line, returning its registers to reset values
    fn reset(&mut self);

    /// Whether the clock is currently enabled
    fn is_enabled(&self) -> bool;
}

/// Enable/reset bits of one peripheral inside an RCC block.
#[derive(Debug)]
pub struct PeripheralClock<A> {
    rcc: A,
    enable: RccRegister,
    reset: RccRegister,
    mask: u32,
}

impl<A: RegisterAccess<RccRegister>> PeripheralClock<A> {
    /// Describe a peripheral gated by `mask` in `enable` and reset by `mask`
    /// in `reset`.
    pub fn new(rcc: A, enable: RccRegister, reset: RccRegister, mask: u32) -> Self {
        Self {
            rcc,
            enable,
            reset,
            mask,
        }
    }

    /// Access the underlying RCC block
    pub fn rcc(&self) -> &A {
        &self.rcc
    }

    /// Release the RCC block
    pub fn release(self) -> A {
        self.rcc
    }
}

impl<A: RegisterAccess<RccRegister>> ClockGate for PeripheralClock<A> {
    fn enable(&mut self) {
        self.rcc.set_bits(self.enable, self.mask);
    }

    fn disable(&mut self) {
        self.rcc.clear_bits(self.enable, self.mask);
    }

    fn reset(&mut self) {
        self.rcc.set_bits(self.reset, self.mask);
        self.rcc.clear_bits(self.reset, self.mask);
    }

    fn is_enabled(&self) -> bool {
        self.rcc.bits_set(self.enable, self.mask)
    }
}
