//! Owned handle to one SPI peripheral
//!
//! Wraps the register capability and the clock gate of a single controller.
//! Everything above this module speaks in configurations and flags; only this
//! module knows which register holds what.

use mcal_core::{ClockGate, RegisterAccess};

use crate::config::SpiConfiguration;
use crate::error::SpiError;
use crate::registers::{cr1, cr2, sr, SpiRegister};
use crate::unit::AsyncMode;

/// Register block and clock gate of one SPI controller
#[derive(Debug)]
pub struct SpiPeripheral<R, C> {
    regs: R,
    clock: C,
}

impl<R: RegisterAccess<SpiRegister>, C: ClockGate> SpiPeripheral<R, C> {
    pub fn new(regs: R, clock: C) -> Self {
        Self { regs, clock }
    }

    /// Program the peripheral from `config` and enable it.
    ///
    /// Gates the clock on first, then rewrites CR1 with SPE cleared, the async
    /// mode bits of CR2 and the CRC polynomial, and sets SPE last. A stale
    /// received unit and its overrun flag are drained before returning.
    pub fn apply(&mut self, config: &SpiConfiguration, mode: AsyncMode) {
        self.clock.enable();
        self.regs.clear_bits(SpiRegister::Cr1, cr1::SPE);
        self.regs.write_register(SpiRegister::Cr1, config.cr1_bits());
        self.set_async_mode(mode);
        self.regs
            .write_register(SpiRegister::Crcpr, u32::from(config.crc_polynomial));
        self.regs.set_bits(SpiRegister::Cr1, cr1::SPE);

        self.clear_overrun();
    }

    /// Discard a unit left in the receive buffer, clearing its overrun flag
    pub fn drain(&mut self) {
        if self.status() & (sr::RXNE | sr::OVR) != 0 {
            self.clear_overrun();
        }
    }

    // DR then SR clears OVR
    fn clear_overrun(&mut self) {
        let _ = self.regs.read_register(SpiRegister::Dr);
        let _ = self.status();
    }

    /// Reprogram only the CR2 bits owned by the async mode
    pub fn set_async_mode(&mut self, mode: AsyncMode) {
        self.regs
            .modify(SpiRegister::Cr2, cr2::ASYNC_MASK, mode.cr2_bits());
    }

    /// Disable the peripheral, pulse its reset line and gate its clock off
    pub fn shut_down(&mut self) {
        self.regs.write_register(SpiRegister::Cr1, 0);
        self.regs.write_register(SpiRegister::Cr2, 0);
        self.clock.reset();
        self.clock.disable();
    }

    pub fn clock_enabled(&self) -> bool {
        self.clock.is_enabled()
    }

    pub fn status(&self) -> u32 {
        self.regs.read_register(SpiRegister::Sr)
    }

    pub fn is_busy(&self) -> bool {
        self.status() & sr::BSY != 0
    }

    pub fn is_enabled(&self) -> bool {
        self.regs.bits_set(SpiRegister::Cr1, cr1::SPE)
    }

    /// Non-blocking: write one data unit once the transmit buffer is empty.
    ///
    /// Only a mode fault stops a write; overrun is reported on the read side.
    pub fn try_write(&mut self, data: u32) -> nb::Result<(), SpiError> {
        let status = self.status();
        if status & sr::MODF != 0 {
            return Err(nb::Error::Other(SpiError::ModeFault));
        }
        if status & sr::TXE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.write_register(SpiRegister::Dr, data);
        Ok(())
    }

    /// Non-blocking: read one data unit once the receive buffer is full.
    ///
    /// An overrun is cleared before it is reported; the overwritten unit is
    /// lost.
    pub fn try_read(&mut self) -> nb::Result<u32, SpiError> {
        let status = self.status();
        if let Some(err) = SpiError::from_status(status) {
            if status & sr::OVR != 0 {
                self.clear_overrun();
            }
            return Err(nb::Error::Other(err));
        }
        if status & sr::RXNE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.regs.read_register(SpiRegister::Dr))
    }

    /// Non-blocking: succeed once the busy flag is clear
    pub fn try_idle(&self) -> nb::Result<(), SpiError> {
        if self.is_busy() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Release the register block and clock gate
    pub fn release(self) -> (R, C) {
        (self.regs, self.clock)
    }
}
