//! Loopback SPI peripheral for host tests
//!
//! Every unit written to DR while the peripheral is enabled is shifted back in
//! on the next status poll, as if MOSI were wired to MISO. Status flags can be
//! held or stalled and faults injected to exercise the waiting and error paths
//! of the driver.

use core::cell::Cell;

use heapless::Vec;
use mcal_core::sim::RegisterFile;
use mcal_core::{PeripheralClock, Register, RccRegister, RegisterAccess};

use crate::registers::{cr1, sr, SpiRegister};

/// Number of transmitted units kept in the transmit log
pub const TX_LOG_SIZE: usize = 64;

/// Clock gate backed by an in-memory RCC block
pub type SimClock = PeripheralClock<RegisterFile<32>>;

/// RCC enable bit used by [`sim_clock`]
pub const SIM_CLOCK_MASK: u32 = 1 << 12;

/// A clock gate wired like SPI1 on an in-memory RCC block
pub fn sim_clock() -> SimClock {
    PeripheralClock::new(
        RegisterFile::new(),
        RccRegister::APB2ENR,
        RccRegister::APB2RSTR,
        SIM_CLOCK_MASK,
    )
}

/// Simulated SPI peripheral with MOSI looped back to MISO
#[derive(Debug)]
pub struct LoopbackSpi {
    regs: RegisterFile<8>,
    rx: Cell<Option<u32>>,
    faults: Cell<u32>,
    overrun_armed: Cell<bool>,
    tx_stall: Cell<u32>,
    busy_polls: Cell<u32>,
    busy_after_write: Cell<u32>,
    hold_busy: Cell<bool>,
    fail_after: Cell<Option<(u32, u32)>>,
    response: Cell<Option<fn(u32) -> u32>>,
    sent: u32,
    tx_log: Vec<u32, TX_LOG_SIZE>,
}

impl Default for LoopbackSpi {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackSpi {
    pub const fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            rx: Cell::new(None),
            faults: Cell::new(0),
            overrun_armed: Cell::new(false),
            tx_stall: Cell::new(0),
            busy_polls: Cell::new(0),
            busy_after_write: Cell::new(0),
            hold_busy: Cell::new(false),
            fail_after: Cell::new(None),
            response: Cell::new(None),
            sent: 0,
            tx_log: Vec::new(),
        }
    }

    // wire-side controls, usable while a driver owns the peripheral

    /// Hold the busy flag set until released
    pub fn set_busy(&self, busy: bool) {
        self.hold_busy.set(busy);
    }

    /// Report busy for `polls` status reads after every data write
    pub fn busy_after_write(&self, polls: u32) {
        self.busy_after_write.set(polls);
    }

    /// Report the transmit buffer full for the next `polls` status reads
    pub fn stall_tx(&self, polls: u32) {
        self.tx_stall.set(polls);
    }

    /// Raise fault bits (`sr::OVR`, `sr::MODF`, `sr::CRCERR`) right away
    pub fn inject_fault(&self, bits: u32) {
        self.faults.set(self.faults.get() | (bits & sr::FAULT_MASK));
    }

    /// Raise fault bits once `units` units in total have been transmitted
    pub fn fail_after(&self, units: u32, bits: u32) {
        self.fail_after.set(Some((units, bits & sr::FAULT_MASK)));
    }

    /// Answer every transmitted unit with `f(unit)` instead of the unit itself
    pub fn respond_with(&self, f: fn(u32) -> u32) {
        self.response.set(Some(f));
    }

    /// Units written to DR while enabled
    pub fn units_sent(&self) -> u32 {
        self.sent
    }

    /// The first [`TX_LOG_SIZE`] units written to DR while enabled
    pub fn transmitted(&self) -> &[u32] {
        &self.tx_log
    }

    /// Current control register 1
    pub fn cr1(&self) -> u32 {
        self.regs.peek(SpiRegister::Cr1.offset())
    }

    /// Current control register 2
    pub fn cr2(&self) -> u32 {
        self.regs.peek(SpiRegister::Cr2.offset())
    }

    /// Current CRC polynomial register
    pub fn crc_polynomial(&self) -> u32 {
        self.regs.peek(SpiRegister::Crcpr.offset())
    }

    /// Register accesses made through the shim
    pub fn registers(&self) -> &RegisterFile<8> {
        &self.regs
    }

    /// Zero the register access counters
    pub fn reset_counters(&mut self) {
        self.regs.reset_counters();
    }

    fn frame_mask(&self) -> u32 {
        if self.cr1() & cr1::DFF != 0 {
            0xFFFF
        } else {
            0xFF
        }
    }

    fn status(&self) -> u32 {
        let mut status = self.faults.get();

        let stall = self.tx_stall.get();
        if stall > 0 {
            self.tx_stall.set(stall - 1);
        } else {
            status |= sr::TXE;
        }

        if self.rx.get().is_some() {
            status |= sr::RXNE;
        }

        let busy = self.busy_polls.get();
        if busy > 0 {
            self.busy_polls.set(busy - 1);
            status |= sr::BSY;
        } else if self.hold_busy.get() {
            status |= sr::BSY;
        }

        // DR then SR clears OVR
        if self.overrun_armed.replace(false) {
            self.faults.set(self.faults.get() & !sr::OVR);
        }
        status
    }

    fn transmit(&mut self, value: u32) {
        let unit = value & self.frame_mask();
        if self.cr1() & cr1::SPE == 0 {
            return;
        }

        self.sent += 1;
        let _ = self.tx_log.push(unit);

        if self.rx.get().is_some() {
            self.faults.set(self.faults.get() | sr::OVR);
        }
        let answer = self.response.get().map_or(unit, |f| f(unit)) & self.frame_mask();
        self.rx.set(Some(answer));
        self.busy_polls.set(self.busy_after_write.get());

        if let Some((units, bits)) = self.fail_after.get() {
            if self.sent >= units {
                self.faults.set(self.faults.get() | bits);
                self.fail_after.set(None);
            }
        }
    }
}

impl RegisterAccess<SpiRegister> for LoopbackSpi {
    fn read_register(&self, reg: SpiRegister) -> u32 {
        // keep the access counters honest
        let stored = self.regs.read_register(reg);
        match reg {
            SpiRegister::Sr => self.status(),
            SpiRegister::Dr => {
                self.overrun_armed.set(self.faults.get() & sr::OVR != 0);
                self.rx.take().unwrap_or(stored)
            }
            _ => stored,
        }
    }

    fn write_register(&mut self, reg: SpiRegister, value: u32) {
        self.regs.write_register(reg, value);
        match reg {
            SpiRegister::Dr => self.transmit(value),
            // SR read then CR1 write clears MODF
            SpiRegister::Cr1 => self.faults.set(self.faults.get() & !sr::MODF),
            // CRCERR is cleared by writing zero
            SpiRegister::Sr => {
                if value & sr::CRCERR == 0 {
                    self.faults.set(self.faults.get() & !sr::CRCERR);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> LoopbackSpi {
        let mut spi = LoopbackSpi::new();
        spi.write_register(SpiRegister::Cr1, cr1::SPE);
        spi
    }

    #[test]
    fn echoes_when_enabled() {
        let mut spi = enabled();
        spi.write_register(SpiRegister::Dr, 0x1A5);
        assert_ne!(spi.read_register(SpiRegister::Sr) & sr::RXNE, 0);
        assert_eq!(spi.read_register(SpiRegister::Dr), 0xA5);
        assert_eq!(spi.read_register(SpiRegister::Sr) & sr::RXNE, 0);
        assert_eq!(spi.transmitted(), &[0xA5]);
    }

    #[test]
    fn disabled_peripheral_sends_nothing() {
        let mut spi = LoopbackSpi::new();
        spi.write_register(SpiRegister::Dr, 1);
        assert_eq!(spi.units_sent(), 0);
        assert_eq!(spi.read_register(SpiRegister::Sr) & sr::RXNE, 0);
    }

    #[test]
    fn unread_unit_overruns() {
        let mut spi = enabled();
        spi.write_register(SpiRegister::Dr, 1);
        spi.write_register(SpiRegister::Dr, 2);
        assert_ne!(spi.read_register(SpiRegister::Sr) & sr::OVR, 0);

        assert_eq!(spi.read_register(SpiRegister::Dr), 2);
        let _ = spi.read_register(SpiRegister::Sr);
        assert_eq!(spi.read_register(SpiRegister::Sr) & sr::OVR, 0);
    }

    #[test]
    fn busy_counts_down() {
        let mut spi = enabled();
        spi.busy_after_write(2);
        spi.write_register(SpiRegister::Dr, 1);
        assert_ne!(spi.read_register(SpiRegister::Sr) & sr::BSY, 0);
        assert_ne!(spi.read_register(SpiRegister::Sr) & sr::BSY, 0);
        assert_eq!(spi.read_register(SpiRegister::Sr) & sr::BSY, 0);
    }

    #[test]
    fn mode_fault_cleared_by_cr1_write() {
        let mut spi = enabled();
        spi.inject_fault(sr::MODF);
        assert_ne!(spi.read_register(SpiRegister::Sr) & sr::MODF, 0);
        spi.write_register(SpiRegister::Cr1, cr1::SPE);
        assert_eq!(spi.read_register(SpiRegister::Sr) & sr::MODF, 0);
    }
}
