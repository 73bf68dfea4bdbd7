//! `embedded-hal` bus implementation
//!
//! Lets an initialized [`SpiDriver`] be handed to any driver written against
//! [`embedded_hal::spi::SpiBus`]. Transfers run on the active configuration
//! with the same strict write-then-read pairing as the rest of the driver.

use embedded_hal::spi::{ErrorType, SpiBus};
use mcal_core::{ClockGate, RegisterAccess};

use crate::driver::SpiDriver;
use crate::error::SpiError;
use crate::registers::SpiRegister;
use crate::transfer::{self, Word};

impl<R, C> ErrorType for SpiDriver<R, C> {
    type Error = SpiError;
}

impl<R, C, W> SpiBus<W> for SpiDriver<R, C>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
    W: Word,
{
    /// Clocks out zeros and keeps what comes back
    fn read(&mut self, words: &mut [W]) -> Result<(), SpiError> {
        let waiter = self.ready::<W>()?;
        for word in words.iter_mut() {
            *word = transfer::exchange_word(self.hw_mut(), W::default(), &waiter)?;
        }
        Ok(())
    }

    /// Sends `words`, discarding what comes back
    fn write(&mut self, words: &[W]) -> Result<(), SpiError> {
        let waiter = self.ready::<W>()?;
        for word in words {
            transfer::exchange_word(self.hw_mut(), *word, &waiter)?;
        }
        Ok(())
    }

    /// Exchanges `max(read.len(), write.len())` words; the shorter side is
    /// padded with zeros on transmit and ignored on receive
    fn transfer(&mut self, read: &mut [W], write: &[W]) -> Result<(), SpiError> {
        let waiter = self.ready::<W>()?;
        for index in 0..read.len().max(write.len()) {
            let tx = write.get(index).copied().unwrap_or_default();
            let rx = transfer::exchange_word(self.hw_mut(), tx, &waiter)?;
            if let Some(slot) = read.get_mut(index) {
                *slot = rx;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [W]) -> Result<(), SpiError> {
        let waiter = self.ready::<W>()?;
        for word in words.iter_mut() {
            *word = transfer::exchange_word(self.hw_mut(), *word, &waiter)?;
        }
        Ok(())
    }

    /// Waits for the busy flag to clear
    fn flush(&mut self) -> Result<(), SpiError> {
        let waiter = self.waiter();
        transfer::wait_idle(self.peripheral(), &waiter)
    }
}

impl<R: RegisterAccess<SpiRegister>, C: ClockGate> SpiDriver<R, C> {
    /// Checks the word width and drops a unit left behind by
    /// [`write_immediate`](Self::write_immediate)
    fn ready<W: Word>(&mut self) -> Result<crate::unit::Waiter, SpiError> {
        let config = self.bus_config()?;
        transfer::check_word::<W>(&config)?;
        self.hw_mut().drain();
        Ok(self.waiter())
    }
}
