//! Word-level transfer engine
//!
//! Every unit is sent and received strictly in turn: wait for TXE, write,
//! wait for RXNE, read. There is no pipelining and no timeout.

use mcal_core::{ClockGate, RegisterAccess};

use crate::config::{DataSize, SpiConfiguration};
use crate::error::{SpiError, SpiResult};
use crate::peripheral::SpiPeripheral;
use crate::registers::SpiRegister;
use crate::unit::Waiter;

/// A data unit the peripheral can shift
pub trait Word: Copy + Default + 'static {
    /// Frame width this word needs
    const DATA_SIZE: DataSize;

    fn into_u32(self) -> u32;
    fn from_u32(value: u32) -> Self;
}

impl Word for u8 {
    const DATA_SIZE: DataSize = DataSize::Bits8;

    fn into_u32(self) -> u32 {
        u32::from(self)
    }

    fn from_u32(value: u32) -> Self {
        value as u8
    }
}

impl Word for u16 {
    const DATA_SIZE: DataSize = DataSize::Bits16;

    fn into_u32(self) -> u32 {
        u32::from(self)
    }

    fn from_u32(value: u32) -> Self {
        value as u16
    }
}

/// Reject a word type that does not match the frame width of `config`
pub(crate) fn check_word<W: Word>(config: &SpiConfiguration) -> SpiResult<()> {
    if W::DATA_SIZE == config.data_size {
        Ok(())
    } else {
        log::warn!(
            "spi: {}-bit word on a {}-bit frame",
            W::DATA_SIZE.bits(),
            config.data_size.bits()
        );
        Err(SpiError::InvalidArgument)
    }
}

/// Block until the peripheral accepts `word`
pub(crate) fn write_word<R, C, W>(
    hw: &mut SpiPeripheral<R, C>,
    word: W,
    waiter: &Waiter,
) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
    W: Word,
{
    waiter.block_on(|| hw.try_write(word.into_u32()))
}

/// Send one word and return the word shifted in at the same time
pub(crate) fn exchange_word<R, C, W>(
    hw: &mut SpiPeripheral<R, C>,
    word: W,
    waiter: &Waiter,
) -> SpiResult<W>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
    W: Word,
{
    write_word(hw, word, waiter)?;
    let received = waiter.block_on(|| hw.try_read())?;
    Ok(W::from_u32(received))
}

/// Exchange `src` into `dst`, one word at a time.
///
/// Stops at the first failure; words already received stay in `dst`, nothing
/// past the failing index is written.
pub(crate) fn exchange<R, C, W>(
    hw: &mut SpiPeripheral<R, C>,
    src: &[W],
    dst: &mut [W],
    waiter: &Waiter,
) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
    W: Word,
{
    for (index, (tx, rx)) in src.iter().zip(dst.iter_mut()).enumerate() {
        match exchange_word(hw, *tx, waiter) {
            Ok(word) => *rx = word,
            Err(err) => {
                log::warn!("spi: exchange aborted at unit {}: {}", index, err);
                return Err(err);
            }
        }
    }
    log::trace!("spi: exchanged {} units", src.len().min(dst.len()));
    Ok(())
}

/// Block until the busy flag clears
pub(crate) fn wait_idle<R, C>(hw: &SpiPeripheral<R, C>, waiter: &Waiter) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    waiter.block_on(|| hw.try_idle())
}

/// Check the arguments of a buffered exchange before any register is touched
pub(crate) fn check_buffers<W: Word>(
    config: &SpiConfiguration,
    src_len: usize,
    dst_len: usize,
    length: usize,
) -> SpiResult<()> {
    check_word::<W>(config)?;
    if length > src_len || length > dst_len {
        log::warn!(
            "spi: length {} exceeds buffers ({} / {})",
            length,
            src_len,
            dst_len
        );
        return Err(SpiError::InvalidArgument);
    }
    Ok(())
}
