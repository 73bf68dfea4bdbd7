//! AUTOSAR-style service surface
//!
//! Thin functions over [`SpiDriver`] that accept the loosely typed arguments
//! of the classic C interface: optional references standing in for nullable
//! pointers, and raw sequence, unit and mode numbers. Every argument is
//! validated here before the driver is reached. Results keep their
//! [`SpiError`] kind; convert with [`StdReturnType::from`] to get the binary
//! `E_OK`/`E_NOT_OK` contract.

use mcal_core::{ClockGate, RegisterAccess, StdReturnType, VersionInfo};

use crate::config::SpiConfiguration;
use crate::driver::SpiDriver;
use crate::error::{SpiError, SpiResult};
use crate::registers::SpiRegister;
use crate::sequence::{SequenceId, SequenceState};
use crate::transfer::Word;
use crate::unit::{AsyncMode, HwUnit};

fn required<T>(arg: Option<T>, name: &str) -> SpiResult<T> {
    arg.ok_or_else(|| {
        log::warn!("spi: {} missing", name);
        SpiError::InvalidArgument
    })
}

/// `Spi_Init`
pub fn init<R, C>(driver: &mut SpiDriver<R, C>, config: Option<&SpiConfiguration>) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    let config = required(config, "configuration")?;
    driver.init(config);
    Ok(())
}

/// `Spi_DeInit`; always succeeds
pub fn deinit<R, C>(driver: &mut SpiDriver<R, C>) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    driver.deinit();
    Ok(())
}

/// `Spi_WriteIB`: send one unit from an internal buffer
pub fn write_ib<R, C, W>(driver: &mut SpiDriver<R, C>, buffer: Option<&W>) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
    W: Word,
{
    let word = required(buffer, "buffer")?;
    driver.write_immediate(*word)
}

/// `Spi_SetupEB`: exchange `length` units through external buffers
pub fn setup_eb<R, C, W>(
    driver: &mut SpiDriver<R, C>,
    config: Option<&SpiConfiguration>,
    src: Option<&[W]>,
    dst: Option<&mut [W]>,
    length: u16,
) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
    W: Word,
{
    let config = required(config, "configuration")?;
    let src = required(src, "source buffer")?;
    let dst = required(dst, "destination buffer")?;
    driver.buffered_exchange(config, src, dst, usize::from(length))
}

/// `Spi_GetStatus`
pub fn get_status<R, C>(driver: &SpiDriver<R, C>) -> StdReturnType
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    driver.status()
}

/// `Spi_GetJobResult`
pub fn get_job_result<R, C>(driver: &SpiDriver<R, C>) -> StdReturnType
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    driver.job_result()
}

/// `Spi_GetSequenceResult`
pub fn get_sequence_result<R, C>(driver: &SpiDriver<R, C>, sequence: u8) -> SpiResult<SequenceState>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    let id = SequenceId::new(sequence)?;
    Ok(driver.sequence_result(id))
}

/// `Spi_SyncTransmit`
pub fn sync_transmit<R, C>(driver: &mut SpiDriver<R, C>, sequence: u8) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    let id = SequenceId::new(sequence)?;
    driver.sync_transmit(id)
}

/// `Spi_AsyncTransmit`
pub fn async_transmit<R, C>(driver: &mut SpiDriver<R, C>, sequence: u8) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    let id = SequenceId::new(sequence)?;
    driver.async_transmit(id)
}

/// `Spi_MainFunction_Handling`
pub fn main_function_handling<R, C>(driver: &mut SpiDriver<R, C>)
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    driver.main_function_handling();
}

/// `Spi_Cancel`; succeeds for every in-bound sequence whatever its state
pub fn cancel<R, C>(driver: &mut SpiDriver<R, C>, sequence: u8) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    let id = SequenceId::new(sequence)?;
    driver.cancel(id);
    Ok(())
}

/// `Spi_SetAsyncMode`.
///
/// An out-of-range unit or an unknown mode is reported as
/// [`SpiError::InvalidArgument`].
pub fn set_async_mode<R, C>(driver: &mut SpiDriver<R, C>, unit: u8, mode: u8) -> SpiResult<()>
where
    R: RegisterAccess<SpiRegister>,
    C: ClockGate,
{
    let parsed = HwUnit::new(unit).and_then(|unit| Ok((unit, AsyncMode::try_from(mode)?)));
    match parsed {
        Ok((unit, mode)) => {
            driver.set_async_mode(unit, mode);
            Ok(())
        }
        Err(err) => {
            log::warn!("spi: set async mode rejected: {}", err);
            Err(SpiError::InvalidArgument)
        }
    }
}

/// `Spi_GetVersionInfo`
pub fn get_version_info(info: Option<&mut VersionInfo>) -> SpiResult<()> {
    let info = required(info, "version info")?;
    *info = crate::version_info();
    Ok(())
}
