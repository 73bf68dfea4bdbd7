//! Error types for SPI operations

use core::fmt;

use embedded_hal::spi::ErrorKind;

/// SPI driver errors
///
/// Every variant collapses onto `E_NOT_OK` at the binary boundary
/// (see [`mcal_core::StdReturnType`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiError {
    /// Missing or inconsistent argument
    InvalidArgument,
    /// Sequence id outside the configured bound
    InvalidSequence(u8),
    /// Hardware unit id outside the configured bound
    InvalidHardwareUnit(u8),
    /// Raw value is not an async mode
    InvalidAsyncMode(u8),
    /// Driver used before `init` or after `deinit`
    Uninitialized,
    /// Sequence submitted again while still pending or running
    SequencePending(u8),
    /// Received data was overwritten before it was read
    Overrun,
    /// Master mode fault (NSS pulled low by another master)
    ModeFault,
    /// CRC check failed
    Crc,
}

impl SpiError {
    /// Decode the fault bits of the status register
    pub(crate) fn from_status(status: u32) -> Option<Self> {
        use crate::registers::sr;

        if status & sr::OVR != 0 {
            Some(SpiError::Overrun)
        } else if status & sr::MODF != 0 {
            Some(SpiError::ModeFault)
        } else if status & sr::CRCERR != 0 {
            Some(SpiError::Crc)
        } else {
            None
        }
    }
}

impl fmt::Display for SpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InvalidSequence(id) => write!(f, "invalid sequence: {}", id),
            Self::InvalidHardwareUnit(id) => write!(f, "invalid hardware unit: {}", id),
            Self::InvalidAsyncMode(raw) => write!(f, "invalid async mode: {}", raw),
            Self::Uninitialized => write!(f, "driver not initialized"),
            Self::SequencePending(id) => write!(f, "sequence {} already pending", id),
            Self::Overrun => write!(f, "receive overrun"),
            Self::ModeFault => write!(f, "master mode fault"),
            Self::Crc => write!(f, "CRC error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SpiError {}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidArgument => defmt::write!(fmt, "InvalidArgument"),
            Self::InvalidSequence(id) => defmt::write!(fmt, "InvalidSequence({})", id),
            Self::InvalidHardwareUnit(id) => defmt::write!(fmt, "InvalidHardwareUnit({})", id),
            Self::InvalidAsyncMode(raw) => defmt::write!(fmt, "InvalidAsyncMode({})", raw),
            Self::Uninitialized => defmt::write!(fmt, "Uninitialized"),
            Self::SequencePending(id) => defmt::write!(fmt, "SequencePending({})", id),
            Self::Overrun => defmt::write!(fmt, "Overrun"),
            Self::ModeFault => defmt::write!(fmt, "ModeFault"),
            Self::Crc => defmt::write!(fmt, "Crc"),
        }
    }
}

impl embedded_hal::spi::Error for SpiError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Overrun => ErrorKind::Overrun,
            Self::ModeFault => ErrorKind::ModeFault,
            Self::Crc => ErrorKind::FrameFormat,
            _ => ErrorKind::Other,
        }
    }
}

/// Result type for SPI operations
pub type SpiResult<T> = Result<T, SpiError>;
