//! Hardware units and async mode management

use core::fmt;

use crate::error::{SpiError, SpiResult};
use crate::registers::cr2;

/// Number of SPI controllers the driver knows about
pub const NUM_OF_SPI_HW_UNITS: u8 = 3;

/// One physical SPI controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HwUnit(u8);

impl HwUnit {
    pub const UNIT0: HwUnit = HwUnit(0);
    pub const UNIT1: HwUnit = HwUnit(1);
    pub const UNIT2: HwUnit = HwUnit(2);

    /// Create a hardware unit id, rejecting ids past [`NUM_OF_SPI_HW_UNITS`]
    pub const fn new(id: u8) -> SpiResult<Self> {
        if id < NUM_OF_SPI_HW_UNITS {
            Ok(HwUnit(id))
        } else {
            Err(SpiError::InvalidHardwareUnit(id))
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for HwUnit {
    type Error = SpiError;

    fn try_from(id: u8) -> SpiResult<Self> {
        HwUnit::new(id)
    }
}

impl fmt::Display for HwUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SPI_HWUnit_{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for HwUnit {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SPI_HWUnit_{}", self.0);
    }
}

/// How a hardware unit waits for transfers to complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AsyncMode {
    /// Spin on status flags
    #[default]
    Polling = 0,
    /// Flag interrupts enabled; the idle hook runs between status polls
    Interrupt = 1,
    /// DMA requests enabled (mode flag only)
    Dma = 2,
}

impl AsyncMode {
    /// CR2 bits selected by this mode, within [`cr2::ASYNC_MASK`]
    pub const fn cr2_bits(self) -> u32 {
        match self {
            AsyncMode::Polling => 0,
            AsyncMode::Interrupt => cr2::TXEIE | cr2::RXNEIE,
            AsyncMode::Dma => cr2::TXDMAEN | cr2::RXDMAEN,
        }
    }
}

impl TryFrom<u8> for AsyncMode {
    type Error = SpiError;

    fn try_from(raw: u8) -> SpiResult<Self> {
        match raw {
            0 => Ok(AsyncMode::Polling),
            1 => Ok(AsyncMode::Interrupt),
            2 => Ok(AsyncMode::Dma),
            _ => Err(SpiError::InvalidAsyncMode(raw)),
        }
    }
}

impl fmt::Display for AsyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncMode::Polling => write!(f, "SPI_POLLING_MODE"),
            AsyncMode::Interrupt => write!(f, "SPI_INTERRUPT_MODE"),
            AsyncMode::Dma => write!(f, "SPI_DMA_MODE"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AsyncMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            AsyncMode::Polling => defmt::write!(fmt, "SPI_POLLING_MODE"),
            AsyncMode::Interrupt => defmt::write!(fmt, "SPI_INTERRUPT_MODE"),
            AsyncMode::Dma => defmt::write!(fmt, "SPI_DMA_MODE"),
        }
    }
}

/// What to do while a status flag is not yet set.
///
/// There is no timeout: a flag that never sets blocks forever.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Waiter {
    mode: AsyncMode,
    idle: Option<fn()>,
}

impl Waiter {
    pub(crate) const fn new(mode: AsyncMode, idle: Option<fn()>) -> Self {
        Self { mode, idle }
    }

    pub(crate) fn mode(&self) -> AsyncMode {
        self.mode
    }

    /// One idle step between two status polls
    pub(crate) fn wait(&self) {
        match (self.mode, self.idle) {
            (AsyncMode::Interrupt, Some(idle)) => idle(),
            _ => core::hint::spin_loop(),
        }
    }

    /// Poll `op` until it stops returning `WouldBlock`
    pub(crate) fn block_on<T>(
        &self,
        mut op: impl FnMut() -> nb::Result<T, SpiError>,
    ) -> SpiResult<T> {
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(nb::Error::Other(err)) => return Err(err),
                Err(nb::Error::WouldBlock) => self.wait(),
            }
        }
    }
}
