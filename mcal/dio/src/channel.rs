//! Channel, port and level types

use core::fmt;
use core::ops::Not;

use mcal_core::Register;

use crate::error::{DioError, DioResult};

/// Number of GPIO ports served by the DIO service
pub const NUM_OF_DIO_PORTS: usize = 2;

/// Channels per port (ports are 16 bits wide)
pub const CHANNELS_PER_PORT: u8 = 16;

/// Total number of addressable channels
pub const NUM_OF_DIO_CHANNELS: u8 = CHANNELS_PER_PORT * NUM_OF_DIO_PORTS as u8;

/// Logic level of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Level of one bit
    pub const fn from_bit(set: bool) -> Self {
        if set {
            Level::High
        } else {
            Level::Low
        }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(set: bool) -> Self {
        Level::from_bit(set)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "STD_LOW"),
            Level::High => write!(f, "STD_HIGH"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Level {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Level::Low => defmt::write!(fmt, "STD_LOW"),
            Level::High => defmt::write!(fmt, "STD_HIGH"),
        }
    }
}

/// One of the fixed GPIO ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortId {
    /// Channels 0..16
    A,
    /// Channels 16..32
    B,
}

impl PortId {
    /// Index into the port table
    pub const fn index(self) -> usize {
        match self {
            PortId::A => 0,
            PortId::B => 1,
        }
    }
}

impl TryFrom<u8> for PortId {
    type Error = DioError;

    fn try_from(raw: u8) -> DioResult<Self> {
        match raw {
            0 => Ok(PortId::A),
            1 => Ok(PortId::B),
            _ => Err(DioError::InvalidPort(raw)),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PortId {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PortId::A => defmt::write!(fmt, "GPIOA"),
            PortId::B => defmt::write!(fmt, "GPIOB"),
        }
    }
}

/// Validated channel identifier
///
/// Ids `0..16` address port A bits 0..16 and ids `16..32` address port B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Create a channel id, rejecting ids outside both ports
    pub const fn new(id: u8) -> DioResult<Self> {
        if id < NUM_OF_DIO_CHANNELS {
            Ok(ChannelId(id))
        } else {
            Err(DioError::InvalidChannel(id))
        }
    }

    /// Get the raw channel id
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Port the channel belongs to
    pub const fn port(self) -> PortId {
        if self.0 < CHANNELS_PER_PORT {
            PortId::A
        } else {
            PortId::B
        }
    }

    /// Bit position within the port
    pub const fn bit(self) -> u8 {
        self.0 % CHANNELS_PER_PORT
    }

    /// Port mask with only this channel's bit set
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }

    /// Iterate over every valid channel
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..NUM_OF_DIO_CHANNELS).map(ChannelId)
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = DioError;

    fn try_from(raw: u8) -> DioResult<Self> {
        ChannelId::new(raw)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Channel({})", self.0);
    }
}

/// A named set of bits within one port, read and written together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelGroup {
    pub port: PortId,
    pub mask: u16,
}

impl ChannelGroup {
    pub const fn new(port: PortId, mask: u16) -> Self {
        Self { port, mask }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelGroup {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ChannelGroup({}, {=u16:#x})", self.port, self.mask);
    }
}

/// GPIO port registers used by the DIO service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioRegister {
    /// Port mode register
    Moder,
    /// Input data register
    Idr,
    /// Output data register
    Odr,
    /// Bit set/reset register: low half sets, high half resets
    Bsrr,
}

impl Register for GpioRegister {
    fn offset(self) -> usize {
        match self {
            GpioRegister::Moder => 0x00,
            GpioRegister::Idr => 0x10,
            GpioRegister::Odr => 0x14,
            GpioRegister::Bsrr => 0x18,
        }
    }
}
