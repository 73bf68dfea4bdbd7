//! SPI bus configuration
//!
//! A [`SpiConfiguration`] is an immutable snapshot of every bus parameter the
//! peripheral needs. The driver applies it wholesale: a later `init` replaces
//! the previous configuration, nothing is merged.

use core::fmt;

use crate::registers::cr1;

/// Data line usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// 2 lines, transmit and receive
    #[default]
    FullDuplex,
    /// 2 lines, receive only
    RxOnly,
    /// 1 bidirectional line, receiving
    HalfDuplexRx,
    /// 1 bidirectional line, transmitting
    HalfDuplexTx,
}

impl Direction {
    const fn cr1_bits(self) -> u32 {
        match self {
            Direction::FullDuplex => 0,
            Direction::RxOnly => cr1::RXONLY,
            Direction::HalfDuplexRx => cr1::BIDIMODE,
            Direction::HalfDuplexTx => cr1::BIDIMODE | cr1::BIDIOE,
        }
    }
}

/// Bus role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Master,
    Slave,
}

impl Role {
    const fn cr1_bits(self) -> u32 {
        match self {
            // SSI keeps the internal NSS high so the master does not fault
            Role::Master => cr1::MSTR | cr1::SSI,
            Role::Slave => 0,
        }
    }
}

/// Data frame width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSize {
    #[default]
    Bits8,
    Bits16,
}

impl DataSize {
    /// Frame width in bits
    pub const fn bits(self) -> u32 {
        match self {
            DataSize::Bits8 => 8,
            DataSize::Bits16 => 16,
        }
    }

    /// Mask selecting the valid bits of the data register
    pub const fn mask(self) -> u32 {
        match self {
            DataSize::Bits8 => 0xFF,
            DataSize::Bits16 => 0xFFFF,
        }
    }

    const fn cr1_bits(self) -> u32 {
        match self {
            DataSize::Bits8 => 0,
            DataSize::Bits16 => cr1::DFF,
        }
    }
}

/// Clock idle level (CPOL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPolarity {
    #[default]
    IdleLow,
    IdleHigh,
}

/// Clock edge data is captured on (CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPhase {
    #[default]
    FirstEdge,
    SecondEdge,
}

/// Slave select (NSS) management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlaveSelect {
    /// NSS driven by software through SSI
    #[default]
    Software,
    /// NSS pin driven by the peripheral
    Hardware,
}

/// Peripheral clock divisor for the bus clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaudRatePrescaler {
    #[default]
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
}

impl BaudRatePrescaler {
    /// Divisor applied to the peripheral clock
    pub const fn divisor(self) -> u32 {
        2 << (self as u32)
    }

    const fn cr1_bits(self) -> u32 {
        (self as u32) << cr1::BR_SHIFT
    }
}

/// Bit transmitted first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

/// Reset value of the CRC polynomial register
pub const DEFAULT_CRC_POLYNOMIAL: u16 = 7;

/// Complete SPI bus configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfiguration {
    pub direction: Direction,
    pub role: Role,
    pub data_size: DataSize,
    pub clock_polarity: ClockPolarity,
    pub clock_phase: ClockPhase,
    pub slave_select: SlaveSelect,
    pub baud_rate_prescaler: BaudRatePrescaler,
    pub bit_order: BitOrder,
    pub crc_polynomial: u16,
}

impl Default for SpiConfiguration {
    fn default() -> Self {
        Self {
            direction: Direction::FullDuplex,
            role: Role::Master,
            data_size: DataSize::Bits8,
            clock_polarity: ClockPolarity::IdleLow,
            clock_phase: ClockPhase::FirstEdge,
            slave_select: SlaveSelect::Software,
            baud_rate_prescaler: BaudRatePrescaler::Div2,
            bit_order: BitOrder::MsbFirst,
            crc_polynomial: DEFAULT_CRC_POLYNOMIAL,
        }
    }
}

impl SpiConfiguration {
    /// Creates a new configuration builder starting from the defaults.
    pub fn builder() -> SpiConfigurationBuilder {
        SpiConfigurationBuilder::default()
    }

    /// CR1 value for this configuration, with the peripheral still disabled.
    pub const fn cr1_bits(&self) -> u32 {
        let mut bits = self.direction.cr1_bits()
            | self.role.cr1_bits()
            | self.data_size.cr1_bits()
            | self.baud_rate_prescaler.cr1_bits();
        if matches!(self.clock_polarity, ClockPolarity::IdleHigh) {
            bits |= cr1::CPOL;
        }
        if matches!(self.clock_phase, ClockPhase::SecondEdge) {
            bits |= cr1::CPHA;
        }
        if matches!(self.slave_select, SlaveSelect::Software) {
            bits |= cr1::SSM;
        }
        if matches!(self.bit_order, BitOrder::LsbFirst) {
            bits |= cr1::LSBFIRST;
        }
        bits
    }
}

impl fmt::Display for SpiConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} {}-bit CPOL={} CPHA={} /{} {:?}",
            self.role,
            self.direction,
            self.data_size.bits(),
            matches!(self.clock_polarity, ClockPolarity::IdleHigh) as u8,
            matches!(self.clock_phase, ClockPhase::SecondEdge) as u8,
            self.baud_rate_prescaler.divisor(),
            self.bit_order,
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiConfiguration {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "SpiConfiguration {{ cr1: {=u32:#x}, crc: {=u16:#x} }}",
            self.cr1_bits(),
            self.crc_polynomial
        );
    }
}

/// Builder for ergonomic bus configuration construction.
#[derive(Debug, Clone, Default)]
pub struct SpiConfigurationBuilder {
    config: SpiConfiguration,
}

impl SpiConfigurationBuilder {
    pub fn direction(mut self, direction: Direction) -> Self {
        self.config.direction = direction;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    pub fn data_size(mut self, data_size: DataSize) -> Self {
        self.config.data_size = data_size;
        self
    }

    /// Sets clock polarity and phase together.
    pub fn clock(mut self, polarity: ClockPolarity, phase: ClockPhase) -> Self {
        self.config.clock_polarity = polarity;
        self.config.clock_phase = phase;
        self
    }

    pub fn slave_select(mut self, slave_select: SlaveSelect) -> Self {
        self.config.slave_select = slave_select;
        self
    }

    pub fn baud_rate_prescaler(mut self, prescaler: BaudRatePrescaler) -> Self {
        self.config.baud_rate_prescaler = prescaler;
        self
    }

    pub fn bit_order(mut self, bit_order: BitOrder) -> Self {
        self.config.bit_order = bit_order;
        self
    }

    pub fn crc_polynomial(mut self, polynomial: u16) -> Self {
        self.config.crc_polynomial = polynomial;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SpiConfiguration {
        self.config
    }
}
