//! SPI peripheral register map (STM32F4 layout)

use mcal_core::Register;

/// Registers of one SPI peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiRegister {
    /// Control register 1
    Cr1,
    /// Control register 2
    Cr2,
    /// Status register
    Sr,
    /// Data register
    Dr,
    /// CRC polynomial register
    Crcpr,
    /// Receive CRC register
    RxCrcr,
    /// Transmit CRC register
    TxCrcr,
}

impl Register for SpiRegister {
    fn offset(self) -> usize {
        match self {
            SpiRegister::Cr1 => 0x00,
            SpiRegister::Cr2 => 0x04,
            SpiRegister::Sr => 0x08,
            SpiRegister::Dr => 0x0C,
            SpiRegister::Crcpr => 0x10,
            SpiRegister::RxCrcr => 0x14,
            SpiRegister::TxCrcr => 0x18,
        }
    }
}

/// CR1 bit fields
pub mod cr1 {
    pub const CPHA: u32 = 1 << 0;
    pub const CPOL: u32 = 1 << 1;
    pub const MSTR: u32 = 1 << 2;
    pub const BR_SHIFT: u32 = 3;
    pub const BR_MASK: u32 = 0b111 << BR_SHIFT;
    /// Peripheral enable
    pub const SPE: u32 = 1 << 6;
    pub const LSBFIRST: u32 = 1 << 7;
    /// Internal slave select
    pub const SSI: u32 = 1 << 8;
    /// Software slave management
    pub const SSM: u32 = 1 << 9;
    pub const RXONLY: u32 = 1 << 10;
    /// 16-bit data frame format
    pub const DFF: u32 = 1 << 11;
    pub const CRCNEXT: u32 = 1 << 12;
    pub const CRCEN: u32 = 1 << 13;
    pub const BIDIOE: u32 = 1 << 14;
    /// 1-line bidirectional data mode
    pub const BIDIMODE: u32 = 1 << 15;
}

/// CR2 bit fields
pub mod cr2 {
    pub const RXDMAEN: u32 = 1 << 0;
    pub const TXDMAEN: u32 = 1 << 1;
    pub const SSOE: u32 = 1 << 2;
    pub const ERRIE: u32 = 1 << 5;
    pub const RXNEIE: u32 = 1 << 6;
    pub const TXEIE: u32 = 1 << 7;

    /// Bits owned by the async mode setting
    pub const ASYNC_MASK: u32 = RXDMAEN | TXDMAEN | RXNEIE | TXEIE;
}

/// SR bit fields
pub mod sr {
    /// Receive buffer not empty
    pub const RXNE: u32 = 1 << 0;
    /// Transmit buffer empty
    pub const TXE: u32 = 1 << 1;
    pub const CRCERR: u32 = 1 << 4;
    /// Mode fault
    pub const MODF: u32 = 1 << 5;
    /// Overrun
    pub const OVR: u32 = 1 << 6;
    /// Busy
    pub const BSY: u32 = 1 << 7;

    pub const FAULT_MASK: u32 = CRCERR | MODF | OVR;
}
