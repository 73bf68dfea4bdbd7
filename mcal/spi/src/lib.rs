//! # SPI handler/driver
//!
//! Configuration, transfer and sequence management for SPI controllers,
//! following the AUTOSAR SPI driver conventions.
//!
//! - [`SpiDriver`] owns one controller through a [`mcal_core::RegisterAccess`]
//!   capability and a [`mcal_core::ClockGate`] injected at construction.
//! - Transfers are strictly one unit out, one unit in, spinning on the status
//!   flags with no timeout.
//! - Sequences of jobs are defined in [`SpiDriverConfig`] and run either
//!   synchronously or one job per [`SpiDriver::main_function_handling`] call.
//! - [`autosar`] exposes the classic service surface with nullable arguments
//!   and raw ids.
//!
//! ## Example
//! ```
//! use mcal_spi::sim::{sim_clock, LoopbackSpi};
//! use mcal_spi::{SpiConfiguration, SpiDriver, SpiDriverConfig};
//!
//! let mut spi = SpiDriver::new(LoopbackSpi::new(), sim_clock(), SpiDriverConfig::default());
//! let config = SpiConfiguration::default();
//! spi.init(&config);
//!
//! let mut rx = [0u8; 3];
//! spi.buffered_exchange(&config, &[1u8, 2, 3], &mut rx, 3).unwrap();
//! assert_eq!(rx, [1, 2, 3]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod autosar;
mod bus;
pub mod config;
pub mod driver;
pub mod error;
pub mod peripheral;
pub mod registers;
pub mod sequence;
pub mod shared;
pub mod sim;
pub mod transfer;
pub mod unit;

pub use config::{
    BaudRatePrescaler, BitOrder, ClockPhase, ClockPolarity, DataSize, Direction, Role,
    SlaveSelect, SpiConfiguration, SpiConfigurationBuilder, DEFAULT_CRC_POLYNOMIAL,
};
pub use driver::{SpiDriver, SpiDriverConfig, SpiDriverConfigBuilder, SpiStatus};
pub use error::{SpiError, SpiResult};
pub use peripheral::SpiPeripheral;
pub use registers::SpiRegister;
pub use sequence::{
    JobConfig, SequenceConfig, SequenceId, SequenceState, JOB_BUFFER_SIZE,
    MAX_JOBS_PER_SEQUENCE, NUM_OF_SPI_SEQUENCES,
};
pub use shared::SharedSpi;
pub use transfer::Word;
pub use unit::{AsyncMode, HwUnit, NUM_OF_SPI_HW_UNITS};

use mcal_core::VersionInfo;

/// Vendor id reported by [`version_info`]
pub const VENDOR_ID: u16 = 0x1234;
/// Module id reported by [`version_info`]
pub const MODULE_ID: u16 = 0xABCD;
pub const SW_MAJOR_VERSION: u8 = 1;
pub const SW_MINOR_VERSION: u8 = 0;
pub const SW_PATCH_VERSION: u8 = 0;

/// Static version information of the SPI module
pub const fn version_info() -> VersionInfo {
    VersionInfo {
        vendor_id: VENDOR_ID,
        module_id: MODULE_ID,
        sw_major: SW_MAJOR_VERSION,
        sw_minor: SW_MINOR_VERSION,
        sw_patch: SW_PATCH_VERSION,
    }
}

/// STM32F4 SPI controllers
pub mod stm32f4 {
    use mcal_core::{Mmio, PeripheralClock, RccRegister};

    use crate::driver::{SpiDriver, SpiDriverConfig};
    use crate::unit::HwUnit;

    /// RCC register block
    pub const RCC_BASE: usize = 0x4002_3800;

    pub const SPI1_BASE: usize = 0x4001_3000;
    pub const SPI2_BASE: usize = 0x4000_3800;
    pub const SPI3_BASE: usize = 0x4000_3C00;

    /// SPI1 enable/reset bit in APB2ENR/APB2RSTR
    pub const SPI1_EN: u32 = 1 << 12;
    /// SPI2 enable/reset bit in APB1ENR/APB1RSTR
    pub const SPI2_EN: u32 = 1 << 14;
    /// SPI3 enable/reset bit in APB1ENR/APB1RSTR
    pub const SPI3_EN: u32 = 1 << 15;

    /// Driver over memory-mapped registers
    pub type Spi = SpiDriver<Mmio, PeripheralClock<Mmio>>;

    /// Create the driver for the controller named by `config.hw_unit`
    /// (unit 0 is SPI1, unit 1 SPI2, unit 2 SPI3).
    ///
    /// # Safety
    ///
    /// Must be called at most once per hardware unit. The returned driver
    /// performs read-modify-write cycles on the shared RCC enable and reset
    /// registers; the caller must not touch those registers concurrently.
    pub unsafe fn spi(config: SpiDriverConfig) -> Spi {
        let (base, enable, reset, mask) = match config.hw_unit {
            HwUnit::UNIT0 => (SPI1_BASE, RccRegister::APB2ENR, RccRegister::APB2RSTR, SPI1_EN),
            HwUnit::UNIT1 => (SPI2_BASE, RccRegister::APB1ENR, RccRegister::APB1RSTR, SPI2_EN),
            _ => (SPI3_BASE, RccRegister::APB1ENR, RccRegister::APB1RSTR, SPI3_EN),
        };
        let regs = Mmio::new(base);
        let clock = PeripheralClock::new(Mmio::new(RCC_BASE), enable, reset, mask);
        SpiDriver::new(regs, clock, config)
    }
}
