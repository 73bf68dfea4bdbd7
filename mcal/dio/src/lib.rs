//! Digital I/O (DIO) service
//!
//! Channel, channel-group and port access over GPIO registers, following the
//! AUTOSAR DIO conventions. The service keeps no state of its own: each call is
//! a direct read or write of the port registers reached through the
//! [`mcal_core::RegisterAccess`] shim.
//!
//! ## Example
//! ```
//! use mcal_dio::{ChannelId, Dio, Level};
//! use mcal_dio::sim::LoopbackPort;
//!
//! let mut dio = Dio::new(LoopbackPort::new(), LoopbackPort::new());
//! let led = ChannelId::new(0).unwrap();
//! dio.write_channel(led, Level::High);
//! assert_eq!(dio.read_channel(led), Level::High);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod channel;
pub mod driver;
pub mod error;
pub mod pin;
pub mod sim;

pub use channel::{
    ChannelGroup, ChannelId, GpioRegister, Level, PortId, CHANNELS_PER_PORT, NUM_OF_DIO_CHANNELS,
    NUM_OF_DIO_PORTS,
};
pub use driver::Dio;
pub use error::{DioError, DioResult};
pub use pin::DioPin;

use mcal_core::VersionInfo;

/// Vendor id reported by [`version_info`]
pub const VENDOR_ID: u16 = 1;
/// Module id reported by [`version_info`]
pub const MODULE_ID: u16 = 1;
pub const SW_MAJOR_VERSION: u8 = 1;
pub const SW_MINOR_VERSION: u8 = 0;
pub const SW_PATCH_VERSION: u8 = 0;

/// Static version information of the DIO module
pub const fn version_info() -> VersionInfo {
    VersionInfo {
        vendor_id: VENDOR_ID,
        module_id: MODULE_ID,
        sw_major: SW_MAJOR_VERSION,
        sw_minor: SW_MINOR_VERSION,
        sw_patch: SW_PATCH_VERSION,
    }
}

/// STM32F4 GPIO port base addresses
pub mod stm32f4 {
    /// GPIOA register block
    pub const GPIOA_BASE: usize = 0x4002_0000;
    /// GPIOB register block
    pub const GPIOB_BASE: usize = 0x4002_0400;
}
