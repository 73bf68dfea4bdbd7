#![cfg_attr(not(feature = "std"), no_std)]

//! # MCAL Core
//!
//! Types shared by the MCAL driver crates: the binary return contract used at
//! the driver boundary, module version information, and the register access
//! shim every driver talks to instead of raw pointers.

use core::fmt;

pub mod clock;
pub mod register;

pub mod sim;

pub use clock::{ClockGate, PeripheralClock, RccRegister};
pub use register::{Mmio, Register, RegisterAccess};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary result returned at the driver boundary.
///
/// Drivers keep richer error kinds internally; every one of them collapses onto
/// [`StdReturnType::NotOk`] when crossing this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StdReturnType {
    /// Request accepted / condition holds
    #[default]
    Ok = 0,
    /// Request rejected / condition does not hold
    NotOk = 1,
}

impl StdReturnType {
    /// Returns `true` for [`StdReturnType::Ok`]
    pub const fn is_ok(self) -> bool {
        matches!(self, StdReturnType::Ok)
    }

    /// Returns `true` for [`StdReturnType::NotOk`]
    pub const fn is_not_ok(self) -> bool {
        !self.is_ok()
    }
}

impl<T, E> From<Result<T, E>> for StdReturnType {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => StdReturnType::Ok,
            Err(_) => StdReturnType::NotOk,
        }
    }
}

impl From<bool> for StdReturnType {
    fn from(ok: bool) -> Self {
        if ok {
            StdReturnType::Ok
        } else {
            StdReturnType::NotOk
        }
    }
}

impl fmt::Display for StdReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdReturnType::Ok => write!(f, "E_OK"),
            StdReturnType::NotOk => write!(f, "E_NOT_OK"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StdReturnType {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            StdReturnType::Ok => defmt::write!(fmt, "E_OK"),
            StdReturnType::NotOk => defmt::write!(fmt, "E_NOT_OK"),
        }
    }
}

/// Module version information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub vendor_id: u16,
    pub module_id: u16,
    pub sw_major: u8,
    pub sw_minor: u8,
    pub sw_patch: u8,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vendor {:#06x} module {:#06x} v{}.{}.{}",
            self.vendor_id, self.module_id, self.sw_major, self.sw_minor, self.sw_patch
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for VersionInfo {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "vendor {=u16:#x} module {=u16:#x} v{}.{}.{}",
            self.vendor_id,
            self.module_id,
            self.sw_major,
            self.sw_minor,
            self.sw_patch
        );
    }
}
