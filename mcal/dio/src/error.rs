//! Error types for DIO operations

use core::fmt;

/// DIO operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DioError {
    /// Channel id outside both ports
    InvalidChannel(u8),
    /// Port id outside the configured ports
    InvalidPort(u8),
}

impl fmt::Display for DioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(id) => write!(f, "invalid channel id: {}", id),
            Self::InvalidPort(id) => write!(f, "invalid port id: {}", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DioError {}

#[cfg(feature = "defmt")]
impl defmt::Format for DioError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidChannel(id) => defmt::write!(fmt, "InvalidChannel({})", id),
            Self::InvalidPort(id) => defmt::write!(fmt, "InvalidPort({})", id),
        }
    }
}

/// Result type for DIO operations
pub type DioResult<T> = Result<T, DioError>;
