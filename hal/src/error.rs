//! Configuration error types

use core::fmt;

/// SysTick configuration errors
///
/// Every variant is a static misconfiguration: retrying the same request
/// fails the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Requested period exceeds the maximum the clock rule allows
    PeriodOutOfRange {
        /// Requested period, in period units
        period: u32,
        /// Largest accepted period for the clock frequency
        max_period: u64,
    },
    /// Clocks per period do not fit the 24-bit reload register
    ///
    /// `ticks` is the reload value plus one. Zero means the period rounds
    /// down to no clocks at all.
    ReloadOutOfRange {
        /// Clocks per period
        ticks: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeriodOutOfRange { period, max_period } => {
                write!(f, "period {} exceeds maximum {}", period, max_period)
            }
            Self::ReloadOutOfRange { ticks: 0 } => {
                write!(f, "period is shorter than one clock")
            }
            Self::ReloadOutOfRange { ticks } => {
                write!(f, "{} clocks per period do not fit the 24-bit reload", ticks)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::PeriodOutOfRange { period, max_period } => {
                defmt::write!(fmt, "PeriodOutOfRange({}, max {})", period, max_period)
            }
            Self::ReloadOutOfRange { ticks } => {
                defmt::write!(fmt, "ReloadOutOfRange({})", ticks)
            }
        }
    }
}

/// Result type for SysTick configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
