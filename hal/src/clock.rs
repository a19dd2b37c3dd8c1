//! Clock sources and period-to-reload arithmetic
//!
//! A period is expressed in units of one cycle of a 50 kHz base, i.e. 20 µs.
//! The reload for a period `p` at clock `f` is `(f / 50_000) * p - 1`, with
//! the integer division applied first. A frequency below 50 kHz therefore
//! has no representable period.
//!
//! The two clock paths bound the period with different formulas, see
//! [`MaxPeriodRule`].

use crate::error::{ConfigError, ConfigResult};

/// Base frequency a period unit is derived from (one unit = 20 µs)
pub const PERIOD_UNIT_HZ: u32 = 50_000;

/// Largest value the 24-bit reload and current-value registers hold
pub const RELOAD_MAX: u32 = 0x00FF_FFFF;

/// Number of distinct counter values (2^24)
pub const COUNTER_RANGE: u64 = 1 << 24;

/// Clock the counter decrements on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Processor core clock
    Internal,
    /// Implementation-defined external reference clock
    External,
}

impl ClockSource {
    /// Rule bounding the period on this clock path
    pub const fn max_period_rule(self) -> MaxPeriodRule {
        match self {
            Self::Internal => MaxPeriodRule::CoreClock,
            Self::External => MaxPeriodRule::ExternalClock,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockSource {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Internal => defmt::write!(fmt, "Internal"),
            Self::External => defmt::write!(fmt, "External"),
        }
    }
}

/// Maximum-period formula for a clock path
///
/// The rules are not algebraically equivalent. `CoreClock` truncates the
/// frequency to whole kilohertz before dividing, `ExternalClock` scales the
/// counter range first. They agree for frequencies that are multiples of
/// 1 kHz and drift apart otherwise; below 1 kHz the core rule admits no
/// period at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxPeriodRule {
    /// `2^24 / (f / 1000)`
    CoreClock,
    /// `2^24 * 1000 / f`
    ExternalClock,
}

impl MaxPeriodRule {
    /// Largest period accepted at `frequency_hz`
    pub const fn max_period(self, frequency_hz: u32) -> u64 {
        match self {
            Self::CoreClock => {
                let khz = (frequency_hz / 1000) as u64;
                if khz == 0 {
                    0
                } else {
                    COUNTER_RANGE / khz
                }
            }
            Self::ExternalClock => {
                if frequency_hz == 0 {
                    0
                } else {
                    COUNTER_RANGE * 1000 / frequency_hz as u64
                }
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MaxPeriodRule {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::CoreClock => defmt::write!(fmt, "CoreClock"),
            Self::ExternalClock => defmt::write!(fmt, "ExternalClock"),
        }
    }
}

/// Clocks per period, without range checks
pub const fn ticks_for(frequency_hz: u32, period: u32) -> u64 {
    (frequency_hz / PERIOD_UNIT_HZ) as u64 * period as u64
}

/// Reload value for `period` at `frequency_hz`
///
/// Returns `None` when the result falls outside `0..=RELOAD_MAX`.
pub const fn reload_for(frequency_hz: u32, period: u32) -> Option<u32> {
    let ticks = ticks_for(frequency_hz, period);
    if ticks == 0 || ticks > COUNTER_RANGE {
        None
    } else {
        Some((ticks - 1) as u32)
    }
}

/// Validate a request against `rule` and compute its reload value
pub fn checked_reload(rule: MaxPeriodRule, frequency_hz: u32, period: u32) -> ConfigResult<u32> {
    let max_period = rule.max_period(frequency_hz);
    if period as u64 > max_period {
        return Err(ConfigError::PeriodOutOfRange { period, max_period });
    }

    reload_for(frequency_hz, period).ok_or(ConfigError::ReloadOutOfRange {
        ticks: ticks_for(frequency_hz, period),
    })
}
