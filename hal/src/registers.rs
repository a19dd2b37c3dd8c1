//! SysTick register map and access abstraction
//!
//! The driver never touches memory directly. It goes through
//! [`SysTickRegisters`], which the `cortex-m` backend implements with
//! volatile accesses and [`SimulatedSysTick`](crate::sim::SimulatedSysTick)
//! implements with atomics.

use crate::clock::{ClockSource, RELOAD_MAX};

/// Raw access to the three SysTick registers the driver uses
///
/// Implementations must perform every call as a single access, in program
/// order relative to the other calls on the same instance.
pub trait SysTickRegisters {
    /// Read CTRL (SYST_CSR). Clears COUNTFLAG as a side effect.
    fn read_ctrl(&self) -> u32;

    /// Write CTRL. COUNTFLAG is read-only and ignored.
    fn write_ctrl(&self, value: u32);

    /// Read LOAD (SYST_RVR)
    fn read_load(&self) -> u32;

    /// Write LOAD. Bits above 23 are ignored.
    fn write_load(&self, value: u32);

    /// Read VAL (SYST_CVR)
    fn read_val(&self) -> u32;

    /// Write VAL. Any write clears the counter and COUNTFLAG.
    fn clear_val(&self);
}

impl<T: SysTickRegisters + ?Sized> SysTickRegisters for &T {
    fn read_ctrl(&self) -> u32 {
        (**self).read_ctrl()
    }

    fn write_ctrl(&self, value: u32) {
        (**self).write_ctrl(value)
    }

    fn read_load(&self) -> u32 {
        (**self).read_load()
    }

    fn write_load(&self, value: u32) {
        (**self).write_load(value)
    }

    fn read_val(&self) -> u32 {
        (**self).read_val()
    }

    fn clear_val(&self) {
        (**self).clear_val()
    }
}

/// Decoded CTRL value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ctrl(u32);

impl Ctrl {
    /// Counter enable
    pub const ENABLE: u32 = 1 << 0;
    /// Exception request on expiry
    pub const TICKINT: u32 = 1 << 1;
    /// 1 = core clock, 0 = external clock
    pub const CLKSOURCE: u32 = 1 << 2;
    /// Counter expired since CTRL was last read
    pub const COUNTFLAG: u32 = 1 << 16;

    /// Bits software may write
    pub const WRITABLE: u32 = Self::ENABLE | Self::TICKINT | Self::CLKSOURCE;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw value, including COUNTFLAG if it was read set
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Value to write back; read-only and reserved bits dropped
    pub const fn writable_bits(self) -> u32 {
        self.0 & Self::WRITABLE
    }

    pub const fn enable(self) -> bool {
        self.0 & Self::ENABLE != 0
    }

    pub const fn tickint(self) -> bool {
        self.0 & Self::TICKINT != 0
    }

    pub const fn count_flag(self) -> bool {
        self.0 & Self::COUNTFLAG != 0
    }

    pub const fn clock_source(self) -> ClockSource {
        if self.0 & Self::CLKSOURCE != 0 {
            ClockSource::Internal
        } else {
            ClockSource::External
        }
    }

    pub const fn with_enable(self, enable: bool) -> Self {
        self.with_bit(Self::ENABLE, enable)
    }

    pub const fn with_tickint(self, tickint: bool) -> Self {
        self.with_bit(Self::TICKINT, tickint)
    }

    pub const fn with_clock_source(self, source: ClockSource) -> Self {
        self.with_bit(Self::CLKSOURCE, matches!(source, ClockSource::Internal))
    }

    const fn with_bit(self, mask: u32, set: bool) -> Self {
        if set {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }
}

/// Mask a raw LOAD or VAL read down to the 24 implemented bits
pub const fn counter_bits(raw: u32) -> u32 {
    raw & RELOAD_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_bit_positions() {
        let ctrl = Ctrl::default()
            .with_enable(true)
            .with_tickint(true)
            .with_clock_source(ClockSource::Internal);
        assert_eq!(ctrl.bits(), 0b111);

        let ctrl = ctrl.with_clock_source(ClockSource::External);
        assert_eq!(ctrl.bits(), 0b011);
        assert_eq!(ctrl.clock_source(), ClockSource::External);
    }

    #[test]
    fn ctrl_fields_toggle_independently() {
        let ctrl = Ctrl::from_bits(Ctrl::ENABLE | Ctrl::TICKINT);
        let ctrl = ctrl.with_tickint(false);
        assert!(ctrl.enable());
        assert!(!ctrl.tickint());

        let ctrl = ctrl.with_enable(false).with_tickint(true);
        assert!(!ctrl.enable());
        assert!(ctrl.tickint());
    }

    #[test]
    fn count_flag_is_not_written_back() {
        let ctrl = Ctrl::from_bits(Ctrl::COUNTFLAG | Ctrl::ENABLE);
        assert!(ctrl.count_flag());
        assert_eq!(ctrl.writable_bits(), Ctrl::ENABLE);
    }

    #[test]
    fn counter_bits_masks_reserved() {
        assert_eq!(counter_bits(0xFFFF_FFFF), RELOAD_MAX);
        assert_eq!(counter_bits(999), 999);
    }
}
