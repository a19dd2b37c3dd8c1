//! SysTick driver
//!
//! [`SysTickDriver`] owns the register bank and the expiry callback. All
//! methods take `&self` so a driver can sit in a `static` and be reached from
//! the exception handler:
//!
//! ```ignore
//! static SYSTICK: SysTickDriver<CortexMSysTick> =
//!     SysTickDriver::new(unsafe { CortexMSysTick::steal() }, 48_000_000);
//!
//! #[exception]
//! fn SysTick() {
//!     SYSTICK.on_interrupt();
//! }
//! ```

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use log::{debug, trace, warn};

use crate::clock::{checked_reload, ClockSource};
use crate::error::ConfigResult;
use crate::interrupt::{CallbackSlot, InterruptCallback};
use crate::registers::{counter_bits, Ctrl, SysTickRegisters};

/// Enable/disable switch, as spelled by C HAL call sites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Disable,
    Enable,
}

impl From<bool> for Mode {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enable
        } else {
            Self::Disable
        }
    }
}

impl From<Mode> for bool {
    fn from(mode: Mode) -> Self {
        mode == Mode::Enable
    }
}

/// Configuration state of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No successful `init_*` call yet
    Unconfigured,
    /// Armed from the given clock
    Configured(ClockSource),
}

impl DriverState {
    const UNCONFIGURED: u8 = 0;
    const INTERNAL: u8 = 1;
    const EXTERNAL: u8 = 2;

    const fn encode(self) -> u8 {
        match self {
            Self::Unconfigured => Self::UNCONFIGURED,
            Self::Configured(ClockSource::Internal) => Self::INTERNAL,
            Self::Configured(ClockSource::External) => Self::EXTERNAL,
        }
    }

    const fn decode(raw: u8) -> Self {
        match raw {
            Self::INTERNAL => Self::Configured(ClockSource::Internal),
            Self::EXTERNAL => Self::Configured(ClockSource::External),
            _ => Self::Unconfigured,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DriverState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unconfigured => defmt::write!(fmt, "Unconfigured"),
            Self::Configured(source) => defmt::write!(fmt, "Configured({})", source),
        }
    }
}

/// Driver for one SysTick peripheral
#[derive(Debug)]
pub struct SysTickDriver<R> {
    regs: R,
    core_clock_hz: u32,
    callback: CallbackSlot,
    state: AtomicU8,
    /// COUNTFLAG seen by a CTRL read other than `expiry_flag`
    expired: AtomicBool,
}

impl<R: SysTickRegisters> SysTickDriver<R> {
    /// Create an unconfigured driver
    ///
    /// `core_clock_hz` is the processor clock used by
    /// [`init_internal`](Self::init_internal). No register is touched.
    pub const fn new(regs: R, core_clock_hz: u32) -> Self {
        Self {
            regs,
            core_clock_hz,
            callback: CallbackSlot::new(),
            state: AtomicU8::new(DriverState::UNCONFIGURED),
            expired: AtomicBool::new(false),
        }
    }

    /// Arm the timer from the core clock
    ///
    /// `period` is in 20 µs units and is bounded by
    /// [`MaxPeriodRule::CoreClock`](crate::clock::MaxPeriodRule::CoreClock).
    /// On success the counter and the tick interrupt are both enabled.
    pub fn init_internal(&self, period: u32) -> ConfigResult<()> {
        self.configure(ClockSource::Internal, self.core_clock_hz, period)
    }

    /// Arm the timer from an external clock running at `frequency_hz`
    ///
    /// `period` is in 20 µs units and is bounded by
    /// [`MaxPeriodRule::ExternalClock`](crate::clock::MaxPeriodRule::ExternalClock).
    pub fn init_external(&self, frequency_hz: u32, period: u32) -> ConfigResult<()> {
        self.configure(ClockSource::External, frequency_hz, period)
    }

    fn configure(&self, source: ClockSource, frequency_hz: u32, period: u32) -> ConfigResult<()> {
        let reload = match checked_reload(source.max_period_rule(), frequency_hz, period) {
            Ok(reload) => reload,
            Err(err) => {
                warn!(
                    "systick: rejected {:?} clock at {} Hz, period {}: {}",
                    source, frequency_hz, period, err
                );
                return Err(err);
            }
        };

        // Counter stays stopped until LOAD and VAL hold the new values.
        critical_section::with(|_| {
            self.regs.write_ctrl(0);
            self.regs
                .write_ctrl(Ctrl::default().with_clock_source(source).bits());
            self.regs.write_load(reload);
            self.regs.clear_val();
            self.regs.write_ctrl(
                Ctrl::default()
                    .with_clock_source(source)
                    .with_enable(true)
                    .with_tickint(true)
                    .bits(),
            );
            // Writing VAL cleared COUNTFLAG; drop any expiry of the old setup.
            self.expired.store(false, Ordering::Release);
        });

        self.state
            .store(DriverState::Configured(source).encode(), Ordering::Release);
        debug!(
            "systick: {:?} clock at {} Hz, period {}, reload {}",
            source, frequency_hz, period, reload
        );
        Ok(())
    }

    /// Set or clear TICKINT, leaving ENABLE and CLKSOURCE alone
    pub fn set_interrupt_enabled(&self, enabled: bool) {
        self.modify_ctrl(|ctrl| ctrl.with_tickint(enabled));
        trace!("systick: interrupt {}", if enabled { "on" } else { "off" });
    }

    /// Set or clear ENABLE, leaving TICKINT and CLKSOURCE alone
    pub fn set_counter_enabled(&self, enabled: bool) {
        self.modify_ctrl(|ctrl| ctrl.with_enable(enabled));
        trace!("systick: counter {}", if enabled { "on" } else { "off" });
    }

    pub fn set_interrupt_mode(&self, mode: Mode) {
        self.set_interrupt_enabled(mode.into());
    }

    pub fn set_counter_mode(&self, mode: Mode) {
        self.set_counter_enabled(mode.into());
    }

    fn modify_ctrl<F>(&self, f: F)
    where
        F: FnOnce(Ctrl) -> Ctrl,
    {
        critical_section::with(|_| {
            let ctrl = self.read_ctrl();
            self.regs.write_ctrl(f(ctrl).writable_bits());
        });
    }

    /// Read CTRL, keeping a COUNTFLAG the hardware clears on read
    fn read_ctrl(&self) -> Ctrl {
        let ctrl = Ctrl::from_bits(self.regs.read_ctrl());
        if ctrl.count_flag() {
            self.expired.store(true, Ordering::Release);
        }
        ctrl
    }

    /// Whether the counter expired since the flag was last consumed
    ///
    /// Consumes the flag: a second call returns `false` until the next
    /// expiry. Expiries seen by the `set_*`/`is_*`/`clock_source` CTRL
    /// reads are kept for this call.
    pub fn expiry_flag(&self) -> bool {
        // Load and store under the lock; ARMv6-M has no atomic swap.
        critical_section::with(|_| {
            let hw = Ctrl::from_bits(self.regs.read_ctrl()).count_flag();
            let latched = self.expired.load(Ordering::Acquire);
            self.expired.store(false, Ordering::Release);
            hw || latched
        })
    }

    /// Momentary snapshot of the down-counter
    ///
    /// The counter keeps moving; the value may be stale by the time it is
    /// returned.
    pub fn current_value(&self) -> u32 {
        counter_bits(self.regs.read_val())
    }

    /// Value the counter restarts from after each expiry
    pub fn reload_value(&self) -> u32 {
        counter_bits(self.regs.read_load())
    }

    pub fn is_counter_enabled(&self) -> bool {
        self.read_ctrl().enable()
    }

    pub fn is_interrupt_enabled(&self) -> bool {
        self.read_ctrl().tickint()
    }

    /// Clock source currently selected in CTRL
    pub fn clock_source(&self) -> ClockSource {
        self.read_ctrl().clock_source()
    }

    pub fn state(&self) -> DriverState {
        DriverState::decode(self.state.load(Ordering::Acquire))
    }

    pub fn core_clock_hz(&self) -> u32 {
        self.core_clock_hz
    }

    /// Register the expiry callback, replacing any previous one
    ///
    /// `None` clears it. The new value is visible to
    /// [`on_interrupt`](Self::on_interrupt) before this returns.
    pub fn set_interrupt_callback(&self, callback: Option<InterruptCallback>) {
        self.callback.set(callback);
        trace!(
            "systick: callback {}",
            if callback.is_some() { "registered" } else { "cleared" }
        );
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_set()
    }

    /// SysTick exception entry point
    ///
    /// Call exactly once per exception from the platform's handler. Runs the
    /// registered callback once, or does nothing if none is registered.
    #[inline]
    pub fn on_interrupt(&self) {
        self.callback.dispatch();
    }

    /// Borrow the register bank
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Give the register bank back
    pub fn free(self) -> R {
        self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::sim::SimulatedSysTick;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Access {
        Ctrl(u32),
        Load(u32),
        ClearVal,
    }

    /// Records writes in order on top of a simulated bank
    #[derive(Default)]
    struct Recorder {
        sim: SimulatedSysTick,
        writes: RefCell<Vec<Access>>,
    }

    impl SysTickRegisters for Recorder {
        fn read_ctrl(&self) -> u32 {
            self.sim.read_ctrl()
        }

        fn write_ctrl(&self, value: u32) {
            self.writes.borrow_mut().push(Access::Ctrl(value));
            self.sim.write_ctrl(value);
        }

        fn read_load(&self) -> u32 {
            self.sim.read_load()
        }

        fn write_load(&self, value: u32) {
            self.writes.borrow_mut().push(Access::Load(value));
            self.sim.write_load(value);
        }

        fn read_val(&self) -> u32 {
            self.sim.read_val()
        }

        fn clear_val(&self) {
            self.writes.borrow_mut().push(Access::ClearVal);
            self.sim.clear_val();
        }
    }

    #[test]
    fn internal_init_write_order() {
        let driver = SysTickDriver::new(Recorder::default(), 50_000_000);
        driver.init_internal(10).unwrap();

        let writes = driver.registers().writes.borrow().clone();
        assert_eq!(
            writes,
            [
                Access::Ctrl(0),
                Access::Ctrl(Ctrl::CLKSOURCE),
                Access::Load(9_999),
                Access::ClearVal,
                Access::Ctrl(Ctrl::CLKSOURCE | Ctrl::ENABLE | Ctrl::TICKINT),
            ]
        );
    }

    #[test]
    fn external_init_clears_clock_source() {
        let driver = SysTickDriver::new(Recorder::default(), 50_000_000);
        driver.init_external(8_000_000, 100).unwrap();

        let writes = driver.registers().writes.borrow().clone();
        assert_eq!(
            writes,
            [
                Access::Ctrl(0),
                Access::Ctrl(0),
                Access::Load(15_999),
                Access::ClearVal,
                Access::Ctrl(Ctrl::ENABLE | Ctrl::TICKINT),
            ]
        );
    }

    #[test]
    fn rejected_init_touches_nothing() {
        let driver = SysTickDriver::new(Recorder::default(), 50_000_000);
        assert_eq!(
            driver.init_internal(336),
            Err(ConfigError::PeriodOutOfRange {
                period: 336,
                max_period: 335
            })
        );
        assert!(driver.registers().writes.borrow().is_empty());
        assert_eq!(driver.state(), DriverState::Unconfigured);
    }

    #[test]
    fn toggles_write_only_their_bit() {
        let driver = SysTickDriver::new(Recorder::default(), 50_000_000);
        driver.init_internal(10).unwrap();
        driver.registers().writes.borrow_mut().clear();

        driver.set_interrupt_enabled(false);
        driver.set_counter_mode(Mode::Disable);
        driver.set_interrupt_mode(Mode::Enable);

        let writes = driver.registers().writes.borrow().clone();
        assert_eq!(
            writes,
            [
                Access::Ctrl(Ctrl::CLKSOURCE | Ctrl::ENABLE),
                Access::Ctrl(Ctrl::CLKSOURCE),
                Access::Ctrl(Ctrl::CLKSOURCE | Ctrl::TICKINT),
            ]
        );
    }

    #[test]
    fn toggle_does_not_write_back_count_flag() {
        let driver = SysTickDriver::new(Recorder::default(), 50_000_000);
        driver.init_internal(1).unwrap();
        driver.registers().sim.clock(2_000);
        driver.registers().writes.borrow_mut().clear();

        driver.set_counter_enabled(true);
        let writes = driver.registers().writes.borrow().clone();
        assert_eq!(
            writes,
            [Access::Ctrl(Ctrl::CLKSOURCE | Ctrl::ENABLE | Ctrl::TICKINT)]
        );
    }

    #[test]
    fn toggle_keeps_expiry_for_flag_read() {
        let driver = SysTickDriver::new(Recorder::default(), 48_000_000);
        driver.init_internal(1).unwrap();
        assert_eq!(driver.registers().sim.clock(960), 1);

        driver.set_interrupt_enabled(false);
        assert!(!driver.registers().sim.peek_ctrl().count_flag());
        assert!(driver.expiry_flag());
        assert!(!driver.expiry_flag());
    }

    #[test]
    fn reconfigure_drops_latched_expiry() {
        let driver = SysTickDriver::new(Recorder::default(), 48_000_000);
        driver.init_internal(1).unwrap();
        driver.registers().sim.clock(960);
        assert!(driver.is_counter_enabled());

        driver.init_internal(2).unwrap();
        assert!(!driver.expiry_flag());
    }

    #[test]
    fn state_encoding() {
        for state in [
            DriverState::Unconfigured,
            DriverState::Configured(ClockSource::Internal),
            DriverState::Configured(ClockSource::External),
        ] {
            assert_eq!(DriverState::decode(state.encode()), state);
        }
    }

    #[test]
    fn mode_conversions() {
        assert_eq!(Mode::from(true), Mode::Enable);
        assert_eq!(Mode::from(false), Mode::Disable);
        assert!(bool::from(Mode::Enable));
        assert!(!bool::from(Mode::Disable));
    }
}
