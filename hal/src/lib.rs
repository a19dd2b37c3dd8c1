//! SysTick tick-timer driver for Cortex-M microcontrollers
//!
//! This crate arms the core's 24-bit down-counting System Timer from the core
//! clock or an external clock, toggles counting and the tick interrupt
//! independently, reads the counter and its expiry flag, and dispatches the
//! SysTick exception to a single registered callback.
//!
//! Register access goes through [`SysTickRegisters`]. Enable the `cortex-m`
//! feature for the hardware backend; [`SimulatedSysTick`] runs the driver on
//! a host. Configuration and CTRL updates run inside
//! `critical_section::with`, so the application must link a
//! `critical-section` implementation (for example
//! `cortex-m/critical-section-single-core`).

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod clock;
pub mod error;
pub mod interrupt;
pub mod registers;
pub mod sim;
pub mod timer;

#[cfg(feature = "cortex-m")]
pub mod cortexm;

// Re-export commonly used types
pub use clock::{reload_for, ClockSource, MaxPeriodRule, PERIOD_UNIT_HZ, RELOAD_MAX};
pub use error::{ConfigError, ConfigResult};
pub use interrupt::{CallbackSlot, InterruptCallback};
pub use registers::{Ctrl, SysTickRegisters};
pub use sim::SimulatedSysTick;
pub use timer::{DriverState, Mode, SysTickDriver};

#[cfg(feature = "cortex-m")]
pub use cortexm::CortexMSysTick;
