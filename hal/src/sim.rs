//! Simulated SysTick register bank
//!
//! Models the peripheral closely enough to test the driver off-target:
//!
//! * setting ENABLE while VAL is zero loads VAL from LOAD;
//! * each clock decrements VAL; the clock that finds VAL at zero reloads it,
//!   latches COUNTFLAG and, with TICKINT set, pends the exception;
//! * reading CTRL clears COUNTFLAG, writing VAL clears VAL and COUNTFLAG;
//! * a LOAD of zero stops the counter at its next wrap.
//!
//! With LOAD = N the first expiry is reported after N + 1 clocks, and every
//! N + 1 clocks after that.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

use crate::clock::RELOAD_MAX;
use crate::registers::{Ctrl, SysTickRegisters};

#[derive(Debug, Clone, Copy)]
struct Bank {
    ctrl: u32,
    load: u32,
    val: u32,
    pending: bool,
}

impl Bank {
    const RESET: Self = Self {
        ctrl: 0,
        load: 0,
        val: 0,
        pending: false,
    };
}

/// In-memory SysTick usable from a `static`
pub struct SimulatedSysTick {
    bank: Mutex<Cell<Bank>>,
}

impl SimulatedSysTick {
    /// Reset state: counter stopped, all registers zero
    pub const fn new() -> Self {
        Self {
            bank: Mutex::new(Cell::new(Bank::RESET)),
        }
    }

    fn with_bank<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Bank) -> T,
    {
        critical_section::with(|cs| {
            let cell = self.bank.borrow(cs);
            let mut bank = cell.get();
            let result = f(&mut bank);
            cell.set(bank);
            result
        })
    }

    /// Advance the counter by `cycles` clocks
    ///
    /// Returns how many times the counter expired. Does nothing while
    /// ENABLE is clear.
    pub fn clock(&self, cycles: u32) -> u32 {
        self.with_bank(|bank| {
            if !Ctrl::from_bits(bank.ctrl).enable() {
                return 0;
            }

            let mut remaining = cycles;
            let mut expiries = 0;
            while remaining > 0 {
                if bank.val == 0 {
                    if bank.load == 0 {
                        break;
                    }
                    bank.val = bank.load;
                    remaining -= 1;
                    expiries += 1;
                } else {
                    let step = bank.val.min(remaining);
                    bank.val -= step;
                    remaining -= step;
                }
            }

            if expiries > 0 {
                bank.ctrl |= Ctrl::COUNTFLAG;
                if Ctrl::from_bits(bank.ctrl).tickint() {
                    bank.pending = true;
                }
            }
            expiries
        })
    }

    /// Consume the pending exception, if any
    ///
    /// Missed expiries collapse into one pending exception.
    pub fn take_pending(&self) -> bool {
        self.with_bank(|bank| core::mem::replace(&mut bank.pending, false))
    }

    /// Whether an exception is pending, without consuming it
    pub fn is_pending(&self) -> bool {
        self.with_bank(|bank| bank.pending)
    }

    /// CTRL contents without the read side effect on COUNTFLAG
    pub fn peek_ctrl(&self) -> Ctrl {
        self.with_bank(|bank| Ctrl::from_bits(bank.ctrl))
    }

    pub fn peek_load(&self) -> u32 {
        self.with_bank(|bank| bank.load)
    }

    pub fn peek_val(&self) -> u32 {
        self.with_bank(|bank| bank.val)
    }
}

impl fmt::Debug for SimulatedSysTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bank = self.with_bank(|bank| *bank);
        f.debug_struct("SimulatedSysTick")
            .field("ctrl", &format_args!("{:#x}", bank.ctrl))
            .field("load", &bank.load)
            .field("val", &bank.val)
            .field("pending", &bank.pending)
            .finish()
    }
}

impl Default for SimulatedSysTick {
    fn default() -> Self {
        Self::new()
    }
}

impl SysTickRegisters for SimulatedSysTick {
    fn read_ctrl(&self) -> u32 {
        self.with_bank(|bank| {
            let ctrl = bank.ctrl;
            bank.ctrl &= !Ctrl::COUNTFLAG;
            ctrl
        })
    }

    fn write_ctrl(&self, value: u32) {
        self.with_bank(|bank| {
            let value = value & Ctrl::WRITABLE;
            let starting = !Ctrl::from_bits(bank.ctrl).enable() && Ctrl::from_bits(value).enable();
            bank.ctrl = value | (bank.ctrl & Ctrl::COUNTFLAG);
            if starting && bank.val == 0 {
                bank.val = bank.load;
            }
        })
    }

    fn read_load(&self) -> u32 {
        self.with_bank(|bank| bank.load)
    }

    fn write_load(&self, value: u32) {
        self.with_bank(|bank| bank.load = value & RELOAD_MAX)
    }

    fn read_val(&self) -> u32 {
        self.with_bank(|bank| bank.val)
    }

    fn clear_val(&self) {
        self.with_bank(|bank| {
            bank.val = 0;
            bank.ctrl &= !Ctrl::COUNTFLAG;
        })
    }
}
