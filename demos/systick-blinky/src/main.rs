//! SysTick demo firmware
//!
//! Arms a 1 ms tick from the core clock, counts ticks from the exception
//! callback and sleeps between interrupts. Every 500 ticks the tick
//! interrupt is switched off for one polled period to show counting without
//! interrupts.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::asm;
use cortex_m_rt::{entry, exception};
use panic_halt as _;
use systick_hal::{CortexMSysTick, Mode, SysTickDriver};

/// Core clock after reset on the target part
const CORE_CLOCK_HZ: u32 = 16_000_000;

/// 50 units of 20 µs
const ONE_MS: u32 = 50;

static SYSTICK: SysTickDriver<CortexMSysTick> =
    SysTickDriver::new(unsafe { CortexMSysTick::steal() }, CORE_CLOCK_HZ);

static TICKS: AtomicU32 = AtomicU32::new(0);

fn on_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

#[exception]
fn SysTick() {
    SYSTICK.on_interrupt();
}

/// Every 500th tick is counted by polling; tick 0 is before the first expiry.
const fn polled_period_due(ticks: u32) -> bool {
    ticks != 0 && ticks % 500 == 0
}

const _: () = assert!(!polled_period_due(0));
const _: () = assert!(!polled_period_due(499));
const _: () = assert!(polled_period_due(500));
const _: () = assert!(polled_period_due(1_000));

#[entry]
fn main() -> ! {
    SYSTICK.set_interrupt_callback(Some(on_tick));

    if SYSTICK.init_internal(ONE_MS).is_err() {
        // Static configuration is wrong; nothing sensible to run.
        loop {
            asm::bkpt();
        }
    }

    loop {
        asm::wfi();

        if polled_period_due(TICKS.load(Ordering::Relaxed)) {
            SYSTICK.set_interrupt_mode(Mode::Disable);
            // Drop the expiry that woke us, then wait out one full period.
            let _ = SYSTICK.expiry_flag();
            while !SYSTICK.expiry_flag() {}
            TICKS.fetch_add(1, Ordering::Relaxed);
            SYSTICK.set_interrupt_mode(Mode::Enable);
        }
    }
}
