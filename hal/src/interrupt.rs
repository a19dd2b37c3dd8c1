//! Expiry callback registration and dispatch

use core::{
    mem, ptr,
    sync::atomic::{AtomicPtr, Ordering},
};

/// Callback run from the SysTick exception
pub type InterruptCallback = fn();

/// Single-slot callback registry shared with interrupt context
///
/// The slot is one pointer-sized atomic. Writers `store` with `Release`,
/// the dispatcher `load`s once with `Acquire`, so a dispatch observes
/// either the old or the new callback in full. Only plain loads and stores
/// are used, which ARMv6-M supports without compare-and-swap.
#[derive(Debug)]
pub struct CallbackSlot {
    handler: AtomicPtr<()>,
}

impl CallbackSlot {
    /// Empty slot, usable in a `static`
    pub const fn new() -> Self {
        Self {
            handler: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Replace the registered callback, or clear it with `None`
    pub fn set(&self, callback: Option<InterruptCallback>) {
        let raw = callback.map_or(ptr::null_mut(), |f| f as *mut ());
        self.handler.store(raw, Ordering::Release);
    }

    /// Currently registered callback
    pub fn get(&self) -> Option<InterruptCallback> {
        let raw = self.handler.load(Ordering::Acquire);
        if raw.is_null() {
            None
        } else {
            // SAFETY: the slot only ever holds null or a pointer produced
            // from an `InterruptCallback` in `set`.
            Some(unsafe { mem::transmute::<*mut (), InterruptCallback>(raw) })
        }
    }

    pub fn is_set(&self) -> bool {
        !self.handler.load(Ordering::Acquire).is_null()
    }

    /// Run the registered callback once
    ///
    /// Returns `false` when the slot is empty; that is not an error.
    pub fn dispatch(&self) -> bool {
        match self.get() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl Default for CallbackSlot {
    fn default() -> Self {
        Self::new()
    }
}
