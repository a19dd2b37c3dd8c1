//! Register backend for the Cortex-M System Timer

use cortex_m::peripheral::{syst, SYST};

use crate::registers::SysTickRegisters;

/// Volatile access to the core's SysTick at `0xE000_E010`
///
/// Zero-sized, so a driver holding it can be built in a `static`.
#[derive(Debug)]
pub struct CortexMSysTick(());

impl CortexMSysTick {
    /// Take over the SysTick, consuming its peripheral token
    pub fn new(_syst: SYST) -> Self {
        Self(())
    }

    /// Access the SysTick without its peripheral token
    ///
    /// # Safety
    ///
    /// Nothing else may drive the SysTick registers while the returned
    /// value (or a driver holding it) is in use.
    pub const unsafe fn steal() -> Self {
        Self(())
    }

    #[inline(always)]
    fn block(&self) -> &syst::RegisterBlock {
        // SAFETY: SYST::PTR is the architecturally fixed SysTick address,
        // valid for the whole program on every Cortex-M core.
        unsafe { &*SYST::PTR }
    }
}

impl SysTickRegisters for CortexMSysTick {
    #[inline]
    fn read_ctrl(&self) -> u32 {
        self.block().csr.read()
    }

    #[inline]
    fn write_ctrl(&self, value: u32) {
        // SAFETY: CSR accepts any value; reserved bits are ignored.
        unsafe { self.block().csr.write(value) }
    }

    #[inline]
    fn read_load(&self) -> u32 {
        self.block().rvr.read()
    }

    #[inline]
    fn write_load(&self, value: u32) {
        // SAFETY: RVR ignores bits above 23.
        unsafe { self.block().rvr.write(value) }
    }

    #[inline]
    fn read_val(&self) -> u32 {
        self.block().cvr.read()
    }

    #[inline]
    fn clear_val(&self) {
        // SAFETY: any write clears CVR and COUNTFLAG.
        unsafe { self.block().cvr.write(0) }
    }
}
