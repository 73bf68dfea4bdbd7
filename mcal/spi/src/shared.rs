//! Driver slot shareable between thread and interrupt context
//!
//! The driver itself does no locking. [`SharedSpi`] serializes access by
//! running each closure inside a critical section, so a driver placed in a
//! `static` can be used from both the main loop and interrupt handlers.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::driver::SpiDriver;

/// A `static`-friendly slot holding at most one driver
pub struct SharedSpi<R, C> {
    slot: Mutex<RefCell<Option<SpiDriver<R, C>>>>,
}

impl<R, C> SharedSpi<R, C> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Place `driver` in the slot, returning the driver it replaces
    pub fn install(&self, driver: SpiDriver<R, C>) -> Option<SpiDriver<R, C>> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).replace(driver))
    }

    /// Remove the driver from the slot
    pub fn take(&self) -> Option<SpiDriver<R, C>> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow_ref(cs).is_some())
    }

    /// Run `f` on the installed driver inside a critical section.
    ///
    /// Returns `None` when no driver is installed.
    pub fn with<T>(&self, f: impl FnOnce(&mut SpiDriver<R, C>) -> T) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<R, C> Default for SharedSpi<R, C> {
    fn default() -> Self {
        Self::new()
    }
}
