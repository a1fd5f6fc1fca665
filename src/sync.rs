//! # Synchronization Primitives
//!
//! Interrupt-safe access to kernel state for a single-core ARMv7-A.
//! The kernel instance lives in a [`KernelCell`] that boot code fills once
//! and the exception entry points borrow afterwards.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

/// Execute a closure within a critical section (interrupts disabled).
///
/// On the board the `critical-section` implementation comes from
/// `cortex-ar` and masks IRQ in the CPSR; on the host it is a global lock.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| {
///     // Access shared state safely
/// });
/// ```
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

/// A slot holding one value that is installed once and then borrowed
/// mutably from interrupt context.
pub struct KernelCell<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> KernelCell<T> {
    pub const fn new() -> Self {
        Self { inner: Mutex::new(RefCell::new(None)) }
    }

    /// Store `value`. Hands it back if the cell is already occupied.
    pub fn install(&self, value: T) -> Result<(), T> {
        critical_section(|cs| {
            let mut slot = self.inner.borrow(cs).borrow_mut();
            if slot.is_some() {
                return Err(value);
            }
            *slot = Some(value);
            Ok(())
        })
    }

    /// Run `f` on the stored value.
    ///
    /// `None` when nothing is installed yet, or when the value is already
    /// borrowed further up the stack (a nested exception).
    pub fn with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section(|cs| {
            let mut slot = self.inner.borrow(cs).try_borrow_mut().ok()?;
            slot.as_mut().map(f)
        })
    }

    pub fn is_installed(&self) -> bool {
        critical_section(|cs| self.inner.borrow(cs).borrow().is_some())
    }
}

impl<T> Default for KernelCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
