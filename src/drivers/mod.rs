//! # Board drivers
//!
//! Minimal drivers for the RealView PB-A8 peripherals the kernel uses. Each
//! driver holds only its MMIO base address, so tests can aim one at a plain
//! memory buffer.

pub mod gic;
pub mod pl011;
pub mod sp804;

use core::ptr::{read_volatile, write_volatile};

#[inline(always)]
fn mmio_read32(addr: usize) -> u32 {
    unsafe { read_volatile(addr as *const u32) }
}

#[inline(always)]
fn mmio_write32(addr: usize, value: u32) {
    unsafe { write_volatile(addr as *mut u32, value) }
}

#[inline(always)]
fn mmio_write8(addr: usize, value: u8) {
    unsafe { write_volatile(addr as *mut u8, value) }
}

/// A zeroed, word-aligned stand-in for a register block.
#[cfg(test)]
pub(crate) struct FakeRegisters(Vec<u32>);

#[cfg(test)]
impl FakeRegisters {
    pub fn new(bytes: usize) -> Self {
        Self(vec![0; bytes / 4])
    }

    pub fn base(&mut self) -> usize {
        self.0.as_mut_ptr() as usize
    }

    pub fn word(&self, offset: usize) -> u32 {
        self.0[offset / 4]
    }

    pub fn byte(&self, offset: usize) -> u8 {
        self.0[offset / 4].to_le_bytes()[offset % 4]
    }

    pub fn set_word(&mut self, offset: usize, value: u32) {
        self.0[offset / 4] = value;
    }
}
