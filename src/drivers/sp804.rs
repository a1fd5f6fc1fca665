//! ARM SP804 dual timer, first timer of the pair only.

use super::{mmio_read32, mmio_write32};
use crate::irq::TickTimer;

const LOAD: usize = 0x00;
const CONTROL: usize = 0x08;
const INTCLR: usize = 0x0C;
const MIS: usize = 0x14;

const CTRL_ENABLE: u32 = 1 << 7;
const CTRL_PERIODIC: u32 = 1 << 6;
const CTRL_INT_ENABLE: u32 = 1 << 5;
const CTRL_32BIT: u32 = 1 << 1;

pub struct Sp804 {
    base: usize,
}

impl Sp804 {
    /// # Safety
    /// `base` must address an SP804 block that no other code drives.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Reload value for a `tick_hz` interrupt rate from a `clock_hz` input.
    pub const fn reload_for(clock_hz: u32, tick_hz: u32) -> u32 {
        clock_hz / tick_hz
    }

    /// Start periodic 32-bit countdown from `load`, interrupting on wrap.
    pub fn start(&mut self, load: u32) {
        mmio_write32(self.base + CONTROL, 0);
        mmio_write32(self.base + LOAD, load);
        mmio_write32(
            self.base + CONTROL,
            CTRL_ENABLE | CTRL_PERIODIC | CTRL_INT_ENABLE | CTRL_32BIT,
        );
    }

    /// Whether the timer is currently asserting its interrupt.
    pub fn is_pending(&self) -> bool {
        mmio_read32(self.base + MIS) & 1 != 0
    }
}

impl TickTimer for Sp804 {
    fn clear_pending_flag(&mut self) {
        mmio_write32(self.base + INTCLR, 1);
    }
}
