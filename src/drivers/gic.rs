//! ARM Generic Interrupt Controller (PL390 as wired on the RealView PB-A8).

use super::{mmio_read32, mmio_write32, mmio_write8};
use crate::irq::{InterruptController, PendingIrq};

// CPU interface
const ICCICR: usize = 0x000;
const ICCPMR: usize = 0x004;
const ICCIAR: usize = 0x00C;
const ICCEOIR: usize = 0x010;

// Distributor
const ICDDCR: usize = 0x000;
const ICDISER: usize = 0x100;
const ICDIPR: usize = 0x400;
const ICDIPTR: usize = 0x800;

/// Interrupt id field of IAR; the remaining bits identify the requesting CPU.
const IAR_ID_MASK: u32 = 0x3FF;

pub struct Gic {
    cpu: usize,
    dist: usize,
}

impl Gic {
    /// # Safety
    /// The bases must address a GIC CPU interface and distributor that no
    /// other code drives.
    pub const unsafe fn new(cpu: usize, dist: usize) -> Self {
        Self { cpu, dist }
    }

    /// Enable distributor and CPU interface, letting through priorities
    /// numerically below `priority_mask`.
    pub fn init(&mut self, priority_mask: u32) {
        mmio_write32(self.dist + ICDDCR, 0);
        mmio_write32(self.cpu + ICCPMR, priority_mask);
        mmio_write32(self.cpu + ICCICR, 1);
        mmio_write32(self.dist + ICDDCR, 1);
    }

    /// Route interrupt `id` to CPU 0 with `priority` and enable it.
    pub fn enable(&mut self, id: u32, priority: u8) {
        let id = id as usize;
        mmio_write8(self.dist + ICDIPR + id, priority);
        mmio_write8(self.dist + ICDIPTR + id, 0x01);
        mmio_write32(self.dist + ICDISER + (id / 32) * 4, 1 << (id % 32));
    }
}

impl InterruptController for Gic {
    fn read_pending(&mut self) -> PendingIrq {
        let ack = mmio_read32(self.cpu + ICCIAR);
        PendingIrq { ack, source: ack & IAR_ID_MASK }
    }

    fn signal_end_of_interrupt(&mut self, ack: u32) {
        mmio_write32(self.cpu + ICCEOIR, ack);
    }
}
