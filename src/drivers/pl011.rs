//! ARM PL011 UART, transmit side.

use super::{mmio_read32, mmio_write32};
use crate::console::Console;

const DR: usize = 0x00;
const FR: usize = 0x18;
const IBRD: usize = 0x24;
const FBRD: usize = 0x28;
const LCR_H: usize = 0x2C;
const CR: usize = 0x30;

const FR_TXFF: u32 = 1 << 5;
/// 8 data bits, FIFOs enabled.
const LCR_H_8N1_FIFO: u32 = (0b11 << 5) | (1 << 4);
const CR_UARTEN: u32 = 1 << 0;
const CR_TXE: u32 = 1 << 8;
const CR_RXE: u32 = 1 << 9;

/// 115200 baud from the 24 MHz UART reference clock.
const IBRD_115200: u32 = 13;
const FBRD_115200: u32 = 1;

pub struct Pl011 {
    base: usize,
}

impl Pl011 {
    /// # Safety
    /// `base` must address a PL011 register block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// 115200 8N1, FIFOs on, transmitter and receiver enabled.
    pub fn init(&mut self) {
        mmio_write32(self.base + CR, 0);
        mmio_write32(self.base + IBRD, IBRD_115200);
        mmio_write32(self.base + FBRD, FBRD_115200);
        mmio_write32(self.base + LCR_H, LCR_H_8N1_FIFO);
        mmio_write32(self.base + CR, CR_UARTEN | CR_TXE | CR_RXE);
    }
}

impl Console for Pl011 {
    fn put_char(&mut self, byte: u8) {
        while mmio_read32(self.base + FR) & FR_TXFF != 0 {
            core::hint::spin_loop();
        }
        mmio_write32(self.base + DR, byte as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::FakeRegisters;

    #[test]
    fn test_init() {
        let mut regs = FakeRegisters::new(0x40);
        let mut uart = unsafe { Pl011::new(regs.base()) };
        uart.init();
        assert_eq!(regs.word(LCR_H), 0x70);
        assert_eq!(regs.word(CR), 0x301);
        assert_eq!(regs.word(IBRD), 13);
    }

    #[test]
    fn test_put_char_writes_data_register() {
        let mut regs = FakeRegisters::new(0x40);
        let mut uart = unsafe { Pl011::new(regs.base()) };
        uart.put_char(b'x');
        assert_eq!(regs.word(DR), b'x' as u32);
    }
}
