//! # TickOS Configuration
//!
//! Compile-time constants governing the scheduler, the board and logging.
//! The task set is fixed at build time; nothing here is read at runtime.

use core::num::NonZeroU32;

/// Number of tasks, idle included. Bounds the static TCB array and must
/// match the per-task stack symbols exported by `link.x`.
pub const TASK_COUNT: usize = 4;

/// Build a quota, rejecting zero at compile time.
pub const fn quota(ticks: u32) -> NonZeroU32 {
    match NonZeroU32::new(ticks) {
        Some(q) => q,
        None => panic!("task quota must be at least one tick"),
    }
}

/// Ticks the idle task runs per turn.
pub const IDLE_QUOTA: NonZeroU32 = quota(5);
/// Ticks task 1 (Fibonacci) runs per turn.
pub const TASK1_QUOTA: NonZeroU32 = quota(8);
/// Ticks task 2 (Collatz) runs per turn.
pub const TASK2_QUOTA: NonZeroU32 = quota(12);
/// Ticks task 3 (prime factorisation) runs per turn.
pub const TASK3_QUOTA: NonZeroU32 = quota(5);

/// Timer interrupt frequency in Hz. One tick is one unit of quota.
pub const TICK_HZ: u32 = 100;

/// SP804 reference clock on the RealView baseboard.
pub const TIMER_CLOCK_HZ: u32 = 1_000_000;

/// Words in a trap-return frame: saved SP, SPSR, r0-r12, return address.
pub const FRAME_WORDS: usize = 16;

// ---------------------------------------------------------------------------
// RealView PB-A8 memory map
// ---------------------------------------------------------------------------

/// GIC CPU interface.
pub const GICC_BASE: usize = 0x1E00_0000;
/// GIC distributor.
pub const GICD_BASE: usize = 0x1E00_1000;
/// SP804 dual timer 0/1.
pub const TIMER0_BASE: usize = 0x1001_1000;
/// PL011 UART 0.
pub const UART0_BASE: usize = 0x1000_9000;

/// GIC priority mask: every priority above the lowest is let through.
pub const GIC_PRIORITY_MASK: u32 = 0xF0;

/// Priority given to the tick source in the distributor.
pub const TIMER_IRQ_PRIORITY: u8 = 0x80;

/// Log level name taken from the `LOG` environment variable at build time
/// (`error`, `warn`, `info`, `debug`, `trace` or `off`).
pub const LOG_LEVEL: Option<&str> = option_env!("LOG");
