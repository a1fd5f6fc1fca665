//! # Context Switch Engine
//!
//! Saves and restores the per-task processor state that lives outside the
//! trap frame: the IRQ stack pointer (which *is* the frame address) and the
//! banked SP/LR of System and Supervisor mode.
//!
//! Reaching another mode's banked registers needs a mode switch, so that
//! part goes through [`BankedRegisters`]. On the board it is implemented
//! with `cps` in `arch::armv7a`; in tests it is a plain struct.
//!
//! `save` and `restore` walk the same [`BankedMode::ALL`] list in opposite
//! directions, so the two can never disagree on which field holds what.

use crate::task::{BankedContext, BankedMode, TaskControlBlock, TrapFrame};

/// Access to the banked stack pointer and link register of other modes.
pub trait BankedRegisters {
    /// Switch to `mode`, read its SP and LR, switch back.
    fn read_context(&mut self, mode: BankedMode) -> BankedContext;

    /// Switch to `mode`, load its SP and LR, switch back.
    fn write_context(&mut self, mode: BankedMode, context: BankedContext);
}

/// Record the suspended state of `tcb`'s task: the frame the IRQ entry just
/// built, and the live banked registers of every other mode it uses.
pub fn save<B: BankedRegisters>(banks: &mut B, tcb: &mut TaskControlBlock, frame: *mut TrapFrame) {
    tcb.irq_frame = frame;
    for mode in BankedMode::ALL {
        *tcb.banked_mut(mode) = banks.read_context(mode);
    }
}

/// Load `tcb`'s state back into the CPU. `frame` receives the trap frame the
/// IRQ exit path must unwind to resume the task.
pub fn restore<B: BankedRegisters>(banks: &mut B, tcb: &TaskControlBlock, frame: &mut *mut TrapFrame) {
    *frame = tcb.irq_frame;
    for mode in BankedMode::ALL {
        banks.write_context(mode, *tcb.banked(mode));
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
