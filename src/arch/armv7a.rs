//! # ARMv7-A Port Layer
//!
//! Hardware-specific code for the Cortex-A8 in ARM state. `vectors.S`
//! provides the vector table, reset code and the IRQ/SVC trap entry paths;
//! this module provides the Rust functions those paths call and the
//! banked-register accessor used by the context switch engine.
//!
//! ## Context Switch Mechanism
//!
//! ```text
//!   _irq_entry          push frame on IRQ stack, r0 = frame
//!     kernel_irq_entry  -> Kernel::on_irq -> frame to resume
//!   sp = returned frame, pop, `ldm {pc}^` restores CPSR from SPSR
//! ```
//!
//! Tasks keep one IRQ stack each, so pointing `sp` at another task's saved
//! frame before unwinding is the whole switch. Their SYS and SVC banked
//! SP/LR are swapped by [`CpsBanks`] while still in IRQ mode.

use core::arch::{asm, global_asm};

use crate::context::BankedRegisters;
use crate::kernel::KERNEL;
use crate::task::{BankedContext, BankedMode, TrapFrame};

global_asm!(include_str!("vectors.S"));

// ---------------------------------------------------------------------------
// Trap entry
// ---------------------------------------------------------------------------

/// Called by `_irq_entry` with the frame it pushed. Returns the frame to
/// unwind.
#[no_mangle]
extern "C" fn kernel_irq_entry(frame: *mut TrapFrame) -> *mut TrapFrame {
    KERNEL.with(|kernel| kernel.on_irq(frame)).unwrap_or(frame)
}

/// Called by `_svc_entry` with the `svc` immediate and the caller's frame.
#[no_mangle]
extern "C" fn kernel_svc_entry(number: u32, frame: *mut TrapFrame) -> *mut TrapFrame {
    // Safety: `frame` is the frame `_svc_entry` just pushed.
    KERNEL
        .with(|kernel| unsafe { kernel.on_svc(number, frame) })
        .unwrap_or(frame)
}

// ---------------------------------------------------------------------------
// Banked registers
// ---------------------------------------------------------------------------

/// Reads and writes SYS/SVC banked SP and LR by briefly switching mode with
/// `cps`. Only valid while executing in IRQ mode.
pub struct CpsBanks {
    _private: (),
}

impl CpsBanks {
    /// # Safety
    /// The returned value may only be used from IRQ mode with IRQ masked.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

// r2/r3 are pinned: a register-class operand could land in lr, which is
// itself banked and would read the wrong mode's copy.
macro_rules! banked_read {
    ($mode:literal) => {{
        let (sp, lr): (usize, usize);
        unsafe {
            asm!(
                concat!("cps #", $mode),
                "mov r2, sp",
                "mov r3, lr",
                "cps #0x12",
                out("r2") sp,
                out("r3") lr,
                options(nostack, preserves_flags),
            );
        }
        BankedContext { sp, lr }
    }};
}

macro_rules! banked_write {
    ($mode:literal, $context:expr) => {{
        let context: BankedContext = $context;
        unsafe {
            asm!(
                concat!("cps #", $mode),
                "mov sp, r2",
                "mov lr, r3",
                "cps #0x12",
                in("r2") context.sp,
                in("r3") context.lr,
                options(nostack, preserves_flags),
            );
        }
    }};
}

impl BankedRegisters for CpsBanks {
    fn read_context(&mut self, mode: BankedMode) -> BankedContext {
        match mode {
            BankedMode::System => banked_read!("0x1F"),
            BankedMode::Supervisor => banked_read!("0x13"),
        }
    }

    fn write_context(&mut self, mode: BankedMode, context: BankedContext) {
        match mode {
            BankedMode::System => banked_write!("0x1F", context),
            BankedMode::Supervisor => banked_write!("0x13", context),
        }
    }
}

// ---------------------------------------------------------------------------
// CPU helpers
// ---------------------------------------------------------------------------

/// Unmask IRQ in the CPSR.
///
/// # Safety
/// Every interrupt that can fire must have somewhere to go.
#[inline]
pub unsafe fn enable_interrupts() {
    cortex_ar::interrupt::enable();
}

#[inline]
pub fn wait_for_interrupt() {
    cortex_ar::asm::wfi();
}
