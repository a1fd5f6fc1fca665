//! # Task Control Block
//!
//! Defines the task model for TickOS: task identifiers, the saved processor
//! status word, the trap-return frame, and the per-task control block that
//! the scheduler and the context switch engine operate on.
//!
//! ## Processor contexts
//!
//! Each task touches three ARMv7-A processor modes, and owns one stack in
//! each of them:
//!
//! ```text
//!   IRQ  ── trap-return frame built on interrupt entry (16 words)
//!   SVC  ── stack used while the task is inside a syscall
//!   SYS  ── the task's own execution stack
//! ```
//!
//! The IRQ stack pointer is the address of the task's last trap frame. The
//! SVC and SYS stack pointers and return addresses are banked registers and
//! are saved verbatim in [`TaskControlBlock::banked`].

use core::fmt;
use core::mem::size_of;
use core::num::NonZeroU32;

use bit_field::BitField;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::config::FRAME_WORDS;

/// Entry point of a task. Tasks never return.
pub type TaskEntry = extern "C" fn() -> !;

// ---------------------------------------------------------------------------
// Task identifiers
// ---------------------------------------------------------------------------

/// Identifier of a task, equal to its slot in the task table.
///
/// Ordinal order is round-robin order. [`TaskId::IDLE`] is both the first
/// task and the wrap-around target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(usize);

impl TaskId {
    pub const IDLE: TaskId = TaskId(0);
    pub const TASK_1: TaskId = TaskId(1);
    pub const TASK_2: TaskId = TaskId(2);
    pub const TASK_3: TaskId = TaskId(3);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }

    /// The task that follows this one in a table of `task_count` tasks,
    /// wrapping past the last one back to idle.
    #[inline]
    pub const fn next(self, task_count: usize) -> TaskId {
        let next = self.0 + 1;
        if next >= task_count {
            TaskId::IDLE
        } else {
            TaskId(next)
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_idle() {
            f.write_str("idle")
        } else {
            write!(f, "task{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Processor status word
// ---------------------------------------------------------------------------

/// ARMv7-A processor modes (CPSR/SPSR `M[4:0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum ProcessorMode {
    User = 0x10,
    Fiq = 0x11,
    Irq = 0x12,
    Supervisor = 0x13,
    Abort = 0x17,
    Undefined = 0x1B,
    System = 0x1F,
}

/// Single-bit fields of the status word, named by their bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum StatusFlag {
    /// T: Thumb execution state.
    Thumb = 5,
    /// F: FIQ disabled.
    FiqMask = 6,
    /// I: IRQ disabled.
    IrqMask = 7,
    /// A: asynchronous abort disabled.
    AbortMask = 8,
    /// E: big-endian data accesses.
    BigEndian = 9,
    /// J: Jazelle execution state.
    Jazelle = 24,
    /// Q: cumulative saturation.
    Saturation = 27,
    /// V: overflow.
    Overflow = 28,
    /// C: carry.
    Carry = 29,
    /// Z: zero.
    Zero = 30,
    /// N: negative.
    Negative = 31,
}

const MODE_BITS: core::ops::Range<usize> = 0..5;
const IT_HIGH_BITS: core::ops::Range<usize> = 10..16;
const GE_BITS: core::ops::Range<usize> = 16..20;
const IT_LOW_BITS: core::ops::Range<usize> = 25..27;

/// A saved program status register value.
///
/// Stored as the raw word the hardware restores on exception return, with
/// named accessors for every field instead of an overlapping bit-field union.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRegister(u32);

impl StatusRegister {
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Status word every task starts with: System mode, ARM state,
    /// interrupts unmasked, Z set.
    pub fn task_initial() -> Self {
        Self::default()
            .with_mode(ProcessorMode::System)
            .with(StatusFlag::Zero, true)
    }

    /// Raw `M[4:0]` field.
    pub fn mode_bits(self) -> u32 {
        self.0.get_bits(MODE_BITS)
    }

    /// Decoded mode, or `None` for a reserved encoding.
    pub fn mode(self) -> Option<ProcessorMode> {
        ProcessorMode::try_from(self.mode_bits()).ok()
    }

    pub fn with_mode(mut self, mode: ProcessorMode) -> Self {
        self.0.set_bits(MODE_BITS, mode.into());
        self
    }

    pub fn is_set(self, flag: StatusFlag) -> bool {
        self.0.get_bit(flag as usize)
    }

    pub fn with(mut self, flag: StatusFlag, value: bool) -> Self {
        self.0.set_bit(flag as usize, value);
        self
    }

    /// GE[3:0], the SIMD greater-than-or-equal flags.
    pub fn ge(self) -> u32 {
        self.0.get_bits(GE_BITS)
    }

    pub fn with_ge(mut self, ge: u32) -> Self {
        self.0.set_bits(GE_BITS, ge & 0xF);
        self
    }

    /// IT[7:0], reassembled from its two split fields.
    pub fn it(self) -> u32 {
        (self.0.get_bits(IT_HIGH_BITS) << 2) | self.0.get_bits(IT_LOW_BITS)
    }

    pub fn with_it(mut self, it: u32) -> Self {
        self.0.set_bits(IT_HIGH_BITS, (it >> 2) & 0x3F);
        self.0.set_bits(IT_LOW_BITS, it & 0x3);
        self
    }
}

impl fmt::Debug for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusRegister")
            .field("bits", &format_args!("{:#010x}", self.0))
            .field("mode", &self.mode())
            .field("n", &self.is_set(StatusFlag::Negative))
            .field("z", &self.is_set(StatusFlag::Zero))
            .field("c", &self.is_set(StatusFlag::Carry))
            .field("v", &self.is_set(StatusFlag::Overflow))
            .field("i", &self.is_set(StatusFlag::IrqMask))
            .field("f", &self.is_set(StatusFlag::FiqMask))
            .field("t", &self.is_set(StatusFlag::Thumb))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Trap-return frame
// ---------------------------------------------------------------------------

/// Register image pushed by the IRQ and SVC entry code, lowest address first.
///
/// ```text
///   frame + 0   stack pointer once this frame is unwound
///   frame + 1   SPSR (status word to resume with)
///   frame + 2   r0       <- syscall argument and result
///   ...
///   frame + 14  r12
///   frame + 15  return address
/// ```
///
/// The entry code in `arch::armv7a` pushes exactly this layout; this type is
/// the only other place that knows it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrapFrame {
    pub unwound_sp: usize,
    pub spsr: usize,
    pub regs: [usize; 13],
    pub return_address: usize,
}

const _: () = assert!(size_of::<TrapFrame>() == FRAME_WORDS * size_of::<usize>());

impl TrapFrame {
    /// The frame a task is first resumed from: zeroed registers, the given
    /// status word, and the entry point as return address.
    pub fn initial(entry: usize, status: StatusRegister, stack_top: usize) -> Self {
        Self {
            unwound_sp: stack_top,
            spsr: status.bits() as usize,
            regs: [0; 13],
            return_address: entry,
        }
    }

    /// Write an initial frame just below `stack_top` and return its address,
    /// which becomes the task's first saved IRQ stack pointer.
    ///
    /// # Safety
    /// `stack_top` must be the word-aligned end of a writable region at least
    /// one frame long, owned by the task being set up.
    pub unsafe fn install(stack_top: usize, entry: usize, status: StatusRegister) -> *mut TrapFrame {
        debug_assert_eq!(stack_top % size_of::<usize>(), 0);
        let frame = (stack_top - size_of::<TrapFrame>()) as *mut TrapFrame;
        frame.write(Self::initial(entry, status, stack_top));
        frame
    }

    pub fn status(&self) -> StatusRegister {
        StatusRegister::from_bits(self.spsr as u32)
    }

    /// Syscall argument register `n` (r0 upwards).
    #[inline]
    pub fn arg(&self, n: usize) -> usize {
        self.regs[n]
    }

    /// Place a syscall result in r0, where the caller reads it back.
    #[inline]
    pub fn set_return(&mut self, value: isize) {
        self.regs[0] = value as usize;
    }
}

// ---------------------------------------------------------------------------
// Banked registers
// ---------------------------------------------------------------------------

/// The two banked contexts saved per task besides the IRQ frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankedMode {
    System,
    Supervisor,
}

impl BankedMode {
    /// Every banked context a task owns, in save/restore order.
    pub const ALL: [BankedMode; 2] = [BankedMode::System, BankedMode::Supervisor];

    pub const fn processor_mode(self) -> ProcessorMode {
        match self {
            BankedMode::System => ProcessorMode::System,
            BankedMode::Supervisor => ProcessorMode::Supervisor,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Banked stack pointer and link register of one processor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankedContext {
    pub sp: usize,
    pub lr: usize,
}

// ---------------------------------------------------------------------------
// Task description supplied at boot
// ---------------------------------------------------------------------------

/// Top addresses of the three stacks reserved for one task.
#[derive(Debug, Clone, Copy)]
pub struct TaskStacks {
    pub irq_top: usize,
    pub svc_top: usize,
    pub sys_top: usize,
}

/// Static description of one task, supplied once at boot.
#[derive(Clone, Copy)]
pub struct TaskConfig {
    pub quota: NonZeroU32,
    pub entry: TaskEntry,
    pub stacks: TaskStacks,
}

// ---------------------------------------------------------------------------
// Task Control Block
// ---------------------------------------------------------------------------

/// Task Control Block (TCB): scheduling parameters plus everything needed to
/// resume the task exactly where it was preempted.
pub struct TaskControlBlock {
    pub id: TaskId,

    /// Ticks the task may run per turn.
    pub quota: NonZeroU32,

    /// Ticks consumed in the current turn. Always below `quota` between ticks.
    pub elapsed: u32,

    pub entry: TaskEntry,

    /// Status word the task was created with.
    pub spsr: StatusRegister,

    /// Saved IRQ stack pointer, i.e. the address of the task's trap frame.
    pub irq_frame: *mut TrapFrame,

    /// Saved SYS and SVC stack pointers and return addresses.
    banked: [BankedContext; 2],
}

// Safety: `irq_frame` points into the task's own IRQ stack and is only
// dereferenced by the trap entry code. TCBs are touched from interrupt
// context only.
unsafe impl Send for TaskControlBlock {}

impl TaskControlBlock {
    /// Build a TCB and synthesise its first trap frame on its IRQ stack.
    ///
    /// # Safety
    /// The stacks in `config` must be valid, writable, and used by no one else.
    unsafe fn new(id: TaskId, config: &TaskConfig) -> Self {
        let spsr = StatusRegister::task_initial();
        let entry = config.entry as usize;
        let irq_frame = TrapFrame::install(config.stacks.irq_top, entry, spsr);

        let mut banked = [BankedContext::default(); 2];
        banked[BankedMode::System.slot()] = BankedContext { sp: config.stacks.sys_top, lr: entry };
        banked[BankedMode::Supervisor.slot()] = BankedContext { sp: config.stacks.svc_top, lr: 0 };

        Self {
            id,
            quota: config.quota,
            elapsed: 0,
            entry: config.entry,
            spsr,
            irq_frame,
            banked,
        }
    }

    #[inline]
    pub fn banked(&self, mode: BankedMode) -> &BankedContext {
        &self.banked[mode.slot()]
    }

    #[inline]
    pub fn banked_mut(&mut self, mode: BankedMode) -> &mut BankedContext {
        &mut self.banked[mode.slot()]
    }
}

// ---------------------------------------------------------------------------
// Task table
// ---------------------------------------------------------------------------

/// Every TCB, indexed by [`TaskId`], plus the scheduling cursor.
///
/// Only interrupt context touches the table; tasks never do.
pub struct TaskTable<const N: usize> {
    pub(crate) tasks: [TaskControlBlock; N],
    pub(crate) current: TaskId,
    pub(crate) started: bool,
}

impl<const N: usize> TaskTable<N> {
    const NON_EMPTY: () = assert!(N > 0, "the task table needs at least the idle task");

    /// Populate every TCB from `configs` (slot 0 is idle) and point the
    /// cursor at idle. Must run before the tick timer is armed.
    ///
    /// # Safety
    /// Every stack named in `configs` must be valid, writable, disjoint from
    /// all others, and reserved for its task for the kernel's lifetime.
    pub unsafe fn init(configs: [TaskConfig; N]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        let tasks = core::array::from_fn(|i| TaskControlBlock::new(TaskId(i), &configs[i]));
        Self {
            tasks,
            current: TaskId::IDLE,
            started: false,
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// The task that owns the CPU.
    #[inline]
    pub fn current(&self) -> TaskId {
        self.current
    }

    /// Whether at least one tick has been taken since boot.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[inline]
    pub fn tcb(&self, id: TaskId) -> &TaskControlBlock {
        &self.tasks[id.index()]
    }

    #[inline]
    pub fn tcb_mut(&mut self, id: TaskId) -> &mut TaskControlBlock {
        &mut self.tasks[id.index()]
    }

    #[inline]
    pub fn current_tcb(&self) -> &TaskControlBlock {
        self.tcb(self.current)
    }

    #[inline]
    pub fn current_tcb_mut(&mut self) -> &mut TaskControlBlock {
        self.tcb_mut(self.current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskControlBlock> {
        self.tasks.iter()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
