//! # Kernel
//!
//! Ties the task table, the interrupt dispatcher and the syscall dispatcher
//! into one instance, and brings the board up.
//!
//! The exception entry code in `arch::armv7a` is the only caller of
//! [`Kernel::on_irq`] and [`Kernel::on_svc`]; it reaches the instance through
//! the [`KERNEL`] cell that [`boot`] fills.
//!
//! ## Startup Sequence
//!
//! ```text
//! _start (arch::armv7a)
//!   └─► kmain()
//!         └─► kernel::boot()
//!               ├─► PL011 init, logger
//!               ├─► TaskTable::init()      ← first frame of every task
//!               ├─► GIC init, enable timer source
//!               ├─► SP804 start            ← TICK_HZ periodic
//!               ├─► KERNEL.install()
//!               └─► unmask IRQ             ← first tick enters idle
//! ```

use core::fmt;

use log::SetLoggerError;

use crate::context::BankedRegisters;
use crate::irq::{InterruptController, InterruptDispatcher, TickTimer};
use crate::console::Console;
use crate::syscall::SyscallDispatcher;
use crate::task::{TaskTable, TrapFrame};

/// One kernel instance: tasks plus the two trap dispatchers.
pub struct Kernel<G, T, B, C, const N: usize> {
    pub tasks: TaskTable<N>,
    pub irq: InterruptDispatcher<G, T, B>,
    pub syscalls: SyscallDispatcher<C>,
}

impl<G, T, B, C, const N: usize> Kernel<G, T, B, C, N>
where
    G: InterruptController,
    T: TickTimer,
    B: BankedRegisters,
    C: Console,
{
    pub fn new(tasks: TaskTable<N>, irq: InterruptDispatcher<G, T, B>, syscalls: SyscallDispatcher<C>) -> Self {
        Self { tasks, irq, syscalls }
    }

    /// IRQ trap: returns the frame the exit path unwinds.
    pub fn on_irq(&mut self, frame: *mut TrapFrame) -> *mut TrapFrame {
        self.irq.handle(&mut self.tasks, frame)
    }

    /// SVC trap: runs syscall `number` and resumes the caller.
    ///
    /// # Safety
    /// `frame` must be null or point to the trap frame of the calling task.
    pub unsafe fn on_svc(&mut self, number: u32, frame: *mut TrapFrame) -> *mut TrapFrame {
        self.syscalls.handle(number, frame.as_mut());
        frame
    }
}

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------

/// Reasons bring-up can stop before interrupts are unmasked.
#[derive(Debug)]
pub enum BootError {
    Logger(SetLoggerError),
    AlreadyBooted,
}

impl From<SetLoggerError> for BootError {
    fn from(err: SetLoggerError) -> Self {
        BootError::Logger(err)
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::Logger(err) => write!(f, "logger: {}", err),
            BootError::AlreadyBooted => f.write_str("kernel already booted"),
        }
    }
}

#[cfg(target_arch = "arm")]
pub use board::{boot, BoardKernel, KERNEL};

#[cfg(target_arch = "arm")]
mod board {
    use log::{debug, info};

    use super::{BootError, Kernel};
    use crate::arch::armv7a::{self, CpsBanks};
    use crate::config::*;
    use crate::console;
    use crate::drivers::{gic::Gic, pl011::Pl011, sp804::Sp804};
    use crate::irq::{InterruptDispatcher, IrqSource};
    use crate::sync::KernelCell;
    use crate::syscall::SyscallDispatcher;
    use crate::task::{TaskConfig, TaskTable};

    pub type BoardKernel = Kernel<Gic, Sp804, CpsBanks, Pl011, TASK_COUNT>;

    /// The kernel instance the exception vectors dispatch into.
    pub static KERNEL: KernelCell<BoardKernel> = KernelCell::new();

    /// Bring the board up and unmask IRQ. The first tick then switches
    /// from the boot context into the idle task.
    ///
    /// # Safety
    /// Must be called once, from the boot context in SVC mode with IRQ
    /// masked, with stacks that satisfy [`TaskTable::init`].
    pub unsafe fn boot(configs: [TaskConfig; TASK_COUNT]) -> Result<(), BootError> {
        let mut uart = Pl011::new(UART0_BASE);
        uart.init();
        console::init()?;
        info!("tickos: {} tasks, {} Hz tick", TASK_COUNT, TICK_HZ);

        let tasks = TaskTable::init(configs);
        for tcb in tasks.iter() {
            debug!("{}: quota {} ticks, frame {:p}", tcb.id, tcb.quota, tcb.irq_frame);
        }

        let mut gic = Gic::new(GICC_BASE, GICD_BASE);
        gic.init(GIC_PRIORITY_MASK);
        gic.enable(IrqSource::Timer01 as u32, TIMER_IRQ_PRIORITY);

        // IRQ is still masked; the first interrupt stays pending until
        // the kernel is installed.
        let mut timer = Sp804::new(TIMER0_BASE);
        timer.start(Sp804::reload_for(TIMER_CLOCK_HZ, TICK_HZ));

        let kernel = Kernel::new(
            tasks,
            InterruptDispatcher::new(gic, timer, CpsBanks::new()),
            SyscallDispatcher::new(uart),
        );
        KERNEL.install(kernel).map_err(|_| BootError::AlreadyBooted)?;

        info!("tickos: scheduler armed");
        armv7a::enable_interrupts();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
