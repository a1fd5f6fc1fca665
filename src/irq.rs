//! # Interrupt Dispatcher
//!
//! Front end for every hardware interrupt. The IRQ entry code hands over the
//! trap frame it just built; the dispatcher identifies the source, runs its
//! handler, acknowledges the controller, and returns the frame to unwind.
//! Returning a different task's frame is how a context switch takes effect.
//!
//! ## Timer tick sequence
//!
//! ```text
//!   read_pending()                       GIC
//!   ├─ save(current, frame)              skipped on the very first tick
//!   ├─ tick()                            scheduler
//!   ├─ clear_pending_flag()              SP804
//!   └─ restore(current, &mut frame)
//!   signal_end_of_interrupt(ack)         always, after the handler
//! ```
//!
//! The timer flag is cleared only after the scheduling decision and the
//! controller is acknowledged only after the handler returns, so a second
//! tick cannot interleave with a context switch.

use log::{debug, trace};
use num_enum::TryFromPrimitive;

use crate::context::{self, BankedRegisters};
use crate::task::{TaskTable, TrapFrame};

/// An interrupt taken from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingIrq {
    /// Token handed back on end-of-interrupt.
    pub ack: u32,
    /// Interrupt id of the source.
    pub source: u32,
}

/// The interrupt controller as seen by the dispatcher.
pub trait InterruptController {
    /// Claim the highest-priority pending interrupt.
    fn read_pending(&mut self) -> PendingIrq;

    /// Signal that servicing of the interrupt claimed with `ack` is complete.
    fn signal_end_of_interrupt(&mut self, ack: u32);
}

/// The periodic tick source.
pub trait TickTimer {
    /// Drop the device's interrupt request for the current period.
    fn clear_pending_flag(&mut self);
}

/// GIC interrupt ids wired on the RealView PB-A8 baseboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum IrqSource {
    /// SP804 timers 0 and 1; timer 0 drives the scheduler.
    Timer01 = 36,
    Timer23 = 37,
    Uart0 = 44,
    Uart1 = 45,
    Uart2 = 46,
    Uart3 = 47,
}

/// Routes hardware interrupts and owns the devices the timer path drives.
pub struct InterruptDispatcher<G, T, B> {
    pub controller: G,
    pub timer: T,
    pub banks: B,
}

impl<G, T, B> InterruptDispatcher<G, T, B>
where
    G: InterruptController,
    T: TickTimer,
    B: BankedRegisters,
{
    pub const fn new(controller: G, timer: T, banks: B) -> Self {
        Self { controller, timer, banks }
    }

    /// Service one interrupt and return the frame to resume from.
    pub fn handle<const N: usize>(&mut self, tasks: &mut TaskTable<N>, frame: *mut TrapFrame) -> *mut TrapFrame {
        let pending = self.controller.read_pending();
        let mut resume = frame;

        match IrqSource::try_from(pending.source) {
            Ok(IrqSource::Timer01) => resume = self.on_timer(tasks, frame),
            // Recognised, no handler yet.
            Ok(source) => trace!("irq {:?}: no handler", source),
            Err(_) => debug!("irq {}: unknown source", pending.source),
        }

        self.controller.signal_end_of_interrupt(pending.ack);
        resume
    }

    /// Timer tick: save the running task, let the scheduler account the
    /// tick, then load whichever task is current afterwards.
    pub fn on_timer<const N: usize>(&mut self, tasks: &mut TaskTable<N>, frame: *mut TrapFrame) -> *mut TrapFrame {
        // Before the first tick the CPU is still on the boot context; the
        // current TCB holds its synthesised frame, which must survive.
        if tasks.is_started() {
            context::save(&mut self.banks, tasks.current_tcb_mut(), frame);
        }

        let outgoing = tasks.current();
        if let Some(next) = tasks.tick() {
            debug!("switch {} -> {}", outgoing, next);
        }

        self.timer.clear_pending_flag();

        let mut resume = frame;
        context::restore(&mut self.banks, tasks.current_tcb(), &mut resume);
        resume
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{BankedContext, BankedMode, TaskId};
    use crate::testing::{event_log, Event, EventLog, MockBanks, MockGic, MockTimer, TestStacks};

    type Dispatcher = InterruptDispatcher<MockGic, MockTimer, MockBanks>;

    fn dispatcher(log: &EventLog) -> Dispatcher {
        InterruptDispatcher::new(MockGic::new(log), MockTimer { log: log.clone() }, MockBanks::new(log))
    }

    fn boot_frame() -> *mut TrapFrame {
        0x7fff_0000usize as *mut TrapFrame
    }

    #[test]
    fn test_first_tick_skips_save() {
        let log = event_log();
        let mut irq = dispatcher(&log);
        let mut stacks = TestStacks::new(2);
        let mut table = stacks.table([3, 3]);
        let idle_frame = table.tcb(TaskId::IDLE).irq_frame;

        let resume = irq.on_timer(&mut table, boot_frame());

        assert_eq!(resume, idle_frame);
        assert_eq!(table.tcb(TaskId::IDLE).irq_frame, idle_frame);
        assert_eq!(
            *log.borrow(),
            [
                Event::TimerCleared,
                Event::WriteBanked(BankedMode::System),
                Event::WriteBanked(BankedMode::Supervisor),
            ]
        );
    }

    #[test]
    fn test_later_ticks_save_once_before_scheduling() {
        let log = event_log();
        let mut irq = dispatcher(&log);
        let mut stacks = TestStacks::new(2);
        let mut table = stacks.table([3, 3]);

        irq.on_timer(&mut table, boot_frame());
        log.borrow_mut().clear();

        let live = 0x7000_1000usize as *mut TrapFrame;
        irq.on_timer(&mut table, live);

        assert_eq!(
            *log.borrow(),
            [
                Event::ReadBanked(BankedMode::System),
                Event::ReadBanked(BankedMode::Supervisor),
                Event::TimerCleared,
                Event::WriteBanked(BankedMode::System),
                Event::WriteBanked(BankedMode::Supervisor),
            ]
        );
        assert_eq!(table.tcb(TaskId::IDLE).irq_frame, live);
        assert_eq!(table.current_tcb().elapsed, 2);
    }

    #[test]
    fn test_quota_expiry_resumes_next_task() {
        let log = event_log();
        let mut irq = dispatcher(&log);
        let mut stacks = TestStacks::new(2);
        let mut table = stacks.table([2, 2]);
        let task1_frame = table.tcb(TaskId::TASK_1).irq_frame;

        irq.on_timer(&mut table, boot_frame());
        irq.banks.sys = BankedContext { sp: 0xAAA0, lr: 0xAAA4 };
        let idle_live = 0x7000_2000usize as *mut TrapFrame;
        let resume = irq.on_timer(&mut table, idle_live);

        assert_eq!(table.current(), TaskId::TASK_1);
        assert_eq!(resume, task1_frame);
        assert_eq!(table.tcb(TaskId::IDLE).irq_frame, idle_live);
        assert_eq!(*table.tcb(TaskId::IDLE).banked(BankedMode::System), BankedContext { sp: 0xAAA0, lr: 0xAAA4 });
        assert_eq!(irq.banks.sys, *table.tcb(TaskId::TASK_1).banked(BankedMode::System));
    }

    #[test]
    fn test_timer_source_routes_to_tick_handler() {
        let log = event_log();
        let mut irq = dispatcher(&log);
        let mut stacks = TestStacks::new(2);
        let mut table = stacks.table([1, 1]);
        irq.controller.raise(IrqSource::Timer01 as u32);

        let resume = irq.handle(&mut table, boot_frame());

        assert_eq!(table.current(), TaskId::TASK_1);
        assert_eq!(resume, table.tcb(TaskId::TASK_1).irq_frame);
        let events = log.borrow();
        assert_eq!(events.first(), Some(&Event::ReadPending));
        assert_eq!(events.last(), Some(&Event::EndOfInterrupt(36 | (1 << 10))));
        let cleared = events.iter().position(|e| *e == Event::TimerCleared).unwrap();
        assert!(cleared < events.len() - 1);
    }

    #[test]
    fn test_end_of_interrupt_once_per_branch() {
        for source in [IrqSource::Timer01 as u32, IrqSource::Uart0 as u32, IrqSource::Timer23 as u32, 99, 1023] {
            let log = event_log();
            let mut irq = dispatcher(&log);
            let mut stacks = TestStacks::new(2);
            let mut table = stacks.table([4, 4]);
            irq.controller.pending.push(PendingIrq { ack: source | (2 << 10), source });

            irq.handle(&mut table, boot_frame());

            let events = log.borrow();
            let eois: Vec<_> = events.iter().filter(|e| matches!(e, Event::EndOfInterrupt(_))).collect();
            assert_eq!(eois, [&Event::EndOfInterrupt(source | (2 << 10))], "source {}", source);
            assert_eq!(events.last(), Some(&Event::EndOfInterrupt(source | (2 << 10))));
        }
    }

    #[test]
    fn test_other_sources_leave_frame_and_table_alone() {
        let log = event_log();
        let mut irq = dispatcher(&log);
        let mut stacks = TestStacks::new(2);
        let mut table = stacks.table([4, 4]);
        let frame = 0x7000_3000usize as *mut TrapFrame;

        for source in [IrqSource::Uart1 as u32, 500] {
            irq.controller.raise(source);
            assert_eq!(irq.handle(&mut table, frame), frame);
        }

        assert!(!table.is_started());
        assert_eq!(table.current_tcb().elapsed, 0);
        assert_eq!(
            *log.borrow(),
            [
                Event::ReadPending,
                Event::EndOfInterrupt(45 | (1 << 10)),
                Event::ReadPending,
                Event::EndOfInterrupt(500 | (1 << 10)),
            ]
        );
    }
}
