//! Host-side test fixtures: heap-backed task stacks and recording mocks for
//! the hardware seams.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::quota;
use crate::console::Console;
use crate::context::BankedRegisters;
use crate::irq::{InterruptController, PendingIrq, TickTimer};
use crate::task::{BankedContext, BankedMode, TaskEntry, TaskConfig, TaskStacks, TaskTable};

const STACK_WORDS: usize = 64;

/// Stand-in task body. Never called on the host; only its address is used.
pub extern "C" fn parked() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Three stacks per task, kept alive for as long as the fixture is.
pub struct TestStacks {
    regions: Vec<[Vec<usize>; 3]>,
}

impl TestStacks {
    pub fn new(tasks: usize) -> Self {
        let regions = (0..tasks)
            .map(|_| [vec![0; STACK_WORDS], vec![0; STACK_WORDS], vec![0; STACK_WORDS]])
            .collect();
        Self { regions }
    }

    pub fn get(&mut self, task: usize) -> TaskStacks {
        let [irq, svc, sys] = &mut self.regions[task];
        TaskStacks {
            irq_top: irq.as_mut_ptr_range().end as usize,
            svc_top: svc.as_mut_ptr_range().end as usize,
            sys_top: sys.as_mut_ptr_range().end as usize,
        }
    }

    /// A task table over these stacks with the given per-task quotas.
    pub fn table<const N: usize>(&mut self, quotas: [u32; N]) -> TaskTable<N> {
        assert_eq!(N, self.regions.len());
        let configs: [TaskConfig; N] = core::array::from_fn(|i| TaskConfig {
            quota: quota(quotas[i]),
            entry: parked as TaskEntry,
            stacks: self.get(i),
        });
        unsafe { TaskTable::init(configs) }
    }
}

// ---------------------------------------------------------------------------
// Recording mocks
// ---------------------------------------------------------------------------

/// Hardware-visible events, in the order the kernel produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ReadPending,
    EndOfInterrupt(u32),
    TimerCleared,
    ReadBanked(BankedMode),
    WriteBanked(BankedMode),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Interrupt controller that hands out a queue of pending interrupts.
pub struct MockGic {
    pub log: EventLog,
    pub pending: Vec<PendingIrq>,
}

impl MockGic {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), pending: Vec::new() }
    }

    pub fn raise(&mut self, source: u32) {
        // Ack tokens carry the source id plus a CPU id in bits 12:10.
        self.pending.push(PendingIrq { ack: source | (1 << 10), source });
    }
}

impl InterruptController for MockGic {
    fn read_pending(&mut self) -> PendingIrq {
        self.log.borrow_mut().push(Event::ReadPending);
        if self.pending.is_empty() {
            PendingIrq { ack: 1023, source: 1023 }
        } else {
            self.pending.remove(0)
        }
    }

    fn signal_end_of_interrupt(&mut self, ack: u32) {
        self.log.borrow_mut().push(Event::EndOfInterrupt(ack));
    }
}

pub struct MockTimer {
    pub log: EventLog,
}

impl TickTimer for MockTimer {
    fn clear_pending_flag(&mut self) {
        self.log.borrow_mut().push(Event::TimerCleared);
    }
}

/// Live SYS and SVC banked registers of a pretend CPU.
pub struct MockBanks {
    pub log: EventLog,
    pub sys: BankedContext,
    pub svc: BankedContext,
}

impl MockBanks {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            sys: BankedContext::default(),
            svc: BankedContext::default(),
        }
    }

    fn slot(&mut self, mode: BankedMode) -> &mut BankedContext {
        match mode {
            BankedMode::System => &mut self.sys,
            BankedMode::Supervisor => &mut self.svc,
        }
    }
}

impl BankedRegisters for MockBanks {
    fn read_context(&mut self, mode: BankedMode) -> BankedContext {
        self.log.borrow_mut().push(Event::ReadBanked(mode));
        *self.slot(mode)
    }

    fn write_context(&mut self, mode: BankedMode, context: BankedContext) {
        self.log.borrow_mut().push(Event::WriteBanked(mode));
        *self.slot(mode) = context;
    }
}

/// Console that keeps every byte written to it.
#[derive(Default)]
pub struct MockConsole {
    pub output: Vec<u8>,
}

impl Console for MockConsole {
    fn put_char(&mut self, byte: u8) {
        self.output.push(byte);
    }
}
