//! # Scheduler
//!
//! Quota-based round-robin. Every task runs for `quota` timer ticks, then
//! the CPU passes to the next task in identifier order, wrapping from the
//! last task back to idle.
//!
//! ## Scheduling Algorithm
//!
//! At each timer tick, for the running task only:
//! 1. Count the tick against the task's `elapsed`
//! 2. Mark the kernel as started (gates the context save on later ticks)
//! 3. If `elapsed` reached `quota`: reset it and advance `current`
//!
//! With quotas Idle=5, Task1=8, Task2=12, Task3=5 the schedule repeats every
//! 30 ticks: 5 on idle, 8 on task 1, 12 on task 2, 5 on task 3.

use crate::task::{TaskId, TaskTable};

impl<const N: usize> TaskTable<N> {
    /// Account one timer tick to the running task.
    ///
    /// Returns the newly selected task when the running one used up its
    /// quota, `None` when it keeps the CPU. Defined for every reachable
    /// state; there is no error path.
    pub fn tick(&mut self) -> Option<TaskId> {
        self.started = true;

        let task_count = self.len();
        let current = self.current_tcb_mut();
        current.elapsed += 1;
        if current.elapsed < current.quota.get() {
            return None;
        }

        current.elapsed = 0;
        self.current = self.current.next(task_count);
        Some(self.current)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStacks;

    const REFERENCE_QUOTAS: [u32; 4] = [5, 8, 12, 5];

    #[test]
    fn test_reference_round_robin() {
        let mut stacks = TestStacks::new(4);
        let mut table = stacks.table(REFERENCE_QUOTAS);

        let mut switches = Vec::new();
        for tick in 1..=60u32 {
            if let Some(next) = table.tick() {
                switches.push((tick, next));
            }
        }

        assert_eq!(
            switches,
            [
                (5, TaskId::TASK_1),
                (13, TaskId::TASK_2),
                (25, TaskId::TASK_3),
                (30, TaskId::IDLE),
                (35, TaskId::TASK_1),
                (43, TaskId::TASK_2),
                (55, TaskId::TASK_3),
                (60, TaskId::IDLE),
            ]
        );
    }

    #[test]
    fn test_current_after_each_tick() {
        let mut stacks = TestStacks::new(4);
        let mut table = stacks.table(REFERENCE_QUOTAS);

        let expected = |tick: u32| match tick % 30 {
            0..=4 => TaskId::IDLE,
            5..=12 => TaskId::TASK_1,
            13..=24 => TaskId::TASK_2,
            _ => TaskId::TASK_3,
        };

        for tick in 1..=90u32 {
            table.tick();
            assert_eq!(table.current(), expected(tick), "after tick {}", tick);
        }
    }

    #[test]
    fn test_elapsed_resets_on_switch_and_counts_up_between() {
        let mut stacks = TestStacks::new(4);
        let mut table = stacks.table(REFERENCE_QUOTAS);

        let mut last = table.current();
        let mut last_elapsed = table.current_tcb().elapsed;
        for _ in 0..120 {
            let outgoing = table.current();
            let switched = table.tick();
            let now = table.current();

            if let Some(next) = switched {
                assert_eq!(next, now);
                assert_eq!(table.tcb(outgoing).elapsed, 0);
                assert_eq!(table.current_tcb().elapsed, 0);
            } else {
                assert_eq!(now, last);
                assert_eq!(table.current_tcb().elapsed, last_elapsed + 1);
            }
            for tcb in table.iter() {
                assert!(tcb.elapsed < tcb.quota.get());
            }
            last = now;
            last_elapsed = table.current_tcb().elapsed;
        }
    }

    #[test]
    fn test_first_tick_marks_started() {
        let mut stacks = TestStacks::new(2);
        let mut table = stacks.table([3, 3]);
        assert!(!table.is_started());
        assert_eq!(table.tick(), None);
        assert!(table.is_started());
        table.tick();
        assert!(table.is_started());
    }

    #[test]
    fn test_single_task_wraps_to_itself() {
        let mut stacks = TestStacks::new(1);
        let mut table = stacks.table([2]);
        assert_eq!(table.tick(), None);
        assert_eq!(table.tick(), Some(TaskId::IDLE));
        assert_eq!(table.current(), TaskId::IDLE);
        assert_eq!(table.current_tcb().elapsed, 0);
    }

    #[test]
    fn test_quota_of_one_switches_every_tick() {
        let mut stacks = TestStacks::new(3);
        let mut table = stacks.table([1, 1, 1]);
        let order: Vec<_> = (0..6).filter_map(|_| table.tick()).collect();
        assert_eq!(
            order,
            [TaskId::TASK_1, TaskId::TASK_2, TaskId::IDLE, TaskId::TASK_1, TaskId::TASK_2, TaskId::IDLE]
        );
    }
}
