//! # TickOS Demo Firmware
//!
//! Four tasks sharing the CPU under the round-robin scheduler:
//!
//! | Task   | Quota | Behavior                                     |
//! |--------|-------|----------------------------------------------|
//! | idle   | 5     | Waits for interrupts                         |
//! | task 1 | 8     | Prints Fibonacci(0..10)                      |
//! | task 2 | 12    | Prints the Collatz sequences of 1, 2 and 3   |
//! | task 3 | 5     | Prints the prime factors of 28               |
//!
//! Quotas are in ticks of 10 ms. Output from the three workers interleaves
//! on the UART at every quota boundary.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod firmware {
    use core::ptr::addr_of;

    use panic_halt as _;

    use tickos::arch::armv7a;
    use tickos::config::*;
    use tickos::kernel;
    use tickos::task::{TaskConfig, TaskStacks};
    use tickos::workload::{collatz_step, fibonacci, prime_factors};
    use tickos::{uprint, uprintln};

    extern "C" {
        static _idle_irq_stack_top: u8;
        static _idle_svc_stack_top: u8;
        static _idle_sys_stack_top: u8;
        static _task1_irq_stack_top: u8;
        static _task1_svc_stack_top: u8;
        static _task1_sys_stack_top: u8;
        static _task2_irq_stack_top: u8;
        static _task2_svc_stack_top: u8;
        static _task2_sys_stack_top: u8;
        static _task3_irq_stack_top: u8;
        static _task3_svc_stack_top: u8;
        static _task3_sys_stack_top: u8;
    }

    macro_rules! stacks {
        ($irq:ident, $svc:ident, $sys:ident) => {
            TaskStacks {
                irq_top: unsafe { addr_of!($irq) } as usize,
                svc_top: unsafe { addr_of!($svc) } as usize,
                sys_top: unsafe { addr_of!($sys) } as usize,
            }
        };
    }

    // -----------------------------------------------------------------------
    // Task entry points
    // -----------------------------------------------------------------------

    extern "C" fn idle_task() -> ! {
        loop {
            armv7a::wait_for_interrupt();
        }
    }

    extern "C" fn fibonacci_task() -> ! {
        loop {
            uprintln!("Fibonacci:");
            for i in 0..10 {
                uprintln!("Fibonacci({}) = {}", i, fibonacci(i));
            }
        }
    }

    extern "C" fn collatz_task() -> ! {
        loop {
            uprintln!("Collatz:");
            for start in 1..4 {
                uprint!("Collatz({}): ", start);
                let mut n = start;
                while n != 1 {
                    uprint!("{} ", n);
                    n = collatz_step(n);
                }
                uprintln!("1");
            }
        }
    }

    extern "C" fn factor_task() -> ! {
        let mut factors = [0u32; 20];
        loop {
            let n = 28;
            uprint!("Prime factors of {}: ", n);
            let count = prime_factors(n, &mut factors);
            for f in &factors[..count] {
                uprint!("{} ", f);
            }
            uprintln!();
        }
    }

    // -----------------------------------------------------------------------
    // Main entry point
    // -----------------------------------------------------------------------

    /// Called by the reset code on the boot SVC stack. Boots the kernel and
    /// waits for the first tick to switch into idle.
    #[no_mangle]
    extern "C" fn kmain() -> ! {
        let configs: [TaskConfig; TASK_COUNT] = [
            TaskConfig {
                quota: IDLE_QUOTA,
                entry: idle_task,
                stacks: stacks!(_idle_irq_stack_top, _idle_svc_stack_top, _idle_sys_stack_top),
            },
            TaskConfig {
                quota: TASK1_QUOTA,
                entry: fibonacci_task,
                stacks: stacks!(_task1_irq_stack_top, _task1_svc_stack_top, _task1_sys_stack_top),
            },
            TaskConfig {
                quota: TASK2_QUOTA,
                entry: collatz_task,
                stacks: stacks!(_task2_irq_stack_top, _task2_svc_stack_top, _task2_sys_stack_top),
            },
            TaskConfig {
                quota: TASK3_QUOTA,
                entry: factor_task,
                stacks: stacks!(_task3_irq_stack_top, _task3_svc_stack_top, _task3_sys_stack_top),
            },
        ];

        // Safety: reset code runs us in SVC mode with IRQ masked, and the
        // stacks above are reserved by the linker script for these tasks.
        if let Err(err) = unsafe { kernel::boot(configs) } {
            log::error!("boot failed: {}", err);
        }

        loop {
            armv7a::wait_for_interrupt();
        }
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {
    eprintln!("tickos is firmware for armv7a-none-eabi; build with --target armv7a-none-eabi");
}
