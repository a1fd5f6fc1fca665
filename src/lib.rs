//! # TickOS
//!
//! A quota-based round-robin preemptive kernel for a single-core ARMv7-A
//! (Cortex-A8 on the RealView PB-A8 board).
//!
//! ## Overview
//!
//! A fixed set of tasks, idle included, share the CPU in identifier order.
//! Each task owns a quota of timer ticks; when it has used them all, the
//! next timer interrupt resumes the following task instead. Tasks reach the
//! console through a single write syscall.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │          Tasks (main.rs) · user.rs · workload.rs        │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel instance (kernel.rs)             │
//! │            boot() · on_irq() · on_svc() · KERNEL        │
//! ├──────────────┬───────────────────┬─────────────────────┤
//! │  Interrupts  │  Syscalls         │  Console / logging  │
//! │  irq.rs      │  syscall.rs       │  console.rs         │
//! │  ─ handle()  │  ─ handle()       │  ─ ConsoleWriter    │
//! │  ─ on_timer()│  ─ write()        │  ─ init()           │
//! ├──────────────┴───────┬───────────┴─────────────────────┤
//! │  Scheduler           │  Context Switch Engine           │
//! │  scheduler.rs        │  context.rs                      │
//! │  ─ tick()            │  ─ save() · restore()            │
//! ├──────────────────────┴──────────────────────────────────┤
//! │      Task Table (task.rs): TCB · TrapFrame · SPSR       │
//! ├────────────────────────────────────────────────────────┤
//! │  Arch Port (arch/armv7a.rs)  │  Drivers (drivers/)      │
//! │  vectors · trap entry · cps  │  GIC · SP804 · PL011     │
//! ├────────────────────────────────────────────────────────┤
//! │            ARMv7-A Hardware (ARM state)                 │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: All state is statically allocated
//! - **Fixed-size TCB array**: `[TaskControlBlock; TASK_COUNT]`
//! - **Per-task stacks**: IRQ, SVC and SYS regions reserved by `link.x`
//! - **Shared state**: one [`kernel::Kernel`] in a [`sync::KernelCell`],
//!   touched only from exception context
//!
//! The library builds for the host too, without the arch layer, so every
//! module above the hardware seams is unit tested with `cargo test`.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod console;
pub mod context;
pub mod drivers;
pub mod irq;
pub mod kernel;
pub mod scheduler;
pub mod sync;
pub mod syscall;
pub mod task;
pub mod user;
pub mod workload;

#[cfg(test)]
mod testing;
