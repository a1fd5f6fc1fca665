//! # Syscall Dispatcher
//!
//! Kernel side of the `svc` path. The SVC entry code builds a trap frame on
//! the task's SVC stack and passes it here with the instruction's immediate
//! as call number. Arguments are read from the frame's r0 slot and the
//! result is written back to the same slot before the task resumes.
//!
//! ABI:
//! - call number: `svc #imm24`
//! - `r0` -> argument 0, and the return value on the way back
//!
//! Unknown call numbers are ignored and leave the frame untouched.

use core::ffi::CStr;

use log::{debug, warn};
use num_enum::TryFromPrimitive;

use crate::console::Console;
use crate::task::TrapFrame;

/// Services offered through `svc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum Syscall {
    /// Write a NUL-terminated buffer to the console. Returns bytes written,
    /// or -1 for a null buffer.
    Write = 4,
}

/// Call number of the console write syscall.
pub const SYS_WRITE: u32 = Syscall::Write as u32;

/// Decodes software interrupts and runs the requested service.
pub struct SyscallDispatcher<C> {
    pub console: C,
}

impl<C: Console> SyscallDispatcher<C> {
    pub const fn new(console: C) -> Self {
        Self { console }
    }

    /// Run syscall `number` against the trapped register frame.
    ///
    /// A missing frame is skipped; it cannot come from a genuine `svc`.
    pub fn handle(&mut self, number: u32, frame: Option<&mut TrapFrame>) {
        let Some(frame) = frame else {
            warn!("svc {}: no trap frame", number);
            return;
        };

        let arg0 = frame.arg(0);
        match Syscall::try_from(number) {
            Ok(Syscall::Write) => {
                // Tasks share the kernel's address space; the pointer is
                // whatever the caller put in r0.
                let written = unsafe { self.write(arg0 as *const u8) };
                frame.set_return(written);
            }
            Err(_) => debug!("svc {}: unknown call", number),
        }
    }

    /// Copy a NUL-terminated buffer to the console, byte by byte.
    ///
    /// # Safety
    /// `buf` must be null or point to a readable NUL-terminated string.
    pub unsafe fn write(&mut self, buf: *const u8) -> isize {
        if buf.is_null() {
            return -1;
        }
        let bytes = CStr::from_ptr(buf.cast()).to_bytes();
        for &byte in bytes {
            self.console.put_char(byte);
        }
        bytes.len() as isize
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
