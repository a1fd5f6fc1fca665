//! # User-side library
//!
//! What tasks link against to reach the kernel: the raw `svc` wrapper and a
//! formatter that turns `uprint!` output into write syscalls.

use core::ffi::CStr;
use core::fmt;

#[cfg(target_arch = "arm")]
use crate::syscall::SYS_WRITE;

/// Bytes formatted per write syscall, not counting the terminating NUL.
pub const CHUNK: usize = 63;

/// Write a NUL-terminated string to the console. Returns the byte count,
/// or -1 if the kernel rejected the buffer.
#[cfg(target_arch = "arm")]
pub fn sys_write(text: &CStr) -> isize {
    const _: () = assert!(SYS_WRITE == 4);
    let mut r0 = text.as_ptr() as usize;
    unsafe {
        core::arch::asm!("svc #4", inout("r0") r0, options(nostack));
    }
    r0 as isize
}

/// `fmt::Write` sink that batches output into NUL-terminated chunks and
/// hands each one to `sink`.
///
/// Interior NUL bytes cannot cross the syscall boundary and are dropped.
pub struct SyscallWriter<F: FnMut(&CStr)> {
    buf: [u8; CHUNK + 1],
    len: usize,
    sink: F,
}

impl<F: FnMut(&CStr)> SyscallWriter<F> {
    pub fn new(sink: F) -> Self {
        Self { buf: [0; CHUNK + 1], len: 0, sink }
    }

    /// Emit whatever is buffered.
    pub fn flush(&mut self) {
        if self.len == 0 {
            return;
        }
        self.buf[self.len] = 0;
        if let Ok(text) = CStr::from_bytes_with_nul(&self.buf[..=self.len]) {
            (self.sink)(text);
        }
        self.len = 0;
    }
}

impl<F: FnMut(&CStr)> fmt::Write for SyscallWriter<F> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes().filter(|&b| b != 0) {
            if self.len == CHUNK {
                self.flush();
            }
            self.buf[self.len] = byte;
            self.len += 1;
        }
        Ok(())
    }
}

#[cfg(target_arch = "arm")]
#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    use core::fmt::Write;

    let mut out = SyscallWriter::new(|text| {
        sys_write(text);
    });
    let _ = out.write_fmt(args);
    out.flush();
}

/// Print from a task through the write syscall.
#[macro_export]
macro_rules! uprint {
    ($($arg:tt)*) => {
        $crate::user::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! uprintln {
    () => {
        $crate::uprint!("\n")
    };
    ($($arg:tt)*) => {
        $crate::uprint!("{}\n", format_args!($($arg)*))
    };
}
