//! # Console and kernel logging
//!
//! [`Console`] is the byte sink the kernel writes to: the write syscall
//! pushes user text through it, and the kernel logger formats `log` records
//! onto it. On the board it is the PL011 UART.

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::{LOG_LEVEL, UART0_BASE};
use crate::drivers::pl011::Pl011;

/// Character output primitive.
pub trait Console {
    fn put_char(&mut self, byte: u8);
}

impl<C: Console + ?Sized> Console for &mut C {
    fn put_char(&mut self, byte: u8) {
        (**self).put_char(byte)
    }
}

/// `fmt::Write` adapter over a [`Console`] that emits `\r\n` line endings.
pub struct ConsoleWriter<C>(pub C);

impl<C: Console> Write for ConsoleWriter<C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.0.put_char(b'\r');
            }
            self.0.put_char(byte);
        }
        Ok(())
    }
}

/// Format one record as `[LEVEL] target: message`.
pub fn write_record<W: Write>(out: &mut W, record: &Record<'_>) -> fmt::Result {
    writeln!(out, "[{:<5}] {}: {}", record.level(), record.target(), record.args())
}

/// Parse the build-time `LOG` setting. Unset or unknown means `info`.
pub fn level_filter(name: Option<&str>) -> LevelFilter {
    match name {
        Some("off") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Logger writing straight to UART 0.
struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Safety: UART0_BASE is the board's PL011; transmit is stateless.
        let uart = unsafe { Pl011::new(UART0_BASE) };
        let _ = write_record(&mut ConsoleWriter(uart), record);
    }

    fn flush(&self) {}
}

/// Install the kernel logger. The UART must already be initialised.
pub fn init() -> Result<(), SetLoggerError> {
    static LOGGER: KernelLogger = KernelLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(level_filter(LOG_LEVEL));
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConsole;
    use log::Level;

    #[test]
    fn test_writer_translates_newlines() {
        let mut console = MockConsole::default();
        write!(ConsoleWriter(&mut console), "a\nb {}\n", 7).unwrap();
        assert_eq!(console.output, b"a\r\nb 7\r\n");
    }

    #[test]
    fn test_record_format() {
        let mut console = MockConsole::default();
        let mut out = ConsoleWriter(&mut console);
        write_record(
            &mut out,
            &Record::builder()
                .args(format_args!("switch {} -> {}", "idle", "task1"))
                .level(Level::Debug)
                .target("tickos::irq")
                .build(),
        )
        .unwrap();
        assert_eq!(console.output, b"[DEBUG] tickos::irq: switch idle -> task1\r\n");
    }

    #[test]
    fn test_level_filter_parsing() {
        assert_eq!(level_filter(None), LevelFilter::Info);
        assert_eq!(level_filter(Some("trace")), LevelFilter::Trace);
        assert_eq!(level_filter(Some("off")), LevelFilter::Off);
        assert_eq!(level_filter(Some("verbose")), LevelFilter::Info);
    }
}
