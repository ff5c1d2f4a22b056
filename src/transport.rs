//! Transport capability trait.
//!
//! The driver only needs a byte stream it can reopen at a given baud rate
//! and a handful of digital lines. Adapters implement this trait to connect
//! to real hardware or to an emulated module.

use std::time::Duration;

use crate::error::Result;
use crate::types::{Level, Pin, PinMode};

/// Byte stream plus pin control for one module.
/// Only requires `Send`: a handle is owned by a single thread.
pub trait Transport: Send {
    /// (Re)open the stream at `baud`. Reopening an open stream changes its rate.
    fn open(&mut self, baud: u32) -> Result<()>;

    /// Release the stream. Pins stay usable where the adapter allows it.
    fn close(&mut self) -> Result<()>;

    /// Timeout applied to each blocking read
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Write all of `data`
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `buffer` is full or the read timeout expires.
    /// Returns the number of bytes stored; 0 means nothing arrived.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Read until `terminator`, a full `buffer`, or the read timeout.
    /// The terminator is consumed but not stored.
    fn read_until(&mut self, terminator: u8, buffer: &mut [u8]) -> Result<usize>;

    /// Bytes that can be read without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Discard anything buffered in either direction
    fn flush(&mut self) -> Result<()>;

    fn pin_mode(&mut self, pin: Pin, mode: PinMode) -> Result<()>;

    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<()>;

    fn digital_read(&mut self, pin: Pin) -> Result<Level>;

    /// Write `line` followed by CRLF
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.write(line)?;
        self.write(crate::constants::LINE_TERMINATOR)
    }
}
