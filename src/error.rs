//! Error types for HC-05/JDY-31 driver operations.

use crate::types::Pin;
use thiserror::Error;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Hc05Error>;

/// Error types for Bluetooth module communication.
///
/// Only transport failures and malformed input surface here. A module that
/// simply does not answer is reported through empty replies or `false`.
#[derive(Error, Debug)]
pub enum Hc05Error {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport was used before `open` or after `close`
    #[error("Transport is not open")]
    NotOpen,

    /// The transport has no way to drive or sample this pin
    #[error("Pin not supported by transport: {0:?}")]
    UnsupportedPin(Pin),

    /// Character outside `0-9`/`A-F` in a hex field
    #[error("Invalid hex digit: {0:?}")]
    InvalidHexDigit(char),

    /// Connection notification shorter than its fixed format
    #[error("Malformed connection notification: {length} bytes (min 30)")]
    MalformedNotification {
        /// Length of the line that was received
        length: usize,
    },
}
