//! Protocol constants for HC-05/JDY-31 communication.
//!
//! This module defines the AT command literals, the unsolicited result codes,
//! timing parameters and the fixed layout of the connection notification.

/// Line terminator appended to every command
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Reply the module sends when a setting was accepted
pub const OK_RESPONSE: &str = "+OK";

/// Version query, also used as the probe during baud detection
pub const CMD_VERSION: &str = "AT+VERSION";

/// Baud query / index-based baud selection prefix
pub const CMD_BAUD: &str = "AT+BAUD";

/// Literal baud selection prefix (`AT+UART=<rate>,<stop>,<parity>`)
pub const CMD_UART: &str = "AT+UART=";

/// Name query / set prefix
pub const CMD_NAME: &str = "AT+NAME";

/// Pairing pin query / set prefix
pub const CMD_PIN: &str = "AT+PIN";

/// Soft reset
pub const CMD_RESET: &str = "AT+RESET";

/// Factory reset
pub const CMD_DEFAULT: &str = "AT+DEFAULT";

/// Drop the current peer
pub const CMD_DISCONNECT: &str = "AT+DISC";

/// Peer is connecting, MAC follows
pub const URC_CONNECTING: &[u8] = b"+CONNECTING";

/// Peer connected
pub const URC_CONNECTED: &[u8] = b"CONNECTED";

/// Peer disconnected
pub const URC_DISCONNECTED: &[u8] = b"+DISC:SUCCESS";

/// Minimum length of `+CONNECTING<<xx:xx:xx:xx:xx:xx`
pub const NOTIFICATION_MIN_LEN: usize = 30;

/// Offset of the first MAC hex digit in the connection notification
pub const MAC_OFFSET: usize = 13;

/// Characters per MAC byte (two digits and a colon)
pub const MAC_STRIDE: usize = 3;

/// Size of the command/response scratch buffer
pub const BUFFER_SIZE: usize = 128;

/// Baud candidates for the `AT+UART` dialect, ascending
pub const UART_BAUD_RATES: [u32; 7] = [4800, 9600, 19200, 38400, 57600, 115200, 128000];

/// Baud candidates for the `AT+BAUD<n>` dialect, ascending; `n` = index + base
pub const INDEXED_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 128000];

/// Offset added to a rate's index in [`INDEXED_BAUD_RATES`] to form `AT+BAUD<n>`
pub const BAUD_INDEX_BASE: usize = 4;

/// Baud rate the module ships with
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout for commands in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Read timeout for `AT+NAME<name>` in milliseconds
pub const SET_NAME_TIMEOUT_MS: u64 = 1000;

/// Settle time after every command pin transition.
/// Over 100ms is needed at 9600 baud for the module to switch modes.
pub const CMD_PIN_SETTLE_MS: u64 = 150;

/// Per-candidate read timeout during baud detection
pub const PROBE_TIMEOUT_MS: u64 = 100;

/// Delay between sending the probe and reading its reply
pub const PROBE_SETTLE_MS: u64 = 10;

/// Boot time after the power pin is switched on
pub const POWER_ON_DELAY_MS: u64 = 500;

/// Settle time after reset and factory reset
pub const RESET_SETTLE_MS: u64 = 100;

/// Settle time after reopening the port following `AT+UART`
pub const UART_REOPEN_SETTLE_MS: u64 = 1000;

/// Poll interval of the connection wait loop
pub const CONNECTION_POLL_MS: u64 = 10;

/// Default refill interval of the token bucket
pub const DEFAULT_REFILL_INTERVAL_MS: u64 = 20;

/// Default poll interval of a blocked token bucket acquire
pub const DEFAULT_BUCKET_POLL_MS: u64 = 1;
