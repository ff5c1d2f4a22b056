//! # HC-05/JDY-31 Protocol Library
//!
//! A Rust driver for serial Bluetooth modules of the HC-05/JDY-31 family.
//! These modules bridge a UART to a Bluetooth SPP link and accept AT commands
//! while a dedicated pin holds them in command mode.
//!
//! ## Features
//!
//! - Issue AT commands with the pin sequencing and settle times the modules need
//! - Auto-detect the module's baud rate and switch it (`AT+UART` or `AT+BAUD<n>` dialects)
//! - Track the link from the status pin or from unsolicited result codes
//! - Decode the peer MAC address from connection notifications
//! - Token bucket rate limiter for pacing outbound data
//! - Emulated module for running everything without hardware
//!
//! ## Example
//!
//! ```no_run
//! use hc05_protocol::Hc05;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut hc05 = Hc05::new("/dev/ttyUSB0")?;
//!     if let Some(baud) = hc05.find_baud()? {
//!         println!("Module at {} baud: {}", baud, hc05.get_version()?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod baud;
pub mod bucket;
pub mod clock;
pub mod commands;
pub mod constants;
pub mod error;
pub mod hex;
pub mod mac;
pub mod protocol;
pub mod serial;
pub mod sim;
pub mod tracker;
pub mod transport;
pub mod types;

pub use bucket::TokenBucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Hc05Error, Result};
pub use protocol::Hc05;
pub use serial::SerialPortTransport;
pub use sim::{SimHandle, SimulatedModule};
pub use transport::Transport;
pub use types::*;
