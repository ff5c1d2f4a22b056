use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

/// A digital line the driver can drive or sample.
///
/// Modem control lines are what a USB-serial adapter exposes; `Gpio` is for
/// transports wired to a microcontroller-style pin header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pin {
    Rts,
    Dtr,
    Cts,
    Dsr,
    CarrierDetect,
    RingIndicator,
    Gpio(u8),
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Pin direction configured at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
    InputPullup,
}

/// Which level switches the module's supply on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    pub fn active(self) -> Level {
        match self {
            Polarity::ActiveHigh => Level::High,
            Polarity::ActiveLow => Level::Low,
        }
    }

    pub fn inactive(self) -> Level {
        match self {
            Polarity::ActiveHigh => Level::Low,
            Polarity::ActiveLow => Level::High,
        }
    }
}

/// Connection state of the Bluetooth link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
}

/// Six-byte Bluetooth device address, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// How the module expects baud changes to be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BaudDialect {
    /// `AT+UART=<rate>,<stop>,<parity>`, effective immediately (HC-05)
    #[default]
    Uart,
    /// `AT+BAUD<n>`, acknowledged with `+OK` and applied on reset (JDY-31)
    Indexed,
}

impl BaudDialect {
    /// Supported rates in ascending order
    pub fn candidates(self) -> &'static [u32] {
        match self {
            BaudDialect::Uart => &UART_BAUD_RATES,
            BaudDialect::Indexed => &INDEXED_BAUD_RATES,
        }
    }
}

/// Source of truth for the connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tracking {
    /// Sample the status pin; `Connecting` is never reported
    #[default]
    StatusPin,
    /// Parse unsolicited result codes from every inbound read
    Urc,
}

/// Static configuration of a device handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial port name, used by [`crate::Hc05::open`]
    pub port_name: String,
    /// Baud rate the port is first opened at
    pub baud_rate: u32,
    /// Pin that switches the module into command mode; `None` sends commands in data mode
    pub command_pin: Option<Pin>,
    /// Pin the module asserts while a peer is connected
    pub status_pin: Option<Pin>,
    /// Pin gating the module's supply, if wired
    pub power_pin: Option<Pin>,
    pub power_polarity: Polarity,
    pub dialect: BaudDialect,
    pub tracking: Tracking,
    /// Read timeout applied to regular commands, in milliseconds
    pub timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            port_name: String::from("/dev/ttyUSB0"),
            baud_rate: DEFAULT_BAUD_RATE,
            command_pin: Some(Pin::Rts),
            status_pin: Some(Pin::Cts),
            power_pin: None,
            power_polarity: Polarity::ActiveHigh,
            dialect: BaudDialect::Uart,
            tracking: Tracking::StatusPin,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Outcome of a baud change request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaudChange {
    /// Rate is not in the dialect's candidate list; nothing was sent
    NotAttempted,
    /// Module answered something other than `+OK`; port left at the old rate
    Rejected(String),
    /// Command sent and port reopened at the new rate
    Applied,
}

/// Snapshot of the link for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStatus {
    pub state: ConnectionState,
    pub peer: Option<MacAddress>,
    pub baud_rate: u32,
    pub changed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_display_is_zero_padded_uppercase() {
        let mac = MacAddress([0xDE, 0xAD, 0x0B, 0xEF, 0x00, 0x11]);
        assert_eq!(mac.to_string(), "DE:AD:0B:EF:00:11");
    }

    #[test]
    fn polarity_levels_are_complementary() {
        assert_eq!(Polarity::ActiveHigh.active(), Level::High);
        assert_eq!(Polarity::ActiveLow.active(), Level::Low);
        assert_eq!(Polarity::ActiveLow.inactive(), Level::High);
    }

    #[test]
    fn indexed_dialect_has_no_4800() {
        assert!(!BaudDialect::Indexed.candidates().contains(&4800));
        assert_eq!(BaudDialect::Uart.candidates()[0], 4800);
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let json = r#"{ "port_name": "COM3", "tracking": "Urc", "power_pin": { "Gpio": 7 } }"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.port_name, "COM3");
        assert_eq!(config.tracking, Tracking::Urc);
        assert_eq!(config.power_pin, Some(Pin::Gpio(7)));
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.command_pin, Some(Pin::Rts));
    }
}
