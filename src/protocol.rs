use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::constants::*;
use crate::error::Result;
use crate::mac::decode_notification;
use crate::serial::SerialPortTransport;
use crate::tracker::{UrcEvent, UrcTracker};
use crate::transport::Transport;
use crate::types::*;

/// Main HC-05/JDY-31 device handle
pub struct Hc05 {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: DeviceConfig,
    pub(crate) baud_rate: u32,
    tracker: UrcTracker,
    peer: Option<MacAddress>,
    changed_at: Option<DateTime<Utc>>,
    print_tx: bool,
    print_rx: bool,
}

impl Hc05 {
    /// Open the module on `port_name` with the default pin assignment
    pub fn new(port_name: &str) -> Result<Self> {
        Self::open(DeviceConfig {
            port_name: port_name.to_string(),
            ..DeviceConfig::default()
        })
    }

    /// Open the module on the serial port named in `config`
    pub fn open(config: DeviceConfig) -> Result<Self> {
        let transport = SerialPortTransport::new(&config.port_name);
        Self::with_transport(Box::new(transport), Arc::new(SystemClock::new()), config)
    }

    /// Build a handle over any transport. Opens it at `config.baud_rate`
    /// and configures the pins.
    pub fn with_transport(
        mut transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: DeviceConfig,
    ) -> Result<Self> {
        transport.open(config.baud_rate)?;
        transport.set_read_timeout(Duration::from_millis(config.timeout_ms))?;

        if let Some(pin) = config.command_pin {
            transport.pin_mode(pin, PinMode::Output)?;
            transport.digital_write(pin, Level::Low)?;
        }
        if let Some(pin) = config.status_pin {
            transport.pin_mode(pin, PinMode::InputPullup)?;
        }
        if let Some(pin) = config.power_pin {
            transport.pin_mode(pin, PinMode::Output)?;
        }

        Ok(Hc05 {
            transport,
            clock,
            baud_rate: config.baud_rate,
            config,
            tracker: UrcTracker::new(),
            peer: None,
            changed_at: None,
            print_tx: false,
            print_rx: false,
        })
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }

    /// Enable/disable debug logging of commands sent and lines read
    pub fn set_debug_print(&mut self, tx: bool, rx: bool) {
        self.print_tx = tx;
        self.print_rx = rx;
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Baud rate the port is currently open at
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Last peer seen in a connection notification. Kept after disconnect.
    pub fn client_mac(&self) -> Option<MacAddress> {
        self.peer
    }

    /// Switch the module's supply on and wait for it to boot
    pub fn power_on(&mut self) -> Result<()> {
        if let Some(pin) = self.config.power_pin {
            self.transport
                .digital_write(pin, self.config.power_polarity.active())?;
            self.clock.delay_ms(POWER_ON_DELAY_MS);
        }
        Ok(())
    }

    pub fn power_off(&mut self) -> Result<()> {
        if let Some(pin) = self.config.power_pin {
            self.transport
                .digital_write(pin, self.config.power_polarity.inactive())?;
        }
        Ok(())
    }

    /// Drive the command pin and wait for the module to switch modes
    pub(crate) fn set_command_pin(&mut self, level: Level) -> Result<()> {
        if let Some(pin) = self.config.command_pin {
            self.transport.digital_write(pin, level)?;
            self.clock.delay_ms(CMD_PIN_SETTLE_MS);
        }
        Ok(())
    }

    pub(crate) fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    /// Send an AT command without reading the reply.
    ///
    /// Asserts the command pin, writes `command` + CRLF, arms `timeout` for
    /// the following reads and releases the pin. The pin is released even
    /// when the write fails. The caller must drain the reply line afterwards.
    pub fn send_command(&mut self, command: &str, timeout: Duration) -> Result<()> {
        self.set_command_pin(Level::High)?;

        if self.print_tx {
            debug!("TX: {command}");
        }
        let sent = self.write_command(command, timeout);
        let released = self.set_command_pin(Level::Low);
        sent.and(released)
    }

    fn write_command(&mut self, command: &str, timeout: Duration) -> Result<()> {
        self.transport.write_line(command.as_bytes())?;
        self.transport.set_read_timeout(timeout)
    }

    /// Read up to `buffer.len()` bytes or until `\n`.
    ///
    /// Returns the number of bytes stored, terminator excluded; a trailing
    /// `\r` is kept. 0 means the read timed out with nothing buffered.
    pub fn read_line(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let recvd = self.transport.read_until(b'\n', buffer)?;
        if self.print_rx {
            debug!("RX: {}", String::from_utf8_lossy(&buffer[..recvd]));
        }
        self.observe(&buffer[..recvd]);
        Ok(recvd)
    }

    /// Read one reply line as text, trailing `\r` removed
    pub(crate) fn read_response(&mut self) -> Result<String> {
        let mut buffer = [0u8; BUFFER_SIZE];
        let recvd = self.read_line(&mut buffer)?;
        let line = String::from_utf8_lossy(&buffer[..recvd]);
        Ok(line.trim_end_matches('\r').to_string())
    }

    /// Write application data through the transparent link
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.transport.write(data)
    }

    /// Read application data, waiting up to the current read timeout
    pub fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let recvd = self.transport.read_bytes(buffer)?;
        if self.print_rx && recvd > 0 {
            debug!("RX: {:02X?}", &buffer[..recvd]);
        }
        self.observe(&buffer[..recvd]);
        Ok(recvd)
    }

    /// Bytes that can be read without blocking
    pub fn available(&mut self) -> Result<usize> {
        self.transport.bytes_available()
    }

    /// Whether a peer is connected.
    ///
    /// With status pin tracking this is the pin level; a missing status pin
    /// counts as always connected. With URC tracking the tracked state and
    /// the status pin (when wired) are OR'd.
    pub fn is_connected(&mut self) -> Result<bool> {
        let pin_asserted = match self.config.status_pin {
            Some(pin) => Some(self.transport.digital_read(pin)?.is_high()),
            None => None,
        };

        Ok(match self.config.tracking {
            Tracking::StatusPin => pin_asserted.unwrap_or(true),
            Tracking::Urc => {
                self.tracker.state() == ConnectionState::Connected
                    || pin_asserted.unwrap_or(false)
            }
        })
    }

    /// Current connection state. Status pin tracking never reports `Connecting`.
    pub fn state(&mut self) -> Result<ConnectionState> {
        match self.config.tracking {
            Tracking::StatusPin => Ok(if self.is_connected()? {
                ConnectionState::Connected
            } else {
                ConnectionState::Idle
            }),
            Tracking::Urc => Ok(self.tracker.state()),
        }
    }

    /// Poll until a peer is connected or `timeout` elapses; `None` waits forever.
    /// Pending notification lines are drained while waiting.
    pub fn wait_for_connection(&mut self, timeout: Option<Duration>) -> Result<bool> {
        let start = self.clock.now_ms();
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            if self.is_connected()? {
                return Ok(true);
            }
            if self.transport.bytes_available()? > 0 {
                self.read_line(&mut buffer)?;
            }
            if let Some(timeout) = timeout {
                let limit = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                if self.clock.now_ms().saturating_sub(start) >= limit {
                    return Ok(false);
                }
            }
            self.clock.delay_ms(CONNECTION_POLL_MS);
        }
    }

    /// Read a `+CONNECTING<<xx:xx:xx:xx:xx:xx` line, store the peer address
    /// and discard the `CONNECTED` line that follows.
    ///
    /// Returns `false` without touching the stored address when the line is
    /// too short or holds invalid hex.
    pub fn handle_new_connection(&mut self) -> Result<bool> {
        let mut buffer = [0u8; BUFFER_SIZE];
        let recvd = self.read_line(&mut buffer)?;

        let mac = match decode_notification(&buffer[..recvd]) {
            Ok(mac) => mac,
            Err(e) => {
                warn!("Ignoring connection notification: {e}");
                return Ok(false);
            }
        };
        self.peer = Some(mac);
        info!("Peer connected: {mac}");

        // Flush "CONNECTED"
        self.read_line(&mut buffer)?;
        Ok(true)
    }

    /// Snapshot of the link for reporting
    pub fn status(&mut self) -> Result<LinkStatus> {
        Ok(LinkStatus {
            state: self.state()?,
            peer: self.peer,
            baud_rate: self.baud_rate,
            changed_at: self.changed_at,
        })
    }

    /// Drop the tracked connection locally, whatever the module reported
    pub(crate) fn force_idle(&mut self) {
        if self.config.tracking == Tracking::Urc && self.tracker.state() != ConnectionState::Idle {
            self.tracker.reset();
            self.changed_at = Some(Utc::now());
            info!("Link state: {:?}", ConnectionState::Idle);
        }
    }

    fn observe(&mut self, data: &[u8]) {
        if self.config.tracking != Tracking::Urc {
            return;
        }
        for event in self.tracker.observe(data) {
            if let UrcEvent::Connecting(Some(mac)) = event {
                self.peer = Some(mac);
            }
            self.changed_at = Some(Utc::now());
            info!("Link state: {:?} ({event:?})", self.tracker.state());
        }
    }
}
