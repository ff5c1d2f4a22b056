//! Baud rate detection and switching.

use log::{info, warn};
use std::time::Duration;

use crate::constants::*;
use crate::error::Result;
use crate::protocol::Hc05;
use crate::types::{BaudChange, BaudDialect, Level};

impl Hc05 {
    /// Probe the dialect's candidate rates, fastest first, until the module
    /// answers `AT+VERSION`.
    ///
    /// The command pin stays asserted for the whole scan and is released on
    /// return. `None` means no rate got an answer; the port is then reopened
    /// at the rate it had before the scan.
    pub fn find_baud(&mut self) -> Result<Option<u32>> {
        let timeout = self.command_timeout();

        self.set_command_pin(Level::High)?;
        let scan = self.probe_candidates();
        let release = self.set_command_pin(Level::Low);

        match scan {
            Ok(Some(baud)) => {
                release?;
                self.transport.set_read_timeout(timeout)?;
                self.baud_rate = baud;
                info!("Module answered at {baud} baud");
                Ok(Some(baud))
            }
            Ok(None) => {
                release?;
                self.restore_port(timeout)?;
                warn!("No baud rate candidate got an answer");
                Ok(None)
            }
            Err(e) => {
                if let Err(release) = release {
                    warn!("Could not release command pin: {release}");
                }
                if let Err(restore) = self.restore_port(timeout) {
                    warn!("Could not reopen at {} baud: {restore}", self.baud_rate);
                }
                Err(e)
            }
        }
    }

    /// Try each candidate, fastest first. The command pin must already be asserted.
    fn probe_candidates(&mut self) -> Result<Option<u32>> {
        let mut buffer = [0u8; BUFFER_SIZE];

        for &baud in self.config.dialect.candidates().iter().rev() {
            self.transport.open(baud)?;
            self.transport
                .set_read_timeout(Duration::from_millis(PROBE_TIMEOUT_MS))?;
            self.transport.flush()?;

            // The JDY-31 has no bare "AT" ping
            self.transport.write_line(CMD_VERSION.as_bytes())?;
            self.clock.delay_ms(PROBE_SETTLE_MS);

            if self.transport.read_bytes(&mut buffer)? > 0 {
                return Ok(Some(baud));
            }
        }
        Ok(None)
    }

    /// Put the port back at the rate the handle believes it is at
    fn restore_port(&mut self, timeout: Duration) -> Result<()> {
        self.transport.open(self.baud_rate)?;
        self.transport.set_read_timeout(timeout)
    }

    /// Switch the module and the port to `baud`, 1 stop bit, no parity
    pub fn set_baud(&mut self, baud: u32) -> Result<BaudChange> {
        self.set_baud_with(baud, 0, 0)
    }

    /// Switch the module and the port to `baud`.
    ///
    /// `stop_bits` and `parity` are passed through verbatim by the `AT+UART`
    /// dialect and ignored by the indexed one. Rates outside the dialect's
    /// candidate list are not sent at all.
    pub fn set_baud_with(&mut self, baud: u32, stop_bits: u32, parity: u32) -> Result<BaudChange> {
        let Some(index) = self
            .config
            .dialect
            .candidates()
            .iter()
            .position(|&rate| rate == baud)
        else {
            warn!("Baud rate {baud} not supported by {:?} dialect", self.config.dialect);
            return Ok(BaudChange::NotAttempted);
        };

        let timeout = self.command_timeout();
        match self.config.dialect {
            BaudDialect::Uart => {
                let command = format!("{CMD_UART}{baud},{stop_bits},{parity}");
                self.send_command(&command, timeout)?;
                let response = self.read_response()?;
                info!("Set baud response: {response}");

                self.transport.open(baud)?;
                self.baud_rate = baud;
                self.clock.delay_ms(UART_REOPEN_SETTLE_MS);
                Ok(BaudChange::Applied)
            }
            BaudDialect::Indexed => {
                let command = format!("{CMD_BAUD}{}", index + BAUD_INDEX_BASE);
                self.send_command(&command, timeout)?;
                let response = self.read_response()?;
                if response != OK_RESPONSE {
                    warn!("Set baud rejected: {response:?}");
                    return Ok(BaudChange::Rejected(response));
                }

                // The new rate only takes effect after a reset
                self.reset()?;
                self.transport.close()?;
                self.transport.open(baud)?;
                self.baud_rate = baud;
                Ok(BaudChange::Applied)
            }
        }
    }
}
