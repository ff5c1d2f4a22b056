//! Named AT operations.

use log::debug;
use std::time::Duration;

use crate::constants::*;
use crate::error::Result;
use crate::protocol::Hc05;

impl Hc05 {
    /// Firmware version string, e.g. `+VERSION=JDY-31-V1.35`
    pub fn get_version(&mut self) -> Result<String> {
        self.query(CMD_VERSION)
    }

    /// Current baud setting as reported by the module
    pub fn get_bauds(&mut self) -> Result<String> {
        self.query(CMD_BAUD)
    }

    pub fn get_name(&mut self) -> Result<String> {
        self.query(CMD_NAME)
    }

    pub fn get_pin(&mut self) -> Result<String> {
        self.query(CMD_PIN)
    }

    /// Set the advertised name. Resets the module on success to apply it.
    pub fn set_name(&mut self, name: &str) -> Result<bool> {
        self.apply_setting(CMD_NAME, name, Duration::from_millis(SET_NAME_TIMEOUT_MS))
    }

    /// Set the pairing pin. Resets the module on success to apply it.
    pub fn set_pin(&mut self, pin: &str) -> Result<bool> {
        self.apply_setting(CMD_PIN, pin, self.command_timeout())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.send_command(CMD_RESET, self.command_timeout())?;
        self.read_response()?;
        self.clock.delay_ms(RESET_SETTLE_MS);
        self.force_idle();
        Ok(())
    }

    /// Restore factory settings
    pub fn reset_factory(&mut self) -> Result<()> {
        self.send_command(CMD_DEFAULT, self.command_timeout())?;
        self.read_response()?;
        self.clock.delay_ms(RESET_SETTLE_MS);
        self.force_idle();
        Ok(())
    }

    /// Drop the current peer. The tracked state goes to `Idle` even if the
    /// module's confirmation is lost.
    pub fn disconnect(&mut self) -> Result<()> {
        self.send_command(CMD_DISCONNECT, self.command_timeout())?;
        self.read_response()?;
        self.force_idle();
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.send_command(command, self.command_timeout())?;
        self.read_response()
    }

    fn apply_setting(&mut self, prefix: &str, value: &str, timeout: Duration) -> Result<bool> {
        let command = bounded_command(prefix, value);
        self.send_command(&command, timeout)?;
        let response = self.read_response()?;
        debug!("{prefix} response: {response}");

        if response != OK_RESPONSE {
            return Ok(false);
        }

        self.reset()?;
        Ok(true)
    }
}

/// `prefix` + `value`, truncated to the command buffer size on a char boundary
fn bounded_command(prefix: &str, value: &str) -> String {
    let mut command = format!("{prefix}{value}");
    if command.len() > BUFFER_SIZE {
        let mut end = BUFFER_SIZE;
        while !command.is_char_boundary(end) {
            end -= 1;
        }
        command.truncate(end);
    }
    command
}
