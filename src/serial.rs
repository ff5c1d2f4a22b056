//! Serial port adapter using the `serialport` crate.
//!
//! Pins map onto the modem control lines of the port: RTS and DTR can be
//! driven (typically wired to the module's KEY/EN and power switch), while
//! CTS, DSR, CD and RI can be sampled (typically the STATE output).

use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::constants::DEFAULT_TIMEOUT_MS;
use crate::error::{Hc05Error, Result};
use crate::transport::Transport;
use crate::types::{Level, Pin, PinMode};

/// `Transport` over an OS serial port
pub struct SerialPortTransport {
    port_name: String,
    port: Option<Box<dyn SerialPort>>,
    timeout: Duration,
}

impl SerialPortTransport {
    /// Create an adapter for `port_name`. Nothing is opened until [`Transport::open`].
    pub fn new(port_name: &str) -> Self {
        SerialPortTransport {
            port_name: port_name.to_string(),
            port: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Hc05Error::NotOpen)
    }

    /// Read a single byte, `None` on timeout
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let port = self.port()?;
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Transport for SerialPortTransport {
    fn open(&mut self, baud: u32) -> Result<()> {
        if let Some(port) = self.port.as_mut() {
            port.set_baud_rate(baud)?;
            return Ok(());
        }

        let port = serialport::new(&self.port_name, baud)
            .timeout(self.timeout)
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.port = None;
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = timeout;
        if let Some(port) = self.port.as_mut() {
            port.set_timeout(timeout)?;
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut recvd = 0;
        while recvd < buffer.len() {
            let port = self.port()?;
            match port.read(&mut buffer[recvd..]) {
                Ok(0) => break,
                Ok(n) => recvd += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(recvd)
    }

    fn read_until(&mut self, terminator: u8, buffer: &mut [u8]) -> Result<usize> {
        let mut recvd = 0;
        while recvd < buffer.len() {
            match self.read_byte()? {
                Some(byte) if byte == terminator => break,
                Some(byte) => {
                    buffer[recvd] = byte;
                    recvd += 1;
                }
                None => break,
            }
        }
        Ok(recvd)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn flush(&mut self) -> Result<()> {
        self.port()?.clear(ClearBuffer::All)?;
        Ok(())
    }

    fn pin_mode(&mut self, pin: Pin, mode: PinMode) -> Result<()> {
        match (pin, mode) {
            (Pin::Rts | Pin::Dtr, PinMode::Output) => Ok(()),
            (
                Pin::Cts | Pin::Dsr | Pin::CarrierDetect | Pin::RingIndicator,
                PinMode::Input | PinMode::InputPullup,
            ) => Ok(()),
            _ => Err(Hc05Error::UnsupportedPin(pin)),
        }
    }

    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<()> {
        let port = self.port()?;
        match pin {
            Pin::Rts => port.write_request_to_send(level.is_high())?,
            Pin::Dtr => port.write_data_terminal_ready(level.is_high())?,
            _ => return Err(Hc05Error::UnsupportedPin(pin)),
        }
        Ok(())
    }

    fn digital_read(&mut self, pin: Pin) -> Result<Level> {
        let port = self.port()?;
        let high = match pin {
            Pin::Cts => port.read_clear_to_send()?,
            Pin::Dsr => port.read_data_set_ready()?,
            Pin::CarrierDetect => port.read_carrier_detect()?,
            Pin::RingIndicator => port.read_ring_indicator()?,
            _ => return Err(Hc05Error::UnsupportedPin(pin)),
        };
        Ok(Level::from(high))
    }
}
