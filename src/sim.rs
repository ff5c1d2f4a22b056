//! Emulated JDY-31/HC-05 module for development and testing without hardware.
//!
//! `SimulatedModule` implements [`Transport`] and answers the AT commands the
//! driver issues, but only when the port is opened at the module's baud rate
//! and the command pin is asserted, the way real firmware behaves. A cloned
//! [`SimHandle`] stays with the test to inspect traffic and to play the peer.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;

use crate::constants::*;
use crate::error::{Hc05Error, Result};
use crate::transport::Transport;
use crate::types::{BaudDialect, Level, MacAddress, Pin, PinMode};

const SIM_VERSION: &str = "+VERSION=JDY-31-V1.35";
const SIM_DEFAULT_NAME: &str = "JDY-31-SPP";
const SIM_DEFAULT_PIN: &str = "1234";
const ERR_RESPONSE: &str = "+ERR";
const URC_DISCONNECTED_STR: &str = "+DISC:SUCCESS";

#[derive(Debug)]
struct SimState {
    module_baud: u32,
    dialect: BaudDialect,
    command_pin: Option<Pin>,
    status_pin: Option<Pin>,
    open_baud: Option<u32>,
    opens: Vec<u32>,
    read_timeout: Duration,
    pins: HashMap<Pin, Level>,
    pin_modes: HashMap<Pin, PinMode>,
    rx: VecDeque<u8>,
    line: Vec<u8>,
    commands: Vec<String>,
    data: Vec<u8>,
    replies: HashMap<String, Option<String>>,
    name: String,
    pin_code: String,
    pending_baud: Option<u32>,
    peer: Option<MacAddress>,
}

impl SimState {
    fn level(&self, pin: Pin) -> Level {
        self.pins.get(&pin).copied().unwrap_or(Level::Low)
    }

    fn in_command_mode(&self) -> bool {
        match self.command_pin {
            Some(pin) => self.level(pin).is_high(),
            None => true,
        }
    }

    fn queue(&mut self, line: &str) {
        self.rx.extend(line.as_bytes());
        self.rx.extend(LINE_TERMINATOR);
    }

    fn set_status(&mut self, level: Level) {
        if let Some(pin) = self.status_pin {
            self.pins.insert(pin, level);
        }
    }

    fn receive(&mut self, data: &[u8]) {
        if self.open_baud != Some(self.module_baud) {
            // Wrong baud: the module sees line noise
            return;
        }
        for &byte in data {
            if !self.in_command_mode() {
                self.data.push(byte);
                continue;
            }
            self.line.push(byte);
            if self.line.ends_with(LINE_TERMINATOR) {
                let len = self.line.len() - LINE_TERMINATOR.len();
                let command = String::from_utf8_lossy(&self.line[..len]).into_owned();
                self.line.clear();
                self.execute(command);
            }
        }
    }

    fn execute(&mut self, command: String) {
        debug!("[SIM] {command}");
        self.commands.push(command.clone());

        if let Some(reply) = self.replies.get(&command).cloned() {
            if let Some(reply) = reply {
                self.queue(&reply);
            }
            return;
        }

        let reply = if command == CMD_VERSION {
            SIM_VERSION.to_string()
        } else if let Some(arg) = command.strip_prefix(CMD_UART) {
            match arg.split(',').next().and_then(|r| r.parse::<u32>().ok()) {
                Some(rate) => {
                    self.queue(OK_RESPONSE);
                    self.module_baud = rate;
                    return;
                }
                None => ERR_RESPONSE.to_string(),
            }
        } else if let Some(arg) = command.strip_prefix(CMD_BAUD) {
            self.baud_command(arg)
        } else if let Some(name) = command.strip_prefix(CMD_NAME) {
            if name.is_empty() {
                format!("+NAME={}", self.name)
            } else {
                self.name = name.to_string();
                OK_RESPONSE.to_string()
            }
        } else if let Some(pin) = command.strip_prefix(CMD_PIN) {
            if pin.is_empty() {
                format!("+PIN={}", self.pin_code)
            } else {
                self.pin_code = pin.to_string();
                OK_RESPONSE.to_string()
            }
        } else if command == CMD_RESET {
            self.queue(OK_RESPONSE);
            self.reboot();
            return;
        } else if command == CMD_DEFAULT {
            self.name = SIM_DEFAULT_NAME.to_string();
            self.pin_code = SIM_DEFAULT_PIN.to_string();
            self.pending_baud = Some(DEFAULT_BAUD_RATE);
            self.queue(OK_RESPONSE);
            self.reboot();
            return;
        } else if command == CMD_DISCONNECT {
            if self.peer.take().is_some() {
                self.set_status(Level::Low);
                URC_DISCONNECTED_STR.to_string()
            } else {
                OK_RESPONSE.to_string()
            }
        } else {
            ERR_RESPONSE.to_string()
        };
        self.queue(&reply);
    }

    fn baud_command(&mut self, arg: &str) -> String {
        let rates = self.dialect.candidates();
        if arg.is_empty() {
            return match rates.iter().position(|&r| r == self.module_baud) {
                Some(index) => format!("+BAUD={}", index + BAUD_INDEX_BASE),
                None => ERR_RESPONSE.to_string(),
            };
        }
        let rate = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(BAUD_INDEX_BASE))
            .and_then(|index| rates.get(index));
        match rate {
            Some(&rate) => {
                self.pending_baud = Some(rate);
                OK_RESPONSE.to_string()
            }
            None => ERR_RESPONSE.to_string(),
        }
    }

    fn reboot(&mut self) {
        if let Some(rate) = self.pending_baud.take() {
            self.module_baud = rate;
        }
        self.peer = None;
        self.set_status(Level::Low);
    }
}

/// Emulated module implementing [`Transport`]
pub struct SimulatedModule {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedModule {
    /// Module listening at `module_baud`, command pin on RTS, status pin on CTS
    pub fn new(module_baud: u32, dialect: BaudDialect) -> Self {
        SimulatedModule {
            state: Arc::new(Mutex::new(SimState {
                module_baud,
                dialect,
                command_pin: Some(Pin::Rts),
                status_pin: Some(Pin::Cts),
                open_baud: None,
                opens: Vec::new(),
                read_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
                pins: HashMap::new(),
                pin_modes: HashMap::new(),
                rx: VecDeque::new(),
                line: Vec::new(),
                commands: Vec::new(),
                data: Vec::new(),
                replies: HashMap::new(),
                name: SIM_DEFAULT_NAME.to_string(),
                pin_code: SIM_DEFAULT_PIN.to_string(),
                pending_baud: None,
                peer: None,
            })),
        }
    }

    /// Which pin puts the module in command mode; `None` accepts commands at all times
    pub fn with_command_pin(self, pin: Option<Pin>) -> Self {
        lock(&self.state).command_pin = pin;
        self
    }

    pub fn with_status_pin(self, pin: Option<Pin>) -> Self {
        lock(&self.state).status_pin = pin;
        self
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for SimulatedModule {
    fn open(&mut self, baud: u32) -> Result<()> {
        let mut state = self.state();
        state.open_baud = Some(baud);
        state.opens.push(baud);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state().open_baud = None;
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.state().read_timeout = timeout;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if state.open_baud.is_none() {
            return Err(Hc05Error::NotOpen);
        }
        state.receive(data);
        Ok(())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut state = self.state();
        if state.open_baud.is_none() {
            return Err(Hc05Error::NotOpen);
        }
        let n = buffer.len().min(state.rx.len());
        for (slot, byte) in buffer.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn read_until(&mut self, terminator: u8, buffer: &mut [u8]) -> Result<usize> {
        let mut state = self.state();
        if state.open_baud.is_none() {
            return Err(Hc05Error::NotOpen);
        }
        let mut recvd = 0;
        while recvd < buffer.len() {
            match state.rx.pop_front() {
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
        Ok(self.state().rx.len())
    }

    fn flush(&mut self) -> Result<()> {
        let mut state = self.state();
        state.rx.clear();
        state.line.clear();
        Ok(())
    }

    fn pin_mode(&mut self, pin: Pin, mode: PinMode) -> Result<()> {
        self.state().pin_modes.insert(pin, mode);
        Ok(())
    }

    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<()> {
        self.state().pins.insert(pin, level);
        Ok(())
    }

    fn digital_read(&mut self, pin: Pin) -> Result<Level> {
        Ok(self.state().level(pin))
    }
}

/// Test-side view of a [`SimulatedModule`]
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    fn state(&self) -> MutexGuard<'_, SimState> {
        lock(&self.state)
    }

    /// AT commands the module accepted, without terminators
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    /// Number of accepted commands equal to `command`
    pub fn count(&self, command: &str) -> usize {
        self.state().commands.iter().filter(|c| *c == command).count()
    }

    /// Bytes written while the module was in data mode
    pub fn data(&self) -> Vec<u8> {
        self.state().data.clone()
    }

    pub fn pin_level(&self, pin: Pin) -> Level {
        self.state().level(pin)
    }

    pub fn pin_mode(&self, pin: Pin) -> Option<PinMode> {
        self.state().pin_modes.get(&pin).copied()
    }

    pub fn set_pin_level(&self, pin: Pin, level: Level) {
        self.state().pins.insert(pin, level);
    }

    /// Baud rate the module currently listens at
    pub fn module_baud(&self) -> u32 {
        self.state().module_baud
    }

    /// Rates the host opened the port at, in order
    pub fn opens(&self) -> Vec<u32> {
        self.state().opens.clone()
    }

    pub fn read_timeout(&self) -> Duration {
        self.state().read_timeout
    }

    pub fn name(&self) -> String {
        self.state().name.clone()
    }

    pub fn pin_code(&self) -> String {
        self.state().pin_code.clone()
    }

    /// Answer `command` with `reply` instead of the built-in response; `None` stays silent
    pub fn set_reply(&self, command: &str, reply: Option<&str>) {
        self.state()
            .replies
            .insert(command.to_string(), reply.map(str::to_string));
    }

    /// Queue raw bytes for the host to read
    pub fn inject(&self, data: &[u8]) {
        self.state().rx.extend(data);
    }

    /// Play a peer connecting: notification, confirmation and status pin
    pub fn connect_peer(&self, mac: MacAddress) {
        let mut state = self.state();
        state.queue(&format!("+CONNECTING<<{mac}"));
        state.queue("CONNECTED");
        state.peer = Some(mac);
        state.set_status(Level::High);
    }

    /// Play the peer dropping the link
    pub fn disconnect_peer(&self) {
        let mut state = self.state();
        state.queue(URC_DISCONNECTED_STR);
        state.peer = None;
        state.set_status(Level::Low);
    }
}
