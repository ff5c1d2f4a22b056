//! Link Monitor Example
//!
//! Waits for a peer to connect, echoes whatever it sends back at a bounded
//! rate and prints a JSON status line on every state change.
//!
//! Runs against a real module, or against the emulated one with `--sim`:
//!   cargo run --example link_monitor -- /dev/ttyUSB0
//!   cargo run --example link_monitor -- --sim

use std::sync::Arc;
use std::time::Duration;

use hc05_protocol::{
    BaudDialect, DeviceConfig, Hc05, MacAddress, Result, SimulatedModule, SystemClock,
    TokenBucket, Tracking,
};
use log::{info, warn};

/// Echo at most this many chunks in a burst
const ECHO_BURST: u32 = 5;

fn open(target: &str) -> Result<Hc05> {
    let config = DeviceConfig {
        port_name: target.to_string(),
        tracking: Tracking::Urc,
        dialect: BaudDialect::Indexed,
        timeout_ms: 200,
        ..DeviceConfig::default()
    };

    if target != "--sim" {
        return Hc05::open(config);
    }

    let module = SimulatedModule::new(config.baud_rate, BaudDialect::Indexed);
    let peer = module.handle();
    peer.connect_peer(MacAddress([0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13]));
    peer.inject(b"hello from the simulated peer\r\n");
    peer.disconnect_peer();
    Hc05::with_transport(Box::new(module), Arc::new(SystemClock::new()), config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let target = std::env::args().nth(1).unwrap_or_else(|| "--sim".to_string());
    let mut hc05 = open(&target)?;
    let mut bucket = TokenBucket::new(ECHO_BURST);

    info!("Waiting for a peer on {}...", target);
    if !hc05.wait_for_connection(Some(Duration::from_secs(30)))? {
        warn!("No peer connected");
        return Ok(());
    }

    let mut last_state = None;
    let mut buffer = [0u8; 128];
    loop {
        let recvd = hc05.read_data(&mut buffer)?;
        if recvd > 0 && hc05.is_connected()? {
            bucket.acquire();
            hc05.write_data(&buffer[..recvd])?;
        }

        let status = hc05.status()?;
        if last_state != Some(status.state) {
            last_state = Some(status.state);
            println!(
                "{}",
                serde_json::to_string(&status).unwrap_or_else(|e| e.to_string())
            );
        }
        if !hc05.is_connected()? {
            info!("Peer {} left", status.peer.map(|m| m.to_string()).unwrap_or_default());
            return Ok(());
        }
    }
}
