//! Basic Usage Example
//!
//! This example demonstrates the core functionality of the HC-05/JDY-31 driver:
//! - Listing and selecting serial ports
//! - Detecting the module's baud rate
//! - Querying version, name and pairing pin
//! - Renaming the module
//!
//! Usage:
//!   cargo run --example basic_usage                  # Interactive mode
//!   cargo run --example basic_usage -- COM3          # Specify port
//!   cargo run --example basic_usage -- /dev/ttyUSB0 MyDevice
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example basic_usage

use hc05_protocol::{Hc05, Result};
use inquire::Select;
use log::info;

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = Hc05::list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports
        .iter()
        .map(|p| format!("{} - {:?}", p.port_name, p.port_type))
        .collect();

    let selection = Select::new("Select a serial port:", port_names)
        .prompt()
        .map_err(|e| std::io::Error::other(format!("Selection cancelled: {}", e)))?;

    let port_name = selection
        .split(" - ")
        .next()
        .unwrap_or(selection.as_str())
        .to_string();
    Ok(port_name)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let port_name = match args.next() {
        Some(port) => port,
        None => select_port()?,
    };
    let new_name = args.next();

    info!("Opening module on {}...", port_name);
    let mut hc05 = Hc05::new(&port_name)?;
    hc05.set_debug_print(true, true);

    info!("=== Baud Detection ===");
    match hc05.find_baud()? {
        Some(baud) => info!("✓ Module answered at {} baud", baud),
        None => {
            info!("✗ Module did not answer at any baud rate");
            return Ok(());
        }
    }

    info!("=== Module Information ===");
    info!("Version: {}", hc05.get_version()?);
    info!("Name:    {}", hc05.get_name()?);
    info!("Pin:     {}", hc05.get_pin()?);
    info!("Baud:    {}", hc05.get_bauds()?);

    if let Some(name) = new_name {
        info!("=== Renaming to {} ===", name);
        if hc05.set_name(&name)? {
            info!("✓ Name updated, module reset");
        } else {
            info!("✗ Module refused the new name");
        }
    }

    info!("=== Basic Usage Complete ===");
    Ok(())
}
