//! Connection tracking: status pin polling, URC parsing and peer capture.

use std::sync::Arc;
use std::time::Duration;

use hc05_protocol::{
    BaudDialect, Clock, ConnectionState, DeviceConfig, Hc05, Level, MacAddress, ManualClock, Pin,
    SimHandle, SimulatedModule, Tracking,
};

const PEER: MacAddress = MacAddress([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11]);

fn driver(tracking: Tracking, status_pin: Option<Pin>) -> (Hc05, SimHandle, ManualClock) {
    let module = SimulatedModule::new(9600, BaudDialect::Indexed).with_status_pin(status_pin);
    let handle = module.handle();
    let clock = ManualClock::new();
    let config = DeviceConfig {
        tracking,
        status_pin,
        dialect: BaudDialect::Indexed,
        ..DeviceConfig::default()
    };
    let hc05 = Hc05::with_transport(Box::new(module), Arc::new(clock.clone()), config).unwrap();
    (hc05, handle, clock)
}

fn drain(hc05: &mut Hc05) {
    let mut buffer = [0u8; 128];
    while hc05.available().unwrap() > 0 {
        hc05.read_data(&mut buffer).unwrap();
    }
}

// --- Status pin polling ---

#[test]
fn status_pin_level_is_the_connection_state() {
    let (mut hc05, handle, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    assert!(!hc05.is_connected().unwrap());
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);

    handle.set_pin_level(Pin::Cts, Level::High);
    assert!(hc05.is_connected().unwrap());
    assert_eq!(hc05.state().unwrap(), ConnectionState::Connected);
}

#[test]
fn polling_mode_ignores_result_codes() {
    let (mut hc05, handle, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    handle.inject(b"+CONNECTING<<DE:AD:BE:EF:00:11\r\nCONNECTED\r\n");
    drain(&mut hc05);
    assert!(!hc05.is_connected().unwrap());
    assert_eq!(hc05.client_mac(), None);
}

#[test]
fn missing_status_pin_counts_as_connected() {
    let (mut hc05, _, _) = driver(Tracking::StatusPin, None);
    assert!(hc05.is_connected().unwrap());
}

#[test]
fn wait_for_connection_returns_once_pin_asserts() {
    let (mut hc05, handle, clock) = driver(Tracking::StatusPin, Some(Pin::Cts));
    handle.connect_peer(PEER);
    assert!(hc05.wait_for_connection(Some(Duration::from_secs(1))).unwrap());
    assert_eq!(clock.now_ms(), 0);
}

#[test]
fn wait_for_connection_times_out() {
    let (mut hc05, _, clock) = driver(Tracking::StatusPin, Some(Pin::Cts));
    assert!(!hc05.wait_for_connection(Some(Duration::from_millis(500))).unwrap());
    assert!(clock.now_ms() >= 500);
    assert!(clock.now_ms() < 500 + 2 * hc05_protocol::constants::CONNECTION_POLL_MS);
}

#[test]
fn huge_timeout_does_not_expire_early() {
    let (mut hc05, handle, clock) = driver(Tracking::StatusPin, Some(Pin::Cts));
    // Its millisecond count does not fit in a u64
    let timeout = Duration::from_secs(u64::MAX / 1000 + 1);

    let peer = {
        let clock = clock.clone();
        std::thread::spawn(move || {
            while clock.now_ms() < 1000 {
                std::thread::yield_now();
            }
            handle.set_pin_level(Pin::Cts, Level::High);
        })
    };

    assert!(hc05.wait_for_connection(Some(timeout)).unwrap());
    assert!(clock.now_ms() >= 1000);
    peer.join().unwrap();
}

#[test]
fn wait_for_connection_drains_pending_lines() {
    let (mut hc05, handle, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    handle.inject(b"noise\r\n");
    assert!(!hc05.wait_for_connection(Some(Duration::from_millis(50))).unwrap());
    assert_eq!(hc05.available().unwrap(), 0);
}

// --- URC tracking ---

#[test]
fn urc_lifecycle_walks_all_states() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    let mut buffer = [0u8; 128];

    handle.connect_peer(PEER);
    hc05.read_line(&mut buffer).unwrap();
    assert_eq!(hc05.state().unwrap(), ConnectionState::Connecting);
    assert!(!hc05.is_connected().unwrap());

    hc05.read_line(&mut buffer).unwrap();
    assert_eq!(hc05.state().unwrap(), ConnectionState::Connected);
    assert!(hc05.is_connected().unwrap());

    handle.disconnect_peer();
    hc05.read_line(&mut buffer).unwrap();
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);
}

#[test]
fn bare_connected_is_ignored() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    handle.inject(b"CONNECTED\r\n");
    drain(&mut hc05);
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);
}

#[test]
fn buffered_reads_are_scanned_and_returned() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    handle.connect_peer(PEER);
    handle.inject(b"payload");

    let mut buffer = [0u8; 128];
    let n = hc05.read_data(&mut buffer).unwrap();
    assert!(buffer[..n].ends_with(b"payload"));
    assert_eq!(hc05.state().unwrap(), ConnectionState::Connected);
    assert_eq!(hc05.client_mac(), Some(PEER));
}

#[test]
fn peer_address_survives_disconnect() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    handle.connect_peer(PEER);
    drain(&mut hc05);
    handle.disconnect_peer();
    drain(&mut hc05);
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);
    assert_eq!(hc05.client_mac(), Some(PEER));
}

#[test]
fn status_pin_and_urc_state_are_ored() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, Some(Pin::Cts));
    handle.set_pin_level(Pin::Cts, Level::High);
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);
    assert!(hc05.is_connected().unwrap());
}

#[test]
fn disconnect_clears_state_even_without_confirmation() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    handle.connect_peer(PEER);
    drain(&mut hc05);
    assert_eq!(hc05.state().unwrap(), ConnectionState::Connected);

    handle.set_reply("AT+DISC", None);
    hc05.disconnect().unwrap();
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);
}

#[test]
fn reset_returns_to_idle() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    handle.connect_peer(PEER);
    drain(&mut hc05);
    hc05.reset().unwrap();
    assert_eq!(hc05.state().unwrap(), ConnectionState::Idle);
}

#[test]
fn wait_for_connection_follows_result_codes() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    handle.connect_peer(PEER);
    assert!(hc05.wait_for_connection(Some(Duration::from_secs(1))).unwrap());
    assert_eq!(hc05.client_mac(), Some(PEER));
}

#[test]
fn status_snapshot_records_transition_time() {
    let (mut hc05, handle, _) = driver(Tracking::Urc, None);
    assert!(hc05.status().unwrap().changed_at.is_none());

    handle.connect_peer(PEER);
    drain(&mut hc05);
    let status = hc05.status().unwrap();
    assert_eq!(status.state, ConnectionState::Connected);
    assert_eq!(status.peer, Some(PEER));
    assert_eq!(status.baud_rate, 9600);
    assert!(status.changed_at.is_some());

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"Connected\""));
}

// --- Explicit connection handling ---

#[test]
fn handle_new_connection_decodes_peer_and_flushes_confirmation() {
    let (mut hc05, handle, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    handle.connect_peer(PEER);
    assert!(hc05.handle_new_connection().unwrap());
    assert_eq!(hc05.client_mac(), Some(PEER));
    assert_eq!(hc05.available().unwrap(), 0);
}

#[test]
fn short_notification_leaves_peer_untouched() {
    let (mut hc05, handle, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    handle.inject(b"+CONNECTING<<DE:AD\r\n");
    assert!(!hc05.handle_new_connection().unwrap());
    assert_eq!(hc05.client_mac(), None);
}

#[test]
fn failed_notification_keeps_previous_peer() {
    let (mut hc05, handle, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    handle.connect_peer(PEER);
    assert!(hc05.handle_new_connection().unwrap());

    handle.inject(b"+CONNECTING<<12:34\r\n");
    assert!(!hc05.handle_new_connection().unwrap());
    handle.inject(b"+CONNECTING<<ab:cd:ef:01:23:45\r\n");
    assert!(!hc05.handle_new_connection().unwrap());
    assert_eq!(hc05.client_mac(), Some(PEER));
}

#[test]
fn handle_new_connection_on_silence_returns_false() {
    let (mut hc05, _, _) = driver(Tracking::StatusPin, Some(Pin::Cts));
    assert!(!hc05.handle_new_connection().unwrap());
}

#[test]
fn clock_is_untouched_by_plain_reads() {
    let (mut hc05, handle, clock) = driver(Tracking::Urc, None);
    handle.inject(b"data\r\n");
    drain(&mut hc05);
    assert_eq!(clock.now_ms(), 0);
}
