//! Connection state machine driven by unsolicited result codes.
//!
//! Every chunk the driver reads is passed through [`UrcTracker::observe`]
//! before the caller sees it. Transitions:
//!
//! - `+CONNECTING`   : `Idle -> Connecting`
//! - `CONNECTED`     : `Connecting -> Connected` (ignored in any other state)
//! - `+DISC:SUCCESS` : any state `-> Idle`
//!
//! Markers are applied in the order they appear in the chunk. A marker split
//! across two reads is not recognised.

use crate::constants::{URC_CONNECTED, URC_CONNECTING, URC_DISCONNECTED};
use crate::mac::decode_notification;
use crate::types::{ConnectionState, MacAddress};

/// A state change caused by a result code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrcEvent {
    /// Peer is connecting; carries its address when the notification was complete
    Connecting(Option<MacAddress>),
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Default)]
pub struct UrcTracker {
    state: ConnectionState,
}

impl UrcTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Force the state back to `Idle` (local disconnect or module reset)
    pub fn reset(&mut self) {
        self.state = ConnectionState::Idle;
    }

    /// Scan `data` for result codes and apply them.
    /// Returns only the markers that actually changed the state.
    pub fn observe(&mut self, data: &[u8]) -> Vec<UrcEvent> {
        let mut markers: Vec<(usize, Marker)> = find_all(data, URC_CONNECTING)
            .map(|pos| (pos, Marker::Connecting))
            .chain(find_all(data, URC_CONNECTED).map(|pos| (pos, Marker::Connected)))
            .chain(find_all(data, URC_DISCONNECTED).map(|pos| (pos, Marker::Disconnected)))
            .collect();
        markers.sort_by_key(|&(pos, _)| pos);

        let mut events = Vec::new();
        for (pos, marker) in markers {
            match (marker, self.state) {
                (Marker::Connecting, ConnectionState::Idle) => {
                    self.state = ConnectionState::Connecting;
                    let peer = decode_notification(line_at(data, pos)).ok();
                    events.push(UrcEvent::Connecting(peer));
                }
                (Marker::Connected, ConnectionState::Connecting) => {
                    self.state = ConnectionState::Connected;
                    events.push(UrcEvent::Connected);
                }
                (Marker::Disconnected, ConnectionState::Connecting | ConnectionState::Connected) => {
                    self.state = ConnectionState::Idle;
                    events.push(UrcEvent::Disconnected);
                }
                _ => {}
            }
        }
        events
    }
}

fn find_all<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(|(pos, _)| pos)
}

/// The rest of the line starting at `pos`
fn line_at(data: &[u8], pos: usize) -> &[u8] {
    let rest = &data[pos..];
    let end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(rest.len());
    &rest[..end]
}
