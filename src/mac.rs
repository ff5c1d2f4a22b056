//! Peer address extraction from the connection notification.
//!
//! The module announces a peer with a fixed-layout line:
//!
//! ```text
//! +CONNECTING<<DE:AD:BE:EF:00:11
//! ^            ^
//! 0            13
//! ```
//!
//! Offsets and lengths encode the wire format and are kept here only.

use crate::constants::{MAC_OFFSET, MAC_STRIDE, NOTIFICATION_MIN_LEN};
use crate::error::{Hc05Error, Result};
use crate::hex::parse_hex_byte;
use crate::types::MacAddress;

/// Decode the peer address from a connection notification line.
///
/// The line must hold at least [`NOTIFICATION_MIN_LEN`] bytes; anything after
/// that (trailing `\r`, padding) is ignored.
pub fn decode_notification(line: &[u8]) -> Result<MacAddress> {
    if line.len() < NOTIFICATION_MIN_LEN {
        return Err(Hc05Error::MalformedNotification { length: line.len() });
    }

    let mut mac = [0u8; 6];
    for (byte_index, byte) in mac.iter_mut().enumerate() {
        let i = MAC_OFFSET + byte_index * MAC_STRIDE;
        *byte = parse_hex_byte(line[i], line[i + 1])?;
    }
    Ok(MacAddress(mac))
}
