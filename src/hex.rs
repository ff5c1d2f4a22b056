//! Uppercase hex digit decoding.

use crate::error::{Hc05Error, Result};

/// Decode one uppercase hex digit (`0-9`, `A-F`) to its nibble value.
///
/// The module is only known to emit uppercase digits, so lowercase is
/// rejected along with anything else outside the range.
pub fn parse_hex_nibble(hex: u8) -> Result<u8> {
    match hex {
        b'0'..=b'9' => Ok(hex - b'0'),
        // 'A' sits 7 code points past '9' + 1
        b'A'..=b'F' => Ok(hex - b'0' - 7),
        _ => Err(Hc05Error::InvalidHexDigit(hex as char)),
    }
}

/// Decode a pair of hex digits, high nibble first
pub fn parse_hex_byte(high: u8, low: u8) -> Result<u8> {
    Ok((parse_hex_nibble(high)? << 4) | parse_hex_nibble(low)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_digits_map_to_zero_through_nine() {
        for (i, c) in (b'0'..=b'9').enumerate() {
            assert_eq!(parse_hex_nibble(c).unwrap(), i as u8);
        }
    }

    #[test]
    fn uppercase_letters_map_to_ten_through_fifteen() {
        for (i, c) in (b'A'..=b'F').enumerate() {
            assert_eq!(parse_hex_nibble(c).unwrap(), 10 + i as u8);
        }
    }

    #[test]
    fn lowercase_and_out_of_range_are_rejected() {
        for c in [b'a', b'f', b'G', b':', b'@', b' ', 0xFF] {
            assert!(
                matches!(parse_hex_nibble(c), Err(Hc05Error::InvalidHexDigit(_))),
                "{c:#04x} should be rejected"
            );
        }
    }

    #[test]
    fn byte_combines_high_and_low() {
        assert_eq!(parse_hex_byte(b'D', b'E').unwrap(), 0xDE);
        assert_eq!(parse_hex_byte(b'0', b'9').unwrap(), 0x09);
    }
}
