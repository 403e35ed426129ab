use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::GatewayError;
use crate::protocol::Encoding;

/// First line of every binary read
pub const BINARY_MARKER: &str = "[Binary file - Base64 encoded]";

/// Turn file bytes into the content string for `encoding`. Text codecs are
/// strict: undecodable input is an error, never replaced.
pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, GatewayError> {
    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| GatewayError::Decode {
            encoding: encoding.label(),
            reason: format!(
                "invalid byte sequence at offset {}",
                e.utf8_error().valid_up_to()
            ),
        }),
        Encoding::Ascii => {
            if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                return Err(GatewayError::Decode {
                    encoding: encoding.label(),
                    reason: format!("byte 0x{:02x} at offset {} is out of range", bytes[pos], pos),
                });
            }
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        // Every byte is a valid code point U+0000..=U+00FF
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        Encoding::Binary => Ok(format!("{}\n{}", BINARY_MARKER, STANDARD.encode(bytes))),
    }
}

/// Turn text into bytes for writing
pub fn encode(text: &str, encoding: Encoding) -> Result<Vec<u8>, GatewayError> {
    match encoding {
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Ascii => narrow(text, encoding, 0x7f),
        Encoding::Latin1 => narrow(text, encoding, 0xff),
        Encoding::Binary => Err(GatewayError::invalid_argument(
            "binary encoding is only supported for reading",
        )),
    }
}

fn narrow(text: &str, encoding: Encoding, max: u32) -> Result<Vec<u8>, GatewayError> {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            if (c as u32) <= max {
                Ok(c as u32 as u8)
            } else {
                Err(GatewayError::Encode {
                    encoding: encoding.label(),
                    reason: format!("character {:?} at position {} is out of range", c, i),
                })
            }
        })
        .collect()
}
