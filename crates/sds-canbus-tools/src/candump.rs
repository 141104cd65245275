//! Capture-line parsing into typed diagnostic messages.
//!
//! Input is one candump-style log line:
//!
//! ```text
//! <interface> <arbitration-id-hex> [<declared-size>] <byte> <byte> ...
//! ```
//!
//! The declared size may appear bracketed (`[3]`) or bare (`3`) and each
//! payload field is exactly two hex digits. Lines with fewer than four
//! fields are non-message log noise and parse to `Ok(None)`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sds_protocol::{Direction, Ecu};

use crate::error::{SdsError, SdsResult};
use crate::packet::Packet;

/// One parsed capture-log message. Immutable; built per line and
/// discarded by the caller after use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// CAN interface name as logged (e.g. "can0").
    pub interface: String,
    /// Full arbitration ID, including the direction nibble.
    pub arbitration_id: u32,
    pub ecu: Ecu,
    pub direction: Direction,
    /// Size field as read from the log. Stored, never cross-checked
    /// against the payload length.
    pub declared_size: usize,
    pub packet: Packet,
}

impl Message {
    /// Parse one capture line. `Ok(None)` means the line is not a message
    /// (fewer than four fields); decode failures on an actual message
    /// propagate as errors.
    pub fn parse_line(line: &str) -> SdsResult<Option<Message>> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            debug!(field_count = fields.len(), "skipping non-message line");
            return Ok(None);
        }

        let interface = fields[0].to_string();
        let arbitration_id = parse_arbitration_id(fields[1])?;
        let declared_size = parse_declared_size(fields[2])?;
        let payload = fields[3..]
            .iter()
            .map(|field| parse_payload_byte(field))
            .collect::<SdsResult<Vec<u8>>>()?;

        let (ecu, direction) = Ecu::from_arbitration_id(arbitration_id)
            .map_err(|_| SdsError::UnknownEcu { id: arbitration_id })?;
        let packet = Packet::decode(&payload)?;

        Ok(Some(Message {
            interface,
            arbitration_id,
            ecu,
            direction,
            declared_size,
            packet,
        }))
    }

    /// One-line human rendering: direction arrow, interface, ECU, packet.
    pub fn describe(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.direction,
            self.interface,
            self.ecu,
            self.packet.describe()
        )
    }
}

/// Hex arbitration ID, with or without a `0x` prefix.
fn parse_arbitration_id(field: &str) -> SdsResult<u32> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u32::from_str_radix(digits, 16).map_err(|_| SdsError::InvalidField {
        field: "arbitration id",
        value: field.to_string(),
    })
}

/// Declared size, bare (`3`) or bracket-wrapped (`[3]`).
fn parse_declared_size(field: &str) -> SdsResult<usize> {
    let bare = field
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(field);
    bare.parse().map_err(|_| SdsError::InvalidField {
        field: "declared size",
        value: field.to_string(),
    })
}

/// One payload byte: exactly two hex digits.
fn parse_payload_byte(field: &str) -> SdsResult<u8> {
    if field.len() != 2 {
        return Err(SdsError::InvalidField {
            field: "payload byte",
            value: field.to_string(),
        });
    }
    u8::from_str_radix(field, 16).map_err(|_| SdsError::InvalidField {
        field: "payload byte",
        value: field.to_string(),
    })
}
