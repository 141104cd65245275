//! Frame codec: typed diagnostic packets and their wire layout.
//!
//! The first byte of every frame discriminates its shape:
//!
//! - `0x00..=0x0F` — command frame; the byte is the declared packet length
//!   and the following byte selects request / response / failure.
//! - `0x10` — flow-control request announcing a segmented transfer.
//! - `0x20..=0x2F` — flow-control continuation frame; the low nibble is a
//!   running sequence index.
//! - `0x30` — flow-control continue (clear-to-send).
//! - `0x11..=0x1F`, `0x31..=0xFF` — outside the framing scheme, rejected.
//!
//! Decode and encode are pure functions; no state is retained between
//! calls and no references into caller buffers survive a call.

use serde::{Deserialize, Serialize};
use tracing::trace;

use sds_protocol::{FailureReason, ResponseType, Service};

use crate::error::{SdsError, SdsResult};

/// Highest first byte still classified as a command frame.
pub const MAX_COMMAND_DISCRIMINATOR: u8 = 0x0F;

/// Marker announcing a segmented transfer.
pub const FLOW_CONTROL_REQUEST: u8 = 0x10;

/// Upper-nibble tag of a continuation frame.
pub const FLOW_CONTROL_FRAME_TAG: u8 = 0x20;

/// Clear-to-send marker emitted by the receiving side.
pub const FLOW_CONTROL_CONTINUE: u8 = 0x30;

/// Negative-response marker inside a command frame.
pub const FAILURE_MARKER: u8 = 0x7F;

/// A continuation frame carries exactly this many payload bytes.
pub const FLOW_CONTROL_FRAME_LEN: usize = 7;

/// Maximum initial-chunk bytes carried alongside a transfer announcement.
pub const FLOW_CONTROL_REQUEST_MAX_INITIAL: usize = 5;

/// One decoded diagnostic frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Packet {
    /// Host-to-ECU service invocation.
    CommandRequest { service: Service, payload: Vec<u8> },
    /// ECU reply carrying a response classification byte.
    CommandResponse {
        response: ResponseType,
        payload: Vec<u8>,
    },
    /// Negative response: always exactly two bytes after the 0x7F marker.
    CommandFailure {
        failed_service: Service,
        reason: FailureReason,
    },
    /// Transfer announcement: total length plus the first few bytes.
    FlowControlRequest {
        declared_length: u8,
        initial_payload: Vec<u8>,
    },
    /// 7-byte continuation chunk. The sequence index is the low nibble of
    /// the type byte and is kept so re-encoding reproduces the wire bytes.
    FlowControlFrame {
        sequence: u8,
        payload: [u8; FLOW_CONTROL_FRAME_LEN],
    },
    /// Zero-length clear-to-send acknowledgment.
    FlowControlContinue,
}

impl Packet {
    /// Decode a raw CAN payload into a typed packet.
    pub fn decode(bytes: &[u8]) -> SdsResult<Packet> {
        let (&b0, rest) = bytes
            .split_first()
            .ok_or(SdsError::MalformedPacket("empty frame"))?;
        match b0 {
            // 0x00–0x0F: command path, b0 is the declared packet length.
            0x00..=MAX_COMMAND_DISCRIMINATOR => Self::decode_command(b0, rest),
            // 0x10: transfer announcement.
            FLOW_CONTROL_REQUEST => Self::decode_flow_control_request(rest),
            // 0x20–0x2F: continuation frame, low nibble is the sequence.
            b if b & 0xF0 == FLOW_CONTROL_FRAME_TAG => Self::decode_flow_control_frame(b, rest),
            // 0x30: clear-to-send. Trailing pad bytes are ignored.
            FLOW_CONTROL_CONTINUE => Ok(Packet::FlowControlContinue),
            // 0x11–0x1F and 0x31–0xFF: no assigned meaning.
            other => Err(SdsError::UnrecognizedControlFlowType { byte: other }),
        }
    }

    fn decode_command(declared: u8, rest: &[u8]) -> SdsResult<Packet> {
        let declared = declared as usize;
        if rest.len() < declared {
            return Err(SdsError::TruncatedPacket {
                needed: declared,
                available: rest.len(),
            });
        }
        if rest.len() > declared {
            // Bytes past the declared length are bus padding, not an error.
            trace!(
                excess = rest.len() - declared,
                "dropping bytes beyond declared command length"
            );
        }
        let body = &rest[..declared];
        let (&b1, payload) = body
            .split_first()
            .ok_or(SdsError::MalformedPacket("command frame with declared length 0"))?;
        match b1 {
            FAILURE_MARKER => {
                // Failure body is exactly two bytes: service then reason.
                if payload.len() < 2 {
                    return Err(SdsError::TruncatedPacket {
                        needed: 3,
                        available: body.len(),
                    });
                }
                let failed_service = Service::from_code(payload[0])
                    .map_err(|_| SdsError::UnknownService { code: payload[0] })?;
                let reason = FailureReason::from_code(payload[1])
                    .map_err(|_| SdsError::UnknownFailureReason { code: payload[1] })?;
                Ok(Packet::CommandFailure {
                    failed_service,
                    reason,
                })
            }
            // Service codes all sit below the 0x30 control-flow floor.
            code if code < FLOW_CONTROL_CONTINUE => {
                let service =
                    Service::from_code(code).map_err(|_| SdsError::UnknownService { code })?;
                Ok(Packet::CommandRequest {
                    service,
                    payload: payload.to_vec(),
                })
            }
            code => {
                let response = ResponseType::from_code(code)
                    .map_err(|_| SdsError::UnknownResponseCode { code })?;
                Ok(Packet::CommandResponse {
                    response,
                    payload: payload.to_vec(),
                })
            }
        }
    }

    fn decode_flow_control_request(rest: &[u8]) -> SdsResult<Packet> {
        let (&declared_length, chunk) = rest.split_first().ok_or(SdsError::TruncatedPacket {
            needed: 1,
            available: 0,
        })?;
        let take = chunk.len().min(FLOW_CONTROL_REQUEST_MAX_INITIAL);
        if chunk.len() > take {
            trace!(
                excess = chunk.len() - take,
                "dropping bytes beyond initial-chunk limit"
            );
        }
        Ok(Packet::FlowControlRequest {
            declared_length,
            initial_payload: chunk[..take].to_vec(),
        })
    }

    fn decode_flow_control_frame(b0: u8, rest: &[u8]) -> SdsResult<Packet> {
        if rest.len() < FLOW_CONTROL_FRAME_LEN {
            return Err(SdsError::TruncatedPacket {
                needed: FLOW_CONTROL_FRAME_LEN,
                available: rest.len(),
            });
        }
        let mut payload = [0u8; FLOW_CONTROL_FRAME_LEN];
        payload.copy_from_slice(&rest[..FLOW_CONTROL_FRAME_LEN]);
        Ok(Packet::FlowControlFrame {
            sequence: b0 & 0x0F,
            payload,
        })
    }

    /// Encode the packet back into wire bytes — the structural inverse of
    /// [`Packet::decode`].
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Packet::CommandRequest { service, payload } => {
                let mut out = Vec::with_capacity(2 + payload.len());
                out.push(1 + payload.len() as u8);
                out.push(service.code());
                out.extend_from_slice(payload);
                out
            }
            Packet::CommandResponse { response, payload } => {
                let mut out = Vec::with_capacity(2 + payload.len());
                out.push(1 + payload.len() as u8);
                out.push(response.code());
                out.extend_from_slice(payload);
                out
            }
            Packet::CommandFailure {
                failed_service,
                reason,
            } => vec![0x03, FAILURE_MARKER, failed_service.code(), reason.code()],
            Packet::FlowControlRequest {
                declared_length,
                initial_payload,
            } => {
                let mut out = Vec::with_capacity(2 + initial_payload.len());
                out.push(FLOW_CONTROL_REQUEST);
                out.push(*declared_length);
                out.extend_from_slice(initial_payload);
                out
            }
            Packet::FlowControlFrame { sequence, payload } => {
                let mut out = Vec::with_capacity(1 + FLOW_CONTROL_FRAME_LEN);
                out.push(FLOW_CONTROL_FRAME_TAG | (sequence & 0x0F));
                out.extend_from_slice(payload);
                out
            }
            Packet::FlowControlContinue => vec![FLOW_CONTROL_CONTINUE],
        }
    }

    /// One-line human rendering for log display. Presentation lives here,
    /// in one exhaustive match, rather than on each variant.
    pub fn describe(&self) -> String {
        match self {
            Packet::CommandRequest { service, payload } => {
                format!("{service} {}", hex_string(payload))
            }
            Packet::CommandResponse { response, payload } => {
                format!("{response} {}", hex_string(payload))
            }
            Packet::CommandFailure {
                failed_service,
                reason,
            } => format!("Failure: {failed_service} - {reason}"),
            Packet::FlowControlRequest {
                declared_length,
                initial_payload,
            } => format!(
                "Flow Control Request: {declared_length} bytes, initial {}",
                hex_string(initial_payload)
            ),
            Packet::FlowControlFrame { sequence, payload } => {
                format!("Flow Control Frame #{sequence} {}", hex_string(payload))
            }
            Packet::FlowControlContinue => "Flow Control Continue".to_string(),
        }
    }
}

/// Lowercase contiguous hex, matching CAN send-line conventions.
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
