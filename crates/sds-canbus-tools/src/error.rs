//! Codec and transport error types.

use thiserror::Error;

/// Errors surfaced by the frame codec, capture-line parser, request
/// builders, and the transport seam.
///
/// A capture line with fewer than four fields is not represented here:
/// that is the `Ok(None)` "no message" parse outcome, since capture logs
/// routinely contain non-message lines.
#[derive(Debug, Error)]
pub enum SdsError {
    /// Frame too short or shapeless to classify at all.
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    /// Declared length exceeds the bytes actually present.
    #[error("truncated packet: need {needed} bytes, only {available} available")]
    TruncatedPacket { needed: usize, available: usize },

    #[error("unknown service code 0x{code:02X}")]
    UnknownService { code: u8 },

    #[error("unknown response code 0x{code:02X}")]
    UnknownResponseCode { code: u8 },

    #[error("unknown failure reason code 0x{code:02X}")]
    UnknownFailureReason { code: u8 },

    #[error("arbitration ID 0x{id:03X} does not address a known ECU")]
    UnknownEcu { id: u32 },

    /// First byte is outside both the command range and the flow-control
    /// markers.
    #[error("unrecognized control-flow type byte 0x{byte:02X}")]
    UnrecognizedControlFlowType { byte: u8 },

    /// A capture-line field that should be numeric failed to parse.
    #[error("unparseable {field} field: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Payload too large for a single command frame; use the segmentation
    /// path instead.
    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Segmentation protocol violation (frame out of order, etc.).
    #[error("flow-control transfer error: {0}")]
    Transfer(String),

    /// Miss against one of the closed protocol code tables.
    #[error(transparent)]
    UnknownCode(#[from] sds_protocol::UnknownCode),

    #[error("CAN interface error: {0}")]
    Interface(String),

    #[error("response timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Convenience alias for codec results.
pub type SdsResult<T> = Result<T, SdsError>;
