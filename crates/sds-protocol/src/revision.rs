//! Wire-framing revisions.
//!
//! Two divergent revisions of the framing logic exist in captured target
//! firmware, and which one a given ECU actually speaks has not been
//! confirmed. Both are kept as explicit named configurations; callers must
//! pick one rather than the library guessing.
//!
//! The revisions differ in exactly three wire details:
//! - the Transfer Data sub-function code for "download and execute"
//!   (0x01 vs 0x80),
//! - the byte order of the 4-byte destination address in Transfer Data
//!   frames (little- vs big-endian),
//! - whether Read Memory By Address requests carry the oversized 0x10
//!   discriminator that skips the receiver's length check (RevA) or the
//!   true default length byte (RevB).

use serde::{Deserialize, Serialize};

use crate::UnknownCode;

/// Which of the two observed framing revisions to build frames for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireRevision {
    /// Capture-era firmware: execute selector 0x01, little-endian transfer
    /// addresses, memory reads sent with the 0x10 length-check bypass.
    RevA,
    /// Later firmware: execute selector 0x80, big-endian transfer
    /// addresses, memory reads with the true length byte.
    RevB,
}

impl WireRevision {
    /// Whether memory reads use the oversized 0x10 discriminator.
    pub const fn read_memory_bypass(self) -> bool {
        matches!(self, WireRevision::RevA)
    }

    /// Whether Transfer Data destination addresses go out big-endian.
    pub const fn transfer_address_big_endian(self) -> bool {
        matches!(self, WireRevision::RevB)
    }
}

/// Sub-function selector for the Transfer Data service. Wire codes are
/// revision-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTransferFunction {
    /// Store the transferred chunk at the destination address.
    Download,
    /// Store the chunk, then jump to the destination address.
    DownloadAndExecute,
}

impl DataTransferFunction {
    pub const fn code(self, revision: WireRevision) -> u8 {
        match (self, revision) {
            (DataTransferFunction::Download, _) => 0x00,
            (DataTransferFunction::DownloadAndExecute, WireRevision::RevA) => 0x01,
            (DataTransferFunction::DownloadAndExecute, WireRevision::RevB) => 0x80,
        }
    }

    pub fn from_code(code: u8, revision: WireRevision) -> Result<Self, UnknownCode> {
        match (code, revision) {
            (0x00, _) => Ok(DataTransferFunction::Download),
            (0x01, WireRevision::RevA) | (0x80, WireRevision::RevB) => {
                Ok(DataTransferFunction::DownloadAndExecute)
            }
            (other, _) => Err(UnknownCode {
                table: "data transfer function",
                code: other as u16,
            }),
        }
    }
}
