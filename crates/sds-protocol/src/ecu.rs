//! ECU addressing: base arbitration IDs and message direction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::UnknownCode;

/// Mask isolating the ECU base address from a full arbitration ID.
pub const ECU_BASE_MASK: u32 = 0xFF0;

/// Electronic Control Units addressed by this protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecu {
    /// Body Control Module (base 0x7C0).
    Bcm,
    /// Engine Control Module (base 0x7E0).
    Ecm,
}

impl Ecu {
    /// Base arbitration ID of this module (low nibble zeroed).
    pub const fn base(self) -> u32 {
        match self {
            Ecu::Bcm => 0x7C0,
            Ecu::Ecm => 0x7E0,
        }
    }

    /// Look up a module by its base address.
    pub fn from_base(base: u32) -> Result<Self, UnknownCode> {
        match base {
            0x7C0 => Ok(Ecu::Bcm),
            0x7E0 => Ok(Ecu::Ecm),
            other => Err(UnknownCode {
                table: "ECU",
                code: other as u16,
            }),
        }
    }

    /// Derive module and direction from a full arbitration ID.
    ///
    /// The low nibble encodes direction: 0 is a request to the ECU,
    /// anything else is a response from it.
    pub fn from_arbitration_id(id: u32) -> Result<(Self, Direction), UnknownCode> {
        let ecu = Self::from_base(id & ECU_BASE_MASK)?;
        let direction = if id & 0xF == 0 {
            Direction::Request
        } else {
            Direction::Response
        };
        Ok((ecu, direction))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Ecu::Bcm => "BCM",
            Ecu::Ecm => "ECM",
        }
    }
}

impl fmt::Display for Ecu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a captured message relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Host to ECU.
    Request,
    /// ECU to host.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Arrows as rendered in capture-log output.
        match self {
            Direction::Request => f.write_str("⟶"),
            Direction::Response => f.write_str("⟵"),
        }
    }
}
