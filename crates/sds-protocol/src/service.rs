//! Diagnostic service catalog and the response/failure code tables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::UnknownCode;

/// Diagnostic services supported by the target ECU firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    InitiateDiagnosticSession,
    ReturnToNormal,
    SecurityAccess,
    ReadMemoryByAddress,
    ReadDidById,
    ProgrammingMode,
    RequestDownload,
    TransferData,
}

/// All services, in code order. Handy for exhaustive catalog tests.
pub const ALL_SERVICES: [Service; 8] = [
    Service::InitiateDiagnosticSession,
    Service::ReturnToNormal,
    Service::SecurityAccess,
    Service::ReadMemoryByAddress,
    Service::ReadDidById,
    Service::ProgrammingMode,
    Service::RequestDownload,
    Service::TransferData,
];

impl Service {
    pub const fn code(self) -> u8 {
        match self {
            Service::InitiateDiagnosticSession => 0x20,
            Service::ReturnToNormal => 0x21,
            Service::SecurityAccess => 0x22,
            Service::ReadMemoryByAddress => 0x23,
            Service::ReadDidById => 0x24,
            Service::ProgrammingMode => 0x25,
            Service::RequestDownload => 0x26,
            Service::TransferData => 0x27,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x20 => Ok(Service::InitiateDiagnosticSession),
            0x21 => Ok(Service::ReturnToNormal),
            0x22 => Ok(Service::SecurityAccess),
            0x23 => Ok(Service::ReadMemoryByAddress),
            0x24 => Ok(Service::ReadDidById),
            0x25 => Ok(Service::ProgrammingMode),
            0x26 => Ok(Service::RequestDownload),
            0x27 => Ok(Service::TransferData),
            other => Err(UnknownCode {
                table: "service",
                code: other as u16,
            }),
        }
    }

    /// The positive response the ECU answers this service with
    /// (service code + 0x40).
    pub const fn success_response(self) -> ResponseType {
        match self {
            Service::InitiateDiagnosticSession => ResponseType::InitiateDiagnosticSessionSuccess,
            Service::ReturnToNormal => ResponseType::ReturnToNormalSuccess,
            Service::SecurityAccess => ResponseType::SecurityAccessSuccess,
            Service::ReadMemoryByAddress => ResponseType::ReadMemoryByAddressSuccess,
            Service::ReadDidById => ResponseType::ReadDidByIdSuccess,
            Service::ProgrammingMode => ResponseType::ProgrammingModeSuccess,
            Service::RequestDownload => ResponseType::RequestDownloadSuccess,
            Service::TransferData => ResponseType::TransferDataSuccess,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::InitiateDiagnosticSession => "Initiate Diagnostic Session",
            Service::ReturnToNormal => "Return To Normal",
            Service::SecurityAccess => "Security Access",
            Service::ReadMemoryByAddress => "Read Memory By Address",
            Service::ReadDidById => "Read DID By ID",
            Service::ProgrammingMode => "Programming Mode",
            Service::RequestDownload => "Request Download",
            Service::TransferData => "Transfer Data",
        };
        f.write_str(name)
    }
}

/// Response classification byte: one success code per service plus the
/// generic failure marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InitiateDiagnosticSessionSuccess,
    ReturnToNormalSuccess,
    SecurityAccessSuccess,
    ReadMemoryByAddressSuccess,
    ReadDidByIdSuccess,
    ProgrammingModeSuccess,
    RequestDownloadSuccess,
    TransferDataSuccess,
    Failure,
}

impl ResponseType {
    pub const fn code(self) -> u8 {
        match self {
            ResponseType::InitiateDiagnosticSessionSuccess => 0x60,
            ResponseType::ReturnToNormalSuccess => 0x61,
            ResponseType::SecurityAccessSuccess => 0x62,
            ResponseType::ReadMemoryByAddressSuccess => 0x63,
            ResponseType::ReadDidByIdSuccess => 0x64,
            ResponseType::ProgrammingModeSuccess => 0x65,
            ResponseType::RequestDownloadSuccess => 0x66,
            ResponseType::TransferDataSuccess => 0x67,
            ResponseType::Failure => 0x7F,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x60 => Ok(ResponseType::InitiateDiagnosticSessionSuccess),
            0x61 => Ok(ResponseType::ReturnToNormalSuccess),
            0x62 => Ok(ResponseType::SecurityAccessSuccess),
            0x63 => Ok(ResponseType::ReadMemoryByAddressSuccess),
            0x64 => Ok(ResponseType::ReadDidByIdSuccess),
            0x65 => Ok(ResponseType::ProgrammingModeSuccess),
            0x66 => Ok(ResponseType::RequestDownloadSuccess),
            0x67 => Ok(ResponseType::TransferDataSuccess),
            0x7F => Ok(ResponseType::Failure),
            other => Err(UnknownCode {
                table: "response type",
                code: other as u16,
            }),
        }
    }

    pub const fn is_failure(self) -> bool {
        matches!(self, ResponseType::Failure)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseType::InitiateDiagnosticSessionSuccess => "Initiate Diagnostic Session Success",
            ResponseType::ReturnToNormalSuccess => "Return To Normal Success",
            ResponseType::SecurityAccessSuccess => "Security Access Success",
            ResponseType::ReadMemoryByAddressSuccess => "Read Memory By Address Success",
            ResponseType::ReadDidByIdSuccess => "Read DID By ID Success",
            ResponseType::ProgrammingModeSuccess => "Programming Mode Success",
            ResponseType::RequestDownloadSuccess => "Request Download Success",
            ResponseType::TransferDataSuccess => "Transfer Data Success",
            ResponseType::Failure => "Failure",
        };
        f.write_str(name)
    }
}

/// Negative-response reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ServiceNotSupported,
    SubFunctionNotSupported,
    ConditionsNotCorrect,
    RequestOutOfRange,
    InvalidKey,
    ExceededNumberOfAttempts,
}

impl FailureReason {
    pub const fn code(self) -> u8 {
        match self {
            FailureReason::ServiceNotSupported => 0x11,
            FailureReason::SubFunctionNotSupported => 0x12,
            FailureReason::ConditionsNotCorrect => 0x13,
            FailureReason::RequestOutOfRange => 0x14,
            FailureReason::InvalidKey => 0x15,
            FailureReason::ExceededNumberOfAttempts => 0x16,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x11 => Ok(FailureReason::ServiceNotSupported),
            0x12 => Ok(FailureReason::SubFunctionNotSupported),
            0x13 => Ok(FailureReason::ConditionsNotCorrect),
            0x14 => Ok(FailureReason::RequestOutOfRange),
            0x15 => Ok(FailureReason::InvalidKey),
            0x16 => Ok(FailureReason::ExceededNumberOfAttempts),
            other => Err(UnknownCode {
                table: "failure reason",
                code: other as u16,
            }),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::ServiceNotSupported => "Service Not Supported",
            FailureReason::SubFunctionNotSupported => "Sub Function Not Supported",
            FailureReason::ConditionsNotCorrect => "Conditions Not Correct",
            FailureReason::RequestOutOfRange => "Request Out Of Range",
            FailureReason::InvalidKey => "Invalid Key",
            FailureReason::ExceededNumberOfAttempts => "Exceeded Number Of Attempts",
        };
        f.write_str(name)
    }
}

/// ECU operating modes selectable via Initiate Diagnostic Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcuMode {
    Default,
    Diagnostic,
    DeviceControl,
}

impl EcuMode {
    pub const fn code(self) -> u8 {
        match self {
            EcuMode::Default => 0x01,
            EcuMode::Diagnostic => 0x02,
            EcuMode::DeviceControl => 0x03,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x01 => Ok(EcuMode::Default),
            0x02 => Ok(EcuMode::Diagnostic),
            0x03 => Ok(EcuMode::DeviceControl),
            other => Err(UnknownCode {
                table: "ECU mode",
                code: other as u16,
            }),
        }
    }
}

impl fmt::Display for EcuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EcuMode::Default => "Default",
            EcuMode::Diagnostic => "Diagnostic",
            EcuMode::DeviceControl => "Device Control",
        };
        f.write_str(name)
    }
}

/// Sub-function selector for the Security Access seed/key handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAccessFunction {
    Seed,
    Key,
}

impl SecurityAccessFunction {
    pub const fn code(self) -> u8 {
        match self {
            SecurityAccessFunction::Seed => 0x01,
            SecurityAccessFunction::Key => 0x02,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x01 => Ok(SecurityAccessFunction::Seed),
            0x02 => Ok(SecurityAccessFunction::Key),
            other => Err(UnknownCode {
                table: "security access function",
                code: other as u16,
            }),
        }
    }
}

/// Known Data Identifier indices readable via Read DID By ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Did {
    Author,
    Manufacturer,
    Year,
    Vin,
}

impl Did {
    pub const fn code(self) -> u8 {
        match self {
            Did::Author => 0x00,
            Did::Manufacturer => 0x01,
            Did::Year => 0x02,
            Did::Vin => 0x03,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x00 => Ok(Did::Author),
            0x01 => Ok(Did::Manufacturer),
            0x02 => Ok(Did::Year),
            0x03 => Ok(Did::Vin),
            other => Err(UnknownCode {
                table: "DID",
                code: other as u16,
            }),
        }
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Did::Author => "Author",
            Did::Manufacturer => "Manufacturer",
            Did::Year => "Year",
            Did::Vin => "VIN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_codes_round_trip() {
        for service in ALL_SERVICES {
            assert_eq!(Service::from_code(service.code()).unwrap(), service);
        }
    }

    #[test]
    fn success_response_is_code_plus_0x40() {
        for service in ALL_SERVICES {
            assert_eq!(service.success_response().code(), service.code() + 0x40);
        }
    }

    #[test]
    fn unknown_service_code() {
        let err = Service::from_code(0x28).unwrap_err();
        assert_eq!(err.table, "service");
        assert_eq!(err.code, 0x28);
    }

    #[test]
    fn response_failure_marker() {
        assert_eq!(ResponseType::from_code(0x7F).unwrap(), ResponseType::Failure);
        assert!(ResponseType::Failure.is_failure());
        assert!(!ResponseType::SecurityAccessSuccess.is_failure());
    }

    #[test]
    fn unknown_response_code() {
        assert!(ResponseType::from_code(0x68).is_err());
        assert!(ResponseType::from_code(0x30).is_err());
    }

    #[test]
    fn failure_reason_codes_round_trip() {
        for code in 0x11..=0x16u8 {
            assert_eq!(FailureReason::from_code(code).unwrap().code(), code);
        }
        assert!(FailureReason::from_code(0x17).is_err());
    }

    #[test]
    fn mode_and_subfunction_tables() {
        assert_eq!(EcuMode::from_code(0x02).unwrap(), EcuMode::Diagnostic);
        assert!(EcuMode::from_code(0x04).is_err());
        assert_eq!(
            SecurityAccessFunction::from_code(0x01).unwrap(),
            SecurityAccessFunction::Seed
        );
        assert!(SecurityAccessFunction::from_code(0x03).is_err());
        assert_eq!(Did::from_code(0x03).unwrap(), Did::Vin);
        assert!(Did::from_code(0x04).is_err());
    }

    #[test]
    fn display_names_use_spaces() {
        assert_eq!(
            Service::InitiateDiagnosticSession.to_string(),
            "Initiate Diagnostic Session"
        );
        assert_eq!(FailureReason::InvalidKey.to_string(), "Invalid Key");
        assert_eq!(EcuMode::DeviceControl.to_string(), "Device Control");
    }

    #[test]
    fn serde_snake_case_names() {
        assert_eq!(
            serde_json::to_string(&Service::SecurityAccess).unwrap(),
            "\"security_access\""
        );
        assert_eq!(
            serde_json::to_string(&FailureReason::RequestOutOfRange).unwrap(),
            "\"request_out_of_range\""
        );
    }
}
