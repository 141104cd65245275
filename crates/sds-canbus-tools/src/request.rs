//! Outgoing request construction for the fixed diagnostic catalog.
//!
//! Each builder assembles the full raw frame buffer up front: the
//! length/type discriminator byte, the service byte, and the payload.
//! The discriminator defaults to `1 + payload length` but stays exposed
//! as an explicit override because several canonical operations put a
//! deliberately oversized value there — certain receiver firmware skips
//! its length check when the discriminator is the 0x10 flow-control
//! marker, and those exact bytes must be reproduced for wire
//! compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use sds_protocol::{
    DataTransferFunction, Did, Ecu, EcuMode, SecurityAccessFunction, Service, WireRevision,
};

use crate::error::{SdsError, SdsResult};
use crate::packet::{
    FLOW_CONTROL_CONTINUE, FLOW_CONTROL_REQUEST, FLOW_CONTROL_REQUEST_MAX_INITIAL,
    MAX_COMMAND_DISCRIMINATOR, hex_string,
};

/// Interface most builders are used with.
pub const DEFAULT_INTERFACE: &str = "can0";

/// One fully assembled outgoing frame. Built once, rendered, discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub ecu: Ecu,
    pub interface: String,
    /// Raw frame bytes: discriminator, service byte, payload.
    pub data: Vec<u8>,
}

impl Request {
    /// Assemble a command frame for `service`.
    ///
    /// Without an override the discriminator is `1 + payload.len()` (the 1
    /// covers the service byte) and must fit the 0x0F command ceiling —
    /// larger payloads belong on the segmentation path. An explicit
    /// override is passed through verbatim.
    pub fn command(
        ecu: Ecu,
        interface: &str,
        service: Service,
        discriminator: Option<u8>,
        payload: &[u8],
    ) -> SdsResult<Request> {
        let discriminator = match discriminator {
            Some(value) => value,
            None => {
                let declared = 1 + payload.len();
                if declared > MAX_COMMAND_DISCRIMINATOR as usize {
                    return Err(SdsError::PayloadTooLarge {
                        len: payload.len(),
                        max: MAX_COMMAND_DISCRIMINATOR as usize - 1,
                    });
                }
                declared as u8
            }
        };
        let mut data = Vec::with_capacity(2 + payload.len());
        data.push(discriminator);
        data.push(service.code());
        data.extend_from_slice(payload);
        debug!(%ecu, %service, discriminator, "built command frame");
        Ok(Request {
            ecu,
            interface: interface.to_string(),
            data,
        })
    }

    /// Switch the ECU's operating mode.
    pub fn set_mode(ecu: Ecu, interface: &str, mode: EcuMode) -> SdsResult<Request> {
        Self::command(
            ecu,
            interface,
            Service::InitiateDiagnosticSession,
            None,
            &[mode.code()],
        )
    }

    /// Enter diagnostic mode (the most common session change).
    pub fn enter_diagnostic_session(ecu: Ecu, interface: &str) -> SdsResult<Request> {
        Self::set_mode(ecu, interface, EcuMode::Diagnostic)
    }

    /// Enter device-control mode.
    pub fn enter_device_control(ecu: Ecu, interface: &str) -> SdsResult<Request> {
        Self::set_mode(ecu, interface, EcuMode::DeviceControl)
    }

    /// Leave whatever session is active.
    pub fn return_to_normal(ecu: Ecu, interface: &str) -> SdsResult<Request> {
        Self::command(ecu, interface, Service::ReturnToNormal, None, &[])
    }

    /// Ask for a security-access seed.
    pub fn security_access_seed(ecu: Ecu, interface: &str) -> SdsResult<Request> {
        Self::command(
            ecu,
            interface,
            Service::SecurityAccess,
            None,
            &[SecurityAccessFunction::Seed.code()],
        )
    }

    /// Submit the computed security-access key.
    pub fn security_access_key(ecu: Ecu, interface: &str, key: &[u8]) -> SdsResult<Request> {
        let mut payload = Vec::with_capacity(1 + key.len());
        payload.push(SecurityAccessFunction::Key.code());
        payload.extend_from_slice(key);
        Self::command(ecu, interface, Service::SecurityAccess, None, &payload)
    }

    /// Read `length` bytes of ECU memory starting at `address`.
    ///
    /// Big-endian 4-byte address plus big-endian 2-byte length. Under RevA
    /// the frame goes out with the 0x10 discriminator: the target firmware
    /// only honors reads whose length check is bypassed that way.
    pub fn read_memory(
        ecu: Ecu,
        interface: &str,
        address: u32,
        length: u16,
        revision: WireRevision,
    ) -> SdsResult<Request> {
        let mut payload = Vec::with_capacity(6);
        payload.extend_from_slice(&address.to_be_bytes());
        payload.extend_from_slice(&length.to_be_bytes());
        let discriminator = if revision.read_memory_bypass() {
            Some(FLOW_CONTROL_REQUEST)
        } else {
            None
        };
        Self::command(
            ecu,
            interface,
            Service::ReadMemoryByAddress,
            discriminator,
            &payload,
        )
    }

    /// Read one of the cataloged data identifiers.
    pub fn read_did(ecu: Ecu, interface: &str, did: Did) -> SdsResult<Request> {
        Self::command(ecu, interface, Service::ReadDidById, None, &[did.code()])
    }

    /// Enter programming mode (prerequisite for download/transfer).
    pub fn programming_mode(ecu: Ecu, interface: &str) -> SdsResult<Request> {
        Self::command(ecu, interface, Service::ProgrammingMode, None, &[])
    }

    /// Announce an upcoming download of `size` bytes (little-endian).
    pub fn request_download(ecu: Ecu, interface: &str, size: u16) -> SdsResult<Request> {
        Self::command(
            ecu,
            interface,
            Service::RequestDownload,
            None,
            &size.to_le_bytes(),
        )
    }

    /// Transfer one data byte to `address`, with a download /
    /// download-and-execute selector. Selector code and address byte
    /// order both depend on the wire revision.
    pub fn transfer_data(
        ecu: Ecu,
        interface: &str,
        address: u32,
        byte: u8,
        function: DataTransferFunction,
        revision: WireRevision,
    ) -> SdsResult<Request> {
        let address_bytes = if revision.transfer_address_big_endian() {
            address.to_be_bytes()
        } else {
            address.to_le_bytes()
        };
        let mut payload = Vec::with_capacity(6);
        payload.push(function.code(revision));
        payload.extend_from_slice(&address_bytes);
        payload.push(byte);
        Self::command(ecu, interface, Service::TransferData, None, &payload)
    }

    /// Jump to previously transferred code at `address`.
    pub fn execute_transferred_data(
        ecu: Ecu,
        interface: &str,
        address: u32,
        revision: WireRevision,
    ) -> SdsResult<Request> {
        Self::transfer_data(
            ecu,
            interface,
            address,
            0x00,
            DataTransferFunction::DownloadAndExecute,
            revision,
        )
    }

    /// Clear-to-send marker frame: the reserved 0x30 byte sits in the
    /// discriminator position instead of a true length.
    pub fn flow_control_continue(ecu: Ecu, interface: &str) -> Request {
        Request {
            ecu,
            interface: interface.to_string(),
            data: vec![FLOW_CONTROL_CONTINUE],
        }
    }

    /// Transfer announcement frame: total length plus up to 5 initial
    /// payload bytes, behind the reserved 0x10 marker.
    pub fn flow_control_request(
        ecu: Ecu,
        interface: &str,
        total_length: u8,
        initial: &[u8],
    ) -> SdsResult<Request> {
        if initial.len() > FLOW_CONTROL_REQUEST_MAX_INITIAL {
            return Err(SdsError::PayloadTooLarge {
                len: initial.len(),
                max: FLOW_CONTROL_REQUEST_MAX_INITIAL,
            });
        }
        let mut data = Vec::with_capacity(2 + initial.len());
        data.push(FLOW_CONTROL_REQUEST);
        data.push(total_length);
        data.extend_from_slice(initial);
        Ok(Request {
            ecu,
            interface: interface.to_string(),
            data,
        })
    }

    /// Send-line text: `<arbitration-id-hex>#<payload-hex>`, lowercase
    /// contiguous hex.
    pub fn render(&self) -> String {
        format!("{:x}#{}", self.ecu.base(), hex_string(&self.data))
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;

    #[test]
    fn enter_diagnostic_session_renders_exactly() {
        let req = Request::enter_diagnostic_session(Ecu::Ecm, DEFAULT_INTERFACE).unwrap();
        assert_eq!(req.data, vec![0x02, 0x20, 0x02]);
        assert_eq!(req.render(), "7e0#022002");
    }

    #[test]
    fn built_requests_decode_back() {
        let req = Request::security_access_seed(Ecu::Ecm, DEFAULT_INTERFACE).unwrap();
        let packet = Packet::decode(&req.data).unwrap();
        assert_eq!(
            packet,
            Packet::CommandRequest {
                service: Service::SecurityAccess,
                payload: vec![0x01],
            }
        );
    }

    #[test]
    fn return_to_normal_has_empty_payload() {
        let req = Request::return_to_normal(Ecu::Bcm, DEFAULT_INTERFACE).unwrap();
        assert_eq!(req.data, vec![0x01, 0x21]);
        assert_eq!(req.render(), "7c0#0121");
    }

    #[test]
    fn security_access_key_carries_sub_function_then_key() {
        let req =
            Request::security_access_key(Ecu::Ecm, DEFAULT_INTERFACE, &[0xDE, 0xAD]).unwrap();
        assert_eq!(req.data, vec![0x04, 0x22, 0x02, 0xDE, 0xAD]);
    }

    #[test]
    fn read_memory_rev_a_uses_the_bypass_discriminator() {
        let req = Request::read_memory(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            0x0001_2345,
            0x0010,
            WireRevision::RevA,
        )
        .unwrap();
        assert_eq!(
            req.data,
            vec![0x10, 0x23, 0x00, 0x01, 0x23, 0x45, 0x00, 0x10]
        );
    }

    #[test]
    fn read_memory_rev_b_uses_the_true_length() {
        let req = Request::read_memory(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            0x0001_2345,
            0x0010,
            WireRevision::RevB,
        )
        .unwrap();
        assert_eq!(
            req.data,
            vec![0x07, 0x23, 0x00, 0x01, 0x23, 0x45, 0x00, 0x10]
        );
        // And that one decodes on the command path.
        assert!(matches!(
            Packet::decode(&req.data).unwrap(),
            Packet::CommandRequest {
                service: Service::ReadMemoryByAddress,
                ..
            }
        ));
    }

    #[test]
    fn read_did_frames() {
        let req = Request::read_did(Ecu::Ecm, DEFAULT_INTERFACE, Did::Vin).unwrap();
        assert_eq!(req.data, vec![0x02, 0x24, 0x03]);
    }

    #[test]
    fn request_download_size_is_little_endian() {
        let req = Request::request_download(Ecu::Ecm, DEFAULT_INTERFACE, 0x0208).unwrap();
        assert_eq!(req.data, vec![0x03, 0x26, 0x08, 0x02]);
    }

    #[test]
    fn transfer_data_diverges_by_revision() {
        let rev_a = Request::transfer_data(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            0x0102_0304,
            0xAB,
            DataTransferFunction::DownloadAndExecute,
            WireRevision::RevA,
        )
        .unwrap();
        // Selector 0x01, little-endian address.
        assert_eq!(
            rev_a.data,
            vec![0x07, 0x27, 0x01, 0x04, 0x03, 0x02, 0x01, 0xAB]
        );

        let rev_b = Request::transfer_data(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            0x0102_0304,
            0xAB,
            DataTransferFunction::DownloadAndExecute,
            WireRevision::RevB,
        )
        .unwrap();
        // Selector 0x80, big-endian address.
        assert_eq!(
            rev_b.data,
            vec![0x07, 0x27, 0x80, 0x01, 0x02, 0x03, 0x04, 0xAB]
        );
    }

    #[test]
    fn execute_transferred_data_selects_download_and_execute() {
        let req =
            Request::execute_transferred_data(Ecu::Ecm, DEFAULT_INTERFACE, 0x8000, WireRevision::RevA)
                .unwrap();
        assert_eq!(req.data[2], 0x01);
        assert_eq!(req.data[1], Service::TransferData.code());
    }

    #[test]
    fn flow_control_markers_sit_in_the_discriminator_position() {
        let cont = Request::flow_control_continue(Ecu::Ecm, DEFAULT_INTERFACE);
        assert_eq!(cont.data, vec![0x30]);
        assert_eq!(cont.render(), "7e0#30");

        let fcr =
            Request::flow_control_request(Ecu::Ecm, DEFAULT_INTERFACE, 8, &[0x01, 0x02]).unwrap();
        assert_eq!(fcr.data, vec![0x10, 0x08, 0x01, 0x02]);
    }

    #[test]
    fn flow_control_request_initial_chunk_is_capped() {
        let err = Request::flow_control_request(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            10,
            &[1, 2, 3, 4, 5, 6],
        )
        .unwrap_err();
        assert!(matches!(err, SdsError::PayloadTooLarge { len: 6, max: 5 }));
    }

    #[test]
    fn oversized_default_payload_fails_immediately() {
        let err = Request::command(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            Service::TransferData,
            None,
            &[0u8; 15],
        )
        .unwrap_err();
        assert!(matches!(err, SdsError::PayloadTooLarge { len: 15, max: 14 }));
    }

    #[test]
    fn explicit_discriminator_is_passed_through_verbatim() {
        let req = Request::command(
            Ecu::Ecm,
            DEFAULT_INTERFACE,
            Service::ReadMemoryByAddress,
            Some(0x10),
            &[0xAA],
        )
        .unwrap();
        assert_eq!(req.data, vec![0x10, 0x23, 0xAA]);
    }

    #[test]
    fn every_catalog_request_renders_lowercase_contiguous_hex() {
        let req = Request::security_access_key(Ecu::Ecm, DEFAULT_INTERFACE, &[0xAB, 0xCD]).unwrap();
        let rendered = req.render();
        let (id, payload) = rendered.split_once('#').unwrap();
        assert_eq!(id, "7e0");
        assert!(payload.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(payload, payload.to_lowercase());
    }
}
