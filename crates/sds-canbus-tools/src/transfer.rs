//! Segmented transfers over the flow-control sub-protocol.
//!
//! A payload too large for one command frame travels as a
//! `FlowControlRequest` (announcing the total length and carrying the
//! first few bytes) followed by 7-byte `FlowControlFrame` chunks consumed
//! in arrival order. Once the declared total has arrived the receiving
//! side answers with a single `FlowControlContinue` — the handshake is
//! receiver-paced, not per-frame-acknowledged. There is no checksum at
//! this layer; only structural shape is verified.

use std::time::Duration;
use tracing::debug;

use sds_protocol::Ecu;

use crate::error::{SdsError, SdsResult};
use crate::interface::CanTransport;
use crate::packet::{FLOW_CONTROL_FRAME_LEN, FLOW_CONTROL_REQUEST_MAX_INITIAL, Packet};
use crate::request::Request;

/// Split a payload into the announcement packet plus continuation frames.
///
/// The announcement carries up to 5 initial bytes; each continuation
/// frame carries exactly 7, zero-padded on the tail (the receiver
/// truncates back to the declared length). Sequence nibbles start at 1
/// and wrap at 16.
pub fn segment(payload: &[u8]) -> SdsResult<Vec<Packet>> {
    if payload.len() > u8::MAX as usize {
        return Err(SdsError::PayloadTooLarge {
            len: payload.len(),
            max: u8::MAX as usize,
        });
    }
    let initial_len = payload.len().min(FLOW_CONTROL_REQUEST_MAX_INITIAL);
    let mut packets = vec![Packet::FlowControlRequest {
        declared_length: payload.len() as u8,
        initial_payload: payload[..initial_len].to_vec(),
    }];
    let mut sequence = 1u8;
    for chunk in payload[initial_len..].chunks(FLOW_CONTROL_FRAME_LEN) {
        let mut frame = [0u8; FLOW_CONTROL_FRAME_LEN];
        frame[..chunk.len()].copy_from_slice(chunk);
        packets.push(Packet::FlowControlFrame {
            sequence: sequence & 0x0F,
            payload: frame,
        });
        sequence = sequence.wrapping_add(1);
    }
    Ok(packets)
}

/// Reassembles one segmented transfer from packets fed in arrival order.
#[derive(Debug, Default)]
pub struct Reassembly {
    declared_length: Option<usize>,
    buffer: Vec<u8>,
}

impl Reassembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next decoded packet of the transfer.
    pub fn push(&mut self, packet: &Packet) -> SdsResult<()> {
        match packet {
            Packet::FlowControlRequest {
                declared_length,
                initial_payload,
            } => {
                if self.declared_length.is_some() {
                    return Err(SdsError::Transfer(
                        "second announcement received mid-transfer".to_string(),
                    ));
                }
                self.declared_length = Some(*declared_length as usize);
                self.buffer.extend_from_slice(initial_payload);
                Ok(())
            }
            Packet::FlowControlFrame { payload, .. } => {
                if self.declared_length.is_none() {
                    return Err(SdsError::Transfer(
                        "continuation frame before any announcement".to_string(),
                    ));
                }
                self.buffer.extend_from_slice(payload);
                Ok(())
            }
            other => Err(SdsError::Transfer(format!(
                "unexpected packet in transfer: {}",
                other.describe()
            ))),
        }
    }

    /// True once at least the declared length has arrived.
    pub fn is_complete(&self) -> bool {
        self.declared_length
            .is_some_and(|declared| self.buffer.len() >= declared)
    }

    /// Finish the transfer, truncating tail padding back to the declared
    /// length.
    pub fn into_payload(self) -> SdsResult<Vec<u8>> {
        let declared = self
            .declared_length
            .ok_or_else(|| SdsError::Transfer("no transfer announced".to_string()))?;
        if self.buffer.len() < declared {
            return Err(SdsError::TruncatedPacket {
                needed: declared,
                available: self.buffer.len(),
            });
        }
        let mut buffer = self.buffer;
        buffer.truncate(declared);
        Ok(buffer)
    }
}

/// Receive one full segmented transfer from `ecu`, answering the
/// completed announcement with a clear-to-send frame.
pub async fn recv_segmented(
    transport: &dyn CanTransport,
    ecu: Ecu,
    interface: &str,
    timeout: Duration,
) -> SdsResult<Vec<u8>> {
    let mut reassembly = Reassembly::new();
    loop {
        let (id, data) = transport.recv_frame(timeout).await?;
        match Ecu::from_arbitration_id(id) {
            Ok((frame_ecu, _)) if frame_ecu == ecu => {}
            _ => {
                debug!(id, "ignoring unrelated frame");
                continue;
            }
        }
        reassembly.push(&Packet::decode(&data)?)?;
        if reassembly.is_complete() {
            transport
                .send_frame(&Request::flow_control_continue(ecu, interface))
                .await?;
            return reassembly.into_payload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCanTransport;
    use crate::request::DEFAULT_INTERFACE;

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn segment_small_payload_is_announcement_only() {
        let packets = segment(&[1, 2, 3]).unwrap();
        assert_eq!(
            packets,
            vec![Packet::FlowControlRequest {
                declared_length: 3,
                initial_payload: vec![1, 2, 3],
            }]
        );
    }

    #[test]
    fn segment_then_reassemble_yields_announced_length() {
        let payload: Vec<u8> = (0..23).collect();
        let packets = segment(&payload).unwrap();
        // 5 initial + ceil(18 / 7) = 3 continuation frames.
        assert_eq!(packets.len(), 4);

        let mut reassembly = Reassembly::new();
        for packet in &packets {
            // Through the wire and back, as a receiver would see them.
            reassembly.push(&Packet::decode(&packet.encode()).unwrap()).unwrap();
        }
        assert!(reassembly.is_complete());
        assert_eq!(reassembly.into_payload().unwrap(), payload);
    }

    #[test]
    fn sequence_nibbles_start_at_one() {
        let payload: Vec<u8> = (0..20).collect();
        let packets = segment(&payload).unwrap();
        let sequences: Vec<u8> = packets[1..]
            .iter()
            .map(|p| match p {
                Packet::FlowControlFrame { sequence, .. } => *sequence,
                other => panic!("unexpected packet: {other:?}"),
            })
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        assert!(matches!(
            segment(&[0u8; 300]),
            Err(SdsError::PayloadTooLarge { len: 300, .. })
        ));
    }

    #[test]
    fn frame_before_announcement_is_a_protocol_violation() {
        let mut reassembly = Reassembly::new();
        let err = reassembly
            .push(&Packet::FlowControlFrame {
                sequence: 1,
                payload: [0; 7],
            })
            .unwrap_err();
        assert!(matches!(err, SdsError::Transfer(_)));
    }

    #[test]
    fn second_announcement_is_a_protocol_violation() {
        let announce = Packet::FlowControlRequest {
            declared_length: 20,
            initial_payload: vec![1, 2, 3, 4, 5],
        };
        let mut reassembly = Reassembly::new();
        reassembly.push(&announce).unwrap();
        assert!(matches!(
            reassembly.push(&announce).unwrap_err(),
            SdsError::Transfer(_)
        ));
    }

    #[test]
    fn incomplete_transfer_cannot_finish() {
        let mut reassembly = Reassembly::new();
        reassembly
            .push(&Packet::FlowControlRequest {
                declared_length: 12,
                initial_payload: vec![1, 2, 3, 4, 5],
            })
            .unwrap();
        assert!(!reassembly.is_complete());
        assert!(matches!(
            reassembly.into_payload().unwrap_err(),
            SdsError::TruncatedPacket {
                needed: 12,
                available: 5
            }
        ));
    }

    #[tokio::test]
    async fn recv_segmented_reassembles_and_acknowledges() {
        let mock = MockCanTransport::new();
        // ECM response ID: base | direction nibble.
        mock.queue_response(0x7E8, vec![0x10, 0x0C, 0x01, 0x02, 0x03, 0x04, 0x05]);
        mock.queue_response(0x7E8, vec![0x21, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C]);

        let payload = recv_segmented(&mock, Ecu::Ecm, DEFAULT_INTERFACE, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(payload, (1..=12).collect::<Vec<u8>>());

        // A single clear-to-send goes back once the total arrived.
        let sent = mock.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data, vec![0x30]);
    }

    #[tokio::test]
    async fn recv_segmented_skips_frames_from_other_ecus() {
        let mock = MockCanTransport::new();
        mock.queue_response(0x7C8, vec![0x02, 0x60, 0x00]); // BCM traffic, unrelated
        mock.queue_response(0x7E8, vec![0x10, 0x03, 0xAA, 0xBB, 0xCC]);

        let payload = recv_segmented(&mock, Ecu::Ecm, DEFAULT_INTERFACE, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(payload, vec![0xAA, 0xBB, 0xCC]);
    }

    #[tokio::test]
    async fn recv_segmented_times_out_without_frames() {
        let mock = MockCanTransport::new();
        let err = recv_segmented(&mock, Ecu::Ecm, DEFAULT_INTERFACE, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, SdsError::Timeout { .. }));
    }
}
