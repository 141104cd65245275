//! Mock CAN transport for testing.
//!
//! Scripted response queue plus sent-frame recording; the suite runs
//! against this on any platform instead of real CAN hardware.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{SdsError, SdsResult};
use crate::interface::CanTransport;
use crate::request::Request;

/// Mock transport with scripted responses and frame recording.
#[derive(Default)]
pub struct MockCanTransport {
    /// Queued `(arbitration_id, payload)` pairs returned by `recv_frame`
    /// in FIFO order.
    responses: Mutex<Vec<(u32, Vec<u8>)>>,
    /// All requests passed to `send_frame` (for test assertions).
    sent_frames: Mutex<Vec<Request>>,
}

impl MockCanTransport {
    /// Create a new mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response frame.
    pub fn queue_response(&self, arbitration_id: u32, payload: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .push((arbitration_id, payload));
    }

    /// Copies of all requests that were sent.
    pub fn sent_frames(&self) -> Vec<Request> {
        self.sent_frames.lock().unwrap().clone()
    }

    /// The last sent request, if any.
    pub fn last_sent(&self) -> Option<Request> {
        self.sent_frames.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CanTransport for MockCanTransport {
    async fn send_frame(&self, request: &Request) -> SdsResult<()> {
        self.sent_frames.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn recv_frame(&self, timeout: Duration) -> SdsResult<(u32, Vec<u8>)> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(SdsError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(responses.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sds_protocol::Ecu;

    #[tokio::test]
    async fn records_sent_frames() {
        let mock = MockCanTransport::new();
        let request = Request::enter_diagnostic_session(Ecu::Ecm, "can0").unwrap();
        mock.send_frame(&request).await.unwrap();

        let sent = mock.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].render(), "7e0#022002");
        assert_eq!(mock.last_sent().unwrap(), request);
    }

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let mock = MockCanTransport::new();
        mock.queue_response(0x7E8, vec![0x02, 0x60, 0x02]);
        mock.queue_response(0x7E8, vec![0x30]);

        let (id, first) = mock.recv_frame(Duration::from_millis(100)).await.unwrap();
        assert_eq!(id, 0x7E8);
        assert_eq!(first, vec![0x02, 0x60, 0x02]);
        let (_, second) = mock.recv_frame(Duration::from_millis(100)).await.unwrap();
        assert_eq!(second, vec![0x30]);
    }

    #[tokio::test]
    async fn empty_queue_times_out() {
        let mock = MockCanTransport::new();
        let err = mock.recv_frame(Duration::from_millis(250)).await.unwrap_err();
        assert!(matches!(err, SdsError::Timeout { timeout_ms: 250 }));
    }
}
