//! CAN transport seam.
//!
//! The codec is purely synchronous; everything touching a live bus
//! (timing, pacing, retries) lives behind `CanTransport`. Two impls:
//! - `SocketCanTransport` — Linux-only, wraps `socketcan::CanSocket`
//! - `MockCanTransport` — all platforms, scripted responses (in `mock.rs`)

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SdsResult;
use crate::request::Request;

/// Trait for CAN transport implementations.
#[async_trait]
pub trait CanTransport: Send + Sync {
    /// Transmit one assembled request frame.
    async fn send_frame(&self, request: &Request) -> SdsResult<()>;

    /// Receive one raw frame (arbitration ID plus payload bytes),
    /// blocking up to `timeout`.
    async fn recv_frame(&self, timeout: Duration) -> SdsResult<(u32, Vec<u8>)>;
}

// ── SocketCAN (Linux-only) ──────────────────────────────────────

/// SocketCAN transport for Linux hosts.
#[cfg(target_os = "linux")]
pub struct SocketCanTransport {
    _interface_name: String,
}

#[cfg(target_os = "linux")]
impl SocketCanTransport {
    pub fn new(interface_name: &str) -> SdsResult<Self> {
        Ok(Self {
            _interface_name: interface_name.to_string(),
        })
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl CanTransport for SocketCanTransport {
    async fn send_frame(&self, _request: &Request) -> SdsResult<()> {
        // TODO: wire to socketcan::CanSocket when running on real hardware
        Err(crate::error::SdsError::Interface(
            "SocketCAN send not yet implemented".into(),
        ))
    }

    async fn recv_frame(&self, _timeout: Duration) -> SdsResult<(u32, Vec<u8>)> {
        // TODO: wire to socketcan::CanSocket when running on real hardware
        Err(crate::error::SdsError::Interface(
            "SocketCAN recv not yet implemented".into(),
        ))
    }
}
