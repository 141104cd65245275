//! CAN diagnostic frame tooling for SDS.
//!
//! Read path: a capture-log line goes through [`Message::parse_line`],
//! which splits the line, derives ECU and direction from the arbitration
//! ID, and decodes the payload bytes via [`Packet::decode`] into a typed
//! packet. Write path: [`Request`] builders assemble protocol-correct
//! frames for the fixed diagnostic catalog and render them in cansend
//! line format.
//!
//! Payloads larger than one frame travel over the flow-control
//! segmentation sub-protocol; see [`transfer`].

pub mod candump;
pub mod error;
pub mod interface;
pub mod mock;
pub mod packet;
pub mod request;
pub mod transfer;

pub use candump::Message;
pub use error::{SdsError, SdsResult};
pub use packet::Packet;
pub use request::Request;
