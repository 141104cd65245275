//! Shared protocol types for SDS diagnostics.
//!
//! Closed numeric-code classification tables (ECU bases, diagnostic
//! services, response and failure codes, operating modes, sub-function
//! selectors) plus the wire-revision configuration. Pure lookup types —
//! no I/O, no state.
//!
//! Every table is a closed set: lookups by numeric code are fallible and
//! return [`UnknownCode`] on a miss. Extending the protocol means adding
//! new entries here, never silently accepting unknown codes.

pub mod ecu;
pub mod revision;
pub mod service;

pub use ecu::*;
pub use revision::*;
pub use service::*;

use thiserror::Error;

/// Lookup miss against one of the closed code tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {table} code 0x{code:02X}")]
pub struct UnknownCode {
    /// Which table was consulted (e.g. "service", "ECU").
    pub table: &'static str,
    /// The code that was not found.
    pub code: u16,
}
