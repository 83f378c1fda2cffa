//! Transport layer: a uniform byte-stream contract over SSH or Telnet.
//!
//! The session engine is transport-agnostic; both implementations expose
//! the same minimal read/write/close surface and the read engine applies
//! timeouts from the outside.

mod ssh;
mod telnet;

pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use async_trait::async_trait;

use crate::error::TransportError;

/// Byte-stream transport to one device.
///
/// `read_chunk` suspends until at least one byte is available and returns
/// `TransportError::Closed` once the peer has closed the connection.
/// Timeout handling belongs to the caller (the read engine wraps each call
/// in `tokio::time::timeout`).
#[async_trait]
pub trait Transport: Send {
    /// Write all of `data` to the device.
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read up to `max` bytes, suspending until at least one arrives.
    async fn read_chunk(&mut self, max: usize) -> Result<Vec<u8>, TransportError>;

    /// Close the connection. Further reads and writes fail.
    async fn close(&mut self) -> Result<(), TransportError>;
}
