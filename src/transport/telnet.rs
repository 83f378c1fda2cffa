//! Telnet transport: a raw TCP socket with a canned negotiation reply.
//!
//! This is not a Telnet option negotiator. Some devices (Mikrotik) open
//! with an IAC option burst and will not print their banner until the
//! client answers; for those, the profile carries a fixed reply that is
//! written verbatim, once, when the burst is first observed.

use async_trait::async_trait;
use memchr::memchr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use crate::error::TransportError;

/// Telnet interpret-as-command byte.
const IAC: u8 = 0xff;

/// Telnet transport over a plain TCP socket.
pub struct TelnetTransport {
    stream: TcpStream,

    /// Canned reply to the server's initial option burst, if the profile
    /// declares one.
    negotiation_reply: Option<Vec<u8>>,

    /// Whether the canned reply has been sent.
    negotiated: bool,

    closed: bool,
}

impl TelnetTransport {
    /// Open the TCP connection.
    ///
    /// The caller supervises this with the connect timeout.
    pub async fn connect(
        host: &str,
        port: u16,
        negotiation_reply: Option<Vec<u8>>,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port)).await.map_err(|source| {
            TransportError::ConnectionFailed {
                host: host.to_string(),
                port,
                source,
            }
        })?;
        log::debug!("telnet: connected to {host}:{port}");

        Ok(Self {
            stream,
            negotiation_reply,
            negotiated: false,
            closed: false,
        })
    }
}

#[async_trait]
impl Transport for TelnetTransport {
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.stream.write_all(data).await?;
        Ok(())
    }

    async fn read_chunk(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut buf = vec![0u8; max];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Err(TransportError::Closed);
        }
        buf.truncate(n);

        // Answer the initial negotiation burst exactly once.
        if !self.negotiated && memchr(IAC, &buf).is_some() {
            self.negotiated = true;
            if let Some(reply) = self.negotiation_reply.take() {
                log::debug!("telnet: answering IAC burst with canned reply ({} bytes)", reply.len());
                self.stream.write_all(&reply).await?;
            }
        }

        Ok(buf)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.shutdown().await?;
        Ok(())
    }
}
