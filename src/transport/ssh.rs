//! SSH transport implementation using russh.

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{ChannelStream, Disconnect};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::Transport;
use crate::error::TransportError;

/// SSH transport wrapping an authenticated russh session with one
/// interactive PTY/shell channel.
pub struct SshTransport {
    /// The russh session handle, kept for the disconnect message.
    session: Handle<AcceptAllHandler>,

    /// The shell channel as a plain byte stream.
    stream: ChannelStream<Msg>,

    /// Whether `close` has already run.
    closed: bool,
}

impl SshTransport {
    /// Connect, authenticate with a password and open the shell channel.
    ///
    /// The caller supervises this whole sequence with the connect timeout;
    /// no timeout is applied here.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Self, TransportError> {
        let config = Arc::new(client::Config::default());

        let mut session = client::connect(config, (host, port), AcceptAllHandler).await?;

        let authenticated = session
            .authenticate_password(username, password)
            .await?
            .success();
        if !authenticated {
            return Err(TransportError::AuthenticationFailed {
                user: username.to_string(),
            });
        }
        log::debug!("ssh: authenticated as {username} on {host}:{port}");

        let channel = session.channel_open_session().await?;
        channel
            .request_pty(true, "xterm", 511, 24, 0, 0, &[])
            .await?;
        channel.request_shell(true).await?;
        log::debug!("ssh: interactive shell channel open");

        Ok(Self {
            session,
            stream: channel.into_stream(),
            closed: false,
        })
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
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
        Ok(buf)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}

/// Client handler that accepts any host key.
///
/// Network devices rotate keys on firmware upgrades and are rarely present
/// in known_hosts; verification is left to the operator's network boundary.
struct AcceptAllHandler;

impl client::Handler for AcceptAllHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
