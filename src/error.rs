//! Error types for netscrape.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for netscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (connection, SSH, raw socket)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session-level errors (prompt handling, command execution)
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration errors (builder validation)
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Transport layer errors (connection establishment, reads and writes).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to reach the device
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SSH credentials rejected by the server
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// The connect sequence did not complete within the configured timeout
    #[error("Connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Peer closed the connection
    #[error("Connection closed by peer")]
    Closed,

    /// I/O error on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session layer errors (prompt matching, command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation attempted on a closed or never-opened session
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// Telnet login, password or enable exchange was rejected by the device.
    ///
    /// Carries the accumulated exchange output for diagnosis.
    #[error("Device rejected the credentials: {output}")]
    AuthenticationFailed { output: String },

    /// No matching pattern arrived within the per-chunk timeout budget.
    ///
    /// Carries whatever was accumulated before the stall, for diagnostics.
    #[error("No prompt matched within {timeout:?} (accumulated {} bytes)", buffer.len())]
    ReadTimeout { timeout: Duration, buffer: String },

    /// The accumulation buffer grew past the hard cap without a match
    #[error("Accumulated output exceeded {limit} bytes without a prompt match")]
    BufferLimitExceeded { limit: usize },

    /// The device reported a command error (e.g. output starting with '%').
    ///
    /// Carries the full sanitized device text, unclassified.
    #[error("Device reported an error: {output}")]
    DeviceError { output: String },

    /// A profile extraction recipe did not apply to the command output
    #[error("Could not extract {what} from command output")]
    ExtractFailed { what: &'static str, output: String },
}

/// Configuration errors raised by the session builder.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Protocol string was neither "ssh" nor "telnet"
    #[error("Unsupported protocol: '{name}'")]
    UnsupportedProtocol { name: String },

    /// Device profile failed validation
    #[error("Invalid device profile: {message}")]
    InvalidProfile { message: String },
}

/// Result type alias using netscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
