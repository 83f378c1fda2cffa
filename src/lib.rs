//! # Netscrape
//!
//! Async interactive CLI session engine for network devices over SSH and
//! Telnet, in the spirit of Python's netmiko and netscud libraries.
//!
//! ## Features
//!
//! - Async SSH shell sessions via russh, Telnet over tokio TCP
//! - Prompt discovery at connect time, substring-matched on every read
//! - Chunked reads with per-chunk timeouts and bounded accumulation
//! - Output sanitization (echo, leading noise, trailing prompt) and
//!   device-reported error detection
//! - Configuration-mode command batches with a circuit breaker on the
//!   config-exit read
//! - Data-driven device profiles: prompts, commands and text-extraction
//!   recipes as serde-loadable tables, no per-vendor code
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netscrape::Session;
//!
//! #[tokio::main]
//! async fn main() -> netscrape::Result<()> {
//!     let mut session = Session::builder("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     session.connect().await?;
//!
//!     let output = session.send_command("show version").await?;
//!     println!("{output}");
//!
//!     session.send_config_set(&["interface Gi0/1", "description uplink"]).await?;
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod profile;
pub mod prompt;
pub mod sanitize;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use error::{ConfigError, Error, Result, SessionError, TransportError};
pub use profile::{
    CommandSet, CommandSpec, DeviceProfile, Extract, SanitizeStrategy, TELNET_NEGOTIATION_REPLY,
};
pub use prompt::PromptModel;
pub use session::{Protocol, Session, SessionBuilder, SessionState};
pub use transport::{SshTransport, TelnetTransport, Transport};
