//! Builder for [`Session`].

use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::profile::DeviceProfile;

use super::{Protocol, Session, SessionConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder-style constructor for a [`Session`].
///
/// Only the host is mandatory up front; everything else has a sensible
/// default (SSH, protocol-default port, 10 s timeout, generic IOS-flavoured
/// profile). `build()` validates the combination and resolves the port.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    host: String,
    port: Option<u16>,
    username: String,
    password: String,
    protocol: Protocol,
    timeout: Duration,
    enable_mode: bool,
    enable_password: Option<String>,
    profile: DeviceProfile,
}

impl SessionBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: String::new(),
            password: String::new(),
            protocol: Protocol::default(),
            timeout: DEFAULT_TIMEOUT,
            enable_mode: false,
            enable_password: None,
            profile: DeviceProfile::default(),
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Override the TCP port. Unset, the profile's default port applies,
    /// then the protocol default (22/23).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Per-chunk read timeout; also supervises the connect sequence.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request enable (elevated-privilege) mode after login. Only the
    /// Telnet login path honours this; SSH sessions land in whatever
    /// privilege level the account is configured for.
    pub fn enable_mode(mut self, enable: bool) -> Self {
        self.enable_mode = enable;
        self
    }

    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(password.into());
        self
    }

    pub fn profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Validate the configuration and produce a disconnected [`Session`].
    pub fn build(self) -> Result<Session> {
        if self.profile.prompt_endings.is_empty() {
            return Err(ConfigError::InvalidProfile {
                message: format!("profile {:?} has no prompt endings", self.profile.name),
            }
            .into());
        }
        if self.profile.bootstrap_endings.is_empty() {
            return Err(ConfigError::InvalidProfile {
                message: format!("profile {:?} has no bootstrap endings", self.profile.name),
            }
            .into());
        }

        let port = self
            .port
            .or(self.profile.default_port)
            .unwrap_or_else(|| self.protocol.default_port());

        let config = SessionConfig {
            host: self.host,
            port,
            username: self.username,
            password: self.password,
            protocol: self.protocol,
            timeout: self.timeout,
            enable_mode: self.enable_mode,
            enable_password: self.enable_password,
        };
        Ok(Session::new(config, self.profile))
    }
}
