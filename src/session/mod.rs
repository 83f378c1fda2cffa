//! Session controller: the high-level request/response API over one device.
//!
//! A [`Session`] owns one transport, one discovered prompt model and the
//! connection state machine. All operations take `&mut self`, which is what
//! enforces the one-command-in-flight protocol: the CLI stream has no
//! multiplexing, so a second write before the previous read completed would
//! interleave undefined data.

mod builder;
mod login;
mod read;

pub use builder::SessionBuilder;

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result, SessionError, TransportError};
use crate::profile::{CommandSpec, DeviceProfile};
use crate::prompt::PromptModel;
use crate::sanitize::{check_error, sanitize};
use crate::transport::{SshTransport, TelnetTransport, Transport};
use login::{FirstPrompt, LoginOutcome, await_first_prompt, exchange_secret};
use read::{CONFIG_EXIT_READ_CAP, Stop, read_until};

/// Wire protocol used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Ssh,
    Telnet,
}

impl Protocol {
    /// Default TCP port for this protocol.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Ssh => 22,
            Protocol::Telnet => 23,
        }
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssh" => Ok(Protocol::Ssh),
            "telnet" => Ok(Protocol::Telnet),
            other => Err(ConfigError::UnsupportedProtocol {
                name: other.to_string(),
            }),
        }
    }
}

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    /// Telnet login sub-protocol in progress.
    TelnetAuthenticating,
    Connected,
    /// Inside a `send_config_set` transaction.
    InConfigMode,
}

/// Resolved connection parameters for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub protocol: Protocol,
    /// Per-chunk read timeout, also supervising the connect sequence.
    pub timeout: Duration,
    pub enable_mode: bool,
    pub enable_password: Option<String>,
}

/// One interactive CLI session with one network device.
///
/// Created by [`SessionBuilder`]; `connect()` establishes the transport and
/// discovers the prompt, after which commands can be sent. The session is
/// exclusively owned by its creator and must not be shared across
/// concurrent callers.
///
/// ```rust,no_run
/// use netscrape::{Session, DeviceProfile};
///
/// # async fn example() -> netscrape::Result<()> {
/// let mut session = Session::builder("192.0.2.1")
///     .username("admin")
///     .password("secret")
///     .profile(DeviceProfile::new("cisco_ios"))
///     .build()?;
///
/// session.connect().await?;
/// let version = session.send_command("show version").await?;
/// println!("{version}");
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: SessionConfig,
    profile: DeviceProfile,
    transport: Option<Box<dyn Transport + Send>>,
    prompts: Option<PromptModel>,
    state: SessionState,
}

impl Session {
    /// Start building a session for the given host.
    pub fn builder(host: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(host)
    }

    pub(crate) fn new(config: SessionConfig, profile: DeviceProfile) -> Self {
        Self {
            config,
            profile,
            transport: None,
            prompts: None,
            state: SessionState::Disconnected,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a transport is currently open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// The prompt model discovered at connect time, if connected.
    pub fn prompt_model(&self) -> Option<&PromptModel> {
        self.prompts.as_ref()
    }

    /// The device profile this session was built with.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Connect to the device and prepare it for unattended reads.
    ///
    /// Dispatches on the configured protocol, runs the login handshake
    /// (Telnet) resp. waits out the banner (SSH), discovers the prompt
    /// model and disables paging when the profile declares a command for
    /// it. On any failure the transport is closed, the state is left
    /// `Disconnected` and the error propagates; nothing is retried.
    pub async fn connect(&mut self) -> Result<()> {
        if self.transport.is_some() {
            log::warn!("connect() on an already-connected session is a no-op");
            return Ok(());
        }

        self.state = SessionState::Connecting;
        log::debug!(
            "connecting to {}:{} via {:?}",
            self.config.host,
            self.config.port,
            self.config.protocol
        );

        let result = match self.config.protocol {
            Protocol::Ssh => self.connect_ssh().await,
            Protocol::Telnet => self.connect_telnet().await,
        };

        match result {
            Ok(()) => {
                self.state = SessionState::Connected;
                log::debug!("connected; prompt stem {:?}", self.stem());
                Ok(())
            }
            Err(err) => {
                // Never leave a half-open socket behind a connect error.
                let _ = self.disconnect().await;
                Err(err)
            }
        }
    }

    /// Close the transport. Idempotent: safe on a never-connected or
    /// already-disconnected session, and always ends `Disconnected`.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close().await {
                log::warn!("transport close failed: {err}");
            }
        }
        self.prompts = None;
        self.state = SessionState::Disconnected;
        Ok(())
    }

    /// Send one command and return its sanitized output.
    ///
    /// Writes `cmd` + newline, reads until a prompt-model match, strips the
    /// echo/leading noise/trailing prompt and raises `DeviceError` when the
    /// device reports a command error.
    pub async fn send_command(&mut self, cmd: &str) -> Result<String> {
        self.exec(cmd, None, self.config.timeout, None).await
    }

    /// Like [`send_command`](Self::send_command), but reads until `pattern`
    /// is contained in the output instead of a prompt. For interactions
    /// that park on something other than the shell prompt (confirmation
    /// questions, destination prompts).
    pub async fn send_command_expect(&mut self, cmd: &str, pattern: &str) -> Result<String> {
        self.exec(cmd, Some(pattern), self.config.timeout, None).await
    }

    /// Run commands inside configuration mode.
    ///
    /// Three phases: the profile's enter-config command, each of `cmds` in
    /// order, the exit-config command. Every phase is a full
    /// write/read/sanitize/check cycle; the sanitized phase outputs come
    /// back newline-joined. An empty `cmds` still runs enter and exit.
    ///
    /// On a phase failure one best-effort attempt is made to leave config
    /// mode (bounded read, its own errors only logged) before the original
    /// error propagates.
    pub async fn send_config_set(&mut self, cmds: &[&str]) -> Result<String> {
        self.send_config_set_with_timeout(cmds, self.config.timeout)
            .await
    }

    /// [`send_config_set`](Self::send_config_set) with a per-chunk timeout
    /// override, for configuration commands that are slow to return
    /// (e.g. `write memory` on flash-backed platforms).
    pub async fn send_config_set_with_timeout(
        &mut self,
        cmds: &[&str],
        timeout: Duration,
    ) -> Result<String> {
        if self.transport.is_none() {
            return Err(SessionError::NotConnected.into());
        }

        self.state = SessionState::InConfigMode;
        let result = self.run_config_phases(cmds, timeout).await;

        if result.is_err() {
            let exit = self.profile.exit_config.clone();
            if !exit.is_empty() {
                if let Err(exit_err) = self
                    .exec(&exit, None, timeout, Some(CONFIG_EXIT_READ_CAP))
                    .await
                {
                    log::warn!("leaving config mode after a failed phase also failed: {exit_err}");
                }
            }
        }

        self.state = if self.transport.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        };
        result
    }

    async fn run_config_phases(&mut self, cmds: &[&str], timeout: Duration) -> Result<String> {
        let mut outputs = Vec::with_capacity(cmds.len() + 2);

        let enter = self.profile.enter_config.clone();
        outputs.push(self.exec(&enter, None, timeout, None).await?);

        for cmd in cmds {
            outputs.push(self.exec(cmd, None, timeout, None).await?);
        }

        let exit = self.profile.exit_config.clone();
        outputs.push(self.exec(&exit, None, timeout, self.exit_read_cap()).await?);

        Ok(outputs.join("\n"))
    }

    /// Iteration cap for the config-exit read; only the Telnet path needs
    /// the circuit breaker (the original infinite-`exit` hazard).
    fn exit_read_cap(&self) -> Option<usize> {
        match self.config.protocol {
            Protocol::Telnet => Some(CONFIG_EXIT_READ_CAP),
            Protocol::Ssh => None,
        }
    }

    /// Software version, per the profile's command and extraction recipe.
    pub async fn get_version(&mut self) -> Result<String> {
        let spec = self.profile.commands.version.clone();
        self.getter(spec, "version").await
    }

    /// Device hostname.
    pub async fn get_hostname(&mut self) -> Result<String> {
        let spec = self.profile.commands.hostname.clone();
        self.getter(spec, "hostname").await
    }

    /// Hardware model.
    pub async fn get_model(&mut self) -> Result<String> {
        let spec = self.profile.commands.model.clone();
        self.getter(spec, "model").await
    }

    /// Chassis serial number (first unit of a stack).
    pub async fn get_serial_number(&mut self) -> Result<String> {
        let spec = self.profile.commands.serial_number.clone();
        self.getter(spec, "serial number").await
    }

    /// Running configuration, unmodified.
    pub async fn get_config(&mut self) -> Result<String> {
        let spec = self.profile.commands.get_config.clone();
        self.getter(spec, "configuration").await
    }

    /// Persist the running configuration; returns the device's output.
    pub async fn save_config(&mut self) -> Result<String> {
        let spec = self.profile.commands.save_config.clone();
        self.getter(spec, "save result").await
    }

    async fn getter(&mut self, spec: CommandSpec, what: &'static str) -> Result<String> {
        let output = self.send_command(&spec.command).await?;
        spec.extract
            .apply(&output)
            .ok_or_else(|| SessionError::ExtractFailed { what, output }.into())
    }

    /// The write/read/sanitize/check cycle every operation is built from.
    async fn exec(
        &mut self,
        cmd: &str,
        pattern: Option<&str>,
        timeout: Duration,
        iteration_cap: Option<usize>,
    ) -> Result<String> {
        let prompts = self.prompts.clone().ok_or(SessionError::NotConnected)?;

        let transport = self
            .transport
            .as_deref_mut()
            .ok_or(SessionError::NotConnected)?;

        log::debug!("send: {cmd:?}");
        transport.write(format!("{cmd}\n").as_bytes()).await?;

        let stop = match pattern {
            Some(p) => Stop::Literal(p),
            None => Stop::Prompt(&prompts),
        };
        let raw = read_until(transport, stop, timeout, iteration_cap).await?;

        let output = sanitize(&raw, cmd, &prompts, self.profile.sanitize);
        check_error(&output, &self.profile.error_markers)?;
        log::trace!("recv: {output:?}");
        Ok(output)
    }

    async fn connect_ssh(&mut self) -> Result<()> {
        let timeout = self.config.timeout;

        let transport = tokio::time::timeout(
            timeout,
            SshTransport::connect(
                &self.config.host,
                self.config.port,
                &self.config.username,
                &self.config.password,
            ),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(timeout))??;
        self.transport = Some(Box::new(transport));

        // The full ending list is not derivable yet; match the banner with
        // the bare bootstrap endings.
        let endings = self.profile.bootstrap_endings.clone();
        let transport = self.transport_mut()?;
        let banner = read_until(transport, Stop::EndsWithAny(&endings), timeout, None).await?;
        self.prompts = Some(PromptModel::discover(&banner, &self.profile.prompt_endings));

        self.disable_paging().await
    }

    async fn connect_telnet(&mut self) -> Result<()> {
        let timeout = self.config.timeout;

        let transport = tokio::time::timeout(
            timeout,
            TelnetTransport::connect(
                &self.config.host,
                self.config.port,
                self.profile.telnet_negotiation_reply.clone(),
            ),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(timeout))??;
        self.transport = Some(Box::new(transport));
        self.state = SessionState::TelnetAuthenticating;

        let login_prompt = self.profile.login_prompt.clone();
        let password_prompt = self.profile.password_prompt.clone();

        match await_first_prompt(self.transport_mut()?, &login_prompt, &password_prompt, timeout)
            .await?
        {
            FirstPrompt::Login => {
                let username = self.config.username.clone();
                let transport = self.transport_mut()?;
                transport.write(format!("{username}\n").as_bytes()).await?;
                read_until(transport, Stop::Literal(&password_prompt), timeout, None).await?;
            }
            // Some devices (IOS line auth) skip the username entirely.
            FirstPrompt::Password => {}
            FirstPrompt::TimedOut(buffer) => {
                return Err(SessionError::ReadTimeout { timeout, buffer }.into());
            }
        }

        let password = self.config.password.clone();
        let output = self.telnet_secret_exchange(&password, timeout).await?;
        self.prompts = Some(PromptModel::discover(&output, &self.profile.prompt_endings));

        if self.config.enable_mode {
            log::debug!("entering enable mode");
            let enable = self.profile.enable_command.clone();
            let transport = self.transport_mut()?;
            transport.write(format!("{enable}\n").as_bytes()).await?;
            read_until(transport, Stop::Literal(&password_prompt), timeout, None).await?;

            let enable_password = self.config.enable_password.clone().unwrap_or_default();
            // The prompt ending may switch (> to #); the model already
            // covers every variant, no re-discovery.
            self.telnet_secret_exchange(&enable_password, timeout).await?;
        }

        self.disable_paging().await
    }

    /// One password-style exchange, translating the tagged outcome into
    /// errors at this boundary.
    async fn telnet_secret_exchange(&mut self, secret: &str, timeout: Duration) -> Result<String> {
        let success = self.profile.bootstrap_endings.clone();
        let failure = self.profile.auth_failure_prompts.clone();

        let outcome =
            exchange_secret(self.transport_mut()?, secret, &success, &failure, timeout).await?;
        match outcome {
            LoginOutcome::Authenticated(output) => Ok(output),
            LoginOutcome::Rejected(output) => {
                Err(SessionError::AuthenticationFailed { output }.into())
            }
            LoginOutcome::TimedOut(buffer) => {
                Err(SessionError::ReadTimeout { timeout, buffer }.into())
            }
        }
    }

    async fn disable_paging(&mut self) -> Result<()> {
        if let Some(cmd) = self.profile.paging_disable.clone() {
            log::debug!("disabling paging: {cmd:?}");
            self.exec(&cmd, None, self.config.timeout, None).await?;
        }
        Ok(())
    }

    fn transport_mut(&mut self) -> Result<&mut (dyn Transport + Send + 'static)> {
        self.transport
            .as_deref_mut()
            .ok_or_else(|| SessionError::NotConnected.into())
    }

    fn stem(&self) -> Option<&str> {
        self.prompts.as_ref().map(PromptModel::stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("ssh".parse::<Protocol>().unwrap(), Protocol::Ssh);
        assert_eq!("TELNET".parse::<Protocol>().unwrap(), Protocol::Telnet);
        assert!(matches!(
            "rlogin".parse::<Protocol>(),
            Err(ConfigError::UnsupportedProtocol { name }) if name == "rlogin"
        ));
    }

    #[test]
    fn test_protocol_default_ports() {
        assert_eq!(Protocol::Ssh.default_port(), 22);
        assert_eq!(Protocol::Telnet.default_port(), 23);
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut session = Session::builder("192.0.2.1")
            .username("admin")
            .password("pw")
            .build()
            .unwrap();

        let err = session.send_command("show version").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::NotConnected)
        ));

        let err = session.send_config_set(&["hostname x"]).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_when_never_connected() {
        let mut session = Session::builder("192.0.2.1")
            .username("admin")
            .password("pw")
            .build()
            .unwrap();

        assert_eq!(session.state(), SessionState::Disconnected);
        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
