//! Device profile: the per-vendor constants consumed by a session.
//!
//! A [`DeviceProfile`] is plain data - prompt literals, command strings,
//! error markers - assembled with builder-style setters and serde-compatible
//! so callers can load profiles from JSON or YAML. The two vendor behaviors
//! that are algorithmic rather than tabular are expressed as data too: the
//! [`SanitizeStrategy`] selector and the canned Telnet negotiation reply.

use serde::{Deserialize, Serialize};

/// Canned Telnet option reply, sent verbatim when the server opens with an
/// IAC negotiation burst. Advertises a dumb 80x24 terminal and accepts
/// server-side echo; enough to get RouterOS-style servers past their banner.
///
/// This is deliberately not an option negotiator - the bytes are a fixed
/// constant per the devices observed in the field.
pub const TELNET_NEGOTIATION_REPLY: &[u8] = &[
    0xff, 0xfb, 0x1f, // IAC WILL NAWS
    0xff, 0xfa, 0x1f, 0x00, 0x50, 0x00, 0x18, 0xff, 0xf0, // IAC SB NAWS 80x24 IAC SE
    0xff, 0xfb, 0x18, // IAC WILL TERMINAL-TYPE
    0xff, 0xfd, 0x01, // IAC DO ECHO
    0xff, 0xfd, 0x03, // IAC DO SUPPRESS-GO-AHEAD
    0xff, 0xfb, 0x03, // IAC WILL SUPPRESS-GO-AHEAD
];

/// How command output is sanitized after a successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeStrategy {
    /// Exact-substring stripping of the echoed command and the trailing
    /// matched prompt. Works for vendors that echo byte-for-byte.
    #[default]
    Substring,

    /// Drop the first and last physical lines wholesale. Used for vendors
    /// (Mikrotik) whose echo and prompt are interleaved with screen-control
    /// bytes, making exact substring matching unreliable.
    WholeLine,
}

/// Declarative text-extraction recipe applied to a getter's output.
///
/// These replace the original per-vendor method overrides with profile data:
/// each getter runs its command, then applies the recipe to the sanitized
/// output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extract {
    /// Return the sanitized output unchanged.
    Raw,

    /// Text between the first occurrence of `after` and the next
    /// occurrence of `before` (e.g. `"Version "` .. `","`).
    Between { after: String, before: String },

    /// First whitespace-separated word of the output.
    FirstWord,

    /// Last whitespace-separated word of the first line.
    LastWordOfFirstLine,

    /// The nth `"`-delimited field (0-based, counting delimiters like
    /// `str::split` does).
    QuotedField { index: usize },

    /// Last word of the first line containing `marker`, optionally with its
    /// final character dropped (for `Name: sw1,`-style lines).
    LineMarkerLastWord { marker: String, trim_trailing: bool },
}

impl Extract {
    /// Apply the recipe to sanitized command output.
    ///
    /// Returns `None` when the recipe does not fit the output shape; the
    /// session translates that into `SessionError::ExtractFailed`.
    pub fn apply(&self, output: &str) -> Option<String> {
        match self {
            Extract::Raw => Some(output.to_string()),
            Extract::Between { after, before } => {
                let rest = &output[output.find(after.as_str())? + after.len()..];
                let end = rest.find(before.as_str())?;
                Some(rest[..end].to_string())
            }
            Extract::FirstWord => output.split_whitespace().next().map(str::to_string),
            Extract::LastWordOfFirstLine => output
                .lines()
                .next()?
                .split_whitespace()
                .last()
                .map(str::to_string),
            Extract::QuotedField { index } => {
                output.split('"').nth(*index).map(str::to_string)
            }
            Extract::LineMarkerLastWord {
                marker,
                trim_trailing,
            } => {
                let line = output.lines().find(|l| l.contains(marker.as_str()))?;
                let word = line.split_whitespace().last()?;
                if *trim_trailing {
                    let mut chars = word.chars();
                    chars.next_back()?;
                    Some(chars.as_str().to_string())
                } else {
                    Some(word.to_string())
                }
            }
        }
    }
}

/// One getter: the command string to send and the recipe for its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    pub extract: Extract,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, extract: Extract) -> Self {
        Self {
            command: command.into(),
            extract,
        }
    }
}

/// Command strings and extraction recipes for the profile-backed getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSet {
    pub version: CommandSpec,
    pub hostname: CommandSpec,
    pub model: CommandSpec,
    pub serial_number: CommandSpec,
    pub get_config: CommandSpec,
    pub save_config: CommandSpec,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            version: CommandSpec::new(
                "show version",
                Extract::Between {
                    after: "Version ".to_string(),
                    before: ",".to_string(),
                },
            ),
            hostname: CommandSpec::new("show version | include uptime", Extract::FirstWord),
            model: CommandSpec::new("show inventory", Extract::QuotedField { index: 3 }),
            serial_number: CommandSpec::new("show inventory | i SN", Extract::LastWordOfFirstLine),
            get_config: CommandSpec::new("show running-config", Extract::Raw),
            save_config: CommandSpec::new("write memory", Extract::Raw),
        }
    }
}

/// Per-vendor constants for one device family.
///
/// Read-only for the duration of a session. The defaults mirror a classic
/// Cisco-IOS-flavoured CLI; builder-style setters adjust individual fields:
///
/// ```rust
/// use netscrape::{DeviceProfile, SanitizeStrategy};
///
/// let routeros = DeviceProfile::new("mikrotik_routeros")
///     .with_prompt_endings(["> "])
///     .with_bootstrap_endings(["> "])
///     .with_paging_disable(None)
///     .with_sanitize(SanitizeStrategy::WholeLine);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Profile name, informational only (e.g. "cisco_ios").
    pub name: String,

    /// Default TCP port when the session config does not set one.
    /// `None` falls back to the protocol default (22/23).
    pub default_port: Option<u16>,

    /// Literal the device prints when it wants a Telnet username.
    pub login_prompt: String,

    /// Literal the device prints when it wants a Telnet password.
    pub password_prompt: String,

    /// Literals whose appearance during the password exchange means the
    /// credentials were rejected.
    pub auth_failure_prompts: Vec<String>,

    /// Prompt endings used only at connect time, before the full prompt
    /// model exists (bare last-character endings, e.g. `#`, `>`).
    pub bootstrap_endings: Vec<String>,

    /// Every prompt-ending variant this family emits, in priority order.
    /// Must be non-empty.
    pub prompt_endings: Vec<String>,

    /// Leading markers that flag device-reported command errors.
    pub error_markers: Vec<String>,

    /// Command disabling output paging, run once at connect. `None` for
    /// vendors without a global paging switch.
    pub paging_disable: Option<String>,

    /// Command entering configuration mode.
    pub enter_config: String,

    /// Command leaving configuration mode.
    pub exit_config: String,

    /// Command entering enable (elevated-privilege) mode.
    pub enable_command: String,

    /// Output sanitization strategy for this family.
    pub sanitize: SanitizeStrategy,

    /// Canned reply to the server's initial IAC negotiation burst, sent
    /// verbatim once when the burst is observed. `None` skips negotiation.
    pub telnet_negotiation_reply: Option<Vec<u8>>,

    /// Getter command strings and extraction recipes.
    pub commands: CommandSet,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            default_port: None,
            login_prompt: "Username:".to_string(),
            password_prompt: "Password:".to_string(),
            auth_failure_prompts: vec![":".to_string(), "%".to_string()],
            bootstrap_endings: vec!["#".to_string(), ">".to_string()],
            prompt_endings: vec![
                "(config-line)#".to_string(),
                "(config-if)#".to_string(),
                "(config)#".to_string(),
                ">".to_string(),
                "#".to_string(),
            ],
            error_markers: vec!["%".to_string()],
            paging_disable: Some("terminal length 0".to_string()),
            enter_config: "configure terminal".to_string(),
            exit_config: "exit".to_string(),
            enable_command: "enable".to_string(),
            sanitize: SanitizeStrategy::Substring,
            telnet_negotiation_reply: None,
            commands: CommandSet::default(),
        }
    }
}

impl DeviceProfile {
    /// Create a profile with the generic defaults and the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the full prompt-ending variant list, in priority order.
    pub fn with_prompt_endings<I, S>(mut self, endings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompt_endings = endings.into_iter().map(Into::into).collect();
        self
    }

    /// Set the connect-time bootstrap ending set.
    pub fn with_bootstrap_endings<I, S>(mut self, endings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrap_endings = endings.into_iter().map(Into::into).collect();
        self
    }

    /// Set the Telnet login and password prompt literals.
    pub fn with_login_prompts(
        mut self,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.login_prompt = login.into();
        self.password_prompt = password.into();
        self
    }

    /// Set the authentication-failure literal set.
    pub fn with_auth_failure_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth_failure_prompts = prompts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the error-marker literal set.
    pub fn with_error_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set or clear the paging-disable command.
    pub fn with_paging_disable(mut self, command: Option<&str>) -> Self {
        self.paging_disable = command.map(str::to_string);
        self
    }

    /// Set the enter/exit configuration-mode commands.
    pub fn with_config_commands(
        mut self,
        enter: impl Into<String>,
        exit: impl Into<String>,
    ) -> Self {
        self.enter_config = enter.into();
        self.exit_config = exit.into();
        self
    }

    /// Set the sanitize strategy.
    pub fn with_sanitize(mut self, sanitize: SanitizeStrategy) -> Self {
        self.sanitize = sanitize;
        self
    }

    /// Enable the canned Telnet negotiation reply for this family.
    pub fn with_telnet_negotiation(mut self, reply: impl Into<Vec<u8>>) -> Self {
        self.telnet_negotiation_reply = Some(reply.into());
        self
    }

    /// Set the default TCP port.
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = Some(port);
        self
    }

    /// Replace the getter command set.
    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_ios_flavoured() {
        let profile = DeviceProfile::default();
        assert_eq!(profile.login_prompt, "Username:");
        assert_eq!(profile.paging_disable.as_deref(), Some("terminal length 0"));
        assert_eq!(profile.enter_config, "configure terminal");
        assert_eq!(profile.prompt_endings.len(), 5);
        assert_eq!(profile.sanitize, SanitizeStrategy::Substring);
    }

    #[test]
    fn test_builder_setters() {
        let profile = DeviceProfile::new("mikrotik_routeros")
            .with_prompt_endings(["> "])
            .with_bootstrap_endings(["> "])
            .with_paging_disable(None)
            .with_sanitize(SanitizeStrategy::WholeLine)
            .with_telnet_negotiation(TELNET_NEGOTIATION_REPLY);

        assert_eq!(profile.name, "mikrotik_routeros");
        assert_eq!(profile.prompt_endings, vec!["> "]);
        assert!(profile.paging_disable.is_none());
        assert_eq!(profile.sanitize, SanitizeStrategy::WholeLine);
        assert!(profile.telnet_negotiation_reply.is_some());
    }

    #[test]
    fn test_extract_between() {
        let recipe = Extract::Between {
            after: "Version ".to_string(),
            before: ",".to_string(),
        };
        let output = "Cisco IOS Software, Version 15.2(4)M7, RELEASE SOFTWARE";
        assert_eq!(recipe.apply(output).as_deref(), Some("15.2(4)M7"));
        assert_eq!(recipe.apply("no version here"), None);
    }

    #[test]
    fn test_extract_first_word() {
        assert_eq!(
            Extract::FirstWord.apply("sw1 uptime is 3 weeks").as_deref(),
            Some("sw1")
        );
        assert_eq!(Extract::FirstWord.apply(""), None);
    }

    #[test]
    fn test_extract_last_word_of_first_line() {
        let output = "NAME: \"1\", DESCR: x, SN: ABC123\nsecond line";
        assert_eq!(
            Extract::LastWordOfFirstLine.apply(output).as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn test_extract_quoted_field() {
        let output = "NAME: \"1\", DESCR: \"WS-C2960-24TT-L\"";
        assert_eq!(
            Extract::QuotedField { index: 3 }.apply(output).as_deref(),
            Some("WS-C2960-24TT-L")
        );
    }

    #[test]
    fn test_extract_line_marker_last_word() {
        let recipe = Extract::LineMarkerLastWord {
            marker: "Name: ".to_string(),
            trim_trailing: true,
        };
        let output = "  Description: core,\n  Name: sw-lab-1,\n  Location: rack 3";
        assert_eq!(recipe.apply(output).as_deref(), Some("sw-lab-1"));
        assert_eq!(recipe.apply("nothing matching"), None);
    }

    #[test]
    fn test_profile_serde_round_trip() {
        let profile = DeviceProfile::new("cisco_s300").with_paging_disable(Some("terminal datadump"));
        let json = serde_json::to_string(&profile).unwrap();
        let back: DeviceProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_partial_profile_deserializes_over_defaults() {
        let back: DeviceProfile =
            serde_json::from_str(r#"{"name":"alcatel_aos","prompt_endings":["> "]}"#).unwrap();
        assert_eq!(back.name, "alcatel_aos");
        assert_eq!(back.prompt_endings, vec!["> "]);
        // Untouched fields keep the generic defaults
        assert_eq!(back.password_prompt, "Password:");
    }
}
