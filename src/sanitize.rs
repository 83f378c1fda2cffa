//! Output sanitization and device-error detection.
//!
//! Raw accumulated output is framed as `echoed command + body + prompt`.
//! The sanitizer peels that framing off in a fixed order, with every step a
//! tolerant no-op when its landmark is absent (not all devices echo, and
//! not all prompts survive byte-for-byte).

use crate::error::SessionError;
use crate::profile::SanitizeStrategy;
use crate::prompt::PromptModel;

/// Strip the command echo, leading line-break noise and the trailing
/// matched prompt from raw output.
pub fn sanitize(raw: &str, cmd: &str, prompts: &PromptModel, strategy: SanitizeStrategy) -> String {
    match strategy {
        SanitizeStrategy::Substring => {
            let output = strip_command_echo(raw, cmd);
            let output = strip_leading_line_breaks(output);
            strip_ending_prompt(output, prompts)
        }
        SanitizeStrategy::WholeLine => strip_first_and_last_lines(raw),
    }
}

/// Exact-string left-strip of the echoed `cmd + "\n"`.
fn strip_command_echo<'a>(raw: &'a str, cmd: &str) -> &'a str {
    let echoed = format!("{cmd}\n");
    raw.strip_prefix(echoed.as_str())
        .or_else(|| raw.strip_prefix(cmd))
        .unwrap_or(raw)
}

/// Strip a leading run of carriage-return/newline characters.
fn strip_leading_line_breaks(text: &str) -> &str {
    text.trim_start_matches(['\r', '\n'])
}

/// Truncate at the last occurrence of the first prompt variant contained in
/// the text, then drop the adjoining trailing line break.
fn strip_ending_prompt(text: &str, prompts: &PromptModel) -> String {
    match prompts.find_in(text) {
        Some(prompt) => {
            let cut = text.rfind(prompt).unwrap_or(text.len());
            text[..cut].trim_end_matches(['\r', '\n']).to_string()
        }
        None => text.to_string(),
    }
}

/// Whole-line variant: drop the first physical line (echo) and the last
/// physical line (prompt), keeping what is between.
fn strip_first_and_last_lines(raw: &str) -> String {
    let body = match raw.split_once('\n') {
        Some((_first, rest)) => rest,
        None => return String::new(),
    };
    let body = strip_leading_line_breaks(body);
    match body.rfind('\n') {
        Some(cut) => body[..cut].trim_end_matches(['\r', '\n']).to_string(),
        // Only the prompt line remained
        None => String::new(),
    }
}

/// Raise `DeviceError` when non-empty output starts with one of the
/// configured error markers. A pass/fail gate, not a parser.
pub fn check_error(output: &str, markers: &[String]) -> Result<(), SessionError> {
    if output.is_empty() {
        return Ok(());
    }
    for marker in markers {
        if output.starts_with(marker.as_str()) {
            log::debug!("device reported an error: {output:?}");
            return Err(SessionError::DeviceError {
                output: output.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(prompt: &str) -> PromptModel {
        let endings: Vec<String> = ["(config)#", "#", ">"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        PromptModel::discover(prompt, &endings)
    }

    #[test]
    fn test_sanitize_full_framing() {
        let prompts = model("switch1#");
        let raw = "show ver\n\r\nVersion 15.2\r\nswitch1#";
        let out = sanitize(raw, "show ver", &prompts, SanitizeStrategy::Substring);
        assert_eq!(out, "Version 15.2");
    }

    #[test]
    fn test_sanitize_framing_property() {
        // raw = cmd + "\n" + body + promptEnding => body, for any body that
        // does not itself contain a prompt variant.
        let prompts = model("sw#");
        for body in ["interface up", "a\r\nb\r\nc", ""] {
            let raw = format!("show x\n{body}\r\nsw#");
            let out = sanitize(&raw, "show x", &prompts, SanitizeStrategy::Substring);
            assert_eq!(out, body);
        }
    }

    #[test]
    fn test_sanitize_no_echo_is_noop() {
        let prompts = model("sw#");
        let raw = "Version 12.4\r\nsw#";
        let out = sanitize(raw, "show ver", &prompts, SanitizeStrategy::Substring);
        assert_eq!(out, "Version 12.4");
    }

    #[test]
    fn test_sanitize_no_prompt_is_noop() {
        let prompts = model("sw#");
        let out = sanitize("show ver\nVersion 12.4", "show ver", &prompts, SanitizeStrategy::Substring);
        assert_eq!(out, "Version 12.4");
    }

    #[test]
    fn test_sanitize_config_mode_prompt() {
        let prompts = model("sw#");
        let raw = "hostname lab\n\r\nsw(config)#";
        let out = sanitize(raw, "hostname lab", &prompts, SanitizeStrategy::Substring);
        assert_eq!(out, "");
    }

    #[test]
    fn test_sanitize_whole_line_strategy() {
        let prompts = model("[admin@rb] > ");
        let raw = "/system identity print\r\n  name: rb\r\n[admin@rb] > ";
        let out = sanitize(raw, "/system identity print", &prompts, SanitizeStrategy::WholeLine);
        assert_eq!(out, "  name: rb");
    }

    #[test]
    fn test_sanitize_whole_line_prompt_only() {
        let prompts = model("[admin@rb] > ");
        let out = sanitize("exit\r\n[admin@rb] > ", "exit", &prompts, SanitizeStrategy::WholeLine);
        assert_eq!(out, "");
    }

    #[test]
    fn test_check_error_marker_gate() {
        let markers = vec!["%".to_string()];
        let err = check_error("% Invalid input detected at '^' marker.", &markers)
            .expect_err("marker output must raise");
        match err {
            SessionError::DeviceError { output } => {
                assert!(output.starts_with("% Invalid input"))
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(check_error("Version 15.2", &markers).is_ok());
        // Marker elsewhere than the start is device output, not an error.
        assert!(check_error("loss 0%", &markers).is_ok());
    }

    #[test]
    fn test_check_error_empty_output_never_raises() {
        assert!(check_error("", &vec!["%".to_string()]).is_ok());
    }
}
