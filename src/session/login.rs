//! Telnet login sub-protocol.
//!
//! Telnet has no authentication layer, so login is scripted like any other
//! prompt exchange. Failure is detected by scanning for vendor failure
//! literals (a second `Username:`, `Authentication failure`, ...) instead of
//! waiting for a timeout. Outcomes are a tagged value here; translation to
//! raised errors happens at the connect boundary.

use std::time::Duration;

use memchr::memmem;

use crate::error::{Result, SessionError};
use crate::session::read::{MAX_ACCUMULATED, MAX_BUFFER_DATA};
use crate::transport::Transport;

/// What the device printed first after the banner.
#[derive(Debug)]
pub(crate) enum FirstPrompt {
    /// A username is expected before the password.
    Login,

    /// The device went straight to the password prompt.
    Password,

    /// Neither prompt appeared before a chunk read stalled.
    TimedOut(String),
}

/// Result of one secret exchange (password or enable password).
#[derive(Debug)]
pub(crate) enum LoginOutcome {
    /// A success candidate appeared; carries the accumulated output so the
    /// caller can discover the prompt from it.
    Authenticated(String),

    /// A failure literal appeared; carries the output for diagnostics.
    Rejected(String),

    /// No candidate appeared and a chunk read stalled past the timeout.
    TimedOut(String),
}

/// Wait for the device to ask for credentials.
///
/// Loops until the login prompt or the password prompt is contained in the
/// accumulated output (some devices skip the username entirely).
pub(crate) async fn await_first_prompt(
    transport: &mut (dyn Transport + Send),
    login_prompt: &str,
    password_prompt: &str,
    timeout: Duration,
) -> Result<FirstPrompt> {
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        let chunk = match read_one_chunk(transport, timeout).await? {
            Some(chunk) => chunk,
            None => {
                return Ok(FirstPrompt::TimedOut(
                    String::from_utf8_lossy(&buffer).into_owned(),
                ));
            }
        };
        buffer.extend_from_slice(&chunk);
        check_size(&buffer)?;

        if memmem::find(&buffer, login_prompt.as_bytes()).is_some() {
            log::debug!("telnet login: username requested");
            return Ok(FirstPrompt::Login);
        }
        if memmem::find(&buffer, password_prompt.as_bytes()).is_some() {
            log::debug!("telnet login: password requested directly");
            return Ok(FirstPrompt::Password);
        }
    }
}

/// Write a secret followed by a newline, then classify what comes back.
///
/// Success candidates are checked before failure literals on every
/// iteration: the failure set is deliberately loose (`:` catches a repeated
/// `Username:`) and must not override a genuine prompt.
pub(crate) async fn exchange_secret(
    transport: &mut (dyn Transport + Send),
    secret: &str,
    success: &[String],
    failure: &[String],
    timeout: Duration,
) -> Result<LoginOutcome> {
    transport.write(format!("{secret}\n").as_bytes()).await?;

    let mut buffer: Vec<u8> = Vec::new();

    loop {
        let chunk = match read_one_chunk(transport, timeout).await? {
            Some(chunk) => chunk,
            None => {
                return Ok(LoginOutcome::TimedOut(
                    String::from_utf8_lossy(&buffer).into_owned(),
                ));
            }
        };
        buffer.extend_from_slice(&chunk);
        check_size(&buffer)?;

        if let Some(found) = contained(&buffer, success) {
            log::debug!("telnet login: success candidate {found:?} seen");
            return Ok(LoginOutcome::Authenticated(
                String::from_utf8_lossy(&buffer).into_owned(),
            ));
        }
        if let Some(found) = contained(&buffer, failure) {
            log::warn!("telnet login: failure literal {found:?} seen");
            return Ok(LoginOutcome::Rejected(
                String::from_utf8_lossy(&buffer).into_owned(),
            ));
        }
    }
}

/// One bounded chunk read; `None` marks a timeout.
async fn read_one_chunk(
    transport: &mut (dyn Transport + Send),
    timeout: Duration,
) -> Result<Option<Vec<u8>>> {
    match tokio::time::timeout(timeout, transport.read_chunk(MAX_BUFFER_DATA)).await {
        Ok(read) => Ok(Some(read?)),
        Err(_) => Ok(None),
    }
}

/// Same accumulation cap the read engine enforces; a device flooding the
/// login exchange must not grow the buffer without bound either.
fn check_size(buffer: &[u8]) -> Result<()> {
    if buffer.len() > MAX_ACCUMULATED {
        return Err(SessionError::BufferLimitExceeded {
            limit: MAX_ACCUMULATED,
        }
        .into());
    }
    Ok(())
}

fn contained<'a>(buffer: &[u8], candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .find(|c| memmem::find(buffer, c.as_bytes()).is_some())
        .map(String::as_str)
}
