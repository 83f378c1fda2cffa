//! Read-until-match engine.
//!
//! Accumulates chunks from the transport until a stop condition is met.
//! The timeout bounds every individual chunk read, not the loop as a whole:
//! a device that keeps dribbling bytes can extend a read indefinitely, and
//! only a single stalled chunk trips `ReadTimeout`. This per-packet
//! liveness check is deliberate; the only global guard is the accumulator
//! size cap.

use std::time::Duration;

use bytes::BytesMut;
use memchr::memmem;

use crate::error::{Result, SessionError};
use crate::prompt::PromptModel;
use crate::transport::Transport;

/// Max bytes requested per chunk read.
pub(crate) const MAX_BUFFER_DATA: usize = 65_535;

/// Hard cap on the accumulation buffer, against a peer that floods without
/// ever presenting a prompt.
pub(crate) const MAX_ACCUMULATED: usize = 4 * 1024 * 1024;

/// Read iterations allowed when leaving Telnet config mode. Some devices
/// answer `exit` with no further prompt when not in an elevated privilege
/// state; the cap breaks that would-be-infinite loop.
pub(crate) const CONFIG_EXIT_READ_CAP: usize = 3;

/// What ends a read loop.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Stop<'a> {
    /// Any prompt-model variant is contained in the buffer.
    Prompt(&'a PromptModel),

    /// A literal override pattern is contained in the buffer.
    Literal(&'a str),

    /// The buffer ends with one of the candidate literals. Used at connect
    /// time, before a prompt model exists.
    EndsWithAny(&'a [String]),
}

impl Stop<'_> {
    fn is_met(&self, buffer: &[u8]) -> bool {
        match self {
            Stop::Prompt(model) => model.matches_bytes(buffer),
            Stop::Literal(pattern) => memmem::find(buffer, pattern.as_bytes()).is_some(),
            Stop::EndsWithAny(candidates) => candidates
                .iter()
                .any(|c| buffer.ends_with(c.as_bytes())),
        }
    }
}

/// Accumulate chunks until `stop` is met.
///
/// `iteration_cap` limits the number of chunk reads; when the cap runs out
/// without a match the accumulated text is returned as-is instead of
/// raising (the Telnet config-exit circuit breaker). `None` loops until a
/// match, a timeout or the size cap.
pub(crate) async fn read_until(
    transport: &mut (dyn Transport + Send),
    stop: Stop<'_>,
    timeout: Duration,
    iteration_cap: Option<usize>,
) -> Result<String> {
    let mut buffer = BytesMut::with_capacity(4096);
    let mut remaining = iteration_cap;

    loop {
        if let Some(n) = remaining.as_mut() {
            if *n == 0 {
                log::debug!("read_until: iteration cap hit with {} bytes buffered", buffer.len());
                break;
            }
            *n -= 1;
        }

        let chunk = match tokio::time::timeout(timeout, transport.read_chunk(MAX_BUFFER_DATA)).await
        {
            Ok(read) => read?,
            Err(_) => {
                let partial = String::from_utf8_lossy(&buffer).into_owned();
                log::debug!(
                    "read_until: chunk read stalled past {timeout:?} with {} bytes buffered",
                    partial.len()
                );
                return Err(SessionError::ReadTimeout {
                    timeout,
                    buffer: partial,
                }
                .into());
            }
        };

        buffer.extend_from_slice(&chunk);
        log::trace!("read_until: +{} bytes ({} total)", chunk.len(), buffer.len());

        if buffer.len() > MAX_ACCUMULATED {
            return Err(SessionError::BufferLimitExceeded {
                limit: MAX_ACCUMULATED,
            }
            .into());
        }

        if stop.is_met(&buffer) {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
