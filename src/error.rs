use parlance_realtime_types::events::server::ErrorDetails;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Microphone permission denied or no input device exists. Reported to
    /// the user, not retried.
    #[error("audio input unavailable: {0}")]
    DeviceUnavailable(String),

    /// The relay dropped the session because a forwarding queue overflowed.
    #[error("relay overloaded: {0}")]
    RelayOverloaded(String),

    /// Failure before the session was established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An upstream error payload that is not a benign notice.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// No payload of any kind arrived within the processing window.
    #[error("no response after {}s, try again", .0.as_secs())]
    ResponseTimeout(std::time::Duration),

    #[error("not connected yet")]
    NotConnected,
}

/// Substrings that mark an upstream error payload as an expected race
/// between a user-initiated cancel and a response that already completed.
const BENIGN_NOTICES: &[&str] = &[
    "no active response",
    "cancellation failed",
    "response is not active",
    "already completed",
];

/// True when an upstream error payload should be swallowed (logged, never
/// surfaced): an empty payload, or a message matching the enumerated
/// cancel-race notices.
pub fn is_benign_notice(details: &ErrorDetails) -> bool {
    match details.message() {
        None => true,
        Some(msg) if msg.trim().is_empty() => true,
        Some(msg) => {
            let msg = msg.to_ascii_lowercase();
            BENIGN_NOTICES.iter().any(|needle| msg.contains(needle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_benign() {
        assert!(is_benign_notice(&ErrorDetails::empty()));
        assert!(is_benign_notice(&ErrorDetails::new("invalid_request_error", "   ")));
    }

    #[test]
    fn cancel_races_are_benign() {
        for msg in [
            "Cancellation failed: no active response found",
            "There is no active response to cancel.",
            "Response is not active",
            "That response has already completed.",
        ] {
            assert!(
                is_benign_notice(&ErrorDetails::new("invalid_request_error", msg)),
                "expected benign: {msg}"
            );
        }
    }

    #[test]
    fn real_failures_are_not_benign() {
        for msg in [
            "Rate limit exceeded",
            "The server had an error processing your request.",
            "Invalid audio format",
        ] {
            assert!(
                !is_benign_notice(&ErrorDetails::new("server_error", msg)),
                "expected fatal: {msg}"
            );
        }
    }
}
