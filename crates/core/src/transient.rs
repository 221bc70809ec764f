//! Transient-failure classification.
//!
//! Decides whether a failed call is worth retrying. Upstream proxies
//! sometimes answer with an HTML gateway page instead of JSON, and the
//! HTTP client surfaces low-level socket faults as free-form text, so the
//! message variant is matched on substrings.

/// HTTP statuses that indicate a gateway or server hiccup.
pub const TRANSIENT_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Markers of a raw HTML error page returned by an edge proxy.
const HTML_MARKERS: &[&str] = &["<!doctype", "<html"];

/// Markers of a connection-level fault. Matched case-insensitively.
const CONNECTION_MARKERS: &[&str] = &[
    "econnreset",
    "connection reset",
    "connection",
    "socket",
    "timeout",
    "timed out",
    "other side closed",
    "fetch failed",
    "error sending request",
];

/// Explicit upstream marker for an unhandled server fault.
const INTERNAL_SERVER_ERROR: &str = "internal server error";

/// Input to the classifier: either a status code or an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal<'a> {
    Status(u16),
    Message(&'a str),
}

/// Classify a failure signal. Returns `true` when a retry is warranted.
pub fn is_transient(signal: FailureSignal<'_>) -> bool {
    match signal {
        FailureSignal::Status(status) => is_transient_status(status),
        FailureSignal::Message(message) => is_transient_message(message),
    }
}

/// `true` for 500, 502, 503 and 504.
pub fn is_transient_status(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// `true` when the message carries a 5xx numeral, an HTML error page, a
/// connection fault or an explicit "Internal server error".
pub fn is_transient_message(message: &str) -> bool {
    if TRANSIENT_STATUSES
        .iter()
        .any(|status| message.contains(&status.to_string()))
    {
        return true;
    }

    let lower = message.to_ascii_lowercase();

    HTML_MARKERS.iter().any(|m| lower.contains(m))
        || CONNECTION_MARKERS.iter().any(|m| lower.contains(m))
        || lower.contains(INTERNAL_SERVER_ERROR)
}
