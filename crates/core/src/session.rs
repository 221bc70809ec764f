//! Anonymous session helpers.
//!
//! A "user" is identified by a salted SHA-256 of the client IP; each browser
//! gets a random session token stored in an HTTP-only cookie.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "hyde_session";

/// Cookie lifetime (one year).
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// Salt used when `SESSION_SECRET` is not configured.
pub const DEFAULT_SESSION_SALT: &str = "hyde-playlist-default-salt";

/// Headers consulted for the client address, in priority order. Each may
/// hold a comma-separated chain; the first entry is the client.
pub const CLIENT_IP_HEADERS: [&str; 4] = [
    "x-forwarded-for",
    "x-vercel-forwarded-for",
    "x-real-ip",
    "cf-connecting-ip",
];

/// Address used when no proxy header is present.
pub const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Hash a client IP with the server-side salt.
pub fn hash_ip(salt: &str, ip: &str) -> String {
    sha256_hex(format!("{salt}:{ip}").as_bytes())
}

/// 32 random bytes, hex-encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Resolve the client IP from proxy headers.
///
/// `header` returns the raw value of a header by lowercase name.
pub fn client_ip<'a>(header: impl Fn(&str) -> Option<&'a str>) -> String {
    CLIENT_IP_HEADERS
        .iter()
        .filter_map(|name| header(name))
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_string()
}
