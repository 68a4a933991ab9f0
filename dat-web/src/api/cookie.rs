//! Session cookie handling
//!
//! The cookie carries only the session token; all state stays on the server.

use axum::http::header::{HeaderMap, COOKIE};
use dat_common::SessionToken;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "dat_session";

/// Token from the request's `Cookie` headers, if present and well-formed
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

/// `Set-Cookie` value binding the client to `token`
pub fn session_cookie(token: SessionToken, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
