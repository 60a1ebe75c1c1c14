//! Best-effort access token inspection for HealthSight.
//!
//! The backend issues compact three-segment bearer tokens
//! (`header.payload.signature`). The only thing the client ever needs
//! from the inside of one is the `exp` claim, so the expiry scheduler
//! can arm a logout timer without a round trip.
//!
//! # This is not verification
//!
//! [`decode_expiry`] reads the payload without checking the signature.
//! It must never be used to decide whether a token is *valid* — only the
//! backend can do that. A forged `exp` merely changes when the client
//! logs itself out; the server rejects the token either way.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::trace;

/// The one claim we care about. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Expiry as seconds since the Unix epoch.
    exp: Option<f64>,
}

/// Extracts the expiry instant from a compact token, in epoch
/// **milliseconds**.
///
/// Returns `None` for anything that isn't a decodable token carrying a
/// numeric `exp` claim: fewer than two segments, payload that isn't
/// base64url, payload that isn't JSON, missing or non-numeric `exp`.
/// Decode failures are an expected condition (tokens are opaque to the
/// client), so this never returns an error and never panics.
pub fn decode_expiry(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    // Issuers differ on padding; strip it and decode as unpadded.
    let raw = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(raw) => raw,
        Err(err) => {
            trace!(%err, "token payload is not base64url");
            return None;
        }
    };

    let claims: Claims = match serde_json::from_slice(&raw) {
        Ok(claims) => claims,
        Err(err) => {
            trace!(%err, "token payload is not JSON");
            return None;
        }
    };

    // `exp` is in seconds; the session layer works in milliseconds.
    claims.exp.map(|exp| (exp * 1000.0) as i64)
}
