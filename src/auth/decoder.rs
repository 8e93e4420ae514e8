//! Bearer credential decoding.
//!
//! Only the payload segment is read. Signatures are never checked here;
//! the backend verifies every request it receives.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::identity::{Identity, TokenClaims};
use super::session::SessionSnapshot;
use super::store::{CredentialStore, TOKEN_KEY};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("credential has no payload segment")]
    MissingPayload,

    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("credential expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
}

/// Decode a credential into an [`Identity`], rejecting it if `exp` has passed.
pub fn decode_at(token: &str, now: DateTime<Utc>) -> Result<Identity, DecodeError> {
    let payload = token
        .trim()
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(DecodeError::MissingPayload)?;

    let bytes = URL_SAFE_LENIENT.decode(payload)?;
    let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
    if !payload.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let claims = TokenClaims::deserialize(payload)?;
    let identity = Identity::from(claims);

    if let Some(exp) = identity.exp {
        let now = now.timestamp();
        if now >= exp {
            return Err(DecodeError::Expired { exp, now });
        }
    }

    Ok(identity)
}

pub fn decode(token: &str) -> Result<Identity, DecodeError> {
    decode_at(token, Utc::now())
}

/// Read the stored credential and turn it into a session snapshot.
///
/// Invalid or expired credentials are purged from `store`. Nothing here is
/// reported as an error: every failure resolves to "no session".
pub fn resolve_at(store: &dyn CredentialStore, now: DateTime<Utc>) -> SessionSnapshot {
    let token = match store.get(TOKEN_KEY) {
        Ok(Some(token)) => token,
        Ok(None) => return SessionSnapshot::signed_out(),
        Err(e) => {
            tracing::warn!("Failed to read stored credential: {}", e);
            return SessionSnapshot::signed_out();
        }
    };

    match decode_at(&token, now) {
        Ok(identity) => SessionSnapshot::signed_in(identity),
        Err(e) => {
            tracing::warn!("Discarding stored credential: {}", e);
            if let Err(e) = store.remove(TOKEN_KEY) {
                tracing::error!("Failed to purge stored credential: {}", e);
            }
            SessionSnapshot::signed_out()
        }
    }
}

pub fn resolve(store: &dyn CredentialStore) -> SessionSnapshot {
    resolve_at(store, Utc::now())
}
