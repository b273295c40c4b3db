use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};
use crate::models::Id;

/// Claims carried in a bearer token's payload segment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub id: Id,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read the claims out of a `header.payload.signature` token.
///
/// The signature is not checked: the backend issued the token and verifies it
/// on every request. The client only needs the user id.
pub fn decode_claims(token: &str) -> ClientResult<Claims> {
    let token = token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClientError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| ClientError::MalformedToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&payload)
        .map_err(|e| ClientError::MalformedToken(format!("payload is not valid claims: {}", e)))
}
