use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, models::Role};

/// Claims
///
/// Payload of the session token minted by the external auth provider. This service
/// never issues tokens; it only verifies the signature and expiry with the shared secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id, mirrored as the primary key of `users`.
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A role outside the known set fails deserialization, which the gate treats as "no session".
    pub role: Role,
    /// Expiration Time (exp): always validated.
    pub exp: usize,
    /// Issued At (iat).
    #[serde(default)]
    pub iat: usize,
}

/// session_token
///
/// Locates the raw session token on a request: the provider's session cookie wins,
/// an `Authorization: Bearer` header is the fallback for API clients.
pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// decode_session
///
/// Verifies the HS256 signature and the `exp` claim, returning the decoded claims.
pub fn decode_session(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
}

/// verify_session
///
/// Pulls the token off the request and verifies it. Every failure mode (no token,
/// bad signature, expired, malformed, unknown role) collapses into `None`.
pub fn verify_session(headers: &HeaderMap, config: &AppConfig) -> Option<Claims> {
    let token = session_token(headers, &config.session_cookie)?;

    match decode_session(token, &config.auth_secret) {
        Ok(claims) => Some(claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                kind => tracing::debug!(?kind, "session token rejected"),
            }
            None
        }
    }
}
