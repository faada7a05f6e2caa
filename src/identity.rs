//! Identity of the acting user, derived from the verified session.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{self, Claims},
    config::AppConfig,
    error::AppError,
    models::Role,
};

/// Label used when a session carries neither a name nor an email.
pub const FALLBACK_DISPLAY_NAME: &str = "Admin";

/// SessionIdentity
///
/// Who is acting on this request. `display_name` is what audit entries attribute to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionIdentity {
    pub id: Uuid,
    /// The session's own name claim, if it carried a non-blank one.
    pub name: Option<String>,
    pub email: Option<String>,
    pub display_name: String,
    pub role: Role,
}

impl SessionIdentity {
    pub fn from_claims(claims: Claims) -> Self {
        let display_name = display_name(claims.name.as_deref(), claims.email.as_deref());
        Self {
            id: claims.sub,
            name: claims.name.filter(|name| !name.trim().is_empty()),
            email: claims.email.filter(|email| !email.trim().is_empty()),
            display_name,
            role: claims.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// display_name
///
/// First non-blank of `name`, then `email`, else [`FALLBACK_DISPLAY_NAME`].
pub fn display_name(name: Option<&str>, email: Option<&str>) -> String {
    [name, email]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(FALLBACK_DISPLAY_NAME)
        .to_string()
}

/// resolve_identity
///
/// `None` whenever the request has no verifiable session.
pub fn resolve_identity(headers: &HeaderMap, config: &AppConfig) -> Option<SessionIdentity> {
    auth::verify_session(headers, config).map(SessionIdentity::from_claims)
}

/// Extractor that requires a signed-in user with an email on the session.
///
/// Rejects with 401 otherwise.
pub struct RequireIdentity(pub SessionIdentity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        resolve_identity(&parts.headers, &config)
            .filter(|identity| identity.email.is_some())
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("sign-in required".to_string()))
    }
}

/// Extractor that optionally gets the acting user. Never rejects.
pub struct OptionalIdentity(pub Option<SessionIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Self(resolve_identity(&parts.headers, &config)))
    }
}

/// Extractor for admin handlers, checked again behind the access gate.
///
/// 401 without a session, 403 for any role other than `ADMIN`.
pub struct RequireAdmin(pub SessionIdentity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireIdentity(identity) = RequireIdentity::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }

        Ok(Self(identity))
    }
}
