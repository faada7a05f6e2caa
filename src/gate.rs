//! Access gate for the admin back-office.
//!
//! Every request passes through [`access_gate`]. Paths under `/admin` continue only
//! when the session token verifies and carries the `ADMIN` role; everything else on
//! those paths is redirected to the sign-in page with a `callbackUrl` pointing back
//! at the original path and query. The decision itself is a pure function of the
//! route class and the role, so it can be exercised without any I/O.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{auth, config::AppConfig, models::Role};

/// Prefix that marks a path as belonging to the back-office.
pub const ADMIN_PREFIX: &str = "/admin";

/// Where unauthenticated or unauthorized admin traffic is sent.
pub const SIGN_IN_PATH: &str = "/auth/signin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Admin,
    Other,
}

impl RouteClass {
    /// `/admin` and anything below `/admin/` is admin; `/administrator` is not.
    pub fn classify(path: &str) -> Self {
        match path.strip_prefix(ADMIN_PREFIX) {
            Some("") => Self::Admin,
            Some(rest) if rest.starts_with('/') => Self::Admin,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectToSignIn,
}

/// decide
///
/// The whole authorization policy. A missing session and a non-admin role get the
/// same answer, so callers can't tell the two apart.
pub fn decide(route: RouteClass, role: Option<Role>) -> GateDecision {
    match (route, role) {
        (RouteClass::Other, _) => GateDecision::Allow,
        (RouteClass::Admin, Some(Role::Admin)) => GateDecision::Allow,
        (RouteClass::Admin, _) => GateDecision::RedirectToSignIn,
    }
}

/// sign_in_location
///
/// Builds `/auth/signin?callbackUrl=<encoded path+query>` for the request URI.
/// Only the path and query are echoed back, never a scheme or host.
pub fn sign_in_location(uri: &Uri) -> String {
    let callback = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    format!(
        "{SIGN_IN_PATH}?callbackUrl={}",
        urlencoding::encode(callback)
    )
}

/// access_gate
///
/// Middleware wrapping the entire router. Verification is a signature and expiry
/// check only; no database access happens here.
pub async fn access_gate(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let route = RouteClass::classify(request.uri().path());

    if route == RouteClass::Other {
        return next.run(request).await;
    }

    let role = auth::verify_session(request.headers(), &config).map(|claims| claims.role);

    match decide(route, role) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectToSignIn => {
            let location = sign_in_location(request.uri());
            tracing::debug!(
                path = %request.uri().path(),
                has_session = role.is_some(),
                "admin request redirected to sign-in"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}
