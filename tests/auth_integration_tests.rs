mod common;

use artisan_storefront::{
    AppConfig,
    auth::{decode_session, session_token, verify_session},
    error::AppError,
    identity::{
        FALLBACK_DISPLAY_NAME, OptionalIdentity, RequireAdmin, RequireIdentity, SessionIdentity,
        display_name,
    },
    models::Role,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use common::{ADMIN_ID, CUSTOMER_ID, MemoryRepo, admin_token, app_state, customer_token, token};
use uuid::Uuid;

// --- Helper Functions ---

fn parts_with(headers: &[(header::HeaderName, String)]) -> Parts {
    let mut builder = Request::builder().uri("/me");
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder.body(()).unwrap().into_parts().0
}

fn bearer(token: &str) -> Parts {
    parts_with(&[(header::AUTHORIZATION, format!("Bearer {token}"))])
}

// --- Token Location ---

#[test]
fn cookie_wins_over_bearer_header() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("a=1; session-token=from-cookie"));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

    assert_eq!(session_token(&headers, "session-token"), Some("from-cookie"));
}

#[test]
fn bearer_is_used_without_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

    assert_eq!(session_token(&headers, "session-token"), Some("abc.def.ghi"));
}

#[test]
fn empty_cookie_and_non_bearer_schemes_are_ignored() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("session-token="));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

    assert_eq!(session_token(&headers, "session-token"), None);
}

#[test]
fn custom_cookie_name_is_respected() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("session-token=wrong; __Secure-sess=right"));

    assert_eq!(session_token(&headers, "__Secure-sess"), Some("right"));
}

// --- Verification ---

#[test]
fn valid_token_decodes_to_claims() {
    let config = AppConfig::default();
    let claims = decode_session(&admin_token(), &config.auth_secret).unwrap();

    assert_eq!(claims.sub, ADMIN_ID);
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.name.as_deref(), Some("Ada"));
}

#[test]
fn unknown_role_claim_is_rejected() {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let config = AppConfig::default();
    let payload = serde_json::json!({
        "sub": Uuid::new_v4(),
        "role": "SUPERUSER",
        "exp": 4_102_444_800u64,
    });
    let raw = encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(config.auth_secret.as_bytes()),
    )
    .unwrap();

    assert!(decode_session(&raw, &config.auth_secret).is_err());
}

#[test]
fn verify_session_is_none_without_token() {
    assert!(verify_session(&HeaderMap::new(), &AppConfig::default()).is_none());
}

// --- Display Name ---

#[test]
fn display_name_prefers_name_then_email_then_fallback() {
    assert_eq!(display_name(Some("Ada"), Some("ada@example.com")), "Ada");
    assert_eq!(display_name(None, Some("ada@example.com")), "ada@example.com");
    assert_eq!(display_name(Some("   "), Some("ada@example.com")), "ada@example.com");
    assert_eq!(display_name(Some(""), Some("")), FALLBACK_DISPLAY_NAME);
    assert_eq!(display_name(None, None), "Admin");
}

#[test]
fn identity_from_claims_drops_blank_email() {
    let identity = SessionIdentity::from_claims(common::claims(ADMIN_ID, Role::Admin, Some("  "), None));

    assert_eq!(identity.email, None);
    assert_eq!(identity.name, None);
    assert_eq!(identity.display_name, FALLBACK_DISPLAY_NAME);
    assert!(identity.is_admin());
}

// --- Extractors ---

#[tokio::test]
async fn require_identity_accepts_customer() {
    let state = app_state(MemoryRepo::new());
    let mut parts = bearer(&customer_token());

    let RequireIdentity(identity) = RequireIdentity::from_request_parts(&mut parts, &state)
        .await
        .unwrap();

    assert_eq!(identity.id, CUSTOMER_ID);
    assert_eq!(identity.role, Role::Customer);
    assert_eq!(identity.display_name, "Cy");
}

#[tokio::test]
async fn require_identity_rejects_missing_session() {
    let state = app_state(MemoryRepo::new());
    let mut parts = parts_with(&[]);

    let rejection = RequireIdentity::from_request_parts(&mut parts, &state)
        .await
        .err()
        .unwrap();

    assert!(matches!(rejection, AppError::Unauthorized(_)));
    assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn require_identity_rejects_session_without_email() {
    let state = app_state(MemoryRepo::new());
    let mut parts = bearer(&token(CUSTOMER_ID, Role::Customer, None, Some("Cy")));

    let result = RequireIdentity::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn require_admin_forbids_customer() {
    let state = app_state(MemoryRepo::new());
    let mut parts = bearer(&customer_token());

    let rejection = RequireAdmin::from_request_parts(&mut parts, &state)
        .await
        .err()
        .unwrap();

    assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn require_admin_accepts_admin() {
    let state = app_state(MemoryRepo::new());
    let mut parts = bearer(&admin_token());

    let RequireAdmin(admin) = RequireAdmin::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(admin.id, ADMIN_ID);
    assert_eq!(admin.display_name, "Ada");
}

#[tokio::test]
async fn optional_identity_never_rejects() {
    let state = app_state(MemoryRepo::new());

    let mut anonymous = parts_with(&[]);
    let OptionalIdentity(none) = OptionalIdentity::from_request_parts(&mut anonymous, &state)
        .await
        .unwrap();
    assert!(none.is_none());

    let mut garbage = bearer("garbage");
    let OptionalIdentity(still_none) = OptionalIdentity::from_request_parts(&mut garbage, &state)
        .await
        .unwrap();
    assert!(still_none.is_none());

    let mut signed_in = bearer(&admin_token());
    let OptionalIdentity(some) = OptionalIdentity::from_request_parts(&mut signed_in, &state)
        .await
        .unwrap();
    assert_eq!(some.map(|i| i.id), Some(ADMIN_ID));
}
