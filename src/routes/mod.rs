/// Router Module Index
///
/// Splits the API by who may call it. The access gate in `crate::gate` wraps all
/// three; the extractors each handler takes are the per-route check.

/// Storefront routes, open to anonymous visitors.
pub mod public;

/// Routes whose handlers require a signed-in session (`RequireIdentity`).
pub mod authenticated;

/// Back-office routes, mounted under `/admin` and reachable only with the `ADMIN` role.
pub mod admin;
