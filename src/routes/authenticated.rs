use crate::{AppState, handlers::account};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Customer account endpoints. Every handler extracts `RequireIdentity`, so a
/// request without a verifiable session is answered with 401 before any work is done.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(account::get_me))
        // GET /me/orders
        // The caller's own orders only; ownership comes from the session `sub`.
        .route("/me/orders", get(account::get_my_orders))
        // POST /orders
        // Checkout: prices from the catalog, optional coupon, stock reserved atomically.
        .route("/orders", post(account::place_order))
        // GET/PUT /me/shipping-address
        .route(
            "/me/shipping-address",
            get(account::get_shipping_address).put(account::put_shipping_address),
        )
}
