use crate::{AppState, handlers::catalog};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only storefront endpoints. Archived products are filtered out at the
/// repository or handler level, never exposed here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; never touches the database.
        .route("/health", get(|| async { "ok" }))
        // GET /products?category=...&artisan=...&search=...
        .route("/products", get(catalog::list_products))
        // GET /products/{slug}
        .route("/products/{slug}", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .route("/artisans", get(catalog::list_artisans))
        .route("/artisans/{slug}", get(catalog::get_artisan))
}
