use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Nested under `/admin`. Requests only get this far once the access gate has seen
/// a verified `ADMIN` session; each handler re-checks through `RequireAdmin`, and
/// every mutation writes one audit entry.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters: products, orders, users, pending orders, revenue.
        .route("/stats", get(admin::get_admin_stats))
        // --- Products ---
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        // POST /admin/products/{id}/archive  { "archived": bool }
        .route("/products/{id}/archive", post(admin::archive_product))
        .route("/products/{id}/duplicate", post(admin::duplicate_product))
        // --- Categories & Artisans ---
        .route("/categories", post(admin::create_category))
        .route(
            "/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route("/artisans", post(admin::create_artisan))
        .route(
            "/artisans/{id}",
            put(admin::update_artisan).delete(admin::delete_artisan),
        )
        // --- Orders ---
        // GET /admin/orders?status=PENDING
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route("/orders/{id}", axum::routing::delete(admin::delete_order))
        // --- Users ---
        // Role changes and deletion refuse to act on the calling admin.
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}", axum::routing::delete(admin::delete_user))
        // --- Coupons ---
        .route(
            "/coupons",
            get(admin::list_coupons).post(admin::create_coupon),
        )
        .route(
            "/coupons/{id}",
            put(admin::update_coupon).delete(admin::delete_coupon),
        )
        .route("/coupons/{id}/toggle", post(admin::toggle_coupon))
        // GET /admin/audit-logs?limit=50
        .route("/audit-logs", get(admin::list_audit_logs))
}
