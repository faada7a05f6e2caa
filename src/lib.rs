use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session verification, identity and the admin gate.
pub mod auth;
pub mod gate;
pub mod identity;

// Audit trail for admin mutations.
pub mod audit;

// Core application services and components.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::catalog::list_products, handlers::catalog::get_product,
        handlers::catalog::list_categories, handlers::catalog::list_artisans,
        handlers::catalog::get_artisan,
        handlers::account::get_me, handlers::account::get_my_orders,
        handlers::account::place_order, handlers::account::get_shipping_address,
        handlers::account::put_shipping_address,
        handlers::admin::get_admin_stats, handlers::admin::list_products,
        handlers::admin::create_product, handlers::admin::update_product,
        handlers::admin::delete_product, handlers::admin::archive_product,
        handlers::admin::duplicate_product, handlers::admin::create_category,
        handlers::admin::update_category, handlers::admin::delete_category,
        handlers::admin::create_artisan, handlers::admin::update_artisan,
        handlers::admin::delete_artisan, handlers::admin::list_orders,
        handlers::admin::update_order_status, handlers::admin::delete_order,
        handlers::admin::list_users, handlers::admin::update_user_role,
        handlers::admin::delete_user, handlers::admin::list_coupons,
        handlers::admin::create_coupon, handlers::admin::update_coupon,
        handlers::admin::delete_coupon, handlers::admin::toggle_coupon,
        handlers::admin::list_audit_logs
    ),
    components(
        schemas(
            models::Role, models::OrderStatus, audit::AuditAction,
            models::User, models::Category, models::Artisan, models::Product, models::Coupon,
            models::OrderItem, models::Order, models::ShippingAddress, models::AuditLogEntry,
            models::AdminDashboardStats, identity::SessionIdentity,
            models::CreateProductRequest, models::UpdateProductRequest,
            models::ArchiveProductRequest, models::CategoryRequest, models::ArtisanRequest,
            models::UpdateOrderStatusRequest, models::UpdateUserRoleRequest,
            models::CreateCouponRequest, models::UpdateCouponRequest,
            models::OrderLineRequest, models::PlaceOrderRequest, models::ShippingAddressRequest,
        )
    ),
    tags(
        (name = "artisan-storefront", description = "Artisan storefront and admin back-office API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable state handed to every handler. Extractors pull the
/// pieces they need through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree, wraps all of it in the access gate, and adds the
/// observability layers on the outside.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Handlers extract `RequireIdentity`, which rejects with 401 on its own.
        .merge(authenticated::authenticated_routes())
        // Admin handlers extract `RequireAdmin` as a second check behind the gate.
        .nest("/admin", admin::admin_routes())
        // 3. Access Gate: wraps every route above, so nested admin paths arrive unstripped.
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            gate::access_gate,
        ))
        .with_state(state);

    // 4. Observability and Correlation Layers (outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: tags every request span with its `x-request-id`
/// so log lines from one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
