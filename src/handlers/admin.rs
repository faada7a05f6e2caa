//! Back-office handlers.
//!
//! Everything here sits behind the access gate and additionally extracts
//! [`RequireAdmin`]. Each mutation records its audit entry only after the write has
//! succeeded; the audit outcome never changes the response.

use crate::{
    AppState,
    audit::{AuditAction, AuditEvent, Auditor},
    error::AppError,
    identity::RequireAdmin,
    models::{
        AdminDashboardStats, ArchiveProductRequest, Artisan, ArtisanRequest, AuditLogEntry,
        Category, CategoryRequest, Coupon, CreateCouponRequest, CreateProductRequest, Order,
        OrderStatus, Product, UpdateCouponRequest, UpdateOrderStatusRequest,
        UpdateProductRequest, UpdateUserRoleRequest, User,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_AUDIT_PAGE: i64 = 50;
pub const MAX_AUDIT_PAGE: i64 = 200;

/// OrderQuery
///
/// Optional status filter for GET /admin/orders.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// AuditLogQuery
///
/// Page size for GET /admin/audit-logs, clamped to `1..=MAX_AUDIT_PAGE`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

// --- Dashboard ---

#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, AppError> {
    Ok(Json(state.repo.get_stats().await?))
}

// --- Products ---

/// list_products
///
/// [Admin Route] Every product, archived ones included (listed last).
#[utoipa::path(
    get,
    path = "/admin/products",
    operation_id = "admin_list_products",
    responses((status = 200, description = "All products", body = [Product]))
)]
pub async fn list_products(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.repo.list_all_products().await?))
}

#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Invalid product"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_product(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload.normalize()?;
    let product = state.repo.create_product(&payload).await?;

    audit
        .record(
            AuditEvent::new(AuditAction::CreateProduct, "Product", product.id)
                .with_details(&product.name),
        )
        .await;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_product(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    payload.normalize()?;
    let product = state
        .repo
        .update_product(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::UpdateProduct, "Product", id)
                .with_details(&product.name),
        )
        .await;

    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_product(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_product(id).await? {
        return Err(AppError::not_found(format!("product {id}")));
    }

    audit
        .record(AuditEvent::new(AuditAction::DeleteProduct, "Product", id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// archive_product
///
/// [Admin Route] Archives (or restores) a product. Archived products disappear from
/// the storefront but keep their order history intact.
#[utoipa::path(
    post,
    path = "/admin/products/{id}/archive",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ArchiveProductRequest,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn archive_product(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArchiveProductRequest>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .repo
        .set_product_archived(id, payload.archived)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;

    let details = if payload.archived { "archived" } else { "restored" };
    audit
        .record(AuditEvent::new(AuditAction::ArchiveProduct, "Product", id).with_details(details))
        .await;

    Ok(Json(product))
}

/// duplicate_product
///
/// [Admin Route] Copies a product under a fresh id and slug. The audit entry points
/// at the copy and names the source.
#[utoipa::path(
    post,
    path = "/admin/products/{id}/duplicate",
    params(("id" = Uuid, Path, description = "Source product ID")),
    responses(
        (status = 201, description = "Copy created", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn duplicate_product(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let copy = state
        .repo
        .duplicate_product(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::DuplicateProduct, "Product", copy.id)
                .with_details(format!("duplicated from {id}")),
        )
        .await;

    Ok((StatusCode::CREATED, Json(copy)))
}

// --- Categories ---

#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_category(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Json(mut payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    payload.normalize()?;
    let category = state.repo.create_category(&payload).await?;

    audit
        .record(
            AuditEvent::new(AuditAction::CreateCategory, "Category", category.id)
                .with_details(&category.name),
        )
        .await;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    payload.normalize()?;
    let category = state
        .repo
        .update_category(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("category {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::UpdateCategory, "Category", id)
                .with_details(&category.name),
        )
        .await;

    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Products in the category survive with `category_id` cleared.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_category(id).await? {
        return Err(AppError::not_found(format!("category {id}")));
    }

    audit
        .record(AuditEvent::new(AuditAction::DeleteCategory, "Category", id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// --- Artisans ---

#[utoipa::path(
    post,
    path = "/admin/artisans",
    request_body = ArtisanRequest,
    responses(
        (status = 201, description = "Created", body = Artisan),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_artisan(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Json(mut payload): Json<ArtisanRequest>,
) -> Result<(StatusCode, Json<Artisan>), AppError> {
    payload.normalize()?;
    let artisan = state.repo.create_artisan(&payload).await?;

    audit
        .record(
            AuditEvent::new(AuditAction::CreateArtisan, "Artisan", artisan.id)
                .with_details(&artisan.name),
        )
        .await;

    Ok((StatusCode::CREATED, Json(artisan)))
}

#[utoipa::path(
    put,
    path = "/admin/artisans/{id}",
    params(("id" = Uuid, Path, description = "Artisan ID")),
    request_body = ArtisanRequest,
    responses(
        (status = 200, description = "Updated", body = Artisan),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_artisan(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<ArtisanRequest>,
) -> Result<Json<Artisan>, AppError> {
    payload.normalize()?;
    let artisan = state
        .repo
        .update_artisan(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("artisan {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::UpdateArtisan, "Artisan", id)
                .with_details(&artisan.name),
        )
        .await;

    Ok(Json(artisan))
}

#[utoipa::path(
    delete,
    path = "/admin/artisans/{id}",
    params(("id" = Uuid, Path, description = "Artisan ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_artisan(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_artisan(id).await? {
        return Err(AppError::not_found(format!("artisan {id}")));
    }

    audit
        .record(AuditEvent::new(AuditAction::DeleteArtisan, "Artisan", id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// --- Orders ---

#[utoipa::path(
    get,
    path = "/admin/orders",
    params(OrderQuery),
    responses((status = 200, description = "Orders, newest first", body = [Order]))
)]
pub async fn list_orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.repo.list_orders(query.status).await?))
}

#[utoipa::path(
    put,
    path = "/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Order),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_order_status(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .repo
        .update_order_status(id, payload.status)
        .await?
        .ok_or_else(|| AppError::not_found(format!("order {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::UpdateOrderStatus, "Order", id)
                .with_details(format!("status -> {}", payload.status)),
        )
        .await;

    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_order(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_order(id).await? {
        return Err(AppError::not_found(format!("order {id}")));
    }

    audit
        .record(AuditEvent::new(AuditAction::DeleteOrder, "Order", id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// --- Users ---

#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.repo.list_users().await?))
}

/// update_user_role
///
/// [Admin Route] Promotes or demotes a user. An admin cannot change their own role,
/// which keeps at least the acting admin in place.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Own role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user_role(
    RequireAdmin(admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> Result<Json<User>, AppError> {
    if id == admin.id {
        return Err(AppError::bad_request("you cannot change your own role"));
    }

    let user = state
        .repo
        .update_user_role(id, payload.role)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::UpdateUserRole, "User", id)
                .with_details(format!("{} -> {}", user.email, payload.role)),
        )
        .await;

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Own account"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if id == admin.id {
        return Err(AppError::bad_request("you cannot delete your own account"));
    }

    if !state.repo.delete_user(id).await? {
        return Err(AppError::not_found(format!("user {id}")));
    }

    audit
        .record(AuditEvent::new(AuditAction::DeleteUser, "User", id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// --- Coupons ---

#[utoipa::path(
    get,
    path = "/admin/coupons",
    responses((status = 200, description = "All coupons", body = [Coupon]))
)]
pub async fn list_coupons(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    Ok(Json(state.repo.list_coupons().await?))
}

#[utoipa::path(
    post,
    path = "/admin/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Created", body = Coupon),
        (status = 400, description = "Invalid coupon"),
        (status = 409, description = "Code already exists")
    )
)]
pub async fn create_coupon(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    payload.normalize()?;
    let coupon = state.repo.create_coupon(&payload).await?;

    audit
        .record(
            AuditEvent::new(AuditAction::CreateCoupon, "Coupon", coupon.id)
                .with_details(&coupon.code),
        )
        .await;

    Ok((StatusCode::CREATED, Json(coupon)))
}

#[utoipa::path(
    put,
    path = "/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Updated", body = Coupon),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_coupon(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateCouponRequest>,
) -> Result<Json<Coupon>, AppError> {
    payload.normalize()?;
    let coupon = state
        .repo
        .update_coupon(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("coupon {id}")))?;

    audit
        .record(AuditEvent::new(AuditAction::UpdateCoupon, "Coupon", id).with_details(&coupon.code))
        .await;

    Ok(Json(coupon))
}

#[utoipa::path(
    delete,
    path = "/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_coupon(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_coupon(id).await? {
        return Err(AppError::not_found(format!("coupon {id}")));
    }

    audit
        .record(AuditEvent::new(AuditAction::DeleteCoupon, "Coupon", id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// toggle_coupon
///
/// [Admin Route] Flips `is_active`. The flip happens in SQL, so two concurrent
/// toggles cancel out instead of both landing on the same value.
#[utoipa::path(
    post,
    path = "/admin/coupons/{id}/toggle",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Toggled", body = Coupon),
        (status = 404, description = "Not Found")
    )
)]
pub async fn toggle_coupon(
    RequireAdmin(_admin): RequireAdmin,
    audit: Auditor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Coupon>, AppError> {
    let coupon = state
        .repo
        .toggle_coupon(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("coupon {id}")))?;

    audit
        .record(
            AuditEvent::new(AuditAction::ToggleCoupon, "Coupon", id)
                .with_details(format!("{} active={}", coupon.code, coupon.is_active)),
        )
        .await;

    Ok(Json(coupon))
}

// --- Audit Log ---

/// list_audit_logs
///
/// [Admin Route] Most recent audit entries first.
#[utoipa::path(
    get,
    path = "/admin/audit-logs",
    params(AuditLogQuery),
    responses((status = 200, description = "Audit entries", body = [AuditLogEntry]))
)]
pub async fn list_audit_logs(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_PAGE)
        .clamp(1, MAX_AUDIT_PAGE);
    Ok(Json(state.repo.list_audit_entries(limit).await?))
}
