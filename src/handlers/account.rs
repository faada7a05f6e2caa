use crate::{
    AppState,
    error::AppError,
    identity::{RequireIdentity, SessionIdentity},
    models::{Order, PlaceOrderRequest, ShippingAddress, ShippingAddressRequest},
    pricing,
};
use axum::{Json, extract::State, http::StatusCode};

/// get_me
///
/// [Authenticated Route] The identity resolved from the caller's session.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Session identity", body = SessionIdentity),
        (status = 401, description = "No session")
    )
)]
pub async fn get_me(RequireIdentity(identity): RequireIdentity) -> Json<SessionIdentity> {
    Json(identity)
}

/// get_my_orders
///
/// [Authenticated Route] The caller's own orders, newest first.
#[utoipa::path(
    get,
    path = "/me/orders",
    responses((status = 200, description = "My orders", body = [Order]))
)]
pub async fn get_my_orders(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.repo.list_orders_for_user(identity.id).await?))
}

/// place_order
///
/// [Authenticated Route] Checkout. Prices and names are taken from the catalog, never
/// from the request; the coupon (if any) must exist and be active. Stock is reserved in
/// the same transaction as the insert, so a concurrent checkout that drains a product
/// first turns this one into a 400.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Invalid items, stock or coupon"),
        (status = 401, description = "No session")
    )
)]
pub async fn place_order(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
    Json(mut payload): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    payload.normalize()?;

    let coupon = match payload.coupon_code.as_deref() {
        Some(code) => Some(
            state
                .repo
                .get_coupon_by_code(code)
                .await?
                .ok_or_else(|| AppError::bad_request(format!("unknown coupon {code}")))?,
        ),
        None => None,
    };

    let ids: Vec<_> = payload.items.iter().map(|line| line.product_id).collect();
    let products = state.repo.get_products(&ids).await?;

    let new_order = pricing::price_order(identity.id, &payload.items, &products, coupon.as_ref())?;

    sync_user(&state, &identity).await?;

    let order = state
        .repo
        .create_order(&new_order)
        .await?
        .ok_or_else(|| AppError::bad_request("insufficient stock"))?;

    tracing::info!(
        order_id = %order.id,
        user_id = %identity.id,
        total_cents = order.total_cents,
        "order placed"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// get_shipping_address
///
/// [Authenticated Route] The caller's saved shipping address; 404 until one is saved.
#[utoipa::path(
    get,
    path = "/me/shipping-address",
    responses(
        (status = 200, description = "Saved address", body = ShippingAddress),
        (status = 404, description = "No address saved")
    )
)]
pub async fn get_shipping_address(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
) -> Result<Json<ShippingAddress>, AppError> {
    state
        .repo
        .get_shipping_address(identity.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("shipping address"))
}

/// put_shipping_address
///
/// [Authenticated Route] Creates or replaces the caller's shipping address.
#[utoipa::path(
    put,
    path = "/me/shipping-address",
    request_body = ShippingAddressRequest,
    responses(
        (status = 200, description = "Saved", body = ShippingAddress),
        (status = 400, description = "Missing required field")
    )
)]
pub async fn put_shipping_address(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
    Json(mut payload): Json<ShippingAddressRequest>,
) -> Result<Json<ShippingAddress>, AppError> {
    payload.normalize()?;
    sync_user(&state, &identity).await?;
    Ok(Json(
        state.repo.upsert_shipping_address(identity.id, &payload).await?,
    ))
}

// Orders and addresses reference `users`; the row is created lazily from the session.
async fn sync_user(state: &AppState, identity: &SessionIdentity) -> Result<(), AppError> {
    let email = identity
        .email
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("session has no email".to_string()))?;
    state
        .repo
        .upsert_user(identity.id, email, identity.name.as_deref())
        .await?;
    Ok(())
}
