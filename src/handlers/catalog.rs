use crate::{
    AppState,
    error::AppError,
    models::{Artisan, Category, Product, ProductFilter},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// list_products
///
/// [Public Route] Lists storefront products, optionally narrowed by category slug,
/// artisan slug, or a free-text search. Archived products are never returned.
#[utoipa::path(
    get,
    path = "/products",
    params(ProductFilter),
    responses((status = 200, description = "Visible products", body = [Product]))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.repo.list_products(&filter).await?))
}

/// get_product
///
/// [Public Route] Single product by slug. Archived products answer 404, same as missing ones.
#[utoipa::path(
    get,
    path = "/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Found", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .repo
        .get_product_by_slug(&slug)
        .await?
        .filter(|product| !product.is_archived)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("product {slug}")))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.repo.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/artisans",
    responses((status = 200, description = "All artisans", body = [Artisan]))
)]
pub async fn list_artisans(State(state): State<AppState>) -> Result<Json<Vec<Artisan>>, AppError> {
    Ok(Json(state.repo.list_artisans().await?))
}

/// get_artisan
///
/// [Public Route] Artisan profile by slug.
#[utoipa::path(
    get,
    path = "/artisans/{slug}",
    params(("slug" = String, Path, description = "Artisan slug")),
    responses(
        (status = 200, description = "Found", body = Artisan),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_artisan(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Artisan>, AppError> {
    state
        .repo
        .get_artisan_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("artisan {slug}")))
}
