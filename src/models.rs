use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::AuditAction,
    error::{AppError, ParseEnumError},
};

// --- Closed Enumerations ---

/// Role
///
/// The RBAC claim carried by the session token and mirrored in `users.role`.
/// Only `Admin` passes the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Admin, Self::Customer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Customer => "CUSTOMER",
        }
    }
}

/// OrderStatus
///
/// Fulfilment lifecycle of an order. Admins may move an order to any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

// Text-column plumbing shared by the enums above: rows hold the literal, sqlx converts
// through `TryFrom<String>` (see the `#[sqlx(try_from = "String")]` fields below).
macro_rules! text_enum {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == s)
                    .ok_or_else(|| ParseEnumError::new($kind, s))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum!(Role, "role");
text_enum!(OrderStatus, "order status");
text_enum!(AuditAction, "audit action");

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Local mirror of an account known to the auth provider. `id` equals the session `sub`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Artisan
///
/// Maker profile shown on the storefront; products optionally reference one.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Artisan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Product
///
/// Catalog entry. Prices are integer minor units (`price_cents`) in `currency`.
/// Archived products stay in the database but vanish from the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub artisan_id: Option<Uuid>,
    pub is_archived: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Coupon {
    pub id: Uuid,
    /// Stored upper-case; lookups are case-insensitive for customers.
    pub code: String,
    pub discount_percent: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// OrderItem
///
/// Line snapshot taken at checkout, so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
}

/// Order
///
/// Maps `orders`; the `items` column is JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    #[sqlx(json)]
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub coupon_code: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ShippingAddress
///
/// At most one per user, keyed by `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct ShippingAddress {
    pub user_id: Uuid,
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AuditLogEntry
///
/// One row of the append-only `audit_logs` table. `created_at` is assigned by the database.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct AuditLogEntry {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: String,
    pub details: Option<String>,
    pub admin_id: Uuid,
    pub admin_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// NewAuditEntry
///
/// Insert payload for `audit_logs`. Built only by the audit recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: String,
    pub details: Option<String>,
    pub admin_id: Uuid,
    pub admin_name: String,
}

// --- Query Filters ---

/// ProductFilter
///
/// Query parameters accepted by the storefront listing (GET /products).
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Artisan slug.
    pub artisan: Option<String>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
}

// --- Request Payloads (Input Schemas) ---
//
// `normalize` trims input, fills derived fields (slugs, upper-case codes) and rejects
// invalid values. Handlers call it before touching the repository.

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateProductRequest {
    pub name: String,
    /// Derived from `name` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    /// Defaults to USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artisan_id: Option<Uuid>,
}

impl CreateProductRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        self.name = required("name", &self.name)?;
        self.slug = Some(resolve_slug(self.slug.as_deref(), &self.name)?);
        self.description = self.description.trim().to_string();
        self.currency = Some(currency_code(self.currency.as_deref().unwrap_or("USD"))?);
        non_negative("price_cents", self.price_cents)?;
        non_negative("stock", i64::from(self.stock))?;
        Ok(())
    }
}

/// UpdateProductRequest
///
/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artisan_id: Option<Uuid>,
}

impl UpdateProductRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            self.name = Some(required("name", name)?);
        }
        if let Some(slug) = &self.slug {
            self.slug = Some(resolve_slug(Some(slug), "")?);
        }
        if let Some(currency) = &self.currency {
            self.currency = Some(currency_code(currency)?);
        }
        if let Some(price) = self.price_cents {
            non_negative("price_cents", price)?;
        }
        if let Some(stock) = self.stock {
            non_negative("stock", i64::from(stock))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArchiveProductRequest {
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        self.name = required("name", &self.name)?;
        self.slug = Some(resolve_slug(self.slug.as_deref(), &self.name)?);
        self.description = optional(self.description.take());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ArtisanRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ArtisanRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        self.name = required("name", &self.name)?;
        self.slug = Some(resolve_slug(self.slug.as_deref(), &self.name)?);
        self.bio = optional(self.bio.take());
        self.location = optional(self.location.take());
        self.avatar_url = optional(self.avatar_url.take());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateUserRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_percent: i32,
    /// New coupons are active unless stated otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateCouponRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        self.code = coupon_code(&self.code)?;
        discount_percent(self.discount_percent)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCouponRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateCouponRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        if let Some(code) = &self.code {
            self.code = Some(coupon_code(code)?);
        }
        if let Some(percent) = self.discount_percent {
            discount_percent(percent)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// PlaceOrderRequest
///
/// Checkout payload. Prices are never taken from the client; they are looked up.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

impl PlaceOrderRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        if self.items.is_empty() {
            return Err(AppError::bad_request("order must contain at least one item"));
        }
        if self.items.iter().any(|line| line.quantity < 1) {
            return Err(AppError::bad_request("quantity must be at least 1"));
        }
        self.coupon_code = match optional(self.coupon_code.take()) {
            Some(code) => Some(coupon_code(&code)?),
            None => None,
        };
        Ok(())
    }
}

/// NewOrder
///
/// Fully priced order, ready to insert. Produced by `pricing::price_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ShippingAddressRequest {
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddressRequest {
    pub fn normalize(&mut self) -> Result<(), AppError> {
        self.full_name = required("full_name", &self.full_name)?;
        self.line1 = required("line1", &self.line1)?;
        self.city = required("city", &self.city)?;
        self.postal_code = required("postal_code", &self.postal_code)?;
        self.country = required("country", &self.country)?;
        self.line2 = optional(self.line2.take());
        self.region = optional(self.region.take());
        self.phone = optional(self.phone.take());
        Ok(())
    }
}

// --- Dashboard Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_users: i64,
    pub pending_orders: i64,
    /// Sum of `total_cents` over orders that were not cancelled.
    pub revenue_cents: i64,
}

// --- Field Helpers ---

/// slugify
///
/// Lower-case ASCII alphanumerics joined by single dashes: `"Hand-Thrown  Mug!"` → `"hand-thrown-mug"`.
pub fn slugify(input: &str) -> String {
    input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<String, AppError> {
    let slug = slugify(explicit.unwrap_or(name));
    if slug.is_empty() {
        return Err(AppError::bad_request("slug must contain letters or digits"));
    }
    Ok(slug)
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_negative(field: &str, value: i64) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::bad_request(format!("{field} must not be negative")));
    }
    Ok(())
}

fn currency_code(raw: &str) -> Result<String, AppError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::bad_request("currency must be a 3-letter code"));
    }
    Ok(code)
}

fn coupon_code(raw: &str) -> Result<String, AppError> {
    let code = required("code", raw)?.to_ascii_uppercase();
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(AppError::bad_request(
            "code may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(code)
}

fn discount_percent(percent: i32) -> Result<(), AppError> {
    if !(1..=100).contains(&percent) {
        return Err(AppError::bad_request("discount_percent must be between 1 and 100"));
    }
    Ok(())
}
