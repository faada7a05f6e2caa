#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use artisan_storefront::{
    AppConfig, AppState,
    auth::Claims,
    create_router,
    models::{
        AdminDashboardStats, Artisan, ArtisanRequest, AuditLogEntry, Category, CategoryRequest,
        Coupon, CreateCouponRequest, CreateProductRequest, NewAuditEntry, NewOrder, Order,
        OrderStatus, Product, ProductFilter, Role, ShippingAddress, ShippingAddressRequest,
        UpdateCouponRequest, UpdateProductRequest, User,
    },
    repository::{RepoResult, Repository, RepositoryState},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use tower::ServiceExt;
use uuid::Uuid;

// --- In-Memory Repository ---

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    categories: Vec<Category>,
    artisans: Vec<Artisan>,
    users: Vec<User>,
    orders: Vec<Order>,
    coupons: Vec<Coupon>,
    addresses: HashMap<Uuid, ShippingAddress>,
    audit: Vec<AuditLogEntry>,
}

/// Repository double backed by vectors. `fail_audit` makes every audit insert error,
/// which is how the best-effort path is exercised.
#[derive(Default)]
pub struct MemoryRepo {
    tables: Mutex<Tables>,
    fail_audit: AtomicBool,
}

impl MemoryRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_audit_writes(&self) {
        self.fail_audit.store(true, Ordering::SeqCst);
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.tables.lock().unwrap().audit.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.tables.lock().unwrap().orders.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.tables.lock().unwrap().users.clone()
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.tables
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn seed_product(&self, name: &str, price_cents: i64, stock: i32) -> Product {
        let product = sample_product(name, price_cents, stock);
        self.tables.lock().unwrap().products.push(product.clone());
        product
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: artisan_storefront::models::slugify(name),
            description: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().categories.push(category.clone());
        category
    }

    pub fn seed_user(&self, id: Uuid, email: &str, role: Role) -> User {
        let user = User {
            id,
            email: email.to_string(),
            name: None,
            role,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_coupon(&self, code: &str, discount_percent: i32, is_active: bool) -> Coupon {
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: code.to_string(),
            discount_percent,
            is_active,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().coupons.push(coupon.clone());
        coupon
    }

    pub fn seed_order(&self, user_id: Uuid, status: OrderStatus) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            status,
            items: vec![],
            subtotal_cents: 1000,
            discount_cents: 0,
            total_cents: 1000,
            coupon_code: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().orders.push(order.clone());
        order
    }
}

pub fn sample_product(name: &str, price_cents: i64, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: artisan_storefront::models::slugify(name),
        description: format!("{name}, made by hand"),
        price_cents,
        currency: "USD".to_string(),
        stock,
        image_url: None,
        category_id: None,
        artisan_id: None,
        is_archived: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<Vec<Product>> {
        let tables = self.tables.lock().unwrap();
        let search = filter.search.as_deref().map(str::to_lowercase);
        Ok(tables
            .products
            .iter()
            .filter(|p| !p.is_archived)
            .filter(|p| match &search {
                Some(s) => p.name.to_lowercase().contains(s) || p.description.to_lowercase().contains(s),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_all_products(&self) -> RepoResult<Vec<Product>> {
        Ok(self.tables.lock().unwrap().products.clone())
    }

    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.product(id))
    }

    async fn get_product_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> RepoResult<Vec<Product>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, req: &CreateProductRequest) -> RepoResult<Product> {
        let mut product = sample_product(&req.name, req.price_cents, req.stock);
        product.slug = req.slug.clone().unwrap_or_default();
        product.description = req.description.clone();
        product.currency = req.currency.clone().unwrap_or_else(|| "USD".to_string());
        product.category_id = req.category_id;
        product.artisan_id = req.artisan_id;
        self.tables.lock().unwrap().products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, req: &UpdateProductRequest) -> RepoResult<Option<Product>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &req.name {
            product.name = name.clone();
        }
        if let Some(price) = req.price_cents {
            product.price_cents = price;
        }
        if let Some(stock) = req.stock {
            product.stock = stock;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        Ok(tables.products.len() != before)
    }

    async fn set_product_archived(&self, id: Uuid, archived: bool) -> RepoResult<Option<Product>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.products.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_archived = archived;
            p.clone()
        }))
    }

    async fn duplicate_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(source) = tables.products.iter().find(|p| p.id == id).cloned() else {
            return Ok(None);
        };
        let new_id = Uuid::new_v4();
        let suffix: String = new_id.simple().to_string().chars().take(6).collect();
        let copy = Product {
            id: new_id,
            name: format!("{} (Copy)", source.name),
            slug: format!("{}-copy-{suffix}", source.slug),
            is_archived: false,
            ..source
        };
        tables.products.push(copy.clone());
        Ok(Some(copy))
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Ok(self.tables.lock().unwrap().categories.clone())
    }

    async fn create_category(&self, req: &CategoryRequest) -> RepoResult<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            slug: req.slug.clone().unwrap_or_default(),
            description: req.description.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, req: &CategoryRequest) -> RepoResult<Option<Category>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.categories.iter_mut().find(|c| c.id == id).map(|c| {
            c.name = req.name.clone();
            c.slug = req.slug.clone().unwrap_or_default();
            c.description = req.description.clone();
            c.clone()
        }))
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        for product in tables.products.iter_mut().filter(|p| p.category_id == Some(id)) {
            product.category_id = None;
        }
        Ok(tables.categories.len() != before)
    }

    async fn list_artisans(&self) -> RepoResult<Vec<Artisan>> {
        Ok(self.tables.lock().unwrap().artisans.clone())
    }

    async fn get_artisan_by_slug(&self, slug: &str) -> RepoResult<Option<Artisan>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.artisans.iter().find(|a| a.slug == slug).cloned())
    }

    async fn create_artisan(&self, req: &ArtisanRequest) -> RepoResult<Artisan> {
        let artisan = Artisan {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            slug: req.slug.clone().unwrap_or_default(),
            bio: req.bio.clone(),
            location: req.location.clone(),
            avatar_url: req.avatar_url.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().artisans.push(artisan.clone());
        Ok(artisan)
    }

    async fn update_artisan(&self, id: Uuid, req: &ArtisanRequest) -> RepoResult<Option<Artisan>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.artisans.iter_mut().find(|a| a.id == id).map(|a| {
            a.name = req.name.clone();
            a.slug = req.slug.clone().unwrap_or_default();
            a.bio = req.bio.clone();
            a.clone()
        }))
    }

    async fn delete_artisan(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.artisans.len();
        tables.artisans.retain(|a| a.id != id);
        Ok(tables.artisans.len() != before)
    }

    async fn upsert_user(&self, id: Uuid, email: &str, name: Option<&str>) -> RepoResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.email = email.to_string();
            user.name = name.map(str::to_string);
            return Ok(user.clone());
        }
        let user = User {
            id,
            email: email.to_string(),
            name: name.map(str::to_string),
            role: Role::Customer,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.users())
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.role = role;
            u.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        tables.orders.retain(|o| o.user_id != id);
        tables.addresses.remove(&id);
        Ok(tables.users.len() != before)
    }

    async fn create_order(&self, order: &NewOrder) -> RepoResult<Option<Order>> {
        let mut tables = self.tables.lock().unwrap();

        let satisfiable = order.items.iter().all(|item| {
            tables
                .products
                .iter()
                .any(|p| p.id == item.product_id && !p.is_archived && p.stock >= item.quantity)
        });
        if !satisfiable {
            return Ok(None);
        }

        for item in &order.items {
            if let Some(product) = tables.products.iter_mut().find(|p| p.id == item.product_id) {
                product.stock -= item.quantity;
            }
        }

        let created = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            status: OrderStatus::Pending,
            items: order.items.clone(),
            subtotal_cents: order.subtotal_cents,
            discount_cents: order.discount_cents,
            total_cents: order.total_cents,
            coupon_code: order.coupon_code.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        tables.orders.push(created.clone());
        Ok(Some(created))
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> RepoResult<Vec<Order>> {
        Ok(self
            .orders()
            .into_iter()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .collect())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>> {
        Ok(self
            .orders()
            .into_iter()
            .filter(|o| o.user_id == user_id)
            .collect())
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> RepoResult<Option<Order>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status;
            o.clone()
        }))
    }

    async fn delete_order(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        Ok(tables.orders.len() != before)
    }

    async fn list_coupons(&self) -> RepoResult<Vec<Coupon>> {
        Ok(self.tables.lock().unwrap().coupons.clone())
    }

    async fn get_coupon_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.coupons.iter().find(|c| c.code == code).cloned())
    }

    async fn create_coupon(&self, req: &CreateCouponRequest) -> RepoResult<Coupon> {
        Ok(self.seed_coupon(&req.code, req.discount_percent, req.is_active.unwrap_or(true)))
    }

    async fn update_coupon(&self, id: Uuid, req: &UpdateCouponRequest) -> RepoResult<Option<Coupon>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.coupons.iter_mut().find(|c| c.id == id).map(|c| {
            if let Some(code) = &req.code {
                c.code = code.clone();
            }
            if let Some(percent) = req.discount_percent {
                c.discount_percent = percent;
            }
            if let Some(active) = req.is_active {
                c.is_active = active;
            }
            c.clone()
        }))
    }

    async fn delete_coupon(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.coupons.len();
        tables.coupons.retain(|c| c.id != id);
        Ok(tables.coupons.len() != before)
    }

    async fn toggle_coupon(&self, id: Uuid) -> RepoResult<Option<Coupon>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.coupons.iter_mut().find(|c| c.id == id).map(|c| {
            c.is_active = !c.is_active;
            c.clone()
        }))
    }

    async fn get_shipping_address(&self, user_id: Uuid) -> RepoResult<Option<ShippingAddress>> {
        Ok(self.tables.lock().unwrap().addresses.get(&user_id).cloned())
    }

    async fn upsert_shipping_address(
        &self,
        user_id: Uuid,
        req: &ShippingAddressRequest,
    ) -> RepoResult<ShippingAddress> {
        let address = ShippingAddress {
            user_id,
            full_name: req.full_name.clone(),
            line1: req.line1.clone(),
            line2: req.line2.clone(),
            city: req.city.clone(),
            region: req.region.clone(),
            postal_code: req.postal_code.clone(),
            country: req.country.clone(),
            phone: req.phone.clone(),
            updated_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .addresses
            .insert(user_id, address.clone());
        Ok(address)
    }

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let tables = self.tables.lock().unwrap();
        Ok(AdminDashboardStats {
            total_products: tables.products.len() as i64,
            total_orders: tables.orders.len() as i64,
            total_users: tables.users.len() as i64,
            pending_orders: tables
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count() as i64,
            revenue_cents: tables
                .orders
                .iter()
                .filter(|o| o.status != OrderStatus::Cancelled)
                .map(|o| o.total_cents)
                .sum(),
        })
    }

    async fn insert_audit_entry(&self, entry: &NewAuditEntry) -> RepoResult<AuditLogEntry> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            action: entry.action,
            entity: entry.entity.clone(),
            entity_id: entry.entity_id.clone(),
            details: entry.details.clone(),
            admin_id: entry.admin_id,
            admin_name: entry.admin_name.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().audit.push(row.clone());
        Ok(row)
    }

    async fn list_audit_entries(&self, limit: i64) -> RepoResult<Vec<AuditLogEntry>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .audit
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// --- Sessions ---

pub const ADMIN_ID: Uuid = Uuid::from_u128(0xA11CE);
pub const CUSTOMER_ID: Uuid = Uuid::from_u128(0xC0FFEE);

fn now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn claims(sub: Uuid, role: Role, email: Option<&str>, name: Option<&str>) -> Claims {
    let now = now();
    Claims {
        sub,
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        role,
        exp: now + 3600,
        iat: now,
    }
}

pub fn sign(claims: &Claims, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).unwrap()
}

/// A token signed with the default (local) secret.
pub fn token(sub: Uuid, role: Role, email: Option<&str>, name: Option<&str>) -> String {
    sign(&claims(sub, role, email, name), &AppConfig::default().auth_secret)
}

pub fn admin_token() -> String {
    token(ADMIN_ID, Role::Admin, Some("ada@example.com"), Some("Ada"))
}

pub fn customer_token() -> String {
    token(CUSTOMER_ID, Role::Customer, Some("cy@example.com"), Some("Cy"))
}

pub fn expired_token(role: Role) -> String {
    let mut claims = claims(ADMIN_ID, role, Some("ada@example.com"), None);
    claims.iat = now() - 7200;
    claims.exp = now() - 3600;
    sign(&claims, &AppConfig::default().auth_secret)
}

// --- App Wiring ---

pub fn app_state(repo: Arc<MemoryRepo>) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        config: AppConfig::default(),
    }
}

pub fn app(repo: Arc<MemoryRepo>) -> Router {
    create_router(app_state(repo))
}

pub fn request(method: &str, uri: &str, bearer: Option<&str>, json: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match json {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

pub async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
