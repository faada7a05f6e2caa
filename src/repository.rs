use crate::models::{
    AdminDashboardStats, Artisan, ArtisanRequest, AuditLogEntry, Category, CategoryRequest,
    Coupon, CreateCouponRequest, CreateProductRequest, NewAuditEntry, NewOrder, Order,
    OrderStatus, Product, ProductFilter, Role, ShippingAddress, ShippingAddressRequest,
    UpdateCouponRequest, UpdateProductRequest, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder, types::Json};
use std::sync::Arc;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only ever see
/// `Arc<dyn Repository>`, so tests swap in an in-memory implementation.
///
/// Lookups return `Option` for "no such row"; mutations keyed by id return
/// `Option`/`bool` so handlers can answer 404 without a second query.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Products ---
    // Storefront listing. Never returns archived products.
    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<Vec<Product>>;
    // Back-office listing, archived included.
    async fn list_all_products(&self) -> RepoResult<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>>;
    async fn get_product_by_slug(&self, slug: &str) -> RepoResult<Option<Product>>;
    async fn get_products(&self, ids: &[Uuid]) -> RepoResult<Vec<Product>>;
    async fn create_product(&self, req: &CreateProductRequest) -> RepoResult<Product>;
    async fn update_product(
        &self,
        id: Uuid,
        req: &UpdateProductRequest,
    ) -> RepoResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_product_archived(&self, id: Uuid, archived: bool) -> RepoResult<Option<Product>>;
    // Copies a product under a new id and slug; the copy is never archived.
    async fn duplicate_product(&self, id: Uuid) -> RepoResult<Option<Product>>;

    // --- Categories ---
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn create_category(&self, req: &CategoryRequest) -> RepoResult<Category>;
    async fn update_category(
        &self,
        id: Uuid,
        req: &CategoryRequest,
    ) -> RepoResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> RepoResult<bool>;

    // --- Artisans ---
    async fn list_artisans(&self) -> RepoResult<Vec<Artisan>>;
    async fn get_artisan_by_slug(&self, slug: &str) -> RepoResult<Option<Artisan>>;
    async fn create_artisan(&self, req: &ArtisanRequest) -> RepoResult<Artisan>;
    async fn update_artisan(&self, id: Uuid, req: &ArtisanRequest) -> RepoResult<Option<Artisan>>;
    async fn delete_artisan(&self, id: Uuid) -> RepoResult<bool>;

    // --- Users ---
    // Mirrors a session user locally. Never changes an existing row's role.
    async fn upsert_user(&self, id: Uuid, email: &str, name: Option<&str>) -> RepoResult<User>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn update_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    // --- Orders ---
    // Inserts the order and decrements stock atomically. `None` when stock ran out
    // between pricing and insert.
    async fn create_order(&self, order: &NewOrder) -> RepoResult<Option<Order>>;
    async fn list_orders(&self, status: Option<OrderStatus>) -> RepoResult<Vec<Order>>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> RepoResult<Option<Order>>;
    async fn delete_order(&self, id: Uuid) -> RepoResult<bool>;

    // --- Coupons ---
    async fn list_coupons(&self) -> RepoResult<Vec<Coupon>>;
    async fn get_coupon_by_code(&self, code: &str) -> RepoResult<Option<Coupon>>;
    async fn create_coupon(&self, req: &CreateCouponRequest) -> RepoResult<Coupon>;
    async fn update_coupon(
        &self,
        id: Uuid,
        req: &UpdateCouponRequest,
    ) -> RepoResult<Option<Coupon>>;
    async fn delete_coupon(&self, id: Uuid) -> RepoResult<bool>;
    async fn toggle_coupon(&self, id: Uuid) -> RepoResult<Option<Coupon>>;

    // --- Shipping Addresses ---
    async fn get_shipping_address(&self, user_id: Uuid) -> RepoResult<Option<ShippingAddress>>;
    async fn upsert_shipping_address(
        &self,
        user_id: Uuid,
        req: &ShippingAddressRequest,
    ) -> RepoResult<ShippingAddress>;

    // --- Dashboard ---
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats>;

    // --- Audit Log (append-only: no update or delete exists) ---
    async fn insert_audit_entry(&self, entry: &NewAuditEntry) -> RepoResult<AuditLogEntry>;
    // Newest first.
    async fn list_audit_entries(&self, limit: i64) -> RepoResult<Vec<AuditLogEntry>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price_cents, currency, stock, image_url, \
     category_id, artisan_id, is_archived, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at";

const ARTISAN_COLUMNS: &str = "id, name, slug, bio, location, avatar_url, created_at";

const USER_COLUMNS: &str = "id, email, name, role, created_at";

const ORDER_COLUMNS: &str = "id, user_id, status, items, subtotal_cents, discount_cents, total_cents, \
     coupon_code, created_at, updated_at";

const COUPON_COLUMNS: &str = "id, code, discount_percent, is_active, created_at";

const SHIPPING_COLUMNS: &str =
    "user_id, full_name, line1, line2, city, region, postal_code, country, phone, updated_at";

const AUDIT_COLUMNS: &str =
    "id, action, entity, entity_id, details, admin_id, admin_name, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_products
    ///
    /// Filtering is built with QueryBuilder so every user-supplied value is bound,
    /// never interpolated.
    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<Vec<Product>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_archived = false"
        ));

        if let Some(category) = &filter.category {
            builder.push(" AND category_id IN (SELECT id FROM categories WHERE slug = ");
            builder.push_bind(category.clone());
            builder.push(")");
        }

        if let Some(artisan) = &filter.artisan {
            builder.push(" AND artisan_id IN (SELECT id FROM artisans WHERE slug = ");
            builder.push_bind(artisan.clone());
            builder.push(")");
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
    }

    async fn list_all_products(&self) -> RepoResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY is_archived ASC, created_at DESC"
        );
        sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await
    }

    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_product_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_products(&self, ids: &[Uuid]) -> RepoResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        sqlx::query_as::<_, Product>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
    }

    async fn create_product(&self, req: &CreateProductRequest) -> RepoResult<Product> {
        let sql = format!(
            "INSERT INTO products (id, name, slug, description, price_cents, currency, stock, image_url, \
             category_id, artisan_id, is_archived, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false, NOW(), NOW()) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.description)
            .bind(req.price_cents)
            .bind(req.currency.as_deref().unwrap_or("USD"))
            .bind(req.stock)
            .bind(&req.image_url)
            .bind(req.category_id)
            .bind(req.artisan_id)
            .fetch_one(&self.pool)
            .await
    }

    /// update_product
    ///
    /// `COALESCE` keeps the stored value for every field the request leaves out.
    async fn update_product(
        &self,
        id: Uuid,
        req: &UpdateProductRequest,
    ) -> RepoResult<Option<Product>> {
        let sql = format!(
            "UPDATE products \
             SET name = COALESCE($2, name), \
                 slug = COALESCE($3, slug), \
                 description = COALESCE($4, description), \
                 price_cents = COALESCE($5, price_cents), \
                 currency = COALESCE($6, currency), \
                 stock = COALESCE($7, stock), \
                 image_url = COALESCE($8, image_url), \
                 category_id = COALESCE($9, category_id), \
                 artisan_id = COALESCE($10, artisan_id), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.description)
            .bind(req.price_cents)
            .bind(&req.currency)
            .bind(req.stock)
            .bind(&req.image_url)
            .bind(req.category_id)
            .bind(req.artisan_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_product_archived(&self, id: Uuid, archived: bool) -> RepoResult<Option<Product>> {
        let sql = format!(
            "UPDATE products SET is_archived = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(archived)
            .fetch_optional(&self.pool)
            .await
    }

    /// duplicate_product
    ///
    /// Single INSERT ... SELECT, so a missing source simply yields no row.
    async fn duplicate_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let new_id = Uuid::new_v4();
        let suffix: String = new_id.simple().to_string().chars().take(6).collect();

        let sql = format!(
            "INSERT INTO products (id, name, slug, description, price_cents, currency, stock, image_url, \
             category_id, artisan_id, is_archived, created_at, updated_at) \
             SELECT $2, name || ' (Copy)', slug || '-copy-' || $3, description, price_cents, currency, \
                    stock, image_url, category_id, artisan_id, false, NOW(), NOW() \
             FROM products WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(new_id)
            .bind(suffix)
            .fetch_optional(&self.pool)
            .await
    }

    // --- CATEGORIES ---

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC");
        sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await
    }

    async fn create_category(&self, req: &CategoryRequest) -> RepoResult<Category> {
        let sql = format!(
            "INSERT INTO categories (id, name, slug, description, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.description)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: &CategoryRequest,
    ) -> RepoResult<Option<Category>> {
        let sql = format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4 WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.description)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- ARTISANS ---

    async fn list_artisans(&self) -> RepoResult<Vec<Artisan>> {
        let sql = format!("SELECT {ARTISAN_COLUMNS} FROM artisans ORDER BY name ASC");
        sqlx::query_as::<_, Artisan>(&sql).fetch_all(&self.pool).await
    }

    async fn get_artisan_by_slug(&self, slug: &str) -> RepoResult<Option<Artisan>> {
        let sql = format!("SELECT {ARTISAN_COLUMNS} FROM artisans WHERE slug = $1");
        sqlx::query_as::<_, Artisan>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_artisan(&self, req: &ArtisanRequest) -> RepoResult<Artisan> {
        let sql = format!(
            "INSERT INTO artisans (id, name, slug, bio, location, avatar_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING {ARTISAN_COLUMNS}"
        );
        sqlx::query_as::<_, Artisan>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.bio)
            .bind(&req.location)
            .bind(&req.avatar_url)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_artisan(&self, id: Uuid, req: &ArtisanRequest) -> RepoResult<Option<Artisan>> {
        let sql = format!(
            "UPDATE artisans SET name = $2, slug = $3, bio = $4, location = $5, avatar_url = $6 \
             WHERE id = $1 RETURNING {ARTISAN_COLUMNS}"
        );
        sqlx::query_as::<_, Artisan>(&sql)
            .bind(id)
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.bio)
            .bind(&req.location)
            .bind(&req.avatar_url)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_artisan(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM artisans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- USERS ---

    async fn upsert_user(&self, id: Uuid, email: &str, name: Option<&str>) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, name, role, created_at) VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, name = EXCLUDED.name \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(email)
            .bind(name)
            .bind(Role::Customer.as_str())
            .fetch_one(&self.pool)
            .await
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let sql = format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- ORDERS ---

    /// create_order
    ///
    /// Runs in one transaction: each line's stock is decremented with a guarded UPDATE
    /// (`stock >= qty`), and any line that cannot be satisfied rolls everything back.
    async fn create_order(&self, order: &NewOrder) -> RepoResult<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            let reserved = sqlx::query(
                "UPDATE products SET stock = stock - $2, updated_at = NOW() \
                 WHERE id = $1 AND stock >= $2 AND is_archived = false",
            )
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if reserved.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(None);
            }
        }

        let sql = format!(
            "INSERT INTO orders (id, user_id, status, items, subtotal_cents, discount_cents, total_cents, \
             coupon_code, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
             RETURNING {ORDER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(Uuid::new_v4())
            .bind(order.user_id)
            .bind(OrderStatus::Pending.as_str())
            .bind(Json(&order.items))
            .bind(order.subtotal_cents)
            .bind(order.discount_cents)
            .bind(order.total_cents)
            .bind(&order.coupon_code)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> RepoResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(&self.pool)
            .await
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> RepoResult<Option<Order>> {
        let sql = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_order(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- COUPONS ---

    async fn list_coupons(&self) -> RepoResult<Vec<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC");
        sqlx::query_as::<_, Coupon>(&sql).fetch_all(&self.pool).await
    }

    async fn get_coupon_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1");
        sqlx::query_as::<_, Coupon>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_coupon(&self, req: &CreateCouponRequest) -> RepoResult<Coupon> {
        let sql = format!(
            "INSERT INTO coupons (id, code, discount_percent, is_active, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {COUPON_COLUMNS}"
        );
        sqlx::query_as::<_, Coupon>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.code)
            .bind(req.discount_percent)
            .bind(req.is_active.unwrap_or(true))
            .fetch_one(&self.pool)
            .await
    }

    async fn update_coupon(
        &self,
        id: Uuid,
        req: &UpdateCouponRequest,
    ) -> RepoResult<Option<Coupon>> {
        let sql = format!(
            "UPDATE coupons \
             SET code = COALESCE($2, code), \
                 discount_percent = COALESCE($3, discount_percent), \
                 is_active = COALESCE($4, is_active) \
             WHERE id = $1 RETURNING {COUPON_COLUMNS}"
        );
        sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .bind(&req.code)
            .bind(req.discount_percent)
            .bind(req.is_active)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_coupon(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_coupon(&self, id: Uuid) -> RepoResult<Option<Coupon>> {
        let sql = format!(
            "UPDATE coupons SET is_active = NOT is_active WHERE id = $1 RETURNING {COUPON_COLUMNS}"
        );
        sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    // --- SHIPPING ADDRESSES ---

    async fn get_shipping_address(&self, user_id: Uuid) -> RepoResult<Option<ShippingAddress>> {
        let sql = format!("SELECT {SHIPPING_COLUMNS} FROM shipping_addresses WHERE user_id = $1");
        sqlx::query_as::<_, ShippingAddress>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn upsert_shipping_address(
        &self,
        user_id: Uuid,
        req: &ShippingAddressRequest,
    ) -> RepoResult<ShippingAddress> {
        let sql = format!(
            "INSERT INTO shipping_addresses \
             (user_id, full_name, line1, line2, city, region, postal_code, country, phone, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 full_name = EXCLUDED.full_name, line1 = EXCLUDED.line1, line2 = EXCLUDED.line2, \
                 city = EXCLUDED.city, region = EXCLUDED.region, postal_code = EXCLUDED.postal_code, \
                 country = EXCLUDED.country, phone = EXCLUDED.phone, updated_at = NOW() \
             RETURNING {SHIPPING_COLUMNS}"
        );
        sqlx::query_as::<_, ShippingAddress>(&sql)
            .bind(user_id)
            .bind(&req.full_name)
            .bind(&req.line1)
            .bind(&req.line2)
            .bind(&req.city)
            .bind(&req.region)
            .bind(&req.postal_code)
            .bind(&req.country)
            .bind(&req.phone)
            .fetch_one(&self.pool)
            .await
    }

    /// get_stats
    ///
    /// All dashboard counters in a single round trip.
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        sqlx::query_as::<_, AdminDashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM orders WHERE status = 'PENDING') AS pending_orders,
                (SELECT COALESCE(SUM(total_cents), 0)::BIGINT FROM orders WHERE status <> 'CANCELLED') AS revenue_cents
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    // --- AUDIT LOG ---

    /// insert_audit_entry
    ///
    /// `created_at` is left to the column default so the database clock is authoritative.
    async fn insert_audit_entry(&self, entry: &NewAuditEntry) -> RepoResult<AuditLogEntry> {
        let sql = format!(
            "INSERT INTO audit_logs (id, action, entity, entity_id, details, admin_id, admin_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {AUDIT_COLUMNS}"
        );
        sqlx::query_as::<_, AuditLogEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(entry.action.as_str())
            .bind(&entry.entity)
            .bind(&entry.entity_id)
            .bind(&entry.details)
            .bind(entry.admin_id)
            .bind(&entry.admin_name)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_audit_entries(&self, limit: i64) -> RepoResult<Vec<AuditLogEntry>> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY created_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, AuditLogEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}
