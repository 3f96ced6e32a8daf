//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Paginated, searchable listing (public or owner-scoped)
//! - Featured strip (oldest ACTIVE products first)
//! - CRUD operations
//!
//! ## Listing Scopes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Which rows a listing sees                            │
//! │                                                                         │
//! │  ListingScope::Public      WHERE status = 'ACTIVE'                     │
//! │  ListingScope::Owner(id)   WHERE owner_id = id       (any status)      │
//! │                                                                         │
//! │  + search "mug"            AND (name LIKE '%mug%' ESCAPE '\'           │
//! │                                 OR description LIKE '%mug%' ...)       │
//! │                                                                         │
//! │  ORDER BY created_at DESC, id ASC  LIMIT page_size OFFSET skip          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use emporium_core::{
    ListingRequest, ListingResult, ListingScope, NewProduct, Product, ProductStatus,
    ProductUpdate, SearchFilter,
};

use super::{list_page, push_search};
use crate::error::{DbError, DbResult};

/// Select list matching `Product`'s `FromRow`.
const PRODUCT_COLUMNS: &str = "id, name, description, category, price_cents, stock, status, \
     image, owner_id, created_at, updated_at";

/// Fields searched by the listing filter.
const SEARCH_COLUMNS: &[&str] = &["name", "description"];

/// Appends the WHERE clause for a scope and filter.
fn push_scope(builder: &mut QueryBuilder<'_, Sqlite>, scope: ListingScope, filter: &SearchFilter) {
    builder.push(" WHERE 1 = 1");
    match scope {
        ListingScope::Public => {
            builder.push(" AND status = ").push_bind(ProductStatus::Active);
        }
        ListingScope::Owner(owner_id) => {
            builder.push(" AND owner_id = ").push_bind(owner_id);
        }
    }
    push_search(builder, filter, SEARCH_COLUMNS);
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Storefront page 2, searching "mug"
/// let request = ListingRequest::new(2, 10, "mug")?;
/// let page = repo.list(ListingScope::Public, &request).await?;
///
/// // Get by ID
/// let product = repo.get_by_id(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// One page of products.
    ///
    /// ## How It Works
    /// 1. Counts rows matching scope + search
    /// 2. Fetches the requested window in `created_at DESC, id ASC` order
    ///
    /// ## Arguments
    /// * `scope` - Public (ACTIVE only) or one owner's products
    /// * `request` - Validated page, page size and search term
    pub async fn list(
        &self,
        scope: ListingScope,
        request: &ListingRequest,
    ) -> DbResult<ListingResult<Product>> {
        debug!(?scope, page = request.page, search = %request.search, "Listing products");

        let filter = request.filter();
        list_page(&self.pool, "products", PRODUCT_COLUMNS, request, |builder| {
            push_scope(builder, scope, &filter)
        })
        .await
    }

    /// Counts products visible to `scope` that pass `filter`.
    pub async fn count(&self, scope: ListingScope, filter: &SearchFilter) -> DbResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_scope(&mut builder, scope, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// The featured strip: first `limit` ACTIVE products by creation time.
    pub async fn top_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE status = ?1 \
             ORDER BY created_at ASC, id ASC LIMIT ?2",
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ProductStatus::Active)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product owned by `owner_id`.
    ///
    /// Text fields are stored trimmed; blank optional text is stored as NULL.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::ForeignKeyViolation)` - Owner doesn't exist
    pub async fn insert(&self, owner_id: i64, product: &NewProduct) -> DbResult<Product> {
        debug!(owner_id, name = %product.name, "Inserting product");

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO products (
                name, description, category, price_cents, stock,
                status, image, owner_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING {}",
            PRODUCT_COLUMNS
        );

        let inserted = sqlx::query_as::<_, Product>(&sql)
            .bind(product.name.trim())
            .bind(non_blank(product.description.as_deref()))
            .bind(product.category.trim())
            .bind(product.price_cents)
            .bind(product.stock)
            .bind(product.status)
            .bind(non_blank(product.image.as_deref()))
            .bind(owner_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id, "Updating product");

        let now = Utc::now();
        let sql = format!(
            "UPDATE products SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                category = COALESCE(?4, category),
                price_cents = COALESCE(?5, price_cents),
                stock = COALESCE(?6, stock),
                status = COALESCE(?7, status),
                image = COALESCE(?8, image),
                updated_at = ?9
            WHERE id = ?1
            RETURNING {}",
            PRODUCT_COLUMNS
        );

        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.description.as_deref().map(str::trim))
            .bind(update.category.as_deref().map(str::trim))
            .bind(update.price_cents)
            .bind(update.stock)
            .bind(update.status)
            .bind(update.image.as_deref().map(str::trim))
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        updated.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Ok(())` - Deleted
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use emporium_core::NewUser;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let alice = db.users().insert(&new_user("alice")).await.unwrap();
        let bob = db.users().insert(&new_user("bob")).await.unwrap();
        (db, alice.id, bob.id)
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "$argon2id$stub".to_string(),
            is_admin: false,
        }
    }

    fn new_product(name: &str, status: ProductStatus) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            category: "General".to_string(),
            price_cents: 1000,
            stock: 5,
            status,
            image: None,
        }
    }

    fn request(page: i64, page_size: i64, search: &str) -> ListingRequest {
        ListingRequest::new(page, page_size, search).unwrap()
    }

    /// Expected listing order computed independently of SQL.
    fn sorted(mut products: Vec<Product>) -> Vec<i64> {
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        products.into_iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, alice, _) = setup().await;
        let repo = db.products();

        let mut input = new_product("  Ceramic Mug  ", ProductStatus::Active);
        input.image = Some("   ".to_string());
        let created = repo.insert(alice, &input).await.unwrap();

        assert_eq!(created.name, "Ceramic Mug");
        assert_eq!(created.owner_id, alice);
        assert_eq!(created.image, None);
        assert_eq!(created.created_at, created.updated_at);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        assert!(repo.get_by_id(9_999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_owner() {
        let (db, _, _) = setup().await;
        let err = db
            .products()
            .insert(404, &new_product("Ghost", ProductStatus::Draft))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    /// 23 rows, page size 10: pages of 10, 10 and 3.
    #[tokio::test]
    async fn test_pagination_twenty_three_rows() {
        let (db, alice, _) = setup().await;
        let repo = db.products();

        let mut all = Vec::new();
        for i in 0..23 {
            let p = repo
                .insert(alice, &new_product(&format!("Item {}", i), ProductStatus::Active))
                .await
                .unwrap();
            all.push(p);
        }
        let expected = sorted(all);

        let first = repo.list(ListingScope::Public, &request(1, 10, "")).await.unwrap();
        assert_eq!(first.total, 23);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.items.len(), 10);

        let third = repo.list(ListingScope::Public, &request(3, 10, "")).await.unwrap();
        assert_eq!(third.items.len(), 3);
        let ids: Vec<i64> = third.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, expected[20..].to_vec());

        let beyond = repo.list(ListingScope::Public, &request(4, 10, "")).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 23);
    }

    #[tokio::test]
    async fn test_listing_order_is_stable() {
        let (db, alice, _) = setup().await;
        let repo = db.products();

        let mut all = Vec::new();
        for i in 0..6 {
            all.push(
                repo.insert(alice, &new_product(&format!("P{}", i), ProductStatus::Active))
                    .await
                    .unwrap(),
            );
        }
        let expected = sorted(all);

        let once = repo.list(ListingScope::Public, &request(1, 10, "")).await.unwrap();
        let twice = repo.list(ListingScope::Public, &request(1, 10, "")).await.unwrap();
        assert_eq!(once, twice);

        let ids: Vec<i64> = once.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_public_scope_only_sees_active() {
        let (db, alice, bob) = setup().await;
        let repo = db.products();

        repo.insert(alice, &new_product("Live", ProductStatus::Active)).await.unwrap();
        repo.insert(alice, &new_product("Draft", ProductStatus::Draft)).await.unwrap();
        repo.insert(bob, &new_product("Gone", ProductStatus::OutOfStock)).await.unwrap();

        let page = repo.list(ListingScope::Public, &request(1, 10, "")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Live");
    }

    #[tokio::test]
    async fn test_owner_scope_sees_all_own_statuses() {
        let (db, alice, bob) = setup().await;
        let repo = db.products();

        repo.insert(alice, &new_product("A1", ProductStatus::Active)).await.unwrap();
        repo.insert(alice, &new_product("A2", ProductStatus::Draft)).await.unwrap();
        repo.insert(bob, &new_product("B1", ProductStatus::Active)).await.unwrap();

        let page = repo.list(ListingScope::Owner(alice), &request(1, 10, "")).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|p| p.owner_id == alice));
    }

    #[tokio::test]
    async fn test_search_name_or_description_case_insensitive() {
        let (db, alice, _) = setup().await;
        let repo = db.products();

        repo.insert(alice, &new_product("Blue MUG", ProductStatus::Active)).await.unwrap();
        let mut plate = new_product("Plate", ProductStatus::Active);
        plate.description = Some("matches the mug set".to_string());
        repo.insert(alice, &plate).await.unwrap();
        let mut bowl = new_product("Bowl", ProductStatus::Active);
        bowl.description = None;
        repo.insert(alice, &bowl).await.unwrap();

        let page = repo.list(ListingScope::Public, &request(1, 10, "mug")).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|p| p.name != "Bowl"));

        let count = repo
            .count(ListingScope::Public, &SearchFilter::new("MuG"))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let (db, alice, _) = setup().await;
        let repo = db.products();

        repo.insert(alice, &new_product("100% Cotton", ProductStatus::Active)).await.unwrap();
        repo.insert(alice, &new_product("100 Cotton", ProductStatus::Active)).await.unwrap();
        repo.insert(alice, &new_product("snake_case", ProductStatus::Active)).await.unwrap();
        repo.insert(alice, &new_product("snakeXcase", ProductStatus::Active)).await.unwrap();

        let percent = repo.list(ListingScope::Public, &request(1, 10, "100%")).await.unwrap();
        assert_eq!(percent.total, 1);

        let underscore = repo.list(ListingScope::Public, &request(1, 10, "e_c")).await.unwrap();
        assert_eq!(underscore.total, 1);
        assert_eq!(underscore.items[0].name, "snake_case");
    }

    #[tokio::test]
    async fn test_top_active_oldest_first() {
        let (db, alice, _) = setup().await;
        let repo = db.products();

        let mut active = Vec::new();
        for i in 0..7 {
            let status = if i % 2 == 0 { ProductStatus::Active } else { ProductStatus::Draft };
            let p = repo
                .insert(alice, &new_product(&format!("T{}", i), status))
                .await
                .unwrap();
            if status == ProductStatus::Active {
                active.push(p);
            }
        }

        let top = repo.top_active(5).await.unwrap();
        assert_eq!(top.len(), active.len());
        assert!(top.iter().all(|p| p.status == ProductStatus::Active));
        assert!(top.windows(2).all(|w| (w[0].created_at, w[0].id) <= (w[1].created_at, w[1].id)));

        let two = repo.top_active(2).await.unwrap();
        assert_eq!(two.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (db, alice, _) = setup().await;
        let repo = db.products();
        let created = repo.insert(alice, &new_product("Lamp", ProductStatus::Draft)).await.unwrap();

        let update = ProductUpdate {
            price_cents: Some(2599),
            status: Some(ProductStatus::LowStock),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.name, "Lamp");
        assert_eq!(updated.price_cents, 2599);
        assert_eq!(updated.status, ProductStatus::LowStock);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let (db, _, _) = setup().await;
        let repo = db.products();

        let err = repo.update(77, &ProductUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = repo.delete(77).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, alice, _) = setup().await;
        let repo = db.products();
        let created = repo.insert(alice, &new_product("Rug", ProductStatus::Active)).await.unwrap();

        repo.delete(created.id).await.unwrap();
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_constraint_on_negative_price() {
        let (db, alice, _) = setup().await;
        let mut input = new_product("Bad", ProductStatus::Active);
        input.price_cents = -5;

        let err = db.products().insert(alice, &input).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
