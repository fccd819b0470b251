//! `PostgreSQL` document repositories.
//!
//! Products and carts are stored as JSONB documents keyed by a serial ID in
//! the `catalog` schema. Filtering, sorting and paging of products run in SQL;
//! cart changes are applied by the core cart rules inside a transaction that
//! holds the row lock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use mercado_core::{
    Cart, CartChange, CartId, CartLine, Page, PageInfo, Price, Product, ProductCode, ProductDraft,
    ProductFilter, ProductId, ProductQuery, ProductUpdate, SortOrder,
};

use super::{CartRepository, ProductRepository, RepositoryError};

/// Stored product body. The ID lives in its own column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductDocument {
    title: String,
    description: String,
    code: ProductCode,
    price: Price,
    status: bool,
    stock: u32,
    category: String,
    #[serde(default)]
    thumbnails: Vec<String>,
}

impl ProductDocument {
    fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            code: self.code,
            price: self.price,
            status: self.status,
            stock: self.stock,
            category: self.category,
            thumbnails: self.thumbnails,
        }
    }
}

impl From<ProductDraft> for ProductDocument {
    fn from(draft: ProductDraft) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            code: draft.code,
            price: draft.price,
            status: draft.status,
            stock: draft.stock,
            category: draft.category,
            thumbnails: draft.thumbnails,
        }
    }
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        Self {
            title: product.title,
            description: product.description,
            code: product.code,
            price: product.price,
            status: product.status,
            stock: product.stock,
            category: product.category,
            thumbnails: product.thumbnails,
        }
    }
}

/// Stored cart body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CartDocument {
    products: Vec<CartLine>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    doc: Json<ProductDocument>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        row.doc.0.into_product(row.id)
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    doc: Json<CartDocument>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            products: row.doc.0.products,
        }
    }
}

/// Map a unique violation on the product code index to a conflict.
fn map_code_conflict(e: sqlx::Error, code: &ProductCode) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::duplicate_code(code);
    }
    RepositoryError::Database(e)
}

/// Split a product filter into its SQL bind parameters.
fn filter_binds(filter: Option<&ProductFilter>) -> (Option<&str>, Option<bool>) {
    match filter {
        Some(ProductFilter::Category(category)) => (Some(category.as_str()), None),
        Some(ProductFilter::Availability(status)) => (None, Some(*status)),
        None => (None, None),
    }
}

// =============================================================================
// Products
// =============================================================================

/// Product repository over `catalog.product`.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self))]
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, RepositoryError> {
        let (category, status) = filter_binds(query.filter.as_ref());
        let sort = query.sort.as_ref().map(SortOrder::as_str);
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM catalog.product
            WHERE ($1::text IS NULL OR doc->>'category' = $1)
              AND ($2::boolean IS NULL OR (doc->>'status')::boolean = $2)
            ",
        )
        .bind(category)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, doc
            FROM catalog.product
            WHERE ($1::text IS NULL OR doc->>'category' = $1)
              AND ($2::boolean IS NULL OR (doc->>'status')::boolean = $2)
            ORDER BY
                CASE WHEN $3::text = 'asc' THEN (doc->>'price')::numeric END ASC,
                CASE WHEN $3::text = 'desc' THEN (doc->>'price')::numeric END DESC,
                id ASC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(category)
        .bind(status)
        .bind(sort)
        .bind(i64::from(query.limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Product::from).collect(),
            info: PageInfo::new(u64::try_from(total).unwrap_or(0), query.page, query.limit),
        })
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT id, doc FROM catalog.product ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, doc FROM catalog.product WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Product::from))
    }

    #[instrument(skip(self, draft), fields(code = %draft.code))]
    async fn create(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        let code = draft.code.clone();
        let doc = ProductDocument::from(draft);

        let id: ProductId =
            sqlx::query_scalar("INSERT INTO catalog.product (doc) VALUES ($1) RETURNING id")
                .bind(Json(&doc))
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_code_conflict(e, &code))?;

        Ok(doc.into_product(id))
    }

    #[instrument(skip(self, update))]
    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, doc FROM catalog.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let mut product = row.map(Product::from).ok_or(RepositoryError::NotFound)?;
        product.apply_update(update)?;

        let code = product.code.clone();
        sqlx::query("UPDATE catalog.product SET doc = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Json(ProductDocument::from(product.clone())))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_code_conflict(e, &code))?;

        tx.commit().await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as("DELETE FROM catalog.product WHERE id = $1 RETURNING id, doc")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog.product")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

// =============================================================================
// Carts
// =============================================================================

/// Cart repository over `catalog.cart`.
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn list(&self) -> Result<Vec<Cart>, RepositoryError> {
        let rows: Vec<CartRow> = sqlx::query_as("SELECT id, doc FROM catalog.cart ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Cart::from).collect())
    }

    async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as("SELECT id, doc FROM catalog.cart WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Cart::from))
    }

    #[instrument(skip(self))]
    async fn create(&self) -> Result<Cart, RepositoryError> {
        let row: CartRow =
            sqlx::query_as("INSERT INTO catalog.cart (doc) VALUES ($1) RETURNING id, doc")
                .bind(Json(CartDocument::default()))
                .fetch_one(&self.pool)
                .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn modify(&self, id: CartId, change: CartChange) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<CartRow> =
            sqlx::query_as("SELECT id, doc FROM catalog.cart WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let mut cart = row.map(Cart::from).ok_or(RepositoryError::NotFound)?;
        cart.apply(change)?;

        sqlx::query("UPDATE catalog.cart SET doc = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Json(CartDocument {
                products: cart.products.clone(),
            }))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(cart)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog.cart")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_binds() {
        assert_eq!(filter_binds(None), (None, None));
        assert_eq!(
            filter_binds(Some(&ProductFilter::Category("tea".to_string()))),
            (Some("tea"), None)
        );
        assert_eq!(
            filter_binds(Some(&ProductFilter::Availability(false))),
            (None, Some(false))
        );
    }

    #[test]
    fn test_product_document_omits_id() {
        let doc: ProductDocument = serde_json::from_value(serde_json::json!({
            "title": "Tea",
            "description": "Green",
            "code": "T-1",
            "price": 3.25,
            "status": true,
            "stock": 4,
            "category": "drinks"
        }))
        .unwrap();
        let product = doc.clone().into_product(ProductId::new(9));
        assert_eq!(product.id, ProductId::new(9));
        assert!(product.thumbnails.is_empty());

        let value = serde_json::to_value(ProductDocument::from(product)).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["price"], 3.25);
    }

    // Tests below need a PostgreSQL server; run with
    // `DATABASE_URL=... cargo test -p mercado-storefront -- --ignored`.

    fn draft(code: &str, cents: i64, category: &str) -> ProductDraft {
        mercado_core::NewProduct {
            title: Some(format!("Item {code}")),
            description: Some("Stored as a document".to_string()),
            code: Some(code.to_string()),
            price: Some(rust_decimal::Decimal::new(cents, 2)),
            stock: Some(3),
            category: Some(category.to_string()),
            ..mercado_core::NewProduct::default()
        }
        .validate()
        .unwrap()
    }

    fn query(
        limit: u32,
        page: u32,
        sort: Option<SortOrder>,
        filter: Option<ProductFilter>,
    ) -> ProductQuery {
        ProductQuery {
            limit,
            page,
            sort,
            filter,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_sql_listing_matches_in_memory_listing(pool: PgPool) {
        let repo = PgProductRepository::new(pool);
        for (code, cents, category) in [
            ("TEA-1", 450, "drinks"),
            ("MUG-1", 1200, "home"),
            ("TEA-2", 450, "drinks"),
            ("POT-1", 3000, "home"),
            ("TEA-3", 199, "drinks"),
        ] {
            repo.create(draft(code, cents, category)).await.unwrap();
        }
        repo.update(
            ProductId::new(2),
            ProductUpdate {
                status: Some(false),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();

        let all = repo.list_all().await.unwrap();
        let queries = [
            query(10, 1, None, None),
            query(2, 2, None, None),
            query(2, 1, Some(SortOrder::Asc), None),
            query(3, 1, Some(SortOrder::Desc), None),
            query(
                10,
                1,
                Some(SortOrder::Asc),
                Some(ProductFilter::Category("drinks".to_string())),
            ),
            query(10, 1, None, Some(ProductFilter::Availability(false))),
            query(2, 4, None, None),
        ];
        for q in &queries {
            assert_eq!(repo.list(q).await.unwrap(), q.apply(&all), "{q:?}");
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_unique_code_violations_are_conflicts(pool: PgPool) {
        let repo = PgProductRepository::new(pool);
        repo.create(draft("A-1", 100, "misc")).await.unwrap();
        let second = repo.create(draft("A-2", 100, "misc")).await.unwrap();

        assert!(matches!(
            repo.create(draft("A-1", 500, "misc")).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            repo.update(
                second.id,
                ProductUpdate {
                    code: Some("A-1".to_string()),
                    ..ProductUpdate::default()
                },
            )
            .await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(repo.get(second.id).await.unwrap(), Some(second));
        assert!(matches!(
            repo.delete(ProductId::new(99)).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_concurrent_cart_changes_are_serialized(pool: PgPool) {
        let repo = PgCartRepository::new(pool);
        let cart = repo.create().await.unwrap();
        let product = ProductId::new(1);

        let adds = (0..8).map(|_| repo.modify(cart.id, CartChange::AddProduct(product)));
        futures_util::future::try_join_all(adds).await.unwrap();

        let stored = repo.get(cart.id).await.unwrap().unwrap();
        assert_eq!(
            stored.products,
            vec![CartLine {
                product,
                quantity: 8
            }]
        );

        assert!(matches!(
            repo.modify(cart.id, CartChange::RemoveProduct(ProductId::new(2))).await,
            Err(RepositoryError::Cart(_))
        ));
        assert!(matches!(
            repo.modify(CartId::new(404), CartChange::Clear).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
