use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewProduct, Product, ProductChanges, ProductRow};
use crate::{
    error::{AppError, AppResult},
    pagination::{Page, PageRequest},
    storage::StoredObject,
};

/// Persistence boundary for the catalog. Writes are single statements;
/// concurrent updates of one product are last-write-wins.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn create(&self, product: NewProduct, image: Option<StoredObject>) -> AppResult<Product>;
    /// `image: Some(..)` replaces the stored image reference.
    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        image: Option<StoredObject>,
    ) -> AppResult<Option<Product>>;
    async fn delete(&self, id: Uuid) -> AppResult<Option<Product>>;
    /// Newest first.
    async fn list(&self, page: PageRequest) -> AppResult<Page<Product>>;
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, brand, stock, image_url, image_key, created_at, updated_at";

#[derive(Clone)]
pub struct PgProductStore {
    db: PgPool,
}

impl PgProductStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_product(row: Option<ProductRow>) -> AppResult<Option<Product>> {
    row.map(Product::try_from).transpose().map_err(AppError::from)
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_product(row)
    }

    async fn create(&self, p: NewProduct, image: Option<StoredObject>) -> AppResult<Product> {
        let (image_url, image_key) = image.map(|o| (o.url, o.key)).unzip();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, description, price, category, brand, stock, image_url, image_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.price)
        .bind(p.category.as_str())
        .bind(&p.brand)
        .bind(p.stock)
        .bind(image_url)
        .bind(image_key)
        .fetch_one(&self.db)
        .await?;
        Ok(Product::try_from(row)?)
    }

    async fn update(
        &self,
        id: Uuid,
        c: ProductChanges,
        image: Option<StoredObject>,
    ) -> AppResult<Option<Product>> {
        let replace_brand = c.brand.is_some();
        let (image_url, image_key) = image.map(|o| (o.url, o.key)).unzip();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                name        = COALESCE($2, name),
                description = COALESCE($3, description),
                price       = COALESCE($4, price),
                category    = COALESCE($5, category),
                brand       = CASE WHEN $6 THEN $7 ELSE brand END,
                stock       = COALESCE($8, stock),
                image_url   = COALESCE($9, image_url),
                image_key   = COALESCE($10, image_key),
                updated_at  = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&c.name)
        .bind(&c.description)
        .bind(c.price)
        .bind(c.category.map(|cat| cat.as_str()))
        .bind(replace_brand)
        .bind(c.brand.flatten())
        .bind(c.stock)
        .bind(image_url)
        .bind(image_key)
        .fetch_optional(&self.db)
        .await?;
        into_product(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_product(row)
    }

    async fn list(&self, page: PageRequest) -> AppResult<Page<Product>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;
        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }
}
