//! Product repository over PostgreSQL
//!
//! - read: product row(s), then sizes + colors per product, fetched
//!   concurrently and awaited together
//! - create: product + sizes + colors in one transaction on a dedicated
//!   connection; any failed statement rolls the whole thing back
//! - update/delete: single statement against `products`

use async_trait::async_trait;
use futures::future::try_join_all;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::pool::AdmissionGate;
use crate::db::store::ProductStore;
use crate::db::DbError;
use crate::models::{ColorVariant, NewProduct, Product, ProductDetail, ProductFields, SizeVariant};

const PRODUCT_COLUMNS: &str =
    "id, name, category, sub_category, price, description, brand, image, in_stock";

/// PostgreSQL-backed product catalog
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    gate: AdmissionGate,
}

impl PgCatalog {
    pub fn new(pool: PgPool, gate: AdmissionGate) -> Self {
        Self { pool, gate }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch sizes and colors for one product and attach them.
    async fn details(&self, product: Product) -> Result<ProductDetail, DbError> {
        let (sizes, colors) = tokio::try_join!(
            sqlx::query_as::<_, SizeVariant>(
                "SELECT size, stock FROM product_sizes WHERE product_id = $1 ORDER BY id",
            )
            .bind(product.id.as_str())
            .fetch_all(&self.pool),
            sqlx::query_as::<_, ColorVariant>(
                "SELECT color FROM product_colors WHERE product_id = $1 ORDER BY id",
            )
            .bind(product.id.as_str())
            .fetch_all(&self.pool),
        )?;

        Ok(ProductDetail::compose(product, sizes, colors))
    }

    /// Compose every product; the result is ready once all fetches are.
    async fn compose_all(&self, products: Vec<Product>) -> Result<Vec<ProductDetail>, DbError> {
        try_join_all(products.into_iter().map(|p| self.details(p))).await
    }
}

/// Run every insert of a create on the transaction's connection, in order.
async fn insert_all(tx: &mut Transaction<'_, Postgres>, new: &NewProduct) -> Result<(), sqlx::Error> {
    let fields = &new.fields;
    sqlx::query(
        r#"
        INSERT INTO products (id, name, category, sub_category, price, description, brand, image, in_stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&new.id)
    .bind(&fields.name)
    .bind(&fields.category)
    .bind(&fields.sub_category)
    .bind(fields.price)
    .bind(&fields.description)
    .bind(&fields.brand)
    .bind(&fields.image)
    .bind(fields.in_stock)
    .execute(&mut **tx)
    .await?;

    for size in &new.sizes {
        sqlx::query("INSERT INTO product_sizes (product_id, size, stock) VALUES ($1, $2, $3)")
            .bind(&new.id)
            .bind(&size.size)
            .bind(size.stock)
            .execute(&mut **tx)
            .await?;
    }

    for color in &new.colors {
        sqlx::query("INSERT INTO product_colors (product_id, color) VALUES ($1, $2)")
            .bind(&new.id)
            .bind(color)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl ProductStore for PgCatalog {
    async fn list(&self) -> Result<Vec<ProductDetail>, DbError> {
        let _slot = self.gate.admit()?;
        let products: Vec<Product> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products"))
                .fetch_all(&self.pool)
                .await?;

        self.compose_all(products).await
    }

    async fn get(&self, id: &str) -> Result<ProductDetail, DbError> {
        let _slot = self.gate.admit()?;
        let product: Product =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("product", id))?;

        self.details(product).await
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<ProductDetail>, DbError> {
        let _slot = self.gate.admit()?;
        let products: Vec<Product> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        self.compose_all(products).await
    }

    async fn create(&self, new: NewProduct) -> Result<String, DbError> {
        let _slot = self.gate.admit()?;
        let mut tx = self.pool.begin().await?;

        if let Err(e) = insert_all(&mut tx, &new).await {
            // Dropping the transaction would also roll back; doing it
            // explicitly returns the connection clean and logs failures.
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(id = %new.id, error = %rollback, "rollback failed");
            }
            return Err(DbError::rolled_back(new.id, e));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::rolled_back(new.id.as_str(), e))?;

        tracing::debug!(
            id = %new.id,
            sizes = new.sizes.len(),
            colors = new.colors.len(),
            "product created"
        );
        Ok(new.id)
    }

    async fn update(&self, id: &str, fields: ProductFields) -> Result<u64, DbError> {
        let _slot = self.gate.admit()?;
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $1, category = $2, sub_category = $3, price = $4,
                description = $5, brand = $6, image = $7, in_stock = $8
            WHERE id = $9
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(&fields.sub_category)
        .bind(fields.price)
        .bind(&fields.description)
        .bind(&fields.brand)
        .bind(&fields.image)
        .bind(fields.in_stock)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &str) -> Result<u64, DbError> {
        let _slot = self.gate.admit()?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    // Integration tests - run with DATABASE_URL set
    // cargo test -p kasport-server -- --ignored

    async fn catalog() -> PgCatalog {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("connect failed");
        schema::ensure(&pool).await.expect("schema failed");
        PgCatalog::new(pool, AdmissionGate::unbounded())
    }

    fn tee(id: &str, sizes: Vec<SizeVariant>, colors: &[&str]) -> NewProduct {
        NewProduct {
            id: id.to_string(),
            fields: ProductFields {
                name: "Tee".into(),
                category: "pg-test".into(),
                sub_category: None,
                price: 10.0,
                description: None,
                brand: None,
                image: None,
                in_stock: true,
            },
            sizes,
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn size(label: &str, stock: i32) -> SizeVariant {
        SizeVariant {
            size: label.into(),
            stock,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_get_preserves_variant_order() {
        let catalog = catalog().await;
        catalog.delete("pg-order").await.unwrap();

        let new = tee("pg-order", vec![size("S", 1), size("M", 5), size("L", 0)], &["red", "blue"]);
        catalog.create(new).await.unwrap();

        let detail = catalog.get("pg-order").await.unwrap();
        assert_eq!(detail.sizes, vec![size("S", 1), size("M", 5), size("L", 0)]);
        assert_eq!(detail.colors, vec!["red", "blue"]);

        catalog.delete("pg-order").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn failed_variant_insert_rolls_back_product() {
        let catalog = catalog().await;
        catalog.delete("pg-rollback").await.unwrap();

        // Second size violates CHECK (stock >= 0) after the product row went in
        let new = tee("pg-rollback", vec![size("M", 5), size("L", -1)], &["red"]);
        let err = catalog.create(new).await.unwrap_err();
        assert!(matches!(err, DbError::Transaction { .. }));

        let err = catalog.get("pg-rollback").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_removes_variants() {
        let catalog = catalog().await;
        catalog.delete("pg-cascade").await.unwrap();

        catalog
            .create(tee("pg-cascade", vec![size("M", 2)], &["green"]))
            .await
            .unwrap();
        assert_eq!(catalog.delete("pg-cascade").await.unwrap(), 1);

        let (orphans,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_sizes WHERE product_id = $1")
                .bind("pg-cascade")
                .fetch_one(catalog.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }
}
