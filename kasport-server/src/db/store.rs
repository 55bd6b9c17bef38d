//! Product store trait
//!
//! Handlers talk to the catalog through this seam; PostgreSQL backs it in
//! production and [`MemoryCatalog`](super::MemoryCatalog) in tests.

use async_trait::async_trait;

use super::DbError;
use crate::models::{NewProduct, ProductDetail, ProductFields};

#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
    /// Every product with its sizes and colors, in table order.
    async fn list(&self) -> Result<Vec<ProductDetail>, DbError>;

    /// One product with its sizes and colors.
    ///
    /// Returns [`DbError::NotFound`] when no row has this id.
    async fn get(&self, id: &str) -> Result<ProductDetail, DbError>;

    /// Products whose category matches exactly, composed like [`list`](Self::list).
    async fn list_by_category(&self, category: &str) -> Result<Vec<ProductDetail>, DbError>;

    /// Insert the product and all its variant rows atomically.
    ///
    /// Returns the created id. On failure nothing is kept and the error is
    /// [`DbError::Transaction`].
    async fn create(&self, product: NewProduct) -> Result<String, DbError>;

    /// Overwrite every product column. Returns the number of rows matched.
    async fn update(&self, id: &str, fields: ProductFields) -> Result<u64, DbError>;

    /// Remove the product row. Returns the number of rows removed.
    async fn delete(&self, id: &str) -> Result<u64, DbError>;
}
