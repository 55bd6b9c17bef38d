//! In-memory product store.
//!
//! Intended for tests/dev. Enforces the same rules as the SQL schema:
//! unique product ids, variant rows must reference an existing product,
//! `stock >= 0`, and variants go away with their product. A create runs
//! against a staged copy of the tables that only replaces the live copy
//! once every insert succeeded.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::ProductStore;
use super::DbError;
use crate::models::{ColorVariant, NewProduct, Product, ProductDetail, ProductFields, SizeVariant};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: Vec<Product>,
    sizes: Vec<(String, SizeVariant)>,
    colors: Vec<(String, String)>,
}

impl Tables {
    fn insert_product(&mut self, product: Product) -> Result<(), DbError> {
        if self.products.iter().any(|p| p.id == product.id) {
            return Err(DbError::Constraint(format!(
                "duplicate key products.id = '{}'",
                product.id
            )));
        }
        self.products.push(product);
        Ok(())
    }

    fn check_parent(&self, product_id: &str) -> Result<(), DbError> {
        if self.products.iter().any(|p| p.id == product_id) {
            Ok(())
        } else {
            Err(DbError::Constraint(format!(
                "product_id '{product_id}' references no product"
            )))
        }
    }

    fn insert_size(&mut self, product_id: &str, size: SizeVariant) -> Result<(), DbError> {
        self.check_parent(product_id)?;
        if size.stock < 0 {
            return Err(DbError::Constraint(format!(
                "product_sizes.stock >= 0 (got {})",
                size.stock
            )));
        }
        self.sizes.push((product_id.to_owned(), size));
        Ok(())
    }

    fn insert_color(&mut self, product_id: &str, color: String) -> Result<(), DbError> {
        self.check_parent(product_id)?;
        self.colors.push((product_id.to_owned(), color));
        Ok(())
    }

    fn detail(&self, product: &Product) -> ProductDetail {
        let sizes = self
            .sizes
            .iter()
            .filter(|(id, _)| *id == product.id)
            .map(|(_, s)| s.clone())
            .collect();
        let colors = self
            .colors
            .iter()
            .filter(|(id, _)| *id == product.id)
            .map(|(_, c)| ColorVariant { color: c.clone() })
            .collect();

        ProductDetail::compose(product.clone(), sizes, colors)
    }
}

/// Product store held in process memory
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: RwLock<Tables>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of size and color rows across all products.
    pub async fn variant_rows(&self) -> usize {
        let tables = self.tables.read().await;
        tables.sizes.len() + tables.colors.len()
    }
}

#[async_trait]
impl ProductStore for MemoryCatalog {
    async fn list(&self) -> Result<Vec<ProductDetail>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().map(|p| tables.detail(p)).collect())
    }

    async fn get(&self, id: &str) -> Result<ProductDetail, DbError> {
        let tables = self.tables.read().await;
        tables
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.detail(p))
            .ok_or_else(|| DbError::not_found("product", id))
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<ProductDetail>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| p.fields.category == category)
            .map(|p| tables.detail(p))
            .collect())
    }

    async fn create(&self, new: NewProduct) -> Result<String, DbError> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        let product = new.product();
        let NewProduct {
            id, sizes, colors, ..
        } = new;

        let applied = staged
            .insert_product(product)
            .and_then(|()| sizes.into_iter().try_for_each(|s| staged.insert_size(&id, s)))
            .and_then(|()| colors.into_iter().try_for_each(|c| staged.insert_color(&id, c)));

        match applied {
            Ok(()) => {
                *tables = staged;
                Ok(id)
            }
            Err(e) => Err(DbError::rolled_back(id, e)),
        }
    }

    async fn update(&self, id: &str, fields: ProductFields) -> Result<u64, DbError> {
        let mut tables = self.tables.write().await;
        let mut matched = 0;
        for product in tables.products.iter_mut().filter(|p| p.id == id) {
            product.fields = fields.clone();
            matched += 1;
        }
        Ok(matched)
    }

    async fn delete(&self, id: &str) -> Result<u64, DbError> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        tables.sizes.retain(|(product_id, _)| product_id != id);
        tables.colors.retain(|(product_id, _)| product_id != id);
        Ok((before - tables.products.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(category: &str) -> ProductFields {
        ProductFields {
            name: "Tee".into(),
            category: category.into(),
            sub_category: None,
            price: 10.0,
            description: None,
            brand: None,
            image: None,
            in_stock: true,
        }
    }

    fn new_product(id: &str, sizes: &[(&str, i32)], colors: &[&str]) -> NewProduct {
        NewProduct {
            id: id.into(),
            fields: fields("shirts"),
            sizes: sizes
                .iter()
                .map(|(size, stock)| SizeVariant {
                    size: size.to_string(),
                    stock: *stock,
                })
                .collect(),
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let catalog = MemoryCatalog::new();
        let id = catalog
            .create(new_product("p1", &[("M", 5), ("L", 2)], &["red", "blue"]))
            .await
            .unwrap();
        assert_eq!(id, "p1");

        let detail = catalog.get("p1").await.unwrap();
        assert_eq!(detail.sizes.len(), 2);
        assert_eq!(detail.sizes[0].size, "M");
        assert_eq!(detail.colors, vec!["red", "blue"]);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_without_touching_original() {
        let catalog = MemoryCatalog::new();
        catalog
            .create(new_product("p1", &[("M", 5)], &["red"]))
            .await
            .unwrap();

        let err = catalog
            .create(new_product("p1", &[("XL", 1)], &["green"]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Transaction { .. }));

        let detail = catalog.get("p1").await.unwrap();
        assert_eq!(detail.colors, vec!["red"]);
        assert_eq!(catalog.variant_rows().await, 2);
    }

    #[tokio::test]
    async fn negative_stock_rolls_back_everything() {
        let catalog = MemoryCatalog::new();
        let err = catalog
            .create(new_product("p1", &[("M", 5), ("L", -1)], &["red"]))
            .await
            .unwrap_err();

        match err {
            DbError::Transaction { id, source } => {
                assert_eq!(id, "p1");
                assert!(matches!(*source, DbError::Constraint(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(catalog.get("p1").await.unwrap_err().is_not_found());
        assert_eq!(catalog.variant_rows().await, 0);
    }

    #[tokio::test]
    async fn delete_cascades_to_variants() {
        let catalog = MemoryCatalog::new();
        catalog
            .create(new_product("p1", &[("M", 5)], &["red"]))
            .await
            .unwrap();
        catalog
            .create(new_product("p2", &[("S", 1)], &[]))
            .await
            .unwrap();

        assert_eq!(catalog.delete("p1").await.unwrap(), 1);
        assert_eq!(catalog.delete("p1").await.unwrap(), 0);
        assert_eq!(catalog.variant_rows().await, 1);
    }

    #[tokio::test]
    async fn update_overwrites_fields_only() {
        let catalog = MemoryCatalog::new();
        catalog
            .create(new_product("p1", &[("M", 5)], &["red"]))
            .await
            .unwrap();

        let mut changed = fields("outerwear");
        changed.price = 25.5;
        assert_eq!(catalog.update("p1", changed.clone()).await.unwrap(), 1);
        assert_eq!(catalog.update("missing", changed.clone()).await.unwrap(), 0);

        let detail = catalog.get("p1").await.unwrap();
        assert_eq!(detail.product.fields, changed);
        assert_eq!(detail.colors, vec!["red"]);
    }

    #[tokio::test]
    async fn category_filter_keeps_table_order() {
        let catalog = MemoryCatalog::new();
        for (id, category) in [("a", "hats"), ("b", "shirts"), ("c", "hats")] {
            let mut new = new_product(id, &[], &[]);
            new.fields.category = category.into();
            catalog.create(new).await.unwrap();
        }

        let hats: Vec<_> = catalog
            .list_by_category("hats")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.product.id)
            .collect();
        assert_eq!(hats, vec!["a", "c"]);
        assert_eq!(catalog.list().await.unwrap().len(), 3);
    }
}
