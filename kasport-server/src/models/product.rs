//! Product aggregate and its variant rows
//!
//! JSON uses camelCase (`subCategory`, `inStock`); columns use snake_case.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Every product column except the identifier.
///
/// This is the full field set an update overwrites; there is no
/// partial-patch form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub name: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub price: f64,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub in_stock: bool,
}

/// Product row from `products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: ProductFields,
}

/// Size/stock row from `product_sizes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SizeVariant {
    pub size: String,
    pub stock: i32,
}

/// Color row from `product_colors`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ColorVariant {
    pub color: String,
}

/// Create payload: the product plus the variant rows inserted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProductFields,
    #[serde(default)]
    pub sizes: Vec<SizeVariant>,
    #[serde(default)]
    pub colors: Vec<String>,
}

impl NewProduct {
    /// The `products` row this payload inserts.
    pub fn product(&self) -> Product {
        Product {
            id: self.id.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Denormalized product as served by the read endpoints.
///
/// `sizes` and `colors` are always present, empty when the product
/// has no variant rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub sizes: Vec<SizeVariant>,
    pub colors: Vec<String>,
}

impl ProductDetail {
    /// Attach variant rows to their product, flattening colors to labels.
    pub fn compose(product: Product, sizes: Vec<SizeVariant>, colors: Vec<ColorVariant>) -> Self {
        Self {
            product,
            sizes,
            colors: colors.into_iter().map(|c| c.color).collect(),
        }
    }
}
