//! Catalog entities decoded at the data-access boundary
//!
//! Rows never travel as loose maps: each table has a struct with a
//! fixed field set, and the HTTP layer serializes those directly.

pub mod product;

pub use product::{ColorVariant, NewProduct, Product, ProductDetail, ProductFields, SizeVariant};
