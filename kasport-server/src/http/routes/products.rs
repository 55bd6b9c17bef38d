//! Product endpoints
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | /api/products | list with variants |
//! | POST | /api/products | create with variants (transactional) |
//! | GET | /api/products/{id} | one product with variants |
//! | PUT | /api/products/{id} | overwrite product fields |
//! | DELETE | /api/products/{id} | remove product |
//! | GET | /api/products/category/{category} | filter by category |

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use crate::http::error::ApiError;
use crate::http::extractors::JsonBody;
use crate::http::server::AppState;
use crate::models::{NewProduct, ProductDetail, ProductFields};

/// Create response
#[derive(Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: String,
}

/// Update/delete response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/products - every product with sizes and colors
async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductDetail>>, ApiError> {
    let products = state.catalog.list().await?;
    tracing::debug!(count = products.len(), "listed products");
    Ok(Json(products))
}

/// GET /api/products/{id} - one product with sizes and colors
#[instrument(skip(state))]
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>, ApiError> {
    let product = state.catalog.get(&id).await?;
    Ok(Json(product))
}

/// GET /api/products/category/{category} - products in one category
#[instrument(skip(state))]
async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProductDetail>>, ApiError> {
    let products = state.catalog.list_by_category(&category).await?;
    Ok(Json(products))
}

/// POST /api/products - create product, sizes and colors atomically
#[instrument(skip(state, req), fields(id = %req.id))]
async fn create_product(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state.catalog.create(req).await?;
    tracing::info!(%id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Product created",
            id,
        }),
    ))
}

/// PUT /api/products/{id} - overwrite every product field
#[instrument(skip(state, fields))]
async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<ProductFields>,
) -> Result<Json<MessageResponse>, ApiError> {
    let matched = state.catalog.update(&id, fields).await?;
    if matched == 0 {
        tracing::debug!("update matched no product");
    }

    Ok(Json(MessageResponse {
        message: "Product updated",
    }))
}

/// DELETE /api/products/{id} - remove the product row
#[instrument(skip(state))]
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.catalog.delete(&id).await?;
    if removed == 0 {
        tracing::debug!("delete matched no product");
    }

    Ok(Json(MessageResponse {
        message: "Product deleted",
    }))
}

/// Product routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/category/{category}", get(list_by_category))
}
