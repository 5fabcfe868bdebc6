use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument, warn};

use crate::{
    error::{api_error, ApiError},
    state::AppState,
};

use super::dto::{ProductCard, ProductDetails, ProductQuery};
use super::services::ProductFilter;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<ProductCard>> {
    let filter = ProductFilter::from(query);
    let cards: Vec<ProductCard> = state.catalog.filter(&filter).map(ProductCard::from).collect();
    debug!(count = cards.len(), "products listed");
    Json(cards)
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProductDetails>, ApiError> {
    match state.catalog.find(id) {
        Some(product) => Ok(Json(ProductDetails::from(product))),
        None => {
            warn!(product_id = id, "product not found");
            Err(api_error(StatusCode::NOT_FOUND, "Product not found"))
        }
    }
}
