use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_stock))
        .route("/reserve", post(reserve))
        .route("/release", post(release))
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StockQuery>,
) -> axum::response::Response {
    match services.stock.get_stock(query.material_id, query.warehouse_id) {
        Ok(level) => (
            StatusCode::OK,
            Json(json!({
                "material_id": query.material_id,
                "warehouse_id": query.warehouse_id,
                "quantity": level.quantity,
                "reserved": level.reserved,
                "available": level.available,
            })),
        )
            .into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn reserve(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReservationRequest>,
) -> axum::response::Response {
    match services
        .stock
        .reserve(body.material_id, body.warehouse_id, body.quantity)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn release(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReservationRequest>,
) -> axum::response::Response {
    match services
        .stock
        .release(body.material_id, body.warehouse_id, body.quantity)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
