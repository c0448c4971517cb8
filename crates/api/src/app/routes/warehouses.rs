use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use siteledger_catalog::{NewWarehouse, WarehouseLookup};
use siteledger_core::{Page, WarehouseId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route("/:id", get(get_warehouse))
        .route("/:id/deactivate", post(deactivate_warehouse))
        .route("/:id/stocks", get(list_warehouse_stocks))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<dto::PageQuery>,
) -> axum::response::Response {
    let warehouses = services.warehouses.list(Page::new(page.limit, page.offset));
    (StatusCode::OK, Json(warehouses)).into_response()
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewWarehouse>,
) -> axum::response::Response {
    match services.warehouses.create(body) {
        Ok(warehouse) => (StatusCode::CREATED, Json(warehouse)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    match services.warehouses.get(id) {
        Some(warehouse) => (StatusCode::OK, Json(warehouse)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "warehouse not found"),
    }
}

pub async fn deactivate_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    match services.warehouses.deactivate(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn list_warehouse_stocks(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    if services.warehouses.get(id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "warehouse not found");
    }

    match services.stock.list_for_warehouse(id) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
