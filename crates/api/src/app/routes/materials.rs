use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use siteledger_catalog::{MaterialLookup, NewMaterial};
use siteledger_core::{MaterialId, Page};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route("/:id", get(get_material))
        .route("/:id/deactivate", post(deactivate_material))
}

pub async fn list_materials(
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<dto::PageQuery>,
) -> axum::response::Response {
    let materials = services.materials.list(Page::new(page.limit, page.offset));
    (StatusCode::OK, Json(materials)).into_response()
}

pub async fn create_material(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewMaterial>,
) -> axum::response::Response {
    match services.materials.create(body) {
        Ok(material) => (StatusCode::CREATED, Json(material)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn get_material(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MaterialId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid material id")
        }
    };

    match services.materials.get(id) {
        Some(material) => (StatusCode::OK, Json(material)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "material not found"),
    }
}

pub async fn deactivate_material(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MaterialId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid material id")
        }
    };

    match services.materials.deactivate(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
