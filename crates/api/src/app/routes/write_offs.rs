use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use siteledger_core::{Page, WriteOffId};
use siteledger_ledger::NewWriteOff;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_write_offs).post(create_write_off))
        .route("/:id", get(get_write_off))
        .route("/:id/post", post(post_write_off))
}

pub async fn create_write_off(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewWriteOff>,
) -> axum::response::Response {
    match services.write_offs.create_draft(body) {
        Ok(write_off) => (StatusCode::CREATED, Json(write_off)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn list_write_offs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::WriteOffListQuery>,
) -> axum::response::Response {
    let write_offs = services
        .write_offs
        .list(query.project_id, Page::new(query.limit, query.offset));
    (StatusCode::OK, Json(write_offs)).into_response()
}

pub async fn get_write_off(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WriteOffId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid write-off id")
        }
    };

    match services.write_offs.get(id) {
        Some(write_off) => (StatusCode::OK, Json(write_off)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "write-off not found"),
    }
}

pub async fn post_write_off(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WriteOffId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid write-off id")
        }
    };

    match services.write_offs.post(id) {
        Ok(write_off) => (StatusCode::OK, Json(write_off)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
