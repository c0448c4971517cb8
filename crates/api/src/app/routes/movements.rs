use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use siteledger_core::Page;
use siteledger_ledger::{MovementFilter, MovementKind};
use siteledger_stock::ExpensePolicy;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_movements).post(create_movement))
}

pub async fn create_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateMovementRequest>,
) -> axum::response::Response {
    let doc = body.doc();

    let result = match body.kind {
        MovementKind::Receipt { to_warehouse } => {
            services
                .stock
                .apply_receipt(body.material_id, to_warehouse, body.quantity, body.price, doc)
        }
        MovementKind::Expense { from_warehouse } => {
            let policy = if body.from_reservation {
                ExpensePolicy::FromReservation
            } else {
                ExpensePolicy::AvailableOnly
            };
            services.stock.apply_expense(
                body.material_id,
                from_warehouse,
                body.quantity,
                body.price,
                policy,
                doc,
            )
        }
        MovementKind::Transfer {
            from_warehouse,
            to_warehouse,
        } => services.stock.apply_transfer(
            body.material_id,
            from_warehouse,
            to_warehouse,
            body.quantity,
            body.price,
            doc,
        ),
    };

    match result {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({
                "id": id,
                "type": body.kind.label(),
            })),
        )
            .into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementHistoryQuery>,
) -> axum::response::Response {
    let filter = MovementFilter {
        warehouse_id: query.warehouse_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };

    match services.stock.movement_history(
        query.material_id,
        filter,
        Page::new(query.limit, query.offset),
    ) {
        Ok(movements) => (StatusCode::OK, Json(movements)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
