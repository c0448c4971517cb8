use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use siteledger_core::StockError;

/// Translate a core error into a consistent JSON error response.
pub fn stock_error_to_response(err: StockError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        StockError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StockError::InvalidOperation(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_operation", message)
        }
        StockError::InsufficientStock {
            required,
            available,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": message,
                "required": required,
                "available": available,
            })),
        )
            .into_response(),
        StockError::Busy => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "busy",
            "stock is locked by another operation; retry with backoff",
        ),
        StockError::Storage(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
