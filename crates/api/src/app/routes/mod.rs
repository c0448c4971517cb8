use axum::{routing::get, Router};

pub mod materials;
pub mod movements;
pub mod stock;
pub mod system;
pub mod warehouses;
pub mod write_offs;

/// Router for all endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/materials", materials::router())
        .nest("/warehouses", warehouses::router())
        .nest("/stock", stock::router())
        .nest("/movements", movements::router())
        .nest("/write-offs", write_offs::router())
}
