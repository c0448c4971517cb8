use std::time::Duration;

#[tokio::main]
async fn main() {
    siteledger_observability::init();

    let addr = std::env::var("SITELEDGER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let lock_wait = std::env::var("SITELEDGER_LOCK_WAIT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| {
            tracing::warn!("SITELEDGER_LOCK_WAIT_MS not set; using 250ms default");
            Duration::from_millis(250)
        });

    let app = siteledger_api::app::build_app(lock_wait);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listen address");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
