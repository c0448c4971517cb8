use std::str::FromStr;
use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = siteledger_api::app::build_app(Duration::from_millis(250));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal value: {other:?}"),
    }
}

async fn create_material(client: &reqwest::Client, base_url: &str, code: &str) -> Value {
    let response = client
        .post(format!("{base_url}/materials"))
        .json(&json!({
            "code": code,
            "name": format!("Material {code}"),
            "category": "material",
            "unit": "t",
            "specification": null,
            "standard_price": null,
            "notes": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn create_warehouse(client: &reqwest::Client, base_url: &str, code: &str) -> Value {
    let response = client
        .post(format!("{base_url}/warehouses"))
        .json(&json!({
            "code": code,
            "name": format!("Warehouse {code}"),
            "location": null,
            "responsible": null,
            "notes": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn post_receipt(
    client: &reqwest::Client,
    base_url: &str,
    material_id: &str,
    warehouse_id: &str,
    quantity: &str,
) {
    let response = client
        .post(format!("{base_url}/movements"))
        .json(&json!({
            "material_id": material_id,
            "type": "receipt",
            "to_warehouse": warehouse_id,
            "quantity": quantity,
            "document_number": "PR-1",
            "movement_date": "2024-06-01",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn get_stock(
    client: &reqwest::Client,
    base_url: &str,
    material_id: &str,
    warehouse_id: &str,
) -> Value {
    let response = client
        .get(format!(
            "{base_url}/stock?material_id={material_id}&warehouse_id={warehouse_id}"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn material_codes_are_unique_over_http() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_material(&client, &server.base_url, "CEM-500").await;

    let duplicate = client
        .post(format!("{}/materials", server.base_url))
        .json(&json!({
            "code": "CEM-500",
            "name": "Cement again",
            "category": "material",
            "unit": "t",
            "specification": null,
            "standard_price": null,
            "notes": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["error"], "invalid_operation");
}

#[tokio::test]
async fn receipt_reserve_and_expense_flow() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let material = create_material(&client, &server.base_url, "CEM-500").await;
    let warehouse = create_warehouse(&client, &server.base_url, "WH-A").await;
    let material_id = material["id"].as_str().unwrap();
    let warehouse_id = warehouse["id"].as_str().unwrap();

    post_receipt(&client, &server.base_url, material_id, warehouse_id, "100").await;

    let stock = get_stock(&client, &server.base_url, material_id, warehouse_id).await;
    assert_eq!(decimal(&stock["quantity"]), dec!(100));
    assert_eq!(decimal(&stock["available"]), dec!(100));

    let reserve = client
        .post(format!("{}/stock/reserve", server.base_url))
        .json(&json!({
            "material_id": material_id,
            "warehouse_id": warehouse_id,
            "quantity": "30",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(reserve.status(), StatusCode::NO_CONTENT);

    // Over-available expense carries the precise shortfall in the payload.
    let rejected = client
        .post(format!("{}/movements", server.base_url))
        .json(&json!({
            "material_id": material_id,
            "type": "expense",
            "from_warehouse": warehouse_id,
            "quantity": "80",
            "document_number": "EX-1",
            "movement_date": "2024-06-02",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = rejected.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(decimal(&body["required"]), dec!(80));
    assert_eq!(decimal(&body["available"]), dec!(70));

    let accepted = client
        .post(format!("{}/movements", server.base_url))
        .json(&json!({
            "material_id": material_id,
            "type": "expense",
            "from_warehouse": warehouse_id,
            "quantity": "50",
            "document_number": "EX-2",
            "movement_date": "2024-06-02",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::CREATED);

    let stock = get_stock(&client, &server.base_url, material_id, warehouse_id).await;
    assert_eq!(decimal(&stock["quantity"]), dec!(50));
    assert_eq!(decimal(&stock["reserved"]), dec!(30));
    assert_eq!(decimal(&stock["available"]), dec!(20));
}

#[tokio::test]
async fn transfer_updates_both_warehouses_with_one_ledger_entry() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let material = create_material(&client, &server.base_url, "REBAR-12").await;
    let wh_a = create_warehouse(&client, &server.base_url, "WH-A").await;
    let wh_b = create_warehouse(&client, &server.base_url, "WH-B").await;
    let material_id = material["id"].as_str().unwrap();
    let wh_a_id = wh_a["id"].as_str().unwrap();
    let wh_b_id = wh_b["id"].as_str().unwrap();

    post_receipt(&client, &server.base_url, material_id, wh_a_id, "100").await;

    let transfer = client
        .post(format!("{}/movements", server.base_url))
        .json(&json!({
            "material_id": material_id,
            "type": "transfer",
            "from_warehouse": wh_a_id,
            "to_warehouse": wh_b_id,
            "quantity": "40",
            "document_number": "TR-1",
            "movement_date": "2024-06-03",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(transfer.status(), StatusCode::CREATED);

    let stock_a = get_stock(&client, &server.base_url, material_id, wh_a_id).await;
    let stock_b = get_stock(&client, &server.base_url, material_id, wh_b_id).await;
    assert_eq!(decimal(&stock_a["quantity"]), dec!(60));
    assert_eq!(decimal(&stock_b["quantity"]), dec!(40));

    let history = client
        .get(format!(
            "{}/movements?material_id={material_id}",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let movements: Value = history.json().await.unwrap();
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[1]["kind"]["type"], "transfer");

    let warehouse_rows = client
        .get(format!("{}/warehouses/{wh_b_id}/stocks", server.base_url))
        .send()
        .await
        .unwrap();
    let rows: Value = warehouse_rows.json().await.unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(decimal(&rows[0]["quantity"]), dec!(40));
}

#[tokio::test]
async fn write_off_posting_is_all_or_nothing_over_http() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let material_m = create_material(&client, &server.base_url, "M-01").await;
    let material_n = create_material(&client, &server.base_url, "N-02").await;
    let warehouse = create_warehouse(&client, &server.base_url, "WH-A").await;
    let m_id = material_m["id"].as_str().unwrap();
    let n_id = material_n["id"].as_str().unwrap();
    let warehouse_id = warehouse["id"].as_str().unwrap();

    post_receipt(&client, &server.base_url, m_id, warehouse_id, "60").await;
    post_receipt(&client, &server.base_url, n_id, warehouse_id, "150").await;

    let project_id = uuid::Uuid::now_v7().to_string();
    let draft = client
        .post(format!("{}/write-offs", server.base_url))
        .json(&json!({
            "number": "WO-1",
            "date": "2024-06-04",
            "project_id": project_id,
            "warehouse_id": warehouse_id,
            "reason": "production",
            "description": null,
            "responsible": "Petrov",
            "approved_by": null,
            "approved_date": null,
            "notes": null,
            "lines": [
                { "material_id": m_id, "quantity": "20", "price": null, "batch_number": null, "notes": null },
                { "material_id": n_id, "quantity": "200", "price": null, "batch_number": null, "notes": null },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(draft.status(), StatusCode::CREATED);
    let draft: Value = draft.json().await.unwrap();
    let draft_id = draft["id"].as_str().unwrap();

    // Second line exceeds stock: the whole post fails, M's stock untouched.
    let rejected = client
        .post(format!("{}/write-offs/{draft_id}/post", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let stock_m = get_stock(&client, &server.base_url, m_id, warehouse_id).await;
    assert_eq!(decimal(&stock_m["quantity"]), dec!(60));

    let reread = client
        .get(format!("{}/write-offs/{draft_id}", server.base_url))
        .send()
        .await
        .unwrap();
    let reread: Value = reread.json().await.unwrap();
    assert_eq!(reread["status"], "draft");

    // A second draft within stock posts cleanly and freezes.
    let draft = client
        .post(format!("{}/write-offs", server.base_url))
        .json(&json!({
            "number": "WO-2",
            "date": "2024-06-04",
            "project_id": project_id,
            "warehouse_id": warehouse_id,
            "reason": "production",
            "description": null,
            "responsible": "Petrov",
            "approved_by": null,
            "approved_date": null,
            "notes": null,
            "lines": [
                { "material_id": m_id, "quantity": "20", "price": "10.00", "batch_number": null, "notes": null },
                { "material_id": n_id, "quantity": "100", "price": "2.00", "batch_number": null, "notes": null },
            ],
        }))
        .send()
        .await
        .unwrap();
    let draft: Value = draft.json().await.unwrap();
    let draft_id = draft["id"].as_str().unwrap();

    let posted = client
        .post(format!("{}/write-offs/{draft_id}/post", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(posted.status(), StatusCode::OK);
    let posted: Value = posted.json().await.unwrap();
    assert_eq!(posted["status"], "posted");
    assert_eq!(decimal(&posted["total_amount"]), dec!(400.00));

    let double = client
        .post(format!("{}/write-offs/{draft_id}/post", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(double.status(), StatusCode::BAD_REQUEST);

    let stock_m = get_stock(&client, &server.base_url, m_id, warehouse_id).await;
    let stock_n = get_stock(&client, &server.base_url, n_id, warehouse_id).await;
    assert_eq!(decimal(&stock_m["quantity"]), dec!(40));
    assert_eq!(decimal(&stock_n["quantity"]), dec!(50));
}

#[tokio::test]
async fn unknown_references_map_to_not_found() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse = create_warehouse(&client, &server.base_url, "WH-A").await;
    let warehouse_id = warehouse["id"].as_str().unwrap();
    let missing_material = uuid::Uuid::now_v7().to_string();

    let response = client
        .post(format!("{}/movements", server.base_url))
        .json(&json!({
            "material_id": missing_material,
            "type": "receipt",
            "to_warehouse": warehouse_id,
            "quantity": "5",
            "document_number": "PR-9",
            "movement_date": "2024-06-01",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bad_id = client
        .get(format!("{}/materials/not-a-uuid", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
}
