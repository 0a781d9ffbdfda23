//! HTTP surface tests driven through the router with in-memory stores, plus
//! one end-to-end failure path through the real SQL store.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use mssql_customer_api::database::{CustomerRecord, CustomerStore, SqlTimestamp};
use mssql_customer_api::{server, AppState, Config, ServerError};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedStore(Vec<CustomerRecord>);

#[async_trait]
impl CustomerStore for FixedStore {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, ServerError> {
        Ok(self.0.clone())
    }
}

struct FailingStore(fn() -> ServerError);

#[async_trait]
impl CustomerStore for FailingStore {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, ServerError> {
        Err((self.0)())
    }
}

fn app(store: impl CustomerStore + 'static) -> Router {
    server::router(AppState::with_store(Arc::new(store)))
}

async fn get_path(app: Router, path: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, body.to_vec())
}

async fn get_json(app: Router, path: &str) -> (StatusCode, Value) {
    let (status, body) = get_path(app, path).await;
    let value = serde_json::from_slice(&body).expect("response body was not JSON");
    (status, value)
}

fn acme() -> CustomerRecord {
    let created = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();

    CustomerRecord {
        id: 1,
        business_name: Some("Acme".to_string()),
        customer_name: Some("Jane Doe".to_string()),
        address: Some("123 St".to_string()),
        city: Some("Metropolis".to_string()),
        province: Some("ON".to_string()),
        postal_code: Some("A1A1A1".to_string()),
        phone_number: Some("555-0100".to_string()),
        invoice_email: Some("inv@acme.test".to_string()),
        report_email: Some("rep@acme.test".to_string()),
        notes: None,
        created_at: Some(SqlTimestamp::Naive(created).format()),
    }
}

#[tokio::test]
async fn index_returns_liveness_text() {
    let (status, body) = get_path(app(FixedStore(vec![])), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Azure SQL API with Entra ID authentication is running!"
    );
}

#[tokio::test]
async fn health_does_not_touch_the_store() {
    let store = FailingStore(|| ServerError::connection("should not be called"));
    let (status, body) = get_json(app(store), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn empty_table_returns_message() {
    let (status, body) = get_json(app(FixedStore(vec![])), "/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "No customers found" }));
}

#[tokio::test]
async fn single_row_is_returned_as_array() {
    let (status, body) = get_json(app(FixedStore(vec![acme()])), "/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "id": 1,
            "business_name": "Acme",
            "customer_name": "Jane Doe",
            "address": "123 St",
            "city": "Metropolis",
            "province": "ON",
            "postal_code": "A1A1A1",
            "phone_number": "555-0100",
            "invoice_email": "inv@acme.test",
            "report_email": "rep@acme.test",
            "notes": null,
            "created_at": "2024-01-01 10:00:00",
        }])
    );
}

#[tokio::test]
async fn store_errors_become_500_with_message() {
    let cases: [(fn() -> ServerError, &str); 4] = [
        (|| ServerError::config("AZURE_CLIENT_ID missing"), "AZURE_CLIENT_ID missing"),
        (|| ServerError::auth("Failed to get token: nope"), "Failed to get token: nope"),
        (|| ServerError::connection("Login timeout expired"), "Login timeout expired"),
        (|| ServerError::query("Invalid object name 'Customers'."), "Invalid object name"),
    ];

    for (make_error, expected) in cases {
        let (status, body) = get_json(app(FailingStore(make_error)), "/customers").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().expect("error key missing");
        assert!(message.contains(expected), "message was: {message}");
    }
}

/// Full path through the SQL store: managed identity token from a local
/// stand-in, then a connect to a port with nothing listening.
#[tokio::test]
async fn connect_failure_returns_500_and_keeps_serving() {
    let imds = Router::new().route(
        "/token",
        get(|| async { Json(json!({ "access_token": "local-token" })).into_response() }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let imds_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, imds).await.unwrap();
    });

    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let closed_port = closed.local_addr().unwrap().port();
    drop(closed);

    let imds_endpoint = format!("http://{}/token", imds_addr);
    let mut config = Config::from_lookup(|key| match key {
        "AZURE_SQL_SERVER" => Some("127.0.0.1".to_string()),
        "WEBSITE_SITE_NAME" => Some("test-site".to_string()),
        "AZURE_IMDS_ENDPOINT" => Some(imds_endpoint.clone()),
        _ => None,
    })
    .unwrap();
    config.database.port = closed_port;

    let state = AppState::from_config(Arc::new(config)).unwrap();
    let router = server::router(state);

    let (status, body) = get_json(router.clone(), "/customers").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().expect("error key missing");
    assert!(message.contains("Database connection failed"), "message was: {message}");
    assert!(message.contains(&closed_port.to_string()), "message was: {message}");

    let (status, _) = get_path(router, "/").await;
    assert_eq!(status, StatusCode::OK);
}

/// A signal that lands before `serve` subscribes must still stop it.
#[tokio::test]
async fn serve_returns_when_shutdown_precedes_startup() {
    let controller = mssql_customer_api::shutdown::new_shutdown_controller();
    controller.shutdown();

    let http = mssql_customer_api::config::HttpConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let state = AppState::with_store(Arc::new(FixedStore(Vec::new())));

    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        server::serve(&http, state, controller),
    )
    .await
    .expect("serve should return promptly after an early shutdown")
    .expect("serve failed");
}
