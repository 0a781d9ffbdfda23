//! HTTP request handlers.

use crate::constants::{LIVENESS_MESSAGE, NO_CUSTOMERS_MESSAGE};
use crate::database::CustomerRecord;
use crate::error::ServerError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

/// `GET /` liveness check.
pub async fn index() -> &'static str {
    LIVENESS_MESSAGE
}

/// `GET /health`. Never touches the database.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "server": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Body of a successful `GET /customers`.
#[derive(Debug)]
pub enum CustomersResponse {
    /// The table had no rows.
    Empty,
    /// At least one customer.
    Found(Vec<CustomerRecord>),
}

impl From<Vec<CustomerRecord>> for CustomersResponse {
    fn from(customers: Vec<CustomerRecord>) -> Self {
        if customers.is_empty() {
            CustomersResponse::Empty
        } else {
            CustomersResponse::Found(customers)
        }
    }
}

impl IntoResponse for CustomersResponse {
    fn into_response(self) -> Response {
        match self {
            CustomersResponse::Empty => {
                Json(serde_json::json!({ "message": NO_CUSTOMERS_MESSAGE })).into_response()
            }
            CustomersResponse::Found(customers) => Json(customers).into_response(),
        }
    }
}

/// `GET /customers`.
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<CustomersResponse, ServerError> {
    let customers = state.store.list_customers().await?;
    info!(count = customers.len(), "Fetched customers");
    Ok(customers.into())
}
