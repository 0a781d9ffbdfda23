//! Error types for the customer API.
//!
//! Every failure in the request path is one of four kinds. All of them end up
//! as an HTTP 500 carrying the error text; none are retried.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Domain errors for the customer API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or invalid configuration (e.g. no client credentials).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition failed on either credential path.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Driver-level failure while opening a session.
    #[error("Database connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Failure while executing the query or reading its rows.
    #[error("Query execution error: {0}")]
    Query(String),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication {
            message: msg.into(),
            source: None,
        }
    }

    /// Create an authentication error with a source.
    pub fn auth_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Authentication {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a connection error with a source.
    pub fn connection_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query execution error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Short machine-friendly name of the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Authentication { .. } => "authentication",
            Self::Connection { .. } => "connection",
            Self::Query(_) => "query",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error!(kind = self.kind(), "Request failed: {}", self);

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
