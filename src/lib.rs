//! # MSSQL Customer API
//!
//! A small HTTP service exposing the `Customers` table of an Azure SQL
//! database, authenticated with Microsoft Entra ID.
//!
//! ## Architecture
//!
//! - **Credentials**: a fresh access token per request, from the instance
//!   metadata endpoint on managed hosts or a client-credentials exchange
//!   elsewhere ([`database::CredentialProvider`])
//! - **Connections**: one dedicated, request-scoped session opened with that
//!   token ([`database::open_connection`])
//! - **HTTP**: `GET /`, `GET /health` and `GET /customers` ([`server::router`])

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod handlers;
pub mod server;
pub mod shutdown;
pub mod state;

pub use config::Config;
pub use error::ServerError;
pub use state::AppState;
