//! Shared application state handed to every request handler.

use crate::config::Config;
use crate::database::{CustomerStore, SqlCustomerStore};
use crate::error::ServerError;
use std::sync::Arc;

/// Read-only state shared across requests.
///
/// Nothing here is mutated after startup; each request builds its own
/// credential and database session.
#[derive(Clone)]
pub struct AppState {
    /// Where customer records come from.
    pub store: Arc<dyn CustomerStore>,
}

impl AppState {
    /// State backed by Azure SQL.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ServerError> {
        let store = SqlCustomerStore::new(config)?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// State backed by an arbitrary store.
    pub fn with_store(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }
}
