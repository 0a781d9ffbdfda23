//! Request-scoped database sessions.
//!
//! A session wraps one dedicated connection. It is opened for a single
//! request and must be closed with [`DatabaseSession::close`] on every exit
//! path; dropping it without closing still tears down the socket, but skips
//! the orderly TDS shutdown.

use super::customers::{CustomerRecord, CUSTOMERS_QUERY};
use crate::error::ServerError;
use std::time::Instant;
use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;
use tracing::{debug, warn};

/// Type alias for a raw tiberius connection.
pub type RawConnection = Client<Compat<TcpStream>>;

/// One open connection owned by a single request.
pub struct DatabaseSession {
    client: RawConnection,
    address: String,
    opened_at: Instant,
}

impl std::fmt::Debug for DatabaseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSession")
            .field("address", &self.address)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}

impl DatabaseSession {
    pub(crate) fn new(client: RawConnection, address: String) -> Self {
        Self {
            client,
            address,
            opened_at: Instant::now(),
        }
    }

    /// Run the customer query and map every row.
    pub async fn query_customers(&mut self) -> Result<Vec<CustomerRecord>, ServerError> {
        let start = Instant::now();

        let stream = self
            .client
            .simple_query(CUSTOMERS_QUERY)
            .await
            .map_err(|e| ServerError::query(e.to_string()))?;

        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| ServerError::query(e.to_string()))?;

        let customers = rows
            .iter()
            .map(CustomerRecord::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            rows = customers.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Customer query completed"
        );
        Ok(customers)
    }

    /// Close the connection. Failures are logged, never returned.
    pub async fn close(self) {
        let lifetime_ms = self.opened_at.elapsed().as_millis() as u64;
        match self.client.close().await {
            Ok(()) => debug!(address = %self.address, lifetime_ms, "Database session closed"),
            Err(e) => warn!(address = %self.address, "Error closing database session: {}", e),
        }
    }
}
