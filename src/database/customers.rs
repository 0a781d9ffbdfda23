//! The customer table: record shape, fixed query and store.

use super::auth::CredentialProvider;
use super::connection::open_connection;
use super::types::TypeMapper;
use crate::config::Config;
use crate::error::ServerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiberius::Row;

/// The only query this service runs.
pub const CUSTOMERS_QUERY: &str = "\
SELECT id, business_name, customer_name, address, city, province, postal_code,
       phone_number, invoice_email, report_email, notes, created_at
FROM Customers";

/// One row of the `Customers` table as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub business_name: Option<String>,
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub phone_number: Option<String>,
    pub invoice_email: Option<String>,
    pub report_email: Option<String>,
    pub notes: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`, or null.
    pub created_at: Option<String>,
}

impl CustomerRecord {
    /// Map a row produced by [`CUSTOMERS_QUERY`].
    pub fn from_row(row: &Row) -> Result<Self, ServerError> {
        let id = TypeMapper::get_integer(row, 0)?
            .ok_or_else(|| ServerError::query("Customer row has a NULL id"))?;

        Ok(Self {
            id,
            business_name: TypeMapper::get_text(row, 1)?,
            customer_name: TypeMapper::get_text(row, 2)?,
            address: TypeMapper::get_text(row, 3)?,
            city: TypeMapper::get_text(row, 4)?,
            province: TypeMapper::get_text(row, 5)?,
            postal_code: TypeMapper::get_text(row, 6)?,
            phone_number: TypeMapper::get_text(row, 7)?,
            invoice_email: TypeMapper::get_text(row, 8)?,
            report_email: TypeMapper::get_text(row, 9)?,
            notes: TypeMapper::get_text(row, 10)?,
            created_at: TypeMapper::get_timestamp(row, 11)?.map(|ts| ts.format()),
        })
    }
}

/// Source of customer records for the HTTP layer.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Fetch every customer.
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, ServerError>;
}

/// Customer store backed by Azure SQL.
///
/// Every call acquires a new token, opens its own session and closes it
/// before returning, whether or not the query succeeded.
pub struct SqlCustomerStore {
    config: Arc<Config>,
    credentials: CredentialProvider,
}

impl SqlCustomerStore {
    pub fn new(config: Arc<Config>) -> Result<Self, ServerError> {
        let credentials = CredentialProvider::new(config.identity.clone())?;
        Ok(Self {
            config,
            credentials,
        })
    }
}

#[async_trait]
impl CustomerStore for SqlCustomerStore {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, ServerError> {
        let mut session = open_connection(&self.config, &self.credentials).await?;
        let result = session.query_customers().await;
        session.close().await;
        result
    }
}
