//! Database connectivity: credentials, connections and the customer query.

pub mod auth;
mod connection;
pub mod customers;
mod session;
pub mod types;

pub use auth::{AccessToken, CredentialProvider, CredentialStrategy};
pub use connection::{open_connection, AuthenticationMode, ConnectionDescriptor};
pub use customers::{CustomerRecord, CustomerStore, SqlCustomerStore, CUSTOMERS_QUERY};
pub use session::{DatabaseSession, RawConnection};
pub use types::{SqlTimestamp, TypeMapper};
