//! Live tests against a real Azure SQL database.
//!
//! These need network access to Azure and a service principal (or a managed
//! host) that can read the `Customers` table, so they are ignored by default.
//!
//! ## Running against a real database:
//! ```bash
//! AZURE_SQL_SERVER=myserver.database.windows.net AZURE_DATABASE=mydb \
//! AZURE_TENANT_ID=... AZURE_CLIENT_ID=... AZURE_CLIENT_SECRET=... \
//!   cargo test --test integration_tests -- --ignored --test-threads=1
//! ```

use mssql_customer_api::database::{
    open_connection, CredentialProvider, CustomerStore, SqlCustomerStore,
};
use mssql_customer_api::Config;
use std::sync::Arc;

fn live_config() -> Arc<Config> {
    let _ = dotenvy::dotenv();
    Arc::new(Config::from_env().expect("configuration should load from the environment"))
}

#[tokio::test]
#[ignore]
async fn test_live_token_acquisition() {
    let config = live_config();
    let provider = CredentialProvider::new(config.identity.clone()).unwrap();

    let token = provider.acquire_token().await.expect("token acquisition failed");
    assert!(!token.is_empty());
    eprintln!("Acquired token of {} bytes via {}", token.len(), provider.strategy());
}

#[tokio::test]
#[ignore]
async fn test_live_session_open_and_close() {
    let config = live_config();
    let provider = CredentialProvider::new(config.identity.clone()).unwrap();

    let session = open_connection(&config, &provider)
        .await
        .expect("connection failed");
    session.close().await;
}

#[tokio::test]
#[ignore]
async fn test_live_list_customers() {
    let store = SqlCustomerStore::new(live_config()).unwrap();

    let customers = store.list_customers().await.expect("customer query failed");
    eprintln!("Fetched {} customers", customers.len());

    for customer in &customers {
        if let Some(created_at) = &customer.created_at {
            assert_eq!(created_at.len(), "YYYY-MM-DD HH:MM:SS".len());
        }
    }
}
