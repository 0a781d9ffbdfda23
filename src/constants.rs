//! Centralized constants for the customer API.
//!
//! Default values and fixed protocol strings live here so they are easy to
//! find and change in one place.

use std::time::Duration;

// =============================================================================
// Database Constants
// =============================================================================

/// Default Azure SQL server hostname.
pub const DEFAULT_SQL_SERVER: &str = "southernscale.database.windows.net";

/// Default database name.
pub const DEFAULT_DATABASE: &str = "ScaleRite Backend";

/// SQL Server TCP port.
pub const SQL_SERVER_PORT: u16 = 1433;

/// Connect timeout in seconds (TCP connect plus TDS login).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Connect timeout as Duration.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// Driver identifier shown in the diagnostic connection string.
pub const DRIVER_NAME: &str = "ODBC Driver 18 for SQL Server";

/// Application name sent to SQL Server during login.
pub const APPLICATION_NAME: &str = "mssql-customer-api";

// =============================================================================
// Identity Constants
// =============================================================================

/// Default Entra ID tenant.
pub const DEFAULT_TENANT_ID: &str = "5adace38-704b-416e-979f-297e63c0483e";

/// Default identity authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default instance-metadata identity endpoint.
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// API version requested from the instance-metadata endpoint.
pub const IMDS_API_VERSION: &str = "2019-08-01";

/// Resource URI for Azure SQL Database tokens (managed identity).
pub const AZURE_SQL_RESOURCE: &str = "https://database.windows.net/";

/// Scope for Azure SQL Database tokens (client credentials).
pub const AZURE_SQL_SCOPE: &str = "https://database.windows.net/.default";

/// Environment variable whose presence marks a managed App Service host.
pub const MANAGED_HOST_MARKER: &str = "WEBSITE_SITE_NAME";

// =============================================================================
// HTTP Constants
// =============================================================================

/// Default bind host.
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Plain-text body served at `/`.
pub const LIVENESS_MESSAGE: &str = "Azure SQL API with Entra ID authentication is running!";

/// Message body returned when the customer table is empty.
pub const NO_CUSTOMERS_MESSAGE: &str = "No customers found";

// =============================================================================
// Shutdown Constants
// =============================================================================

/// Time allowed for in-flight requests to finish after a shutdown signal.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
