//! Configuration management for the customer API.
//!
//! Configuration is read once at startup from environment variables (after
//! loading an optional `.env` file) and then shared read-only by every request.

use crate::constants::{
    APPLICATION_NAME, CONNECT_TIMEOUT, DEFAULT_AUTHORITY_HOST, DEFAULT_DATABASE,
    DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_IMDS_ENDPOINT, DEFAULT_SQL_SERVER,
    DEFAULT_TENANT_ID, MANAGED_HOST_MARKER, SQL_SERVER_PORT,
};
use crate::error::ServerError;
use std::time::Duration;
use tracing::info;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection configuration
    pub database: DatabaseConfig,

    /// Entra ID identity configuration
    pub identity: IdentityConfig,

    /// HTTP listener configuration
    pub http: HttpConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Azure SQL server hostname
    pub host: String,

    /// SQL Server port (always 1433 for Azure SQL)
    pub port: u16,

    /// Database name
    pub database: String,

    /// Timeout for TCP connect plus login
    pub connect_timeout: Duration,

    /// Application name sent to SQL Server
    pub application_name: String,
}

/// Identity configuration used to obtain database access tokens.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Entra ID tenant
    pub tenant_id: String,

    /// Service principal client ID (service-principal path only)
    pub client_id: Option<String>,

    /// Service principal client secret (service-principal path only)
    pub client_secret: Option<String>,

    /// Value of the managed-host marker, when running inside App Service
    pub managed_host: Option<String>,

    /// Instance-metadata identity endpoint
    pub imds_endpoint: String,

    /// Identity authority host, without the tenant segment
    pub authority_host: String,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `AZURE_SQL_SERVER`: server hostname (default: southernscale.database.windows.net)
    /// - `AZURE_DATABASE`: database name (default: ScaleRite Backend)
    /// - `AZURE_TENANT_ID`: Entra ID tenant
    /// - `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`: service principal credentials,
    ///   required when not running on a managed host
    /// - `WEBSITE_SITE_NAME`: set by App Service; selects managed identity
    /// - `AZURE_IMDS_ENDPOINT`: metadata identity endpoint override
    /// - `AZURE_AUTHORITY_HOST`: authority host override
    /// - `HTTP_HOST` / `HTTP_PORT`: listener address (default: 0.0.0.0:5000)
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        // Empty credentials are treated the same as unset ones
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_port = match lookup("HTTP_PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                ServerError::config(format!("HTTP_PORT must be a valid port number, got '{raw}'"))
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        Ok(Config {
            database: DatabaseConfig {
                host: var_or("AZURE_SQL_SERVER", DEFAULT_SQL_SERVER),
                port: SQL_SERVER_PORT,
                database: var_or("AZURE_DATABASE", DEFAULT_DATABASE),
                connect_timeout: CONNECT_TIMEOUT,
                application_name: APPLICATION_NAME.to_string(),
            },
            identity: IdentityConfig {
                tenant_id: var_or("AZURE_TENANT_ID", DEFAULT_TENANT_ID),
                client_id: non_empty("AZURE_CLIENT_ID"),
                client_secret: non_empty("AZURE_CLIENT_SECRET"),
                managed_host: lookup(MANAGED_HOST_MARKER),
                imds_endpoint: var_or("AZURE_IMDS_ENDPOINT", DEFAULT_IMDS_ENDPOINT),
                authority_host: var_or("AZURE_AUTHORITY_HOST", DEFAULT_AUTHORITY_HOST),
            },
            http: HttpConfig {
                host: var_or("HTTP_HOST", DEFAULT_HTTP_HOST),
                port: http_port,
            },
        })
    }

    /// Log a redacted summary of the loaded configuration.
    pub fn log_summary(&self) {
        info!(
            server = %self.database.host,
            database = %self.database.database,
            tenant_id = %self.identity.tenant_id,
            client_id = self.identity.client_id.as_deref().unwrap_or("<unset>"),
            client_secret = if self.identity.client_secret.is_some() { "set" } else { "missing" },
            managed_host = self.identity.is_managed_host(),
            "Configuration loaded"
        );
    }
}

impl IdentityConfig {
    /// Whether the process runs on a managed host with an assigned identity.
    pub fn is_managed_host(&self) -> bool {
        self.managed_host.is_some()
    }

    /// Authority URL for the configured tenant.
    pub fn authority_url(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("managed_host", &self.managed_host)
            .field("imds_endpoint", &self.imds_endpoint)
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

impl HttpConfig {
    /// Socket address string to bind to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ServerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.host, DEFAULT_SQL_SERVER);
        assert_eq!(config.database.database, DEFAULT_DATABASE);
        assert_eq!(config.database.port, 1433);
        assert_eq!(config.database.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.identity.tenant_id, DEFAULT_TENANT_ID);
        assert!(config.identity.client_id.is_none());
        assert!(config.identity.client_secret.is_none());
        assert!(!config.identity.is_managed_host());
        assert_eq!(config.http.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("AZURE_SQL_SERVER", "example.database.windows.net"),
            ("AZURE_DATABASE", "Sales"),
            ("AZURE_TENANT_ID", "tenant-1"),
            ("AZURE_CLIENT_ID", "client-1"),
            ("AZURE_CLIENT_SECRET", "s3cret"),
            ("WEBSITE_SITE_NAME", "my-site"),
            ("HTTP_PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.database.host, "example.database.windows.net");
        assert_eq!(config.database.database, "Sales");
        assert_eq!(config.identity.client_id.as_deref(), Some("client-1"));
        assert_eq!(config.identity.client_secret.as_deref(), Some("s3cret"));
        assert!(config.identity.is_managed_host());
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_empty_credentials_are_unset() {
        let config = config_from(&[("AZURE_CLIENT_ID", ""), ("AZURE_CLIENT_SECRET", "  ")]).unwrap();
        assert!(config.identity.client_id.is_none());
        assert!(config.identity.client_secret.is_none());
    }

    #[test]
    fn test_invalid_http_port() {
        let err = config_from(&[("HTTP_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_authority_url() {
        let config = config_from(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("AZURE_AUTHORITY_HOST", "https://login.example.test/"),
        ])
        .unwrap();
        assert_eq!(
            config.identity.authority_url(),
            "https://login.example.test/tenant-1"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = config_from(&[("AZURE_CLIENT_SECRET", "s3cret")]).unwrap();
        let rendered = format!("{:?}", config.identity);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
