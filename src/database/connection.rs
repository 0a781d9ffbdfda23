//! Connection establishment for Azure SQL.
//!
//! A [`ConnectionDescriptor`] is built fresh for every request from the static
//! database configuration and a just-acquired access token, then used once to
//! open a [`DatabaseSession`].

use super::auth::{truncate_for_log, AccessToken, CredentialProvider, CredentialStrategy};
use super::session::{DatabaseSession, RawConnection};
use crate::config::{Config, DatabaseConfig, IdentityConfig};
use crate::constants::DRIVER_NAME;
use crate::error::ServerError;
use std::time::Duration;
use tiberius::{AuthMethod, Client, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::{debug, info};

/// Authentication mode recorded in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationMode {
    /// Service principal; the client id is the effective login.
    ServicePrincipal { client_id: String },
    /// Host-assigned managed identity.
    ManagedIdentity,
}

impl AuthenticationMode {
    /// Mode matching the strategy that produced the token.
    pub fn for_strategy(strategy: CredentialStrategy, identity: &IdentityConfig) -> Self {
        match strategy {
            CredentialStrategy::ManagedIdentity => AuthenticationMode::ManagedIdentity,
            CredentialStrategy::ServicePrincipal => AuthenticationMode::ServicePrincipal {
                client_id: identity.client_id.clone().unwrap_or_default(),
            },
        }
    }

    /// Connection-string keyword for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationMode::ServicePrincipal { .. } => "ActiveDirectoryServicePrincipal",
            AuthenticationMode::ManagedIdentity => "ActiveDirectoryMsi",
        }
    }
}

/// Everything needed to open one database session.
#[derive(Debug)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    database: String,
    connect_timeout: Duration,
    application_name: String,
    mode: AuthenticationMode,
    token: AccessToken,
}

impl ConnectionDescriptor {
    /// Build a descriptor from configuration and a fresh token.
    pub fn new(config: &DatabaseConfig, mode: AuthenticationMode, token: AccessToken) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            database: config.database.clone(),
            connect_timeout: config.connect_timeout,
            application_name: config.application_name.clone(),
            mode,
            token,
        }
    }

    /// `host:port` address of the server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// ODBC-style rendering of the descriptor with no secret material.
    pub fn connection_string(&self) -> String {
        let mut out = format!(
            "DRIVER={{{}}};SERVER=tcp:{},{};DATABASE={};Encrypt=yes;TrustServerCertificate=no;\
             Connection Timeout={};Authentication={};",
            DRIVER_NAME,
            self.host,
            self.port,
            self.database,
            self.connect_timeout.as_secs(),
            self.mode.as_str(),
        );
        if let AuthenticationMode::ServicePrincipal { client_id } = &self.mode {
            out.push_str(&format!("UID={};", client_id));
        }
        out
    }

    /// Driver configuration: TLS required with certificate validation and the
    /// access token as the login credential.
    fn client_config(&self) -> tiberius::Config {
        let mut config = tiberius::Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.database(&self.database);
        config.encryption(EncryptionLevel::Required);
        config.application_name(&self.application_name);
        config.authentication(AuthMethod::aad_token(self.token.secret()));
        config
    }

    /// Open a session, bounded by the connect timeout.
    pub async fn connect(self) -> Result<DatabaseSession, ServerError> {
        let address = self.address();
        debug!(
            connection_string = %self.connection_string(),
            "Opening database connection"
        );

        let client = match tokio::time::timeout(self.connect_timeout, establish(self.client_config())).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                return Err(ServerError::connection_with_source(
                    format!("Failed to connect to {}: {}", address, e),
                    e,
                ))
            }
            Err(_) => {
                return Err(ServerError::connection(format!(
                    "Timed out after {}s connecting to {}",
                    self.connect_timeout.as_secs(),
                    address
                )))
            }
        };

        info!(
            server = %self.host,
            database = %self.database,
            authentication = self.mode.as_str(),
            "Database connection established"
        );
        Ok(DatabaseSession::new(client, address))
    }
}

/// TCP connect and TDS login, following one Azure SQL gateway redirect.
async fn establish(mut config: tiberius::Config) -> tiberius::Result<RawConnection> {
    match connect_tds(config.clone()).await {
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "Following gateway redirect");
            config.host(&host);
            config.port(port);
            connect_tds(config).await
        }
        other => other,
    }
}

async fn connect_tds(config: tiberius::Config) -> tiberius::Result<RawConnection> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}

/// Acquire a token and open a new session for this request.
pub async fn open_connection(
    config: &Config,
    credentials: &CredentialProvider,
) -> Result<DatabaseSession, ServerError> {
    let strategy = credentials.strategy();
    let token = credentials.acquire_token().await?;
    let mode = AuthenticationMode::for_strategy(strategy, &config.identity);

    if let AuthenticationMode::ServicePrincipal { client_id } = &mode {
        debug!(client_id = %truncate_for_log(client_id, 8), "Using service principal login");
    }

    ConnectionDescriptor::new(&config.database, mode, token)
        .connect()
        .await
}
