//! Access token acquisition for Azure SQL.
//!
//! Two mutually exclusive strategies are supported:
//! - Managed identity, when running on an App Service host (token from the
//!   local instance-metadata endpoint)
//! - Service principal, everywhere else (OAuth2 client-credentials exchange
//!   against the tenant authority)
//!
//! Tokens are acquired fresh for every connection and never cached.

use crate::config::IdentityConfig;
use crate::constants::{AZURE_SQL_RESOURCE, AZURE_SQL_SCOPE, IMDS_API_VERSION};
use crate::error::ServerError;
use oauth2::basic::BasicClient;
use oauth2::{AuthType, ClientId, ClientSecret, RequestTokenError, Scope, TokenResponse, TokenUrl};
use serde::Deserialize;
use tracing::{debug, info};

/// A bearer token for the Azure SQL resource.
///
/// The token value is never printed by `Debug`.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    scope: String,
}

impl AccessToken {
    /// Wrap a raw token string together with the scope it was issued for.
    pub fn new(token: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            scope: scope.into(),
        }
    }

    /// The raw bearer token.
    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Resource or scope the token was requested for.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Token length in bytes, for diagnostics.
    pub fn len(&self) -> usize {
        self.token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &format_args!("<redacted, {} bytes>", self.token.len()))
            .field("scope", &self.scope)
            .finish()
    }
}

/// How the process obtains its database credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Host-assigned identity via the instance-metadata endpoint.
    ManagedIdentity,
    /// Client id + secret exchanged with the tenant authority.
    ServicePrincipal,
}

impl CredentialStrategy {
    /// Pick the strategy for the current environment.
    pub fn detect(identity: &IdentityConfig) -> Self {
        if identity.is_managed_host() {
            CredentialStrategy::ManagedIdentity
        } else {
            CredentialStrategy::ServicePrincipal
        }
    }
}

impl std::fmt::Display for CredentialStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStrategy::ManagedIdentity => write!(f, "managed_identity"),
            CredentialStrategy::ServicePrincipal => write!(f, "service_principal"),
        }
    }
}

/// Instance-metadata token response. Only the token itself is used.
#[derive(Debug, Deserialize)]
struct ImdsTokenResponse {
    access_token: Option<String>,
}

/// Acquires Azure SQL access tokens for the configured identity.
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    identity: IdentityConfig,
    http_client: reqwest::Client,
}

impl CredentialProvider {
    /// Create a provider for the given identity configuration.
    pub fn new(identity: IdentityConfig) -> Result<Self, ServerError> {
        // Token endpoints must not be followed through redirects
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ServerError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            identity,
            http_client,
        })
    }

    /// Strategy this provider uses for the current environment.
    pub fn strategy(&self) -> CredentialStrategy {
        CredentialStrategy::detect(&self.identity)
    }

    /// Acquire a fresh access token for Azure SQL.
    ///
    /// Missing service principal credentials fail with a configuration error;
    /// every other failure is reported as an authentication error.
    pub async fn acquire_token(&self) -> Result<AccessToken, ServerError> {
        let strategy = self.strategy();
        debug!(%strategy, "Acquiring Azure SQL access token");

        let token = match strategy {
            CredentialStrategy::ManagedIdentity => self.acquire_managed_identity_token().await?,
            CredentialStrategy::ServicePrincipal => self.acquire_service_principal_token().await?,
        };

        info!(
            %strategy,
            token_obtained = !token.is_empty(),
            token_length = token.len(),
            "Access token acquired"
        );
        Ok(token)
    }

    async fn acquire_managed_identity_token(&self) -> Result<AccessToken, ServerError> {
        let response = self
            .http_client
            .get(&self.identity.imds_endpoint)
            .header("Metadata", "true")
            .query(&[
                ("api-version", IMDS_API_VERSION),
                ("resource", AZURE_SQL_RESOURCE),
            ])
            .send()
            .await
            .map_err(|e| {
                ServerError::auth_with_source(format!("Metadata endpoint request failed: {}", e), e)
            })?
            .error_for_status()
            .map_err(|e| {
                ServerError::auth_with_source(format!("Metadata endpoint returned an error: {}", e), e)
            })?;

        let body: ImdsTokenResponse = response.json().await.map_err(|e| {
            ServerError::auth_with_source(format!("Invalid metadata endpoint response: {}", e), e)
        })?;

        body.access_token
            .filter(|token| !token.is_empty())
            .map(|token| AccessToken::new(token, AZURE_SQL_RESOURCE))
            .ok_or_else(|| ServerError::auth("Metadata endpoint response did not contain an access_token"))
    }

    async fn acquire_service_principal_token(&self) -> Result<AccessToken, ServerError> {
        let (client_id, client_secret) =
            match (&self.identity.client_id, &self.identity.client_secret) {
                (Some(id), Some(secret)) => (id, secret),
                _ => {
                    return Err(ServerError::config(
                        "AZURE_CLIENT_ID and AZURE_CLIENT_SECRET must be set for local authentication",
                    ))
                }
            };

        let authority = self.identity.authority_url();
        debug!(
            %authority,
            client_id = %truncate_for_log(client_id, 8),
            "Requesting token with client credentials"
        );

        let token_url = TokenUrl::new(format!("{}/oauth2/v2.0/token", authority)).map_err(|e| {
            ServerError::auth_with_source(format!("Invalid authority URL '{}': {}", authority, e), e)
        })?;

        let client = BasicClient::new(ClientId::new(client_id.clone()))
            .set_client_secret(ClientSecret::new(client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url);

        let response = client
            .exchange_client_credentials()
            .add_scope(Scope::new(AZURE_SQL_SCOPE.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(resp) => {
                    let description = resp
                        .error_description()
                        .cloned()
                        .unwrap_or_else(|| resp.error().to_string());
                    ServerError::auth(format!("Failed to get token: {}", description))
                }
                other => {
                    ServerError::auth_with_source(format!("Failed to get token: {}", other), other)
                }
            })?;

        let token = response.access_token().secret();
        if token.is_empty() {
            return Err(ServerError::auth(
                "Failed to get token: authority returned an empty access_token",
            ));
        }

        Ok(AccessToken::new(token.clone(), AZURE_SQL_SCOPE))
    }
}

/// Truncate a string for logging purposes.
pub fn truncate_for_log(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
