use crate::config::{AuthType, ConfigManager, ConnectionConfig, TokenCache};
use crate::error::{M365Error, Result};
use crate::graph::GRAPH_RESOURCE;
use colored::Colorize;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, DeviceAuthorizationUrl, EmptyExtraDeviceAuthorizationFields,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::time::Duration;

const MICROSOFT_AUTHORITY: &str = "https://login.microsoftonline.com";

fn default_scope(resource: &str) -> Scope {
    Scope::new(format!("{}/.default", resource.trim_end_matches('/')))
}

pub struct GraphAuth {
    config_manager: ConfigManager,
}

impl GraphAuth {
    pub fn new(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    fn oauth_client(connection: &ConnectionConfig, with_secret: bool) -> Result<BasicClient> {
        let tenant_id = &connection.tenant_id;

        let auth_url = AuthUrl::new(format!(
            "{}/{}/oauth2/v2.0/authorize",
            MICROSOFT_AUTHORITY, tenant_id
        ))
        .map_err(|e| M365Error::AuthError(format!("Invalid auth URL: {}", e)))?;

        let token_url = TokenUrl::new(format!(
            "{}/{}/oauth2/v2.0/token",
            MICROSOFT_AUTHORITY, tenant_id
        ))
        .map_err(|e| M365Error::AuthError(format!("Invalid token URL: {}", e)))?;

        let client_secret = if with_secret {
            let secret = connection.client_secret.as_ref().ok_or_else(|| {
                M365Error::AuthError("Client secret required for client credentials flow".into())
            })?;
            Some(ClientSecret::new(secret.clone()))
        } else {
            None
        };

        Ok(BasicClient::new(
            ClientId::new(connection.client_id.clone()),
            client_secret,
            auth_url,
            Some(token_url),
        ))
    }

    fn to_cache(
        token: &BasicTokenResponse,
        connection: &ConnectionConfig,
        resource: &str,
        previous_refresh: Option<String>,
    ) -> TokenCache {
        let lifetime = token.expires_in().unwrap_or(Duration::from_secs(3600));
        let expires_at = chrono::Utc::now()
            + chrono::Duration::from_std(lifetime).unwrap_or_else(|_| chrono::Duration::hours(1));

        TokenCache {
            access_token: token.access_token().secret().clone(),
            refresh_token: token
                .refresh_token()
                .map(|t| t.secret().clone())
                .or(previous_refresh),
            expires_at,
            tenant_id: connection.tenant_id.clone(),
            resource: resource.trim_end_matches('/').to_string(),
        }
    }

    /// Authenticate using device code flow (interactive). The Graph token is
    /// cached together with a refresh token used later for other resources.
    pub async fn login_device_code(&self, connection: &ConnectionConfig) -> Result<TokenCache> {
        println!(
            "{} Starting device code authentication for '{}'...",
            "→".cyan(),
            connection.name
        );

        let device_auth_url = DeviceAuthorizationUrl::new(format!(
            "{}/{}/oauth2/v2.0/devicecode",
            MICROSOFT_AUTHORITY, connection.tenant_id
        ))
        .map_err(|e| M365Error::AuthError(format!("Invalid device auth URL: {}", e)))?;

        let client =
            Self::oauth_client(connection, false)?.set_device_authorization_url(device_auth_url);

        let details: oauth2::DeviceAuthorizationResponse<EmptyExtraDeviceAuthorizationFields> =
            client
                .exchange_device_code()
                .map_err(|e| M365Error::AuthError(format!("Device code exchange failed: {}", e)))?
                .add_scope(default_scope(GRAPH_RESOURCE))
                .add_scope(Scope::new("offline_access".to_string()))
                .request_async(async_http_client)
                .await
                .map_err(|e| {
                    M365Error::AuthError(format!("Device authorization request failed: {}", e))
                })?;

        println!(
            "\nTo sign in, visit {} and enter the code {}\n",
            details.verification_uri().as_str().bold(),
            details.user_code().secret().bold()
        );

        let token = client
            .exchange_device_access_token(&details)
            .request_async(async_http_client, tokio::time::sleep, None)
            .await
            .map_err(|e| M365Error::AuthError(format!("Token exchange failed: {}", e)))?;

        let token_cache = Self::to_cache(&token, connection, GRAPH_RESOURCE, None);
        self.config_manager.save_token(&connection.name, &token_cache)?;

        println!("{} Authentication successful", "✓".green());
        Ok(token_cache)
    }

    /// Authenticate using client credentials flow (non-interactive)
    pub async fn login_client_credentials(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
    ) -> Result<TokenCache> {
        tracing::info!(
            connection = %connection.name,
            resource,
            "requesting token with client credentials"
        );

        let token = Self::oauth_client(connection, true)?
            .exchange_client_credentials()
            .add_scope(default_scope(resource))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                M365Error::AuthError(format!("Client credentials exchange failed: {}", e))
            })?;

        let token_cache = Self::to_cache(&token, connection, resource, None);
        self.config_manager.save_token(&connection.name, &token_cache)?;
        Ok(token_cache)
    }

    /// Redeem a refresh token for an access token scoped to `resource`
    async fn refresh(
        &self,
        connection: &ConnectionConfig,
        refresh_token: String,
        resource: &str,
    ) -> Result<TokenCache> {
        tracing::info!(
            connection = %connection.name,
            resource,
            "redeeming refresh token"
        );

        let token = Self::oauth_client(connection, false)?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .add_scope(default_scope(resource))
            .request_async(async_http_client)
            .await
            .map_err(|e| M365Error::AuthError(format!("Token refresh failed: {}", e)))?;

        let token_cache = Self::to_cache(&token, connection, resource, Some(refresh_token));
        self.config_manager.save_token(&connection.name, &token_cache)?;
        Ok(token_cache)
    }

    /// Valid access token for `resource`: cached, refreshed, or re-requested
    pub async fn get_access_token(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
    ) -> Result<String> {
        let resource = resource.trim_end_matches('/');

        let cached = self.config_manager.load_token(&connection.name, resource)?;
        if let Some(token) = &cached {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        match connection.auth_type {
            AuthType::ClientCredentials => Ok(self
                .login_client_credentials(connection, resource)
                .await?
                .access_token),
            AuthType::DeviceCode => {
                // Any refresh token of this connection can be redeemed for another resource
                let refresh_token = cached
                    .and_then(|t| t.refresh_token)
                    .or_else(|| {
                        self.config_manager
                            .load_tokens(&connection.name)
                            .ok()?
                            .into_iter()
                            .filter(|t| t.refresh_token.is_some())
                            .max_by_key(|t| t.expires_at)
                            .and_then(|t| t.refresh_token)
                    })
                    .ok_or(M365Error::TokenNotFound)?;

                Ok(self
                    .refresh(connection, refresh_token, resource)
                    .await?
                    .access_token)
            }
        }
    }

    /// Logout (delete every cached token of the connection)
    pub fn logout(&self, connection_name: &str) -> Result<()> {
        self.config_manager.delete_tokens(connection_name)?;
        println!("{} Logged out from '{}'", "✓".green(), connection_name);
        Ok(())
    }
}
