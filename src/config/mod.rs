use crate::error::{M365Error, Result};
use crate::output::OutputMode;
use crate::util::validation::validate_connection_name;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "M365CTL_CONFIG_DIR";

/// Tokens are treated as expired this long before their real expiry
const EXPIRY_SKEW_SECS: i64 = 300;

/// CLI settings persisted in `config.toml`
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Default output mode when `--output` is not passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMode>,

    /// Default tracing filter when neither `--verbose` nor `--debug` is passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_connection: Option<String>,
}

/// A named tenant + app registration used to acquire tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub name: String,
    pub tenant_id: String,
    pub client_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub auth_type: AuthType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    DeviceCode,
    ClientCredentials,
}

/// Cached access token for one connection and one resource
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub tenant_id: String,
    pub resource: String,
}

impl TokenCache {
    pub fn is_expired(&self) -> bool {
        self.expires_at - chrono::Duration::seconds(EXPIRY_SKEW_SECS) < chrono::Utc::now()
    }
}

/// File name stem for a resource: `https://contoso.sharepoint.com` -> `contoso.sharepoint.com`
fn resource_key(resource: &str) -> String {
    resource
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .replace([':', '/'], "_")
}

/// Token cache directory name of a connection. Names match case-insensitively
/// and never leave the cache directory.
fn connection_key(name: &str) -> String {
    let key: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if key.is_empty() || key.starts_with('.') {
        format!("_{}", key)
    } else {
        key
    }
}

/// Configuration manager
#[derive(Clone, Debug)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Self::with_dir(dir);
        }

        let project_dirs = ProjectDirs::from("com", "m365ctl", "m365ctl").ok_or_else(|| {
            M365Error::ConfigError("Failed to determine config directory".into())
        })?;

        Self::with_dir(project_dirs.config_dir())
    }

    /// Use an explicit configuration directory, creating it if needed
    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = dir.as_ref().to_path_buf();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn connections_file(&self) -> PathBuf {
        self.config_dir.join("connections.toml")
    }

    fn token_dir(&self, connection: &str) -> PathBuf {
        self.config_dir.join("cache").join(connection_key(connection))
    }

    pub fn token_cache_file(&self, connection: &str, resource: &str) -> PathBuf {
        self.token_dir(connection)
            .join(format!("{}.json", resource_key(resource)))
    }

    /// Load main config
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_file();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save main config
    pub fn save_config(&self, config: &Config) -> Result<()> {
        let contents = toml::to_string_pretty(config)
            .map_err(|e| M365Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(self.config_file(), contents)?;
        Ok(())
    }

    /// Load all connections
    pub fn load_connections(&self) -> Result<Vec<ConnectionConfig>> {
        let path = self.connections_file();

        if !path.exists() {
            return Ok(Vec::new());
        }

        #[derive(Deserialize)]
        struct ConnectionsFile {
            #[serde(default)]
            connections: Vec<ConnectionConfig>,
        }

        let contents = fs::read_to_string(path)?;
        let file: ConnectionsFile = toml::from_str(&contents)?;
        Ok(file.connections)
    }

    /// Save all connections
    pub fn save_connections(&self, connections: &[ConnectionConfig]) -> Result<()> {
        #[derive(Serialize)]
        struct ConnectionsFile<'a> {
            connections: &'a [ConnectionConfig],
        }

        let contents = toml::to_string_pretty(&ConnectionsFile { connections }).map_err(|e| {
            M365Error::ConfigError(format!("Failed to serialize connections: {}", e))
        })?;
        fs::write(self.connections_file(), contents)?;
        Ok(())
    }

    /// Add or replace a connection with the same name
    pub fn add_connection(&self, connection: ConnectionConfig) -> Result<()> {
        validate_connection_name(&connection.name)?;

        let mut connections = self.load_connections()?;
        connections.retain(|c| !c.name.eq_ignore_ascii_case(&connection.name));
        connections.push(connection);
        self.save_connections(&connections)
    }

    pub fn get_connection(&self, name: &str) -> Result<ConnectionConfig> {
        self.load_connections()?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| M365Error::ConnectionNotFound(name.to_string()))
    }

    pub fn get_active_connection(&self) -> Result<Option<ConnectionConfig>> {
        match self.load_config()?.current_connection {
            Some(name) => Ok(Some(self.get_connection(&name)?)),
            None => Ok(None),
        }
    }

    /// The explicitly named connection, else the active one
    pub fn resolve_connection(&self, name: Option<&str>) -> Result<ConnectionConfig> {
        match name {
            Some(name) => self.get_connection(name),
            None => self.get_active_connection()?.ok_or_else(|| {
                M365Error::ConfigError(
                    "No active connection. Run 'm365ctl login' or 'm365ctl connection use <name>' first."
                        .into(),
                )
            }),
        }
    }

    pub fn set_active_connection(&self, name: &str) -> Result<()> {
        let connection = self.get_connection(name)?;

        let mut config = self.load_config()?;
        config.current_connection = Some(connection.name);
        self.save_config(&config)
    }

    /// Remove a connection, its tokens, and clear it if it was active
    pub fn remove_connection(&self, name: &str) -> Result<()> {
        let removed = self.get_connection(name)?;

        let mut connections = self.load_connections()?;
        connections.retain(|c| c.name != removed.name);
        self.save_connections(&connections)?;
        self.delete_tokens(&removed.name)?;

        let mut config = self.load_config()?;
        if config
            .current_connection
            .as_deref()
            .is_some_and(|current| current.eq_ignore_ascii_case(&removed.name))
        {
            config.current_connection = None;
            self.save_config(&config)?;
        }

        Ok(())
    }

    pub fn save_token(&self, connection: &str, token: &TokenCache) -> Result<()> {
        let dir = self.token_dir(connection);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let contents = serde_json::to_string_pretty(token)?;
        fs::write(self.token_cache_file(connection, &token.resource), contents)?;
        Ok(())
    }

    /// Cached token for a resource, expired or not
    pub fn load_token(&self, connection: &str, resource: &str) -> Result<Option<TokenCache>> {
        let path = self.token_cache_file(connection, resource);

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// All cached tokens of a connection
    pub fn load_tokens(&self, connection: &str) -> Result<Vec<TokenCache>> {
        let dir = self.token_dir(connection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tokens = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let contents = fs::read_to_string(&path)?;
                match serde_json::from_str::<TokenCache>(&contents) {
                    Ok(token) => tokens.push(token),
                    Err(e) => tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable token cache"
                    ),
                }
            }
        }
        Ok(tokens)
    }

    pub fn delete_tokens(&self, connection: &str) -> Result<()> {
        let dir = self.token_dir(connection);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
