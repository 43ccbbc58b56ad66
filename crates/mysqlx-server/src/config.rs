use mysqlx_core::auth::parse_auth_string;
use mysqlx_protocol::DEFAULT_MAX_PACKET_SIZE;
use mysqlx_sql::{CredentialStore, UserAccount};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
    /// Logs every SQL statement under the `audit` target.
    #[serde(default)]
    pub audit: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub skip_auth: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            skip_auth: false,
            max_attempts: default_max_attempts(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub username: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub password_plain: Option<String>,
    /// `*` followed by the 40 hex digits of `SHA1(SHA1(password))`.
    pub auth_string: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_addr(),
        }
    }
}

fn default_max_connections() -> usize {
    1024
}

fn default_max_packet_size() -> usize {
    DEFAULT_MAX_PACKET_SIZE
}

fn default_max_attempts() -> u32 {
    3
}

fn default_host() -> String {
    "%".to_string()
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9898".to_string()
}

impl Config {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server.listen_addr.trim().is_empty() {
            return Err(anyhow::anyhow!("server.listen_addr must not be empty"));
        }
        if self.server.max_packet_size < 16 {
            return Err(anyhow::anyhow!(
                "server.max_packet_size must be at least 16 bytes"
            ));
        }
        if self.server.max_connections == 0 {
            return Err(anyhow::anyhow!("server.max_connections must be positive"));
        }
        if self.auth.max_attempts == 0 {
            return Err(anyhow::anyhow!("auth.max_attempts must be positive"));
        }
        if !self.auth.skip_auth && self.auth.users.is_empty() {
            return Err(anyhow::anyhow!("authentication enabled but no users configured"));
        }
        for user in &self.auth.users {
            match (&user.password_plain, &user.auth_string) {
                (Some(_), Some(_)) => {
                    return Err(anyhow::anyhow!(format!(
                        "user {} sets both password_plain and auth_string",
                        user.username
                    )));
                }
                (None, None) => {
                    return Err(anyhow::anyhow!(format!(
                        "user {} has no password configured",
                        user.username
                    )));
                }
                (None, Some(auth_string)) => {
                    parse_auth_string(auth_string).map_err(|e| {
                        anyhow::anyhow!(format!("user {}: {e}", user.username))
                    })?;
                }
                (Some(_), None) => {}
            }
        }
        Ok(())
    }

    pub fn credential_store(&self) -> anyhow::Result<CredentialStore> {
        let mut store = CredentialStore::default();
        for user in &self.auth.users {
            let account = match (&user.password_plain, &user.auth_string) {
                (Some(password), _) => {
                    UserAccount::with_password(&user.username, &user.host, password)
                }
                (None, Some(auth_string)) => UserAccount::with_auth_string(
                    &user.username,
                    &user.host,
                    parse_auth_string(auth_string)?,
                ),
                (None, None) => {
                    return Err(anyhow::anyhow!(format!(
                        "user {} has no password configured",
                        user.username
                    )))
                }
            };
            store.add(account);
        }
        Ok(store)
    }
}
