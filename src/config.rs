use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR_PREFIX: &str = "gsheet-frame";

// Shared with gspread so that an existing setup keeps working.
const GSPREAD_DIR_PREFIX: &str = "gspread";
const CLIENT_SECRETS_FILE: &str = "client_secrets.json";
const TOKEN_CACHE_FILE: &str = "token.json";

pub const DEFAULT_REDIRECT_PORT: u16 = 8080;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client secret downloaded from the Google Cloud console
    pub client_secrets: Option<PathBuf>,
    pub token_cache: Option<PathBuf>,
    pub auth: AuthMethod,
}

impl GoogleConfig {
    pub fn client_secrets_path(&self) -> Result<PathBuf> {
        match &self.client_secrets {
            Some(path) => Ok(path.clone()),
            None => Config::gspread_file(CLIENT_SECRETS_FILE),
        }
    }

    pub fn token_cache_path(&self) -> Result<PathBuf> {
        match &self.token_cache {
            Some(path) => Ok(path.clone()),
            None => Config::gspread_file(TOKEN_CACHE_FILE),
        }
    }
}

/// How credentials for the Sheets API are obtained.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthMethod {
    /// Installed-app consent flow redirecting to `localhost:<port>`.
    LocalServer {
        #[serde(default = "default_redirect_port")]
        port: u16,
    },
    /// Installed-app consent flow where the code is pasted into the terminal.
    Interactive,
    ServiceAccount { key_file: PathBuf },
    /// A refresh token cached by gcloud or gspread (`authorized_user.json`).
    AuthorizedUser { secret_file: PathBuf },
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::LocalServer {
            port: DEFAULT_REDIRECT_PORT,
        }
    }
}

fn default_redirect_port() -> u16 {
    DEFAULT_REDIRECT_PORT
}

impl Config {
    /// Load the config file, falling back to defaults when there isn't one.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            debug!(path = ?config_path, "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
            .get_config_home()
            .map(|dir| dir.join("config.toml"))
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    /// Get a file path inside the gspread config directory
    fn gspread_file(filename: &str) -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix(GSPREAD_DIR_PREFIX)
            .get_config_home()
            .map(|dir| dir.join(filename))
            .ok_or_else(|| {
                AppError::Config("Failed to determine gspread config directory".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            google: GoogleConfig {
                client_secrets: Some(PathBuf::from("/tmp/secrets.json")),
                token_cache: None,
                auth: AuthMethod::ServiceAccount {
                    key_file: PathBuf::from("/tmp/key.json"),
                },
            },
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = Config::from_toml(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(
            config.google.auth,
            AuthMethod::LocalServer {
                port: DEFAULT_REDIRECT_PORT
            }
        );
    }

    #[test]
    fn test_auth_method_from_toml() {
        let config = Config::from_toml(
            r#"
            [google.auth]
            method = "local_server"
            port = 9090
            "#,
        )
        .unwrap();
        assert_eq!(config.google.auth, AuthMethod::LocalServer { port: 9090 });

        let config = Config::from_toml(
            r#"
            [google.auth]
            method = "local_server"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.google.auth,
            AuthMethod::LocalServer {
                port: DEFAULT_REDIRECT_PORT
            }
        );

        let config = Config::from_toml(
            r#"
            [google.auth]
            method = "interactive"
            "#,
        )
        .unwrap();
        assert_eq!(config.google.auth, AuthMethod::Interactive);
    }

    #[test]
    fn test_unknown_auth_method() {
        let result = Config::from_toml(
            r#"
            [google.auth]
            method = "carrier_pigeon"
            "#,
        );

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_explicit_paths_win() {
        let google = GoogleConfig {
            client_secrets: Some(PathBuf::from("/etc/secrets.json")),
            token_cache: Some(PathBuf::from("/var/cache/token.json")),
            auth: AuthMethod::Interactive,
        };

        assert_eq!(
            google.client_secrets_path().unwrap(),
            PathBuf::from("/etc/secrets.json")
        );
        assert_eq!(
            google.token_cache_path().unwrap(),
            PathBuf::from("/var/cache/token.json")
        );
    }
}
