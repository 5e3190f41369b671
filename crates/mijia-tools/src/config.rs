//! Mijia account configuration.
//!
//! Credentials come from, in priority order: an explicit YAML file, the
//! default file [`DEFAULT_CONFIG_PATH`], then the `MIJIA_*` environment
//! variables. The YAML shape is:
//!
//! ```yaml
//! mijia:
//!   username: "13800000000"
//!   password: "secret"
//!   enableQR: false
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Config file consulted when no explicit path is given, relative to the
/// working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/mijia.yaml";

pub const ENV_USERNAME: &str = "MIJIA_USERNAME";
pub const ENV_PASSWORD: &str = "MIJIA_PASSWORD";
pub const ENV_ENABLE_QR: &str = "MIJIA_ENABLEQR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{0}")]
    MissingCredentials(String),

    #[error(
        "Failed to load Mijia configuration. Please provide config file or set environment variables:\n  \
         - MIJIA_USERNAME\n  - MIJIA_PASSWORD\n  - MIJIA_ENABLEQR (optional, default: false)"
    )]
    Unavailable,
}

/// Login settings for the Mijia cloud.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MijiaConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Log in by scanning a QR code instead of with a password.
    #[serde(default, rename = "enableQR")]
    pub enable_qr: bool,
}

impl fmt::Debug for MijiaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MijiaConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("enable_qr", &self.enable_qr)
            .finish()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mijia: MijiaConfig,
}

impl MijiaConfig {
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            enable_qr: false,
        }
    }

    pub fn with_qr_login() -> Self {
        Self {
            enable_qr: true,
            ..Self::default()
        }
    }

    /// Whether this config can be used to log in: QR login is enabled, or
    /// both username and password are non-empty.
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        self.enable_qr || (present(&self.username) && present(&self.password))
    }

    fn ensure_usable(self, missing: &str) -> Result<Self, ConfigError> {
        if self.has_credentials() {
            Ok(self)
        } else {
            Err(ConfigError::MissingCredentials(missing.to_string()))
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            enable_qr: lookup(ENV_ENABLE_QR).is_some_and(|v| v.eq_ignore_ascii_case("true")),
        };
        config.ensure_usable(&format!(
            "{ENV_USERNAME} and {ENV_PASSWORD} environment variables are required"
        ))
    }

    /// Load the `mijia:` section of a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // An empty file parses as null; treat it as an empty config.
        let file: Option<ConfigFile> =
            serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        file.unwrap_or_default()
            .mijia
            .ensure_usable("username and password are required in config file")
    }

    /// Load using the first usable source: `path`, then
    /// [`DEFAULT_CONFIG_PATH`], then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(
            path,
            Path::new(DEFAULT_CONFIG_PATH),
            |key| std::env::var(key).ok(),
        )
    }

    fn load_from(
        path: Option<&Path>,
        default_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            match Self::from_file(path) {
                Ok(config) => {
                    info!("Loaded Mijia config from {}", path.display());
                    return Ok(config);
                }
                Err(e) => warn!("Failed to load config from {}: {e}", path.display()),
            }
        }

        if default_path.exists() {
            match Self::from_file(default_path) {
                Ok(config) => {
                    info!("Loaded Mijia config from {}", default_path.display());
                    return Ok(config);
                }
                Err(e) => warn!("Failed to load default config: {e}"),
            }
        } else {
            debug!("No default config at {}", default_path.display());
        }

        match Self::from_env_with(lookup) {
            Ok(config) => {
                info!("Loaded Mijia config from environment");
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to load config from environment: {e}");
                Err(ConfigError::Unavailable)
            }
        }
    }

    /// Write this config as YAML, creating parent directories.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_yaml::to_string(&ConfigFile {
            mijia: self.clone(),
        })
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(io_err)?;
        debug!("Saved Mijia config to {}", path.display());
        Ok(())
    }
}
