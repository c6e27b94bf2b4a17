//! Config file discovery and persistence.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No per-user config directory on this platform.
    #[error("no config directory available")]
    NoConfigDir,
    /// Filesystem failure on a specific path.
    #[error("{path}: {source}", path = .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The defaults could not be rendered as TOML.
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Locates `config.toml` and loads [`AppConfig`] from it.
#[derive(Debug, Clone)]
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Uses the platform config directory for the application.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoConfigDir`] if the platform has none.
    pub fn new() -> Result<Self, ConfigError> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| Self::with_dir(dirs.config_dir().to_path_buf()))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Uses `config_dir` instead of the platform directory.
    #[must_use]
    pub const fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Path that [`Self::load_config`] reads when no override is given.
    #[must_use]
    pub fn default_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads the config from `path_override` or the default location.
    ///
    /// A missing file is seeded with the defaults so users have something to
    /// edit. An unparsable file is kept as is and the defaults are returned.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or seeded.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let path = path_override.map_or_else(|| self.default_config_path(), Path::to_path_buf);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, writing defaults");
                let config = AppConfig::default();
                write_atomic(&path, &toml::to_string_pretty(&config)?)?;
                return Ok(config);
            }
            Err(e) => return Err(ConfigError::io(&path, e)),
        };

        match toml::from_str::<AppConfig>(&content) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }
}

/// Replaces `path` with `content` through a temp file in the same directory.
fn write_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| ConfigError::io(dir, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::io(file.path(), e))?;
    file.persist(path).map_err(|e| ConfigError::io(path, e.error))?;
    Ok(())
}
