//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::avatar::AvatarLoaderConfig;
use crate::infrastructure::avatar::loader::DEFAULT_DECODE_SIZE;
use crate::infrastructure::avatar::memory_cache::{DEFAULT_COUNT_LIMIT, DEFAULT_TOTAL_COST_LIMIT};

pub(crate) const APP_NAME: &str = "avatar-loader";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, loaded from TOML and overridden from CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Avatar URLs cycled through by the screen.
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// Memory cache limits.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Avatar view configuration.
    #[serde(default)]
    pub view: ViewConfig,

    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Memory cache limits. `0` disables a bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached avatars.
    #[serde(default = "default_count_limit")]
    pub count_limit: usize,

    /// Maximum summed decoded size in bytes.
    #[serde(default = "default_total_cost_limit")]
    pub total_cost_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            count_limit: default_count_limit(),
            total_cost_limit: default_total_cost_limit(),
        }
    }
}

/// Avatar view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Side of the rendered avatar in pixels.
    #[serde(default = "default_view_size")]
    pub size: u32,

    /// Progress ring stroke width in pixels.
    #[serde(default = "default_ring_width")]
    pub ring_width: f32,

    /// Image shown before the first avatar arrives.
    #[serde(default)]
    pub placeholder: Option<PathBuf>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            size: default_view_size(),
            ring_width: default_ring_width(),
            placeholder: None,
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds. Unset keeps the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_count_limit() -> usize {
    DEFAULT_COUNT_LIMIT
}

fn default_total_cost_limit() -> usize {
    DEFAULT_TOTAL_COST_LIMIT
}

fn default_view_size() -> u32 {
    DEFAULT_DECODE_SIZE
}

fn default_ring_width() -> f32 {
    10.0
}

fn default_urls() -> Vec<String> {
    [
        "https://images.unsplash.com/photo-1562113127-e5bcec12486b?auto=format&fit=crop&w=3034&q=80",
        "https://images.unsplash.com/photo-1524639203153-736267488b2d?auto=format&fit=crop&w=2647&q=80",
        "https://freebigpictures.com/wp-content/uploads/2009/09/blow-ball-spring.jpg",
        "https://www.annaorion.com.ua/wp-content/uploads/2016/05/Мона-Лиза.jpg",
        "https://www.annaorion.com.ua/wp-content/uploads/2016/05/звездная-ночь.jpg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(count_limit) = args.count_limit {
            self.cache.count_limit = count_limit;
        }
        if let Some(total_cost_limit) = args.cache_size {
            self.cache.total_cost_limit = total_cost_limit;
        }
        if let Some(size) = args.size {
            self.view.size = size;
        }
        if let Some(placeholder) = args.placeholder {
            self.view.placeholder = Some(placeholder);
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.network.timeout_secs = Some(timeout_secs);
        }
        if !args.urls.is_empty() {
            self.urls = args.urls;
        }
    }

    /// Builds the loader configuration. Decoded avatars are shrunk to the
    /// view size, since nothing larger is ever drawn.
    #[must_use]
    pub fn loader_config(&self) -> AvatarLoaderConfig {
        AvatarLoaderConfig {
            count_limit: self.cache.count_limit,
            total_cost_limit: self.cache.total_cost_limit,
            timeout: self.network.timeout_secs.map(Duration::from_secs),
            decode_size: Some(self.view.size),
        }
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("avatar-loader.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            cache: CacheConfig::default(),
            view: ViewConfig::default(),
            network: NetworkConfig::default(),
            urls: default_urls(),
        }
    }
}
