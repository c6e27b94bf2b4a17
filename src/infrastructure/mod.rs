//! Infrastructure layer with adapters for external services.

/// Avatar loading (fetching, caching, download session).
pub mod avatar;
/// Application configuration.
pub mod config;

pub use avatar::{
    AvatarLoader, AvatarLoaderConfig, CacheStats, DownloadHandler, DownloadSession,
    HttpImageFetcher, LoaderEvent, MemoryAvatarCache,
};
pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
