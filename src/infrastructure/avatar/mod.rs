//! Avatar loading infrastructure.
//!
//! This module provides:
//! - URL preparation and validation
//! - HTTP fetching with progress
//! - Memory caching bounded by count and cost
//! - The download delegate and single-task session
//! - The loader orchestrating all of the above

pub mod delegate;
pub mod http_fetcher;
pub mod loader;
pub mod memory_cache;
pub mod request_url;
pub mod session;

pub use delegate::DownloadHandler;
pub use http_fetcher::HttpImageFetcher;
pub use loader::{AvatarLoader, AvatarLoaderConfig, LoaderEvent, ResultCallback};
pub use memory_cache::{CacheStats, MemoryAvatarCache};
pub use request_url::prepare_url;
pub use session::DownloadSession;
