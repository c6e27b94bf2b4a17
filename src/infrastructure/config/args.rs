//! Command line arguments.

use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments; every value overrides the config file.
#[derive(Debug, Parser)]
#[command(
    name = "avatar-loader",
    version,
    about = "Circular avatar loader with a download progress ring",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Maximum number of cached avatars (0 for unlimited).
    #[arg(long)]
    pub count_limit: Option<usize>,

    /// Maximum decoded size of cached avatars in bytes (0 for unlimited).
    #[arg(long, value_name = "BYTES")]
    pub cache_size: Option<usize>,

    /// Side of the rendered avatar in pixels.
    #[arg(long)]
    pub size: Option<u32>,

    /// Placeholder image shown before the first avatar.
    #[arg(long, value_name = "PATH")]
    pub placeholder: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Avatar URLs to cycle through (replaces the configured list).
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,
}
