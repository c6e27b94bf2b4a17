use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use ratatui_image::picker::Picker;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use avatar_loader::infrastructure::{AppConfig, AvatarLoader, CliArgs, StorageManager};
use avatar_loader::presentation::{App, AvatarView};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn load_placeholder(config: &AppConfig) -> Option<Arc<image::DynamicImage>> {
    let path = config.view.placeholder.as_ref()?;
    match image::open(path) {
        Ok(image) => Some(Arc::new(image)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load placeholder image");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = load_config()?;
    init_logging(&config)?;

    info!(version = avatar_loader::VERSION, "Starting {}", avatar_loader::NAME);

    let view = AvatarView::new(config.view.size, config.view.size)
        .with_ring_width(config.view.ring_width);
    let loader = AvatarLoader::with_http(view, load_placeholder(&config), &config.loader_config())
        .wrap_err("Failed to create avatar loader")?;

    let mut terminal = ratatui::init();
    let picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::halfblocks());

    let app = App::new(loader, config.urls, picker);
    let result = app.run(&mut terminal).await;

    ratatui::restore();

    result
}
