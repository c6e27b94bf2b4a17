//! Single-connection download session.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error};

use crate::domain::errors::{AvatarLoaderError, FetchError};
use crate::domain::ports::ImageFetchPort;

use super::delegate::DownloadHandler;

/// Downloads running at the same time within one session.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 1;

#[derive(Debug)]
enum SessionCommand {
    Download { url: url::Url },
}

/// Background download queue feeding a [`DownloadHandler`].
///
/// Dropping the session lets already started tasks finish, then the worker
/// exits.
pub struct DownloadSession {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
}

struct WorkerState {
    fetcher: Arc<dyn ImageFetchPort>,
    handler: Arc<DownloadHandler>,
    semaphore: Arc<Semaphore>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl DownloadSession {
    /// Creates a session and spawns its worker on the current Tokio runtime.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetchPort>, handler: Arc<DownloadHandler>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let worker_state = WorkerState {
            fetcher,
            handler,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_DOWNLOADS)),
            command_rx,
        };

        tokio::spawn(Self::run_worker_loop(worker_state));

        Self { command_tx }
    }

    /// Queues a download of `url`.
    ///
    /// # Errors
    /// Returns `DownloadError` if the session worker is gone.
    pub fn download_task(&self, url: url::Url) -> Result<(), AvatarLoaderError> {
        self.command_tx
            .send(SessionCommand::Download { url })
            .map_err(|e| {
                error!("Failed to send download request: {}", e);
                AvatarLoaderError::DownloadError
            })
    }

    async fn run_worker_loop(mut state: WorkerState) {
        while let Some(command) = state.command_rx.recv().await {
            match command {
                SessionCommand::Download { url } => {
                    let Ok(permit) = state.semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let fetcher = state.fetcher.clone();
                    let handler = state.handler.clone();

                    tokio::spawn(async move {
                        Self::run_task(fetcher.as_ref(), handler, &url).await;
                        drop(permit);
                    });
                }
            }
        }
        debug!("Download session invalidated");
    }

    async fn run_task(fetcher: &dyn ImageFetchPort, handler: Arc<DownloadHandler>, url: &url::Url) {
        debug!(url = %url, "Download task started");

        let progress_handler = handler.clone();
        let progress = move |written: u64, expected: Option<u64>| {
            progress_handler.did_write_data(written, expected);
        };

        match fetcher.fetch(url, &progress).await {
            Ok(bytes) => {
                let decode_handler = handler.clone();
                let decoded =
                    tokio::task::spawn_blocking(move || decode_handler.did_finish_downloading(&bytes))
                        .await;
                if let Err(e) = decoded {
                    handler.did_complete_with_error(&FetchError::body(format!(
                        "Decode task panicked: {e}"
                    )));
                }
            }
            Err(e) => handler.did_complete_with_error(&e),
        }
    }
}

impl std::fmt::Debug for DownloadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSession")
            .field("closed", &self.command_tx.is_closed())
            .finish()
    }
}
