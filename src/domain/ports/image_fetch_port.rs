//! Port definition for fetching image bytes.

use bytes::Bytes;

use crate::domain::errors::FetchError;

/// Progress sink: `(total_bytes_written, total_bytes_expected)`.
pub type FetchProgress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Port for downloading raw image bytes.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Downloads the body at `url`, reporting progress as chunks arrive.
    async fn fetch(&self, url: &url::Url, progress: FetchProgress<'_>) -> Result<Bytes, FetchError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Mock fetcher answering every request with the same outcome.
    pub struct StubFetcher {
        outcome: Result<Bytes, FetchError>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl StubFetcher {
        /// Answers with `body`, reporting progress at its start and end.
        pub fn with_body(body: impl Into<Bytes>) -> Self {
            Self {
                outcome: Ok(body.into()),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Answers with a transport failure.
        pub fn failing(error: FetchError) -> Self {
            Self {
                outcome: Err(error),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Holds every request until `gate` is notified.
        #[must_use]
        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        /// Number of fetches started so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ImageFetchPort for StubFetcher {
        async fn fetch(
            &self,
            _url: &url::Url,
            progress: FetchProgress<'_>,
        ) -> Result<Bytes, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let body = self.outcome.clone()?;
            let total = body.len() as u64;
            progress(0, Some(total));
            progress(total, Some(total));
            Ok(body)
        }
    }
}
