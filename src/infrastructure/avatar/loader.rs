//! Avatar loading orchestrator.
//!
//! Ties together URL preparation, the memory cache, the download session and
//! the view. Background callbacks are forwarded over a channel and applied
//! only when the owning task drains it, so the view and cache are never
//! touched from another thread.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::AvatarKey;
use crate::domain::errors::{AvatarLoaderError, AvatarResult, FetchError};
use crate::domain::ports::{AvatarViewPort, ImageFetchPort};

use super::delegate::DownloadHandler;
use super::http_fetcher::HttpImageFetcher;
use super::memory_cache::{
    CacheStats, DEFAULT_COUNT_LIMIT, DEFAULT_TOTAL_COST_LIMIT, MemoryAvatarCache,
};
use super::request_url::prepare_url;
use super::session::DownloadSession;

/// Side of the square decoded avatars are shrunk to by default.
pub const DEFAULT_DECODE_SIZE: u32 = 256;

/// Callback receiving the outcome of one `download` call.
pub type ResultCallback = Box<dyn FnOnce(AvatarResult) + Send>;

/// Configuration for the avatar loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarLoaderConfig {
    /// Maximum number of cached avatars. `0` disables the bound.
    pub count_limit: usize,
    /// Maximum summed decoded size of cached avatars in bytes. `0` disables the bound.
    pub total_cost_limit: usize,
    /// Request timeout. `None` keeps the HTTP client default.
    pub timeout: Option<Duration>,
    /// Decoded images larger than this square are shrunk before caching.
    /// `None` keeps full resolution.
    pub decode_size: Option<u32>,
}

impl Default for AvatarLoaderConfig {
    fn default() -> Self {
        Self {
            count_limit: DEFAULT_COUNT_LIMIT,
            total_cost_limit: DEFAULT_TOTAL_COST_LIMIT,
            timeout: None,
            decode_size: Some(DEFAULT_DECODE_SIZE),
        }
    }
}

/// Event waiting to be applied on the owning task.
pub enum LoaderEvent {
    /// Download progress in `0.0..=1.0`.
    Progress(f32),
    /// The running download finished.
    Finished(Result<image::DynamicImage, AvatarLoaderError>),
    /// A cached avatar to show and report.
    CacheHit {
        /// Cached image.
        image: Arc<image::DynamicImage>,
        /// Callback of the request that hit the cache.
        callback: ResultCallback,
    },
}

impl std::fmt::Debug for LoaderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progress(progress) => f.debug_tuple("Progress").field(progress).finish(),
            Self::Finished(result) => f
                .debug_tuple("Finished")
                .field(&result.as_ref().map(|img| (img.width(), img.height())))
                .finish(),
            Self::CacheHit { image, .. } => f
                .debug_struct("CacheHit")
                .field("size", &(image.width(), image.height()))
                .finish_non_exhaustive(),
        }
    }
}

/// Loads one avatar at a time into a view.
pub struct AvatarLoader<V> {
    view: V,
    cache: MemoryAvatarCache,
    session: DownloadSession,
    event_tx: mpsc::UnboundedSender<LoaderEvent>,
    event_rx: mpsc::UnboundedReceiver<LoaderEvent>,
    completion: Option<ResultCallback>,
    current_key: Option<AvatarKey>,
    in_flight: bool,
}

impl<V: AvatarViewPort> AvatarLoader<V> {
    /// Creates a loader that downloads through `fetcher`.
    ///
    /// The view shows `placeholder` (if any) and an empty ring until the
    /// first avatar arrives. Must be called within a Tokio runtime.
    pub fn new(
        mut view: V,
        placeholder: Option<Arc<image::DynamicImage>>,
        config: &AvatarLoaderConfig,
        fetcher: Arc<dyn ImageFetchPort>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut handler = DownloadHandler::new().with_decode_size(config.decode_size);
        Self::subscribe_on_progress(&mut handler, event_tx.clone());
        Self::subscribe_on_download_handler(&mut handler, event_tx.clone());
        let session = DownloadSession::new(fetcher, Arc::new(handler));

        if let Some(placeholder) = placeholder {
            view.set_image(placeholder);
        }
        view.reset_progress();

        info!(
            count_limit = config.count_limit,
            total_cost_limit = config.total_cost_limit,
            decode_size = ?config.decode_size,
            "Avatar loader ready"
        );

        Self {
            view,
            cache: MemoryAvatarCache::new(config.count_limit, config.total_cost_limit),
            session,
            event_tx,
            event_rx,
            completion: None,
            current_key: None,
            in_flight: false,
        }
    }

    /// Creates a loader downloading over HTTP.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_http(
        view: V,
        placeholder: Option<Arc<image::DynamicImage>>,
        config: &AvatarLoaderConfig,
    ) -> Result<Self, FetchError> {
        let fetcher = Arc::new(HttpImageFetcher::new(config.timeout)?);
        Ok(Self::new(view, placeholder, config, fetcher))
    }

    /// Requests the avatar at `url`.
    ///
    /// Ignored while another download is running: `on_result` is dropped
    /// without being called. A malformed URL is reported immediately; a
    /// cache hit and a download are reported once the event is handled.
    pub fn download(&mut self, url: &str, on_result: impl FnOnce(AvatarResult) + Send + 'static) {
        if self.in_flight {
            debug!(url, "Download in progress, ignoring request");
            return;
        }

        let url = match prepare_url(url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url, "Rejected avatar URL");
                on_result(Err(e));
                return;
            }
        };

        let key = AvatarKey::from_url(&url);
        if let Some(image) = self.cache.get(&key) {
            debug!(key = %key, "Avatar served from memory cache");
            let _ = self.event_tx.send(LoaderEvent::CacheHit {
                image,
                callback: Box::new(on_result),
            });
            return;
        }

        if let Err(e) = self.session.download_task(url) {
            on_result(Err(e));
            return;
        }

        debug!(key = %key, "Downloading avatar");
        self.completion = Some(Box::new(on_result));
        self.current_key = Some(key);
        self.in_flight = true;
    }

    /// Waits for the next pending event.
    pub async fn recv_event(&mut self) -> Option<LoaderEvent> {
        self.event_rx.recv().await
    }

    /// Applies every event already queued. Returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Applies one event to the view, the cache and the waiting callback.
    pub fn handle_event(&mut self, event: LoaderEvent) {
        match event {
            LoaderEvent::Progress(progress) => {
                if self.in_flight {
                    trace!(progress, "Updating progress ring");
                    self.view.set_progress(progress);
                }
            }
            LoaderEvent::Finished(result) => {
                self.view.reset_progress();
                self.in_flight = false;
                let key = self.current_key.take();
                let callback = self.completion.take();

                let result = result.map(|decoded| {
                    let image = Arc::new(decoded);
                    self.view.set_image(image.clone());
                    if let Some(key) = key {
                        if !self.cache.put(key.clone(), image.clone()) {
                            warn!(key = %key, "Avatar exceeds cache cost limit, not retained");
                        }
                    }
                    image
                });

                match &result {
                    Ok(image) => debug!(width = image.width(), height = image.height(), "Avatar loaded"),
                    Err(e) => warn!(error = %e, "Avatar load failed"),
                }

                if let Some(callback) = callback {
                    callback(result);
                }
            }
            LoaderEvent::CacheHit { image, callback } => {
                self.view.set_image(image.clone());
                callback(Ok(image));
            }
        }
    }

    /// Returns true while a download is running.
    #[must_use]
    pub const fn is_downloading(&self) -> bool {
        self.in_flight
    }

    /// Returns the view.
    #[must_use]
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Peeks at a cached avatar by its request URL.
    #[must_use]
    pub fn cached(&self, url: &str) -> Option<Arc<image::DynamicImage>> {
        let url = prepare_url(url).ok()?;
        self.cache.peek(&AvatarKey::from_url(&url))
    }

    /// Returns memory cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops every cached avatar.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        info!("Cleared avatar cache");
    }

    fn subscribe_on_progress(
        handler: &mut DownloadHandler,
        event_tx: mpsc::UnboundedSender<LoaderEvent>,
    ) {
        handler.set_progress_handler(move |progress| {
            let _ = event_tx.send(LoaderEvent::Progress(progress));
        });
    }

    fn subscribe_on_download_handler(
        handler: &mut DownloadHandler,
        event_tx: mpsc::UnboundedSender<LoaderEvent>,
    ) {
        handler.set_completion_handler(move |result| {
            let _ = event_tx.send(LoaderEvent::Finished(result));
        });
    }
}

impl<V> std::fmt::Debug for AvatarLoader<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarLoader")
            .field("in_flight", &self.in_flight)
            .field("current_key", &self.current_key)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{RecordingView, StubFetcher};
    use crate::infrastructure::avatar::delegate::tests::png_bytes;
    use tokio::sync::{Notify, oneshot};

    const AVATAR_URL: &str = "https://example.com/avatars/Мона-Лиза.png";

    fn loader_with(fetcher: Arc<StubFetcher>) -> AvatarLoader<RecordingView> {
        AvatarLoader::new(
            RecordingView::default(),
            None,
            &AvatarLoaderConfig::default(),
            fetcher,
        )
    }

    fn capture() -> (
        impl FnOnce(AvatarResult) + Send + 'static,
        oneshot::Receiver<AvatarResult>,
    ) {
        let (tx, rx) = oneshot::channel();
        (
            move |result| {
                let _ = tx.send(result);
            },
            rx,
        )
    }

    async fn pump_until_idle(loader: &mut AvatarLoader<RecordingView>) {
        tokio::time::timeout(Duration::from_secs(30), async {
            while loader.is_downloading() {
                let event = loader.recv_event().await.unwrap();
                loader.handle_event(event);
            }
        })
        .await
        .unwrap();
    }

    async fn wait_for_calls(fetcher: &StubFetcher, calls: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while fetcher.calls() < calls {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_placeholder_shown_at_construction() {
        let placeholder = Arc::new(image::DynamicImage::new_rgb8(3, 3));
        let loader = AvatarLoader::new(
            RecordingView::default(),
            Some(placeholder.clone()),
            &AvatarLoaderConfig::default(),
            Arc::new(StubFetcher::with_body(Vec::new())),
        );

        let shown = loader.view().image.clone().unwrap();
        assert!(Arc::ptr_eq(&shown, &placeholder));
        assert_eq!(loader.view().progress, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_url_fails_fast_without_fetch() {
        let fetcher = Arc::new(StubFetcher::with_body(png_bytes(4)));
        let mut loader = loader_with(fetcher.clone());
        let (callback, mut rx) = capture();

        loader.download("not a url", callback);

        assert_eq!(rx.try_recv().unwrap(), Err(AvatarLoaderError::BadUrl));
        assert!(!loader.is_downloading());
        tokio::task::yield_now().await;
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_download_caches_before_reporting() {
        let fetcher = Arc::new(StubFetcher::with_body(png_bytes(6)));
        let mut loader = loader_with(fetcher.clone());
        let (callback, rx) = capture();

        loader.download(AVATAR_URL, callback);
        assert!(loader.is_downloading());
        pump_until_idle(&mut loader).await;

        let image = rx.await.unwrap().unwrap();
        assert_eq!(image.width(), 6);

        let cached = loader.cached(AVATAR_URL).unwrap();
        assert!(Arc::ptr_eq(&cached, &image));
        let shown = loader.view().image.clone().unwrap();
        assert!(Arc::ptr_eq(&shown, &image));

        assert_eq!(loader.view().progress_updates, vec![0.0, 1.0]);
        assert_eq!(loader.view().progress, 0.0);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let fetcher = Arc::new(StubFetcher::with_body(png_bytes(6)));
        let mut loader = loader_with(fetcher.clone());

        let (callback, rx) = capture();
        loader.download(AVATAR_URL, callback);
        pump_until_idle(&mut loader).await;
        let first = rx.await.unwrap().unwrap();

        let (callback, mut rx) = capture();
        loader.download(AVATAR_URL, callback);

        // Reported only once the event is handled on the owning task.
        assert!(rx.try_recv().is_err());
        assert!(!loader.is_downloading());
        assert_eq!(loader.process_pending(), 1);

        let second = rx.try_recv().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(loader.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_large_download_fits_default_cache() {
        // 1900x1900 RGB decodes to more than the default cost limit.
        let fetcher = Arc::new(StubFetcher::with_body(png_bytes(1900)));
        let mut loader = loader_with(fetcher.clone());

        let (callback, rx) = capture();
        loader.download(AVATAR_URL, callback);
        pump_until_idle(&mut loader).await;
        let first = rx.await.unwrap().unwrap();

        assert_eq!(first.width(), DEFAULT_DECODE_SIZE);
        assert!(loader.cached(AVATAR_URL).is_some());

        let (callback, mut rx) = capture();
        loader.download(AVATAR_URL, callback);
        assert!(!loader.is_downloading());
        loader.process_pending();

        let second = rx.try_recv().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_bad_data() {
        let fetcher = Arc::new(StubFetcher::with_body(b"<html></html>".to_vec()));
        let mut loader = loader_with(fetcher);
        let (callback, rx) = capture();

        loader.download(AVATAR_URL, callback);
        pump_until_idle(&mut loader).await;

        assert_eq!(rx.await.unwrap(), Err(AvatarLoaderError::BadData));
        assert!(loader.cached(AVATAR_URL).is_none());
        assert_eq!(loader.view().progress, 0.0);
    }

    #[tokio::test]
    async fn test_network_failure_resets_ring() {
        let fetcher = Arc::new(StubFetcher::failing(FetchError::request("offline")));
        let mut loader = loader_with(fetcher);
        loader.view.set_progress(0.7);
        let resets_before = loader.view().resets;
        let (callback, rx) = capture();

        loader.download(AVATAR_URL, callback);
        pump_until_idle(&mut loader).await;

        assert_eq!(rx.await.unwrap(), Err(AvatarLoaderError::DownloadError));
        assert_eq!(loader.view().progress, 0.0);
        assert_eq!(loader.view().resets, resets_before + 1);
        assert!(loader.view().image.is_none());
    }

    #[tokio::test]
    async fn test_request_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let fetcher = Arc::new(StubFetcher::with_body(png_bytes(5)).gated(gate.clone()));
        let mut loader = loader_with(fetcher.clone());

        let (first_callback, first_rx) = capture();
        loader.download(AVATAR_URL, first_callback);
        wait_for_calls(&fetcher, 1).await;

        let (second_callback, second_rx) = capture();
        loader.download("https://example.com/other.png", second_callback);
        loader.download("also not a url", |_| panic!("ignored request must not report"));

        // The ignored callback was dropped without being called.
        assert!(second_rx.await.is_err());
        assert!(loader.is_downloading());

        gate.notify_one();
        pump_until_idle(&mut loader).await;

        assert_eq!(first_rx.await.unwrap().unwrap().width(), 5);
        assert_eq!(fetcher.calls(), 1);
        assert!(loader.cached("https://example.com/other.png").is_none());
    }

    #[tokio::test]
    async fn test_new_request_allowed_after_completion() {
        let fetcher = Arc::new(StubFetcher::failing(FetchError::Status { status: 502 }));
        let mut loader = loader_with(fetcher.clone());

        let (callback, rx) = capture();
        loader.download(AVATAR_URL, callback);
        pump_until_idle(&mut loader).await;
        assert!(rx.await.unwrap().is_err());

        let (callback, rx) = capture();
        loader.download(AVATAR_URL, callback);
        assert!(loader.is_downloading());
        pump_until_idle(&mut loader).await;
        assert!(rx.await.unwrap().is_err());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let fetcher = Arc::new(StubFetcher::with_body(png_bytes(2)));
        let mut loader = loader_with(fetcher.clone());

        let (callback, _rx) = capture();
        loader.download(AVATAR_URL, callback);
        pump_until_idle(&mut loader).await;
        loader.clear_cache();

        let (callback, _rx) = capture();
        loader.download(AVATAR_URL, callback);
        assert!(loader.is_downloading());
        pump_until_idle(&mut loader).await;
        assert_eq!(fetcher.calls(), 2);
    }
}
