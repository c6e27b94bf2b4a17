//! Adapter from low-level download events to loader callbacks.

use image::imageops::FilterType;
use tracing::{debug, trace, warn};

use crate::domain::errors::{AvatarLoaderError, FetchError};

/// Receives the download progress as a fraction in `0.0..=1.0`.
pub type ProgressHandler = Box<dyn Fn(f32) + Send + Sync>;

/// Receives the decoded image or the failure of a download.
pub type CompletionHandler =
    Box<dyn Fn(Result<image::DynamicImage, AvatarLoaderError>) + Send + Sync>;

/// Download delegate.
///
/// The session calls the `did_*` methods from its worker; they are forwarded
/// to whichever handlers are subscribed. Decoding happens here so that the
/// owning task only ever sees a finished image or a typed failure.
#[derive(Default)]
pub struct DownloadHandler {
    progress_handler: Option<ProgressHandler>,
    completion_handler: Option<CompletionHandler>,
    decode_size: Option<u32>,
}

impl DownloadHandler {
    /// Creates a handler with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shrinks decoded images larger than `side` x `side` to fill that square.
    #[must_use]
    pub fn with_decode_size(mut self, side: Option<u32>) -> Self {
        self.decode_size = side;
        self
    }

    /// Subscribes to progress updates.
    pub fn set_progress_handler(&mut self, handler: impl Fn(f32) + Send + Sync + 'static) {
        self.progress_handler = Some(Box::new(handler));
    }

    /// Subscribes to completion.
    pub fn set_completion_handler(
        &mut self,
        handler: impl Fn(Result<image::DynamicImage, AvatarLoaderError>) + Send + Sync + 'static,
    ) {
        self.completion_handler = Some(Box::new(handler));
    }

    /// Reports body progress. Nothing is reported while the length is unknown.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn did_write_data(&self, total_written: u64, total_expected: Option<u64>) {
        let Some(expected) = total_expected.filter(|&len| len > 0) else {
            return;
        };

        let fraction = (total_written as f64 / expected as f64).clamp(0.0, 1.0) as f32;
        trace!(total_written, expected, fraction, "Download progress");

        if let Some(handler) = &self.progress_handler {
            handler(fraction);
        }
    }

    /// Decodes the downloaded body and reports the image, or `BadData`.
    ///
    /// Blocking; the session runs it off the async workers.
    pub fn did_finish_downloading(&self, data: &[u8]) {
        let result = image::load_from_memory(data)
            .map(|image| match self.decode_size {
                Some(side) => shrink_to_fill(image, side),
                None => image,
            })
            .map_err(|e| {
                warn!(error = %e, len = data.len(), "Downloaded bytes are not an image");
                AvatarLoaderError::BadData
            });
        self.complete(result);
    }

    /// Reports a transport failure as `DownloadError`.
    pub fn did_complete_with_error(&self, error: &FetchError) {
        warn!(error = %error, "Download failed");
        self.complete(Err(AvatarLoaderError::DownloadError));
    }

    fn complete(&self, result: Result<image::DynamicImage, AvatarLoaderError>) {
        if let Some(handler) = &self.completion_handler {
            handler(result);
        }
    }
}

/// Scales `image` down so it covers a `side` x `side` square, cropping the
/// overflow. Images already within the square are returned unchanged.
fn shrink_to_fill(image: image::DynamicImage, side: u32) -> image::DynamicImage {
    let side = side.max(1);
    if image.width() <= side || image.height() <= side {
        return image;
    }
    debug!(
        width = image.width(),
        height = image.height(),
        side,
        "Downscaling decoded avatar"
    );
    image.resize_to_fill(side, side, FilterType::Triangle)
}

impl std::fmt::Debug for DownloadHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadHandler")
            .field("has_progress_handler", &self.progress_handler.is_some())
            .field("has_completion_handler", &self.completion_handler.is_some())
            .field("decode_size", &self.decode_size)
            .finish()
    }
}
