//! HTTP implementation of the image fetch port.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::domain::errors::FetchError;
use crate::domain::ports::{FetchProgress, ImageFetchPort};

/// Plain `GET` fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher. Without a timeout the client defaults apply.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &url::Url, progress: FetchProgress<'_>) -> Result<Bytes, FetchError> {
        debug!(url = %url, "Requesting image");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let expected = response.content_length();
        let capacity = expected
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or_default();
        let mut body = BytesMut::with_capacity(capacity);
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::body(e.to_string()))?
        {
            body.extend_from_slice(&chunk);
            written += chunk.len() as u64;
            trace!(written, expected = ?expected, "Received chunk");
            progress(written, expected);
        }

        Ok(body.freeze())
    }
}
