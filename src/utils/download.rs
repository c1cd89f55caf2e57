//! Unauthenticated download of provider-hosted images.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::core::models::DownloadedImage;
use crate::core::services::ImageFetcher;
use crate::errors::BotError;

/// Generated images are a few MiB at most; anything larger is refused.
pub const IMAGE_MAX_BYTES: usize = 20 * 1024 * 1024;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpImageFetcher {
    http: Client,
    max_bytes: usize,
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new(IMAGE_MAX_BYTES)
    }
}

impl HttpImageFetcher {
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            http: Client::builder()
                .timeout(DOWNLOAD_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            max_bytes,
        }
    }

    /// Download `url` into memory with a strict size cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s), the request fails, the host
    /// responds non-2xx, or the body exceeds the cap.
    pub async fn download(&self, url: &str) -> Result<DownloadedImage, BotError> {
        if self.max_bytes == 0 {
            return Err(BotError::HttpError(
                "image download max_bytes must be > 0".to_string(),
            ));
        }

        let parsed = Url::parse(url)
            .map_err(|e| BotError::HttpError(format!("Invalid image URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BotError::HttpError(format!(
                "Unsupported image URL scheme: {}",
                parsed.scheme()
            )));
        }

        let resp = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("Failed to download image: {e}")))?;

        if !resp.status().is_success() {
            return Err(BotError::HttpError(format!(
                "Image download HTTP {}",
                resp.status()
            )));
        }

        if let Some(len) = resp.content_length()
            && len > u64::try_from(self.max_bytes).unwrap_or(u64::MAX)
        {
            return Err(BotError::HttpError(format!(
                "Image too large ({len}B > {}B)",
                self.max_bytes
            )));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(item) = stream.next().await {
            let chunk = item.map_err(|e| {
                BotError::HttpError(format!("Error reading image download stream: {e}"))
            })?;
            if bytes.len().saturating_add(chunk.len()) > self.max_bytes {
                return Err(BotError::HttpError(format!(
                    "Image too large (exceeded {}B cap)",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(DownloadedImage {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<DownloadedImage, BotError> {
        self.download(url).await
    }
}
