//! Slack Web API client module
//!
//! Covers the handful of calls the relay makes: reading a thread, posting a
//! reply, and attaching a file to a thread.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use slack_morphism::{SlackApiToken, SlackApiTokenValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::DEFAULT_SLACK_API_BASE;
use crate::core::models::{FileUpload, HistoryEntry};
use crate::core::services::{PlatformConnector, ThreadPlatform};
use crate::errors::BotError;

const SLACK_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    messages: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    error: Option<String>,
    upload_url: Option<String>,
    file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OkResponse {
    ok: bool,
    error: Option<String>,
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(SLACK_HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Slack API client bound to one bot token.
pub struct SlackClient {
    token: SlackApiToken,
    api_base: String,
    http: Client,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, DEFAULT_SLACK_API_BASE)
    }

    #[must_use]
    pub fn with_api_base(token: String, api_base: &str) -> Self {
        Self::with_http(token, api_base, build_http_client())
    }

    fn with_http(token: String, api_base: &str, http: Client) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn decode<T: DeserializeOwned>(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<T, BotError> {
        if !resp.status().is_success() {
            return Err(BotError::ApiError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }
        resp.json::<T>()
            .await
            .map_err(|e| BotError::ApiError(format!("{method} JSON parse error: {e}")))
    }

    fn check_ok(method: &str, ok: bool, error: Option<String>) -> Result<(), BotError> {
        if ok {
            Ok(())
        } else {
            Err(BotError::ApiError(format!(
                "{method} error: {}",
                error.unwrap_or_else(|| "unknown".to_string())
            )))
        }
    }

    /// Fetch the messages of a thread via `conversations.replies`.
    ///
    /// Slack delivers the thread oldest first; the list is returned reversed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or Slack returns `ok: false`.
    pub async fn get_thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<HistoryEntry>, BotError> {
        let method = "conversations.replies";
        let resp = self
            .http
            .get(self.method_url(method))
            .bearer_auth(&self.token.token_value.0)
            .query(&[("channel", channel_id), ("ts", thread_ts), ("oldest", "1")])
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("{method} request failed: {e}")))?;

        let body: RepliesResponse = Self::decode(method, resp).await?;
        Self::check_ok(method, body.ok, body.error)?;

        let mut messages = body.messages;
        messages.reverse();
        debug!(count = messages.len(), "Fetched thread replies");
        Ok(messages)
    }

    /// Post a plain-text reply into a specific thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or Slack returns an error.
    pub async fn post_message_in_thread(
        &self,
        channel_id: &str,
        thread_ts: &str,
        message: &str,
    ) -> Result<(), BotError> {
        let method = "chat.postMessage";
        let payload = json!({
            "channel": channel_id,
            "text": message,
            "thread_ts": thread_ts,
        });

        let resp = self
            .http
            .post(self.method_url(method))
            .bearer_auth(&self.token.token_value.0)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("Failed to post thread message: {e}")))?;

        let body: OkResponse = Self::decode(method, resp).await?;
        Self::check_ok(method, body.ok, body.error)
    }

    /// Attach a file to a thread using Slack's external upload flow:
    /// reserve an upload URL, send the bytes there, then share the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is empty or any of the three steps fails.
    pub async fn upload_file_to_thread(&self, upload: &FileUpload) -> Result<String, BotError> {
        if upload.bytes.is_empty() {
            return Err(BotError::ApiError(
                "file upload requires a non-empty payload".to_string(),
            ));
        }

        let method = "files.getUploadURLExternal";
        let length = upload.bytes.len().to_string();
        let resp = self
            .http
            .post(self.method_url(method))
            .bearer_auth(&self.token.token_value.0)
            .form(&[
                ("filename", upload.filename.as_str()),
                ("length", length.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("{method} request failed: {e}")))?;

        let reserved: UploadUrlResponse = Self::decode(method, resp).await?;
        Self::check_ok(method, reserved.ok, reserved.error)?;
        let upload_url = reserved
            .upload_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| BotError::ApiError(format!("{method} missing upload_url")))?;
        let file_id = reserved
            .file_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| BotError::ApiError(format!("{method} missing file_id")))?;

        let resp = self
            .http
            .post(&upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(upload.bytes.clone())
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("file upload request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(BotError::ApiError(format!(
                "file upload HTTP {}",
                resp.status()
            )));
        }

        let method = "files.completeUploadExternal";
        let payload = json!({
            "files": [{ "id": file_id, "title": upload.title }],
            "channel_id": upload.channel,
            "thread_ts": upload.thread_ts,
            "initial_comment": upload.initial_comment,
        });
        let resp = self
            .http
            .post(self.method_url(method))
            .bearer_auth(&self.token.token_value.0)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("{method} request failed: {e}")))?;

        let body: Value = Self::decode(method, resp).await?;
        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        Self::check_ok(method, ok, error)?;

        info!(file_id = %file_id, channel = %upload.channel, "Uploaded file to thread");
        Ok(file_id)
    }
}

#[async_trait]
impl ThreadPlatform for SlackClient {
    async fn fetch_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<HistoryEntry>, BotError> {
        self.get_thread_replies(channel, thread_ts).await
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<(), BotError> {
        self.post_message_in_thread(channel, thread_ts, text).await
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<(), BotError> {
        self.upload_file_to_thread(&upload).await.map(|_| ())
    }
}

/// Creates `SlackClient`s that share one connection pool.
pub struct SlackConnector {
    api_base: String,
    http: Client,
}

impl SlackConnector {
    #[must_use]
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.to_string(),
            http: build_http_client(),
        }
    }
}

impl PlatformConnector for SlackConnector {
    fn connect(&self, token: &str) -> Arc<dyn ThreadPlatform> {
        Arc::new(SlackClient::with_http(
            token.to_string(),
            &self.api_base,
            self.http.clone(),
        ))
    }
}
