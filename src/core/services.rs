//! Traits at the boundaries of the relay, implemented by the HTTP clients and
//! by in-memory fakes in tests.

use std::sync::Arc;

use async_trait::async_trait;

use super::models::{ConversationTurn, DownloadedImage, FileUpload, HistoryEntry};
use crate::errors::BotError;

/// Thread operations against the chat platform, bound to one workspace token.
#[async_trait]
pub trait ThreadPlatform: Send + Sync {
    /// Messages in the thread rooted at `thread_ts`.
    async fn fetch_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<HistoryEntry>, BotError>;

    async fn post_message(&self, channel: &str, thread_ts: &str, text: &str)
    -> Result<(), BotError>;

    async fn upload_file(&self, upload: FileUpload) -> Result<(), BotError>;
}

/// Produces a platform client for a workspace token.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, token: &str) -> Arc<dyn ThreadPlatform>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Reply to `text` given the prior turns of the conversation.
    async fn complete(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, BotError>;

    /// Returns the hosted URL of one generated image.
    async fn generate_image(&self, prompt: &str) -> Result<String, BotError>;
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DownloadedImage, BotError>;
}
