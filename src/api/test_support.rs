//! In-memory fakes for the service traits, recording every call in order.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::event_handler::Relay;
use crate::core::config::WorkspaceTokens;
use crate::core::models::{ConversationTurn, DownloadedImage, FileUpload, HistoryEntry};
use crate::core::services::{ImageFetcher, LanguageModel, PlatformConnector, ThreadPlatform};
use crate::errors::BotError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect {
        token: String,
    },
    FetchReplies {
        channel: String,
        thread_ts: String,
    },
    Post {
        channel: String,
        thread_ts: String,
        text: String,
    },
    Upload {
        channel: String,
        thread_ts: String,
        filename: String,
        title: String,
        initial_comment: String,
        bytes: Vec<u8>,
    },
    Complete {
        text: String,
        history: Vec<ConversationTurn>,
    },
    Image {
        prompt: String,
    },
    Fetch {
        url: String,
    },
}

pub struct FakeWorld {
    history: Option<Vec<HistoryEntry>>,
    completion: Option<String>,
    image_url: Option<String>,
    image: Option<DownloadedImage>,
    fail_posts: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            history: Some(Vec::new()),
            completion: Some("reply".to_string()),
            image_url: Some("https://images.example/fox.png".to_string()),
            image: Some(DownloadedImage {
                bytes: b"img".to_vec(),
                content_type: Some("image/png".to_string()),
            }),
            fail_posts: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_completion(mut self, reply: &str) -> Self {
        self.completion = Some(reply.to_string());
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.history = None;
        self
    }

    pub fn failing_completion(mut self) -> Self {
        self.completion = None;
        self
    }

    pub fn failing_image(mut self) -> Self {
        self.image_url = None;
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Builds a relay wired to this world, with workspace `T1` → `xoxb-t1`.
    pub fn relay(self: &Arc<Self>) -> Relay {
        let fake = Arc::new(Fake(Arc::clone(self)));
        Relay::new(
            WorkspaceTokens::from_pairs([("T1".to_string(), "xoxb-t1".to_string())]),
            fake.clone(),
            fake.clone(),
            fake,
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

struct Fake(Arc<FakeWorld>);

impl PlatformConnector for Fake {
    fn connect(&self, token: &str) -> Arc<dyn ThreadPlatform> {
        self.0.record(Call::Connect {
            token: token.to_string(),
        });
        Arc::new(Fake(Arc::clone(&self.0)))
    }
}

#[async_trait]
impl ThreadPlatform for Fake {
    async fn fetch_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<HistoryEntry>, BotError> {
        self.0.record(Call::FetchReplies {
            channel: channel.to_string(),
            thread_ts: thread_ts.to_string(),
        });
        self.0
            .history
            .clone()
            .ok_or_else(|| BotError::ApiError("conversations.replies error: fake".to_string()))
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<(), BotError> {
        self.0.record(Call::Post {
            channel: channel.to_string(),
            thread_ts: thread_ts.to_string(),
            text: text.to_string(),
        });
        if self.0.fail_posts {
            return Err(BotError::ApiError("chat.postMessage error: fake".to_string()));
        }
        Ok(())
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<(), BotError> {
        self.0.record(Call::Upload {
            channel: upload.channel,
            thread_ts: upload.thread_ts,
            filename: upload.filename,
            title: upload.title,
            initial_comment: upload.initial_comment,
            bytes: upload.bytes,
        });
        if self.0.fail_posts {
            return Err(BotError::ApiError("files.completeUploadExternal error: fake".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageModel for Fake {
    async fn complete(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, BotError> {
        self.0.record(Call::Complete {
            text: text.to_string(),
            history: history.to_vec(),
        });
        self.0
            .completion
            .clone()
            .ok_or_else(|| BotError::OpenAIError("fake completion failure".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, BotError> {
        self.0.record(Call::Image {
            prompt: prompt.to_string(),
        });
        self.0
            .image_url
            .clone()
            .ok_or_else(|| BotError::OpenAIError("fake image failure".to_string()))
    }
}

#[async_trait]
impl ImageFetcher for Fake {
    async fn fetch(&self, url: &str) -> Result<DownloadedImage, BotError> {
        self.0.record(Call::Fetch {
            url: url.to_string(),
        });
        self.0
            .image
            .clone()
            .ok_or_else(|| BotError::HttpError("Image download HTTP 403".to_string()))
    }
}
