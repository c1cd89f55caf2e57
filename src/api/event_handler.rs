//! Handler for Slack message events: chat replies and image generation.
//!
//! A message containing the image marker is turned into an image prompt; any
//! other message is answered by the chat model with the thread as context.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::ai::LlmClient;
use crate::core::config::{AppConfig, WorkspaceTokens};
use crate::core::conversation::{
    Directive, parse_directive, prepare_turns, strip_mentions, thread_anchor,
};
use crate::core::models::{FileUpload, InboundEvent};
use crate::core::services::{ImageFetcher, LanguageModel, PlatformConnector, ThreadPlatform};
use crate::errors::BotError;
use crate::slack::SlackConnector;
use crate::utils::download::HttpImageFetcher;
use crate::utils::mime::image_filename;

pub const IMAGE_ACK_MESSAGE: &str = "Image generated successfully.";
pub const COMPLETION_FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't generate a reply right now. Please try again later.";
pub const IMAGE_TITLE: &str = "Generated Image";
pub const IMAGE_CAPTION: &str = "こちらが画像です";
const IMAGE_FILE_STEM: &str = "generated-image";

/// Relays one workspace message to the model and posts the result back.
pub struct Relay {
    workspaces: WorkspaceTokens,
    connector: Arc<dyn PlatformConnector>,
    model: Arc<dyn LanguageModel>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl Relay {
    #[must_use]
    pub fn new(
        workspaces: WorkspaceTokens,
        connector: Arc<dyn PlatformConnector>,
        model: Arc<dyn LanguageModel>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            workspaces,
            connector,
            model,
            fetcher,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.workspace_tokens(),
            Arc::new(SlackConnector::new(config.slack_base())),
            Arc::new(LlmClient::from_config(config)),
            Arc::new(HttpImageFetcher::default()),
        )
    }

    /// Handles one message event and returns the text reported back to the caller.
    ///
    /// # Errors
    ///
    /// Returns `BotError::UnknownWorkspace` for an unregistered team and
    /// propagates image-generation failures. Posting failures and chat-model
    /// failures are logged and never returned.
    pub async fn handle_message(&self, inbound: &InboundEvent) -> Result<String, BotError> {
        let token = self.workspaces.token_for(&inbound.team_id)?;
        let platform = self.connector.connect(token);

        let event = &inbound.event;
        let text = strip_mentions(&event.text);
        let anchor = thread_anchor(event);
        info!(channel = %event.channel, thread_ts = %anchor, "input: {}", text);

        match parse_directive(&text) {
            Directive::Image { prompt } => {
                self.reply_with_image(platform.as_ref(), &event.channel, anchor, &prompt)
                    .await?;
                Ok(IMAGE_ACK_MESSAGE.to_string())
            }
            Directive::Chat { text } => Ok(self
                .reply_with_text(platform.as_ref(), &event.channel, anchor, &text)
                .await),
        }
    }

    async fn reply_with_text(
        &self,
        platform: &dyn ThreadPlatform,
        channel: &str,
        anchor: &str,
        text: &str,
    ) -> String {
        let history = match platform.fetch_replies(channel, anchor).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to fetch thread history, continuing without it: {}", e);
                Vec::new()
            }
        };
        let turns = prepare_turns(history);
        info!(turns = turns.len(), "Prepared thread history");

        let reply = match self.model.complete(text, &turns).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Completion failed, replying with fallback notice: {}", e);
                COMPLETION_FALLBACK_MESSAGE.to_string()
            }
        };

        post_text(platform, channel, anchor, &reply).await;
        reply
    }

    async fn reply_with_image(
        &self,
        platform: &dyn ThreadPlatform,
        channel: &str,
        anchor: &str,
        prompt: &str,
    ) -> Result<(), BotError> {
        let image_url = self.model.generate_image(prompt).await?;
        info!(image_url = %image_url, "Image generated");

        post_image(platform, self.fetcher.as_ref(), channel, anchor, &image_url).await;
        Ok(())
    }
}

/// Posts a text reply; failures are logged and dropped.
async fn post_text(platform: &dyn ThreadPlatform, channel: &str, anchor: &str, text: &str) {
    match platform.post_message(channel, anchor, text).await {
        Ok(()) => info!(channel = %channel, "Posted reply to thread"),
        Err(e) => error!("Failed to post reply to thread: {}", e),
    }
}

/// Re-uploads the generated image into the thread; failures are logged and dropped.
async fn post_image(
    platform: &dyn ThreadPlatform,
    fetcher: &dyn ImageFetcher,
    channel: &str,
    anchor: &str,
    image_url: &str,
) {
    let image = match fetcher.fetch(image_url).await {
        Ok(image) => image,
        Err(e) => {
            error!("Failed to download generated image: {}", e);
            return;
        }
    };

    let upload = FileUpload {
        channel: channel.to_string(),
        thread_ts: anchor.to_string(),
        filename: image_filename(IMAGE_FILE_STEM, image.content_type.as_deref()),
        title: IMAGE_TITLE.to_string(),
        initial_comment: IMAGE_CAPTION.to_string(),
        bytes: image.bytes,
    };

    match platform.upload_file(upload).await {
        Ok(()) => info!(channel = %channel, "Uploaded generated image to thread"),
        Err(e) => error!("Failed to upload generated image: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{Call, FakeWorld};
    use crate::core::models::{ConversationTurn, HistoryEntry, MessageEvent};

    fn inbound(text: &str, thread_ts: Option<&str>) -> InboundEvent {
        InboundEvent {
            team_id: "T1".to_string(),
            event: MessageEvent {
                channel: "C1".to_string(),
                ts: "1700000000.000200".to_string(),
                thread_ts: thread_ts.map(ToString::to_string),
                text: text.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_chat_reply_without_history() {
        let world = FakeWorld::new().with_completion("Hi!").shared();
        let relay = world.relay();

        let message = relay.handle_message(&inbound("Hello", None)).await.unwrap();

        assert_eq!(message, "Hi!");
        assert_eq!(
            world.calls(),
            vec![
                Call::Connect {
                    token: "xoxb-t1".to_string()
                },
                Call::FetchReplies {
                    channel: "C1".to_string(),
                    thread_ts: "1700000000.000200".to_string()
                },
                Call::Complete {
                    text: "Hello".to_string(),
                    history: vec![]
                },
                Call::Post {
                    channel: "C1".to_string(),
                    thread_ts: "1700000000.000200".to_string(),
                    text: "Hi!".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_reply_uses_thread_and_trimmed_history() {
        let world = FakeWorld::new()
            .with_history(vec![
                HistoryEntry {
                    ts: "3.0".to_string(),
                    text: "bot answer".to_string(),
                    bot_id: Some("B1".to_string()),
                },
                HistoryEntry {
                    ts: "1.0".to_string(),
                    text: "<@UBOT> first".to_string(),
                    bot_id: None,
                },
                HistoryEntry {
                    ts: "2.0".to_string(),
                    text: "user follow-up".to_string(),
                    bot_id: None,
                },
            ])
            .shared();
        let relay = world.relay();

        relay
            .handle_message(&inbound("<@UBOT> and now?", Some("1.0")))
            .await
            .unwrap();

        let calls = world.calls();
        assert!(calls.contains(&Call::FetchReplies {
            channel: "C1".to_string(),
            thread_ts: "1.0".to_string()
        }));
        assert!(calls.contains(&Call::Complete {
            text: " and now?".to_string(),
            history: vec![
                ConversationTurn::user("user follow-up"),
                ConversationTurn::assistant("bot answer"),
            ]
        }));
    }

    #[tokio::test]
    async fn test_history_failure_falls_back_to_empty_history() {
        let world = FakeWorld::new().failing_history().shared();
        let relay = world.relay();

        let message = relay.handle_message(&inbound("Hello", None)).await.unwrap();

        assert_eq!(message, "reply");
        assert!(world.calls().contains(&Call::Complete {
            text: "Hello".to_string(),
            history: vec![]
        }));
    }

    #[tokio::test]
    async fn test_completion_failure_posts_fallback_notice() {
        let world = FakeWorld::new().failing_completion().shared();
        let relay = world.relay();

        let message = relay.handle_message(&inbound("Hello", None)).await.unwrap();

        assert_eq!(message, COMPLETION_FALLBACK_MESSAGE);
        assert!(world.calls().contains(&Call::Post {
            channel: "C1".to_string(),
            thread_ts: "1700000000.000200".to_string(),
            text: COMPLETION_FALLBACK_MESSAGE.to_string()
        }));
    }

    #[tokio::test]
    async fn test_post_failure_is_swallowed() {
        let world = FakeWorld::new().failing_posts().shared();
        let relay = world.relay();

        let message = relay.handle_message(&inbound("Hello", None)).await.unwrap();
        assert_eq!(message, "reply");
    }

    #[tokio::test]
    async fn test_image_directive_generates_and_uploads() {
        let world = FakeWorld::new().shared();
        let relay = world.relay();

        let message = relay
            .handle_message(&inbound("[ai_img] a red fox", None))
            .await
            .unwrap();

        assert_eq!(message, IMAGE_ACK_MESSAGE);
        assert_eq!(
            world.calls(),
            vec![
                Call::Connect {
                    token: "xoxb-t1".to_string()
                },
                Call::Image {
                    prompt: " a red fox".to_string()
                },
                Call::Fetch {
                    url: "https://images.example/fox.png".to_string()
                },
                Call::Upload {
                    channel: "C1".to_string(),
                    thread_ts: "1700000000.000200".to_string(),
                    filename: "generated-image.png".to_string(),
                    title: "Generated Image".to_string(),
                    initial_comment: "こちらが画像です".to_string(),
                    bytes: b"img".to_vec(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_image_prompt_strips_mention_and_marker() {
        let world = FakeWorld::new().shared();
        let relay = world.relay();

        relay
            .handle_message(&inbound("<@U123> draw a cat [ai_img]", None))
            .await
            .unwrap();

        assert!(world.calls().contains(&Call::Image {
            prompt: " draw a cat ".to_string()
        }));
    }

    #[tokio::test]
    async fn test_image_generation_failure_propagates() {
        let world = FakeWorld::new().failing_image().shared();
        let relay = world.relay();

        let result = relay.handle_message(&inbound("[ai_img] fox", None)).await;

        assert!(matches!(result, Err(BotError::OpenAIError(_))));
        assert!(
            !world
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Upload { .. } | Call::Fetch { .. }))
        );
    }

    #[tokio::test]
    async fn test_image_download_failure_still_acknowledges() {
        let world = FakeWorld::new().failing_download().shared();
        let relay = world.relay();

        let message = relay
            .handle_message(&inbound("[ai_img] fox", None))
            .await
            .unwrap();

        assert_eq!(message, IMAGE_ACK_MESSAGE);
        assert!(!world.calls().iter().any(|c| matches!(c, Call::Upload { .. })));
    }

    #[tokio::test]
    async fn test_image_upload_failure_still_acknowledges() {
        let world = FakeWorld::new().failing_posts().shared();
        let relay = world.relay();

        let message = relay
            .handle_message(&inbound("[ai_img] fox", None))
            .await
            .unwrap();

        assert_eq!(message, IMAGE_ACK_MESSAGE);
        assert!(world.calls().iter().any(|c| matches!(c, Call::Upload { .. })));
    }

    #[tokio::test]
    async fn test_unknown_workspace_makes_no_calls() {
        let world = FakeWorld::new().shared();
        let relay = world.relay();
        let mut event = inbound("Hello", None);
        event.team_id = "T404".to_string();

        let result = relay.handle_message(&event).await;

        assert!(matches!(result, Err(BotError::UnknownWorkspace(ref id)) if id == "T404"));
        assert!(world.calls().is_empty());
    }
}
