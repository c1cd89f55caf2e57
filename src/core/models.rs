use serde::{Deserialize, Deserializer, Serialize};

/// Slack sends `"text": null` on some message subtypes.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Slack `event_callback` payload, reduced to the fields the relay reads.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    pub team_id: String,
    pub event: MessageEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub channel: String,
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

/// One message from `conversations.replies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&HistoryEntry> for ConversationTurn {
    fn from(entry: &HistoryEntry) -> Self {
        if entry.bot_id.is_some() {
            Self::assistant(entry.text.clone())
        } else {
            Self::user(entry.text.clone())
        }
    }
}

/// Bytes fetched from the image host.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// A file to attach to a thread.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub channel: String,
    pub thread_ts: String,
    pub filename: String,
    pub title: String,
    pub initial_comment: String,
    pub bytes: Vec<u8>,
}
