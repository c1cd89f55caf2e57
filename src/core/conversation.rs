//! Pure transforms between Slack message text/history and model input.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{ConversationTurn, HistoryEntry, MessageEvent};

/// Marker that switches a message to image generation.
pub const IMAGE_MARKER: &str = "[ai_img]";

/// Number of prior thread messages forwarded to the model.
pub const MAX_HISTORY_TURNS: usize = 20;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Chat { text: String },
    Image { prompt: String },
}

/// Removes `<@U…>` mention tokens from the message text.
#[must_use]
pub fn strip_mentions(text: &str) -> String {
    static MENTION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<@[^>]*>").expect("static regex compile"));
    MENTION_RE.replace_all(text, "").into_owned()
}

/// Replies go into the parent thread, or start one under the triggering message.
#[must_use]
pub fn thread_anchor(event: &MessageEvent) -> &str {
    event
        .thread_ts
        .as_deref()
        .filter(|ts| !ts.is_empty())
        .unwrap_or(&event.ts)
}

#[must_use]
pub fn parse_directive(text: &str) -> Directive {
    if text.contains(IMAGE_MARKER) {
        Directive::Image {
            prompt: text.replacen(IMAGE_MARKER, "", 1),
        }
    } else {
        Directive::Chat {
            text: text.to_string(),
        }
    }
}

fn numeric_ts(ts: &str) -> f64 {
    ts.parse::<f64>().unwrap_or(0.0)
}

/// Sorts oldest first, then drops the thread's opening message and keeps the
/// most recent `MAX_HISTORY_TURNS` of the rest.
#[must_use]
pub fn trim_history(mut history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    history.sort_by(|a, b| numeric_ts(&a.ts).total_cmp(&numeric_ts(&b.ts)));
    if history.is_empty() {
        return history;
    }
    history.remove(0);
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history.split_off(skip)
}

#[must_use]
pub fn to_turns(history: &[HistoryEntry]) -> Vec<ConversationTurn> {
    history.iter().map(ConversationTurn::from).collect()
}

/// Full history pipeline: sort, trim, map roles.
#[must_use]
pub fn prepare_turns(history: Vec<HistoryEntry>) -> Vec<ConversationTurn> {
    to_turns(&trim_history(history))
}
