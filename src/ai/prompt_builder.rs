//! Prompt assembly for thread replies.

use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};

use crate::core::models::{ConversationTurn, TurnRole};

/// Opening user turn that frames the conversation as a role-play.
pub const PRIMING_USER_TURN: &str = "これからロールプレイをしましょう。あなたはこのSlackワークスペースで働く親切なアシスタントです。スレッドのこれまでのやり取りを踏まえて、質問や依頼に日本語で簡潔に答えてください。";

/// Assistant acknowledgement of the role-play framing.
pub const PRIMING_ASSISTANT_TURN: &str =
    "承知しました。ロールプレイを始めます。スレッドの流れを踏まえてお手伝いします。";

fn message(role: MessageRole, text: &str) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Content::Text(text.to_string()),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Priming preamble, prior turns in order, then the new user message.
#[must_use]
pub fn build_prompt(text: &str, history: &[ConversationTurn]) -> Vec<ChatCompletionMessage> {
    let mut chat = Vec::with_capacity(history.len() + 3);
    chat.push(message(MessageRole::user, PRIMING_USER_TURN));
    chat.push(message(MessageRole::assistant, PRIMING_ASSISTANT_TURN));

    for turn in history {
        let role = match turn.role {
            TurnRole::User => MessageRole::user,
            TurnRole::Assistant => MessageRole::assistant,
        };
        chat.push(message(role, &turn.content));
    }

    chat.push(message(MessageRole::user, text));
    chat
}
