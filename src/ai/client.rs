//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat-completion and image-generation calls.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use super::prompt_builder::build_prompt;
use crate::core::config::{AppConfig, DEFAULT_OPENAI_API_BASE};
use crate::core::models::ConversationTurn;
use crate::core::services::LanguageModel;
use crate::errors::BotError;

const OPENAI_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// LLM API client for thread replies and image generation
pub struct LlmClient {
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    image_model: Option<String>,
    image_size: Option<String>,
    api_base: String,
    http: Client,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, org_id: Option<String>, model_name: String) -> Self {
        Self {
            api_key,
            org_id,
            model_name,
            image_model: None,
            image_size: None,
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            http: Client::builder()
                .timeout(OPENAI_HTTP_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let mut client = Self::new(
            config.openai_api_key.clone(),
            config.openai_org_id.clone(),
            config.model_name().to_string(),
        )
        .with_api_base(config.openai_base());
        client.image_model.clone_from(&config.openai_image_model);
        client.image_size.clone_from(&config.openai_image_size);
        client
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, BotError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| BotError::HttpError(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        if let Some(org) = &self.org_id {
            let org_value = org.parse().map_err(|e| {
                BotError::HttpError(format!("Invalid OpenAI-Organization header: {e}"))
            })?;
            headers.insert("OpenAI-Organization", org_value);
        }

        Ok(headers)
    }

    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, BotError> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_base, endpoint))
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(BotError::OpenAIError(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BotError::OpenAIError(format!("Failed to parse OpenAI response: {e}")))
    }

    /// Sends a prepared prompt to the chat-completion endpoint and returns the
    /// first choice's text.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, `OpenAI` answers non-2xx, or
    /// the response carries no message content.
    pub async fn create_completion(
        &self,
        prompt: &[ChatCompletionMessage],
    ) -> Result<String, BotError> {
        #[cfg(feature = "debug-logs")]
        info!("Using ChatGPT prompt:\n{:?}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            "Requesting completion with {} messages in prompt",
            prompt.len()
        );

        let request_body = json!({
            "model": self.model_name,
            "messages": build_chat_messages(prompt),
        });

        let response_json = self.post_json("chat/completions", &request_body).await?;
        extract_completion_text(&response_json)
    }

    /// Requests a single generated image and returns its hosted URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no URL.
    pub async fn create_image(&self, prompt: &str) -> Result<String, BotError> {
        info!(prompt_chars = prompt.chars().count(), "Requesting image generation");

        let mut request_body = json!({
            "prompt": prompt,
            "n": 1,
        });
        if let Some(model) = &self.image_model {
            request_body["model"] = Value::String(model.clone());
        }
        if let Some(size) = &self.image_size {
            request_body["size"] = Value::String(size.clone());
        }

        let response_json = self
            .post_json("images/generations", &request_body)
            .await?;
        extract_image_url(&response_json)
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, BotError> {
        let prompt = build_prompt(text, history);
        self.create_completion(&prompt).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, BotError> {
        self.create_image(prompt).await
    }
}

/// Converts the prompt into the chat-completions `messages` array.
pub(crate) fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };
            match &m.content {
                Content::Text(t) => Some(json!({ "role": role_str, "content": t })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

fn extract_completion_text(response_json: &Value) -> Result<String, BotError> {
    response_json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| BotError::OpenAIError("No message content in response".to_string()))
}

fn extract_image_url(response_json: &Value) -> Result<String, BotError> {
    response_json
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| BotError::OpenAIError("No image URL in response".to_string()))
}
