use std::collections::HashMap;
use std::env;

use crate::errors::BotError;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_org_id: Option<String>,
    pub openai_model: Option<String>,
    pub openai_image_model: Option<String>,
    pub openai_image_size: Option<String>,
    pub openai_api_base: Option<String>,
    pub slack_api_base: Option<String>,
    pub workspace_id: String,
    pub slack_bot_token: String,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `BotError::ConfigError` naming the first required variable that is
    /// missing or empty.
    pub fn from_env() -> Result<Self, BotError> {
        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_org_id: optional("OPENAI_ORG_ID"),
            openai_model: optional("OPENAI_MODEL"),
            openai_image_model: optional("OPENAI_IMAGE_MODEL"),
            openai_image_size: optional("OPENAI_IMAGE_SIZE"),
            openai_api_base: optional("OPENAI_API_BASE"),
            slack_api_base: optional("SLACK_API_BASE"),
            workspace_id: required("WORKSPACE_ID")?,
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
        })
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        self.openai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    #[must_use]
    pub fn openai_base(&self) -> &str {
        self.openai_api_base
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_API_BASE)
    }

    #[must_use]
    pub fn slack_base(&self) -> &str {
        self.slack_api_base.as_deref().unwrap_or(DEFAULT_SLACK_API_BASE)
    }

    /// Builds the workspace credential table. Only one workspace is configured
    /// today.
    #[must_use]
    pub fn workspace_tokens(&self) -> WorkspaceTokens {
        WorkspaceTokens::from_pairs([(
            self.workspace_id.clone(),
            self.slack_bot_token.clone(),
        )])
    }
}

fn required(name: &str) -> Result<String, BotError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        Ok(_) => Err(BotError::ConfigError(format!("{name}: empty value"))),
        Err(e) => Err(BotError::ConfigError(format!("{name}: {e}"))),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read-only mapping from Slack workspace (team) id to bot token.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceTokens {
    tokens: HashMap<String, String>,
}

impl WorkspaceTokens {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            tokens: pairs.into_iter().collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `BotError::UnknownWorkspace` when no token is registered for `team_id`.
    pub fn token_for(&self, team_id: &str) -> Result<&str, BotError> {
        self.tokens
            .get(team_id)
            .map(String::as_str)
            .ok_or_else(|| BotError::UnknownWorkspace(team_id.to_string()))
    }
}
