/// thread-gpt - A Slack bot that answers mentions with `OpenAI` chat completions
/// and generated images, replying inside the originating thread.
///
/// The crate is deployed as a single AWS Lambda behind an HTTP endpoint that
/// receives Slack Events API callbacks. For each event it:
/// 1. Drops Slack retry deliveries
/// 2. Resolves the bot token of the sending workspace
/// 3. Either generates an image (message contains `[ai_img]`) and uploads it to
///    the thread, or replays the thread history to the chat model and posts the
///    reply
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda (`lambda_runtime`) for serverless execution
/// - reqwest for the Slack Web API and `OpenAI` calls
/// - openai-api-rs message types for prompt assembly
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use thread_gpt::api::{Relay, process_request};
/// use thread_gpt::core::config::AppConfig;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     thread_gpt::setup_logging();
///
///     let config = AppConfig {
///         openai_api_key: "dummy_openai_key".to_string(),
///         openai_org_id: None,
///         openai_model: None,
///         openai_image_model: None,
///         openai_image_size: None,
///         openai_api_base: None,
///         slack_api_base: None,
///         workspace_id: "T12345678".to_string(),
///         slack_bot_token: "dummy_token".to_string(),
///     };
///     let relay = Arc::new(Relay::from_config(&config));
///
///     let request = serde_json::json!({
///         "headers": {},
///         "body": serde_json::json!({
///             "team_id": "T12345678",
///             "event": {"channel": "C12345678", "ts": "1700000000.000100", "text": "<@U1> Hello"}
///         }).to_string()
///     });
///     let response = process_request(&relay, &request).await;
///     println!("{response}");
///
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod api;
pub mod core;
pub mod errors;
pub mod slack;
pub mod utils;

pub use errors::BotError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. The level comes from `RUST_LOG` and defaults
/// to `info`. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// thread_gpt::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
