use std::sync::Arc;

use anyhow::Context;
use thread_gpt::api::{Relay, handler};
use thread_gpt::core::config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    thread_gpt::setup_logging();

    let config = AppConfig::from_env().context("loading configuration")?;
    let relay = Arc::new(Relay::from_config(&config));
    info!(
        workspace_id = %config.workspace_id,
        model = %config.model_name(),
        "Relay configured"
    );

    lambda_runtime::run(lambda_runtime::service_fn(move |event| {
        let relay = Arc::clone(&relay);
        async move { handler(&relay, event).await }
    }))
    .await
}
