//! Lambda entrypoint - request validation in front of the relay.
//!
//! This module handles:
//! - Slack retry suppression (`X-Slack-Retry-Num`)
//! - Body extraction and JSON parsing
//! - The `url_verification` handshake
//! - Mapping relay results onto HTTP-style responses

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::event_handler::Relay;
use super::helpers;
use super::parsing::{self, Callback};

pub const RETRY_HEADER: &str = "X-Slack-Retry-Num";
pub const RETRY_ACK_MESSAGE: &str = "No need to resend";

/// Lambda handler for the webhook.
///
/// # Errors
///
/// Never fails at the Lambda level; every outcome is encoded in the returned
/// `statusCode`.
pub async fn function_handler(relay: &Relay, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "slack_event",
        correlation_id = %correlation_id,
        request_id = %event.context.request_id
    );
    Ok(process_request(relay, &event.payload).instrument(span).await)
}

/// Turns one HTTP-style request payload into a response.
pub async fn process_request(relay: &Relay, payload: &Value) -> Value {
    let headers = payload.get("headers").cloned().unwrap_or(Value::Null);

    // ========================================================================
    // Retry deliveries are acknowledged without processing
    // ========================================================================

    if let Some(retry_num) = parsing::get_header_value(&headers, RETRY_HEADER) {
        info!(retry_num = %retry_num, "Ignoring Slack retry delivery");
        return helpers::ok_message(RETRY_ACK_MESSAGE);
    }

    info!("event.headers: {}", headers);

    let body = match parsing::extract_body(payload) {
        Ok(body) => body,
        Err(e) => {
            error!("Invalid request: {}", e);
            return helpers::err_response(400, &e.to_string());
        }
    };
    info!("event.body: {}", body);

    let inbound = match parsing::parse_callback(&body) {
        Ok(Callback::UrlVerification { challenge }) => {
            return helpers::challenge_response(&challenge);
        }
        Ok(Callback::Message(inbound)) => inbound,
        Err(e) => {
            error!("Invalid request: {}", e);
            return helpers::err_response(400, &e.to_string());
        }
    };

    match relay.handle_message(&inbound).await {
        Ok(message) => helpers::ok_message(&message),
        Err(e) => {
            error!("Failed to handle event: {}", e);
            helpers::err_response(500, &e.to_string())
        }
    }
}
