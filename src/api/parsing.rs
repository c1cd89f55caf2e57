use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::core::models::InboundEvent;
use crate::errors::BotError;

/// A parsed Events API request body.
#[derive(Debug)]
pub enum Callback {
    UrlVerification { challenge: String },
    Message(InboundEvent),
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

/// Returns the request body as text, decoding it when API Gateway marked it
/// base64-encoded.
///
/// # Errors
///
/// Returns `BotError::ParseError` if the body is missing, not a string, or not
/// valid base64/UTF-8.
pub fn extract_body(payload: &Value) -> Result<String, BotError> {
    let body = payload
        .get("body")
        .ok_or_else(|| BotError::ParseError("Missing body".to_string()))?
        .as_str()
        .ok_or_else(|| BotError::ParseError("Invalid body format".to_string()))?;

    let is_base64 = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !is_base64 {
        return Ok(body.to_string());
    }

    let decoded = STANDARD
        .decode(body)
        .map_err(|e| BotError::ParseError(format!("Invalid base64 body: {e}")))?;
    String::from_utf8(decoded)
        .map_err(|e| BotError::ParseError(format!("Body is not UTF-8: {e}")))
}

/// # Errors
///
/// Returns `BotError::ParseError` if the body is not JSON or lacks the event fields.
pub fn parse_callback(body: &str) -> Result<Callback, BotError> {
    let json_body: Value = serde_json::from_str(body)
        .map_err(|e| BotError::ParseError(format!("Invalid JSON body: {e}")))?;

    if json_body.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = json_body
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        return Ok(Callback::UrlVerification { challenge });
    }

    serde_json::from_value(json_body)
        .map(Callback::Message)
        .map_err(|e| BotError::ParseError(format!("Unexpected event payload: {e}")))
}
