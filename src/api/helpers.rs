//! Response builders for the HTTP-style Lambda response.

use serde_json::{Value, json};

/// Returns a 200 OK response whose body carries `message`.
#[must_use]
pub fn ok_message(message: &str) -> Value {
    json!({
        "statusCode": 200,
        "body": json!({ "message": message }).to_string()
    })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "body": json!({ "message": message }).to_string()
    })
}

/// Answers Slack's `url_verification` handshake.
#[must_use]
pub fn challenge_response(challenge: &str) -> Value {
    json!({
        "statusCode": 200,
        "body": challenge
    })
}
