//! Delivery-status webhook.
//!
//! The provider retries any callback that does not get a 200, so every
//! outcome here answers 200 and failures are only logged.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    routing::post,
    Form, Router,
};
use serde::Deserialize;

use crate::AppState;

use super::queries;

/// Form fields of a status callback
#[derive(Debug, Deserialize)]
pub struct StatusCallback {
    #[serde(rename = "MessageSid")]
    pub message_sid: String,
    #[serde(rename = "MessageStatus")]
    pub message_status: String,
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
}

const KNOWN_STATUSES: [&str; 8] = [
    "accepted",
    "queued",
    "sending",
    "sent",
    "delivered",
    "read",
    "undelivered",
    "failed",
];

pub fn router() -> Router<AppState> {
    Router::new().route("/whatsapp/status", post(whatsapp_status))
}

async fn whatsapp_status(
    State(state): State<AppState>,
    callback: Result<Form<StatusCallback>, FormRejection>,
) -> StatusCode {
    let Form(callback) = match callback {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!("Malformed WhatsApp status callback: {}", e);
            return StatusCode::OK;
        }
    };

    let status = callback.message_status.trim().to_ascii_lowercase();
    if !KNOWN_STATUSES.contains(&status.as_str()) {
        tracing::warn!(
            sid = %callback.message_sid,
            "Unknown WhatsApp message status: {}",
            status
        );
        return StatusCode::OK;
    }

    let error_code = callback
        .error_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());

    match queries::update_delivery_status(&state.db, &callback.message_sid, &status, error_code).await {
        Ok(true) => {
            tracing::debug!(sid = %callback.message_sid, status = %status, "Delivery status updated");
        }
        Ok(false) => {
            tracing::warn!(sid = %callback.message_sid, "Status callback for unknown message");
        }
        Err(e) => {
            tracing::error!(sid = %callback.message_sid, "Failed to store delivery status: {}", e);
        }
    }

    StatusCode::OK
}
