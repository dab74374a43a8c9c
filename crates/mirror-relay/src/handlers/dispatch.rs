//! Webhook dispatch: challenge echo or item event fan-out.

use serde_json::{json, Value};
use tracing::info;

use super::fanout::notify;
use crate::client::ItemsApi;
use crate::error::RelayError;
use crate::models::WebhookPayload;

/// Handle one raw webhook body and produce the success response body.
///
/// - `{"challenge": x}` -> `{"challenge": x}`
/// - `{"event": {...}}` -> the item query response, after fan-out
pub async fn dispatch(api: &dyn ItemsApi, body: &[u8]) -> Result<Value, RelayError> {
    match WebhookPayload::parse(body)? {
        WebhookPayload::Challenge(challenge) => {
            info!("Answering webhook challenge");
            Ok(json!({ "challenge": challenge }))
        }
        WebhookPayload::Event(event) => {
            info!(
                board_id = ?event.board_id,
                item_id = %event.pulse_id,
                event_type = ?event.event_type,
                "Received item event"
            );

            let report = notify(api, &event.pulse_id, &event.text_body).await?;

            info!(
                item_id = %event.pulse_id,
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed,
                "Item event relayed"
            );

            Ok(report.snapshot)
        }
    }
}
