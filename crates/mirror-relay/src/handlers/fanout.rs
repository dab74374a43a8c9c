//! Relays item activity onto every item linked through a mirror column.
//!
//! For one triggering item:
//! 1. Query the item, its columns and the acting user
//! 2. Build the update text from the item name, user, relation columns and message
//! 3. Post the text as an update on each id listed in a non-empty mirror column
//!
//! Writes are sequential and independent: a failed write is logged and the
//! remaining targets are still attempted.

use serde_json::Value;
use std::fmt::Write as _;
use tracing::{error, info, instrument};

use crate::client::ItemsApi;
use crate::error::RelayError;
use crate::models::{ColumnKind, ColumnRecord, ItemSnapshot};

/// Outcome of one fan-out run.
#[derive(Debug, Clone)]
pub struct FanOutReport {
    /// Raw item query response, returned to the webhook sender
    pub snapshot: Value,
    /// Text posted on each target
    pub update_text: String,
    /// Number of `create_update` calls issued
    pub attempted: usize,
    /// Calls that returned an update id
    pub succeeded: usize,
    /// Calls that failed
    pub failed: usize,
}

/// Build the update body.
///
/// ```text
/// Activity name: {item}
/// Creator: {user}
/// {relation column title}: {display value}   (one per non-empty relation column)
/// Message: {message}
/// ```
#[must_use]
pub fn build_update_text(snapshot: &ItemSnapshot, message: &str) -> String {
    let mut text = format!(
        "Activity name: {}\nCreator: {}\n",
        snapshot.item_name, snapshot.user_name
    );

    for column in snapshot
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::BoardRelation)
    {
        if let Some(value) = column.non_empty_display_value() {
            let _ = writeln!(text, "{}: {value}", column.label());
        }
    }

    let _ = writeln!(text, "Message: {message}");
    text
}

/// Item ids listed in non-empty mirror columns, in column order.
///
/// Mirror display values are comma-separated id lists. Relation columns are
/// never treated as targets.
#[must_use]
pub fn mirror_targets(columns: &[ColumnRecord]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Mirror)
        .filter_map(ColumnRecord::non_empty_display_value)
        .flat_map(|ids| ids.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

/// Fetch `item_id`, then post the update text to every mirrored item.
///
/// Fails only when the item query fails or its response is missing data.
/// Individual write failures are counted in the report.
#[instrument(skip(api, message), fields(item_id = %item_id))]
pub async fn notify(
    api: &dyn ItemsApi,
    item_id: &str,
    message: &str,
) -> Result<FanOutReport, RelayError> {
    let response = api.query_item(item_id).await.map_err(|e| {
        error!(error = %e, "Failed to fetch item info");
        RelayError::UpstreamFetch(e.to_string())
    })?;

    let snapshot = ItemSnapshot::from_response(&response).map_err(|e| {
        error!(error = %e, "Item info is missing expected fields");
        e
    })?;

    info!(
        item_name = %snapshot.item_name,
        user_name = %snapshot.user_name,
        columns = snapshot.columns.len(),
        "Fetched item info"
    );

    let update_text = build_update_text(&snapshot, message);
    let targets = mirror_targets(&snapshot.columns);

    let mut succeeded = 0;
    let mut failed = 0;

    for target in &targets {
        match api.create_update(target, &update_text).await {
            Ok(update_id) => {
                info!(target_item_id = %target, update_id = %update_id, "Update created");
                succeeded += 1;
            }
            Err(e) => {
                let err = RelayError::UpdateCreationFailed {
                    item_id: target.clone(),
                    reason: e.to_string(),
                };
                error!(target_item_id = %target, error = %err, "Error creating update");
                failed += 1;
            }
        }
    }

    if succeeded == 0 {
        info!(attempted = targets.len(), "No linked item found");
    }

    Ok(FanOutReport {
        snapshot: response,
        update_text,
        attempted: targets.len(),
        succeeded,
        failed,
    })
}
