//! monday.com webhook and item type definitions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;

use crate::error::RelayError;

// =========================================================================
// Inbound webhook
// =========================================================================

/// Classified inbound webhook body.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    /// Endpoint verification; the token is echoed back unchanged.
    Challenge(Value),
    /// Item activity to relay.
    Event(WebhookEvent),
}

impl WebhookPayload {
    /// Parse and classify a raw request body.
    ///
    /// `challenge` wins when both keys are present.
    pub fn parse(body: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RelayError::MalformedPayload(e.to_string()))?;

        let Value::Object(mut object) = value else {
            return Err(RelayError::UnrecognizedPayload);
        };

        if let Some(challenge) = object.remove("challenge") {
            return Ok(Self::Challenge(challenge));
        }

        if let Some(event) = object.remove("event") {
            let event: WebhookEvent = serde_json::from_value(event)
                .map_err(|e| RelayError::MalformedPayload(format!("invalid event: {e}")))?;
            return Ok(Self::Event(event));
        }

        Err(RelayError::UnrecognizedPayload)
    }
}

/// The `event` record of a monday.com webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Board the item lives on
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub board_id: Option<String>,
    /// Item ("pulse") that triggered the event
    #[serde(deserialize_with = "deserialize_id")]
    pub pulse_id: String,
    /// Plain-text body of the update that triggered the event
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub text_body: String,
    /// Event type, e.g. `create_update`
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    /// User who triggered the event
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub user_id: Option<String>,
}

/// monday.com sends ids as integers in webhooks but as strings in GraphQL.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn deserialize_opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// =========================================================================
// Item snapshot
// =========================================================================

/// Column type tag as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// `mirror`: display value holds linked item id(s)
    Mirror,
    /// `board_relation`: display value holds linked item name(s)
    BoardRelation,
    /// Any other column type
    Other(String),
}

impl From<&str> for ColumnKind {
    fn from(tag: &str) -> Self {
        match tag {
            "mirror" => Self::Mirror,
            "board_relation" => Self::BoardRelation,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mirror => write!(f, "mirror"),
            Self::BoardRelation => write!(f, "board_relation"),
            Self::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// One entry of an item's `column_values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    /// Column id, e.g. `connect_boards6`
    pub id: String,
    /// Column type
    pub kind: ColumnKind,
    /// Column title from the nested `column { title }` selection
    pub title: Option<String>,
    /// Raw JSON-encoded value
    pub value: Option<String>,
    /// Text rendering
    pub text: Option<String>,
    /// Only present on mirror and board relation columns
    pub display_value: Option<String>,
}

impl ColumnRecord {
    /// Extract a column from its JSON representation.
    ///
    /// Returns the name of the first missing required key on failure.
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        let id = value.get("id").and_then(Value::as_str).ok_or("id")?;
        let kind = value.get("type").and_then(Value::as_str).ok_or("type")?;

        let text_field = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);

        Ok(Self {
            id: id.to_string(),
            kind: ColumnKind::from(kind),
            title: value
                .pointer("/column/title")
                .and_then(Value::as_str)
                .map(String::from),
            value: text_field("value"),
            text: text_field("text"),
            display_value: text_field("display_value"),
        })
    }

    /// Display value, treating an empty string as absent.
    #[must_use]
    pub fn non_empty_display_value(&self) -> Option<&str> {
        self.display_value.as_deref().filter(|v| !v.is_empty())
    }

    /// Title used in update text; falls back to the column id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// The fields of the item query the relay relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// Item name
    pub item_name: String,
    /// Display name of the API token's user (`me.name`)
    pub user_name: String,
    /// Columns in API order
    pub columns: Vec<ColumnRecord>,
}

impl ItemSnapshot {
    /// Extract a snapshot from the raw item query response.
    pub fn from_response(response: &Value) -> Result<Self, RelayError> {
        let missing = |path: String| RelayError::MalformedUpstreamData(path);

        let data = response
            .get("data")
            .ok_or_else(|| missing("data".into()))?;

        let user_name = data
            .pointer("/me/name")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("data.me.name".into()))?;

        let item = data
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .ok_or_else(|| missing("data.items[0]".into()))?;

        let item_name = item
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("data.items[0].name".into()))?;

        let columns = item
            .get("column_values")
            .and_then(Value::as_array)
            .ok_or_else(|| missing("data.items[0].column_values".into()))?
            .iter()
            .enumerate()
            .map(|(i, column)| {
                ColumnRecord::from_value(column)
                    .map_err(|key| missing(format!("data.items[0].column_values[{i}].{key}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            item_name: item_name.to_string(),
            user_name: user_name.to_string(),
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_challenge() {
        let payload = WebhookPayload::parse(br#"{"challenge": "abc123"}"#).unwrap();
        assert_eq!(payload, WebhookPayload::Challenge(json!("abc123")));
    }

    #[test]
    fn test_challenge_takes_precedence() {
        let body = br#"{"challenge": "abc", "event": {"pulseId": 1}}"#;
        assert!(matches!(
            WebhookPayload::parse(body).unwrap(),
            WebhookPayload::Challenge(_)
        ));
    }

    #[test]
    fn test_parse_event_with_numeric_ids() {
        let body = br#"{
            "event": {
                "app": "monday",
                "type": "create_update",
                "boardId": 1234567890,
                "pulseId": 9876543210,
                "userId": 42,
                "textBody": "Called the client"
            }
        }"#;

        let WebhookPayload::Event(event) = WebhookPayload::parse(body).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.board_id.as_deref(), Some("1234567890"));
        assert_eq!(event.pulse_id, "9876543210");
        assert_eq!(event.user_id.as_deref(), Some("42"));
        assert_eq!(event.text_body, "Called the client");
        assert_eq!(event.event_type.as_deref(), Some("create_update"));
    }

    #[test]
    fn test_parse_event_string_ids_and_no_text() {
        let body = br#"{"event": {"pulseId": "55", "textBody": null}}"#;
        let WebhookPayload::Event(event) = WebhookPayload::parse(body).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.pulse_id, "55");
        assert!(event.board_id.is_none());
        assert_eq!(event.text_body, "");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            WebhookPayload::parse(b"{not json"),
            Err(RelayError::MalformedPayload(_))
        ));
        assert!(matches!(
            WebhookPayload::parse(br#"{"hello": "world"}"#),
            Err(RelayError::UnrecognizedPayload)
        ));
        assert!(matches!(
            WebhookPayload::parse(b"[1, 2, 3]"),
            Err(RelayError::UnrecognizedPayload)
        ));
        assert!(matches!(
            WebhookPayload::parse(br#"{"event": {"boardId": 1}}"#),
            Err(RelayError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_non_object_event_is_malformed() {
        for body in [&br#"{"event": null}"#[..], br#"{"event": 5}"#, br#"{"event": "x"}"#] {
            assert!(matches!(
                WebhookPayload::parse(body),
                Err(RelayError::MalformedPayload(_))
            ));
        }
    }

    #[test]
    fn test_column_kind_from_tag() {
        assert_eq!(ColumnKind::from("mirror"), ColumnKind::Mirror);
        assert_eq!(ColumnKind::from("board_relation"), ColumnKind::BoardRelation);
        assert_eq!(
            ColumnKind::from("status"),
            ColumnKind::Other("status".to_string())
        );
        assert_eq!(ColumnKind::from("status").to_string(), "status");
    }

    #[test]
    fn test_snapshot_from_response() {
        let response = json!({
            "data": {
                "me": { "name": "Alice" },
                "items": [{
                    "name": "Demo",
                    "column_values": [
                        {
                            "id": "connect_boards6",
                            "type": "board_relation",
                            "value": null,
                            "text": null,
                            "column": { "title": "Clients" },
                            "display_value": "Acme"
                        },
                        {
                            "id": "status",
                            "type": "status",
                            "value": "{\"index\":1}",
                            "text": "Done",
                            "column": { "title": "Status" }
                        }
                    ]
                }]
            },
            "account_id": 1
        });

        let snapshot = ItemSnapshot::from_response(&response).unwrap();
        assert_eq!(snapshot.item_name, "Demo");
        assert_eq!(snapshot.user_name, "Alice");
        assert_eq!(snapshot.columns.len(), 2);

        let relation = &snapshot.columns[0];
        assert_eq!(relation.kind, ColumnKind::BoardRelation);
        assert_eq!(relation.label(), "Clients");
        assert_eq!(relation.non_empty_display_value(), Some("Acme"));

        let status = &snapshot.columns[1];
        assert_eq!(status.text.as_deref(), Some("Done"));
        assert!(status.display_value.is_none());
    }

    #[test]
    fn test_snapshot_missing_fields() {
        let cases = [
            (json!({}), "data"),
            (json!({"data": {"items": []}}), "data.me.name"),
            (json!({"data": {"me": {"name": "A"}, "items": []}}), "data.items[0]"),
            (
                json!({"data": {"me": {"name": "A"}, "items": [{"column_values": []}]}}),
                "data.items[0].name",
            ),
            (
                json!({"data": {"me": {"name": "A"}, "items": [{"name": "I"}]}}),
                "data.items[0].column_values",
            ),
            (
                json!({"data": {"me": {"name": "A"}, "items": [{
                    "name": "I",
                    "column_values": [{"id": "x"}]
                }]}}),
                "data.items[0].column_values[0].type",
            ),
        ];

        for (response, expected) in cases {
            match ItemSnapshot::from_response(&response) {
                Err(RelayError::MalformedUpstreamData(path)) => assert_eq!(path, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let column = ColumnRecord::from_value(&json!({"id": "mirror1", "type": "mirror"})).unwrap();
        assert_eq!(column.label(), "mirror1");
        assert!(column.non_empty_display_value().is_none());
    }
}
