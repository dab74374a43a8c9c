//! GraphQL client for the monday.com API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::ClientError;

/// Item, column and acting-user data for one item.
const ITEM_QUERY: &str = r"
    query ($ids: [ID!]) {
        me {
            name
        }
        items(ids: $ids) {
            name
            column_values {
                id
                type
                value
                text
                column {
                    title
                }
                ... on MirrorValue {
                    display_value
                }
                ... on BoardRelationValue {
                    display_value
                }
            }
        }
    }
";

/// Post an update (comment) on an item.
const CREATE_UPDATE_MUTATION: &str = r"
    mutation ($itemId: ID!, $body: String!) {
        create_update(item_id: $itemId, body: $body) {
            id
        }
    }
";

/// The two API calls the relay makes.
#[async_trait]
pub trait ItemsApi: Send + Sync {
    /// Run the item query and return the full response body.
    async fn query_item(&self, item_id: &str) -> Result<Value, ClientError>;

    /// Post `body` as an update on `item_id`, returning the new update id.
    async fn create_update(&self, item_id: &str, body: &str) -> Result<String, ClientError>;
}

/// monday.com GraphQL client
#[derive(Debug, Clone)]
pub struct MondayClient {
    client: reqwest::Client,
    api_url: String,
}

/// GraphQL request body
#[derive(Debug, Serialize)]
struct GraphQLRequest<V: Serialize> {
    query: &'static str,
    variables: V,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

impl MondayClient {
    /// Create a client from the relay configuration.
    ///
    /// monday.com takes the API token as-is in `Authorization`, without a
    /// `Bearer` prefix.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&config.api_token)
            .map_err(|_| ClientError::InvalidHeader("Authorization"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("api-version"),
            HeaderValue::from_str(&config.api_version)
                .map_err(|_| ClientError::InvalidHeader("API-Version"))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// Execute a GraphQL query/mutation and return the raw response body.
    async fn execute<V: Serialize + Send>(
        &self,
        query: &'static str,
        variables: V,
    ) -> Result<Value, ClientError> {
        let request = GraphQLRequest { query, variables };

        let response = self.client.post(&self.api_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;

        if let Some(errors) = body.get("errors").filter(|e| !e.is_null() && !is_empty_array(e)) {
            let messages = serde_json::from_value::<Vec<GraphQLError>>(errors.clone())
                .map(|errors| {
                    errors
                        .into_iter()
                        .map(|e| e.message)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_else(|_| errors.to_string());
            return Err(ClientError::GraphQl(messages));
        }

        Ok(body)
    }
}

fn is_empty_array(value: &Value) -> bool {
    value.as_array().is_some_and(Vec::is_empty)
}

#[async_trait]
impl ItemsApi for MondayClient {
    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn query_item(&self, item_id: &str) -> Result<Value, ClientError> {
        #[derive(Serialize)]
        struct Variables<'a> {
            ids: [&'a str; 1],
        }

        let response = self.execute(ITEM_QUERY, Variables { ids: [item_id] }).await?;
        debug!(response = %response, "Fetched item info");
        Ok(response)
    }

    #[instrument(skip(self, body), fields(item_id = %item_id))]
    async fn create_update(&self, item_id: &str, body: &str) -> Result<String, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Variables<'a> {
            item_id: &'a str,
            body: &'a str,
        }

        let response = self
            .execute(CREATE_UPDATE_MUTATION, Variables { item_id, body })
            .await?;

        let update_id = match response.pointer("/data/create_update/id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ClientError::UnexpectedResponse(
                    "create_update returned no id".into(),
                ))
            }
        };

        debug!(update_id = %update_id, "Created update");
        Ok(update_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        assert!(MondayClient::new(&Config::new("test-token")).is_ok());
    }

    #[test]
    fn test_client_rejects_unprintable_token() {
        assert!(MondayClient::new(&Config::new("bad\ntoken")).is_err());
    }

    #[test]
    fn test_graphql_request_serialization() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Vars {
            item_id: &'static str,
            body: &'static str,
        }

        let request = GraphQLRequest {
            query: CREATE_UPDATE_MUTATION,
            variables: Vars {
                item_id: "123",
                body: "hello",
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["variables"], json!({"itemId": "123", "body": "hello"}));
        assert!(value["query"].as_str().unwrap().contains("create_update"));
    }

    #[test]
    fn test_queries_are_distinct() {
        // Mock servers tell the two calls apart by these substrings
        assert!(!ITEM_QUERY.contains("create_update"));
        assert!(!CREATE_UPDATE_MUTATION.contains("column_values"));
    }

    #[test]
    fn test_is_empty_array() {
        assert!(is_empty_array(&json!([])));
        assert!(!is_empty_array(&json!([{"message": "x"}])));
        assert!(!is_empty_array(&json!(null)));
    }
}
