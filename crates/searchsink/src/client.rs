//! Reference [`SinkClient`] implementation backed by an Elasticsearch-style
//! bulk HTTP API.

use crate::config::SinkConfig;
use crate::sink::{BulkAction, BulkItemResult, BulkOutcome, SinkClient};
use async_trait::async_trait;
use indexer_core::{IndexerError, Result};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// `SinkClient` that stages bulk actions in memory and submits them as a
/// single NDJSON request to the search backend's `_bulk` endpoint.
pub struct EsSinkClient {
    config: SinkConfig,
    http: Client,
    staged: Mutex<Vec<BulkAction>>,
}

impl EsSinkClient {
    pub fn new(config: SinkConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| IndexerError::config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            config,
            http,
            staged: Mutex::new(Vec::new()),
        })
    }

    fn bulk_url(&self) -> String {
        format!("{}/_bulk", self.config.url.trim_end_matches('/'))
    }

    fn ndjson_body(&self, actions: &[BulkAction]) -> String {
        let mut body = String::new();
        for action in actions {
            let header = json!({
                "index": { "_index": self.config.index, "_id": action.id }
            });
            body.push_str(&header.to_string());
            body.push('\n');
            body.push_str(&action.document.to_string());
            body.push('\n');
        }
        body
    }
}

#[async_trait]
impl SinkClient for EsSinkClient {
    fn stage(&self, action: BulkAction) {
        self.staged.lock().push(action);
    }

    async fn submit(&self) -> Result<BulkOutcome> {
        let actions = self.staged.lock().clone();
        if actions.is_empty() {
            return Ok(BulkOutcome { items: Vec::new() });
        }

        let body = self.ndjson_body(&actions);
        let mut request = self
            .http
            .post(self.bulk_url())
            .header("Content-Type", "application/x-ndjson")
            .body(body);

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| IndexerError::sink_unreachable(format!("bulk request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(IndexerError::sink_unreachable(format!(
                "search backend returned {status}"
            )));
        }

        let payload: Value = response.json().await.map_err(|e| {
            IndexerError::sink_unreachable(format!("failed to decode bulk response: {e}"))
        })?;

        let items = parse_bulk_response(&actions, &payload);
        debug!(
            staged = actions.len(),
            rejected = items.iter().filter(|i| !i.accepted).count(),
            "bulk submission complete"
        );

        Ok(BulkOutcome { items })
    }

    fn clear(&self) {
        self.staged.lock().clear();
    }

    fn staged_len(&self) -> usize {
        self.staged.lock().len()
    }
}

fn parse_bulk_response(actions: &[BulkAction], payload: &Value) -> Vec<BulkItemResult> {
    let Some(items) = payload.get("items").and_then(Value::as_array) else {
        warn!("bulk response missing items array, treating all as accepted");
        return actions
            .iter()
            .map(|a| BulkItemResult {
                id: a.id.clone(),
                accepted: true,
                error: None,
            })
            .collect();
    };

    items
        .iter()
        .zip(actions.iter())
        .map(|(item, action)| {
            let inner = item.get("index").or_else(|| item.get("create"));
            let status = inner
                .and_then(|v| v.get("status"))
                .and_then(Value::as_u64)
                .unwrap_or(200);
            let accepted = (200..300).contains(&status);
            let error = if accepted {
                None
            } else {
                inner.and_then(|v| v.get("error")).map(|e| e.to_string())
            };
            BulkItemResult {
                id: action.id.clone(),
                accepted,
                error,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_url_strips_trailing_slash() {
        let config = SinkConfig {
            url: "http://localhost:9200/".to_string(),
            ..SinkConfig::default()
        };
        let client = EsSinkClient::new(config).unwrap();
        assert_eq!(client.bulk_url(), "http://localhost:9200/_bulk");
    }

    #[test]
    fn ndjson_body_has_two_lines_per_action() {
        let client = EsSinkClient::new(SinkConfig::default()).unwrap();
        let actions = vec![BulkAction {
            id: "t-0-1".to_string(),
            document: json!({"hello": "world"}),
        }];
        let body = client.ndjson_body(&actions);
        assert_eq!(body.lines().count(), 2);
    }

    #[test]
    fn parse_bulk_response_marks_non_2xx_as_rejected() {
        let actions = vec![BulkAction {
            id: "t-0-1".to_string(),
            document: json!({}),
        }];
        let payload = json!({
            "items": [ { "index": { "status": 400, "error": { "type": "mapper_parsing_exception" } } } ]
        });
        let items = parse_bulk_response(&actions, &payload);
        assert_eq!(items.len(), 1);
        assert!(!items[0].accepted);
        assert!(items[0].error.is_some());
    }
}
