//! Search backend connection configuration.

use serde::{Deserialize, Serialize};

/// Search backend (Elasticsearch-style) client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Base URL of the search cluster, e.g. `http://localhost:9200`
    pub url: String,
    /// Default index documents are bulk-indexed into
    #[serde(default = "default_index")]
    pub index: String,
    /// Username (optional, basic auth)
    pub username: Option<String>,
    /// Password (optional, basic auth)
    pub password: Option<String>,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_index() -> String {
    "indexed-records".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: default_index(),
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}
