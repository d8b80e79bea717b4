//! Search backend health checks.

use crate::config::SinkConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Checks search backend reachability by probing its cluster health endpoint.
pub async fn check_connection(config: &SinkConfig) -> bool {
    let Ok(http) = Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
    else {
        return false;
    };

    let url = format!("{}/_cluster/health", config.url.trim_end_matches('/'));
    let mut request = http.get(&url);
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        request = request.basic_auth(username, Some(password));
    }

    match request.send().await {
        Ok(response) if response.status().is_success() => {
            debug!("search backend connection healthy");
            true
        }
        Ok(response) => {
            error!(status = %response.status(), "search backend health check failed");
            false
        }
        Err(e) => {
            error!("search backend health check failed: {}", e);
            false
        }
    }
}
