//! Per-partition log-to-search indexing engine.
//!
//! Runs one `IndexerWorker` per configured partition, each driving the
//! fetch -> transform -> stage -> post -> commit round loop against a
//! Kafka-compatible broker and an Elasticsearch-style search backend, and
//! exposes a minimal HTTP health/status surface over the aggregate.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use indexer_core::PartitionId;
use indexer_worker::{IndexerWorker, PartitionSupervisor, PassthroughHandler, WorkerConfig};
use logsource::{BrokerConfig, KafkaLogClient, PartitionConfig};
use searchsink::{EsSinkClient, SinkClient, SinkConfig};
use telemetry::{health, init_tracing_from_env};
use tokio_util::sync::CancellationToken;

/// One partition this process instance is responsible for.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PartitionSpec {
    topic: String,
    partition: i32,
}

/// Application configuration, loaded via `config` + `dotenvy` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    broker: BrokerConfig,
    #[serde(default)]
    sink: SinkConfig,
    #[serde(default)]
    partitions: Vec<PartitionSpec>,

    #[serde(default = "default_consumer_group_name")]
    consumer_group_name: String,
    #[serde(default = "default_sleep_ms")]
    sleep_between_fetches_ms: u64,
    #[serde(default)]
    is_dry_run: bool,
    #[serde(default)]
    is_perf_reporting_enabled: bool,
    #[serde(default)]
    initial_offset_policy: indexer_core::InitialOffsetPolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_consumer_group_name() -> String {
    "indexer-engine".to_string()
}

fn default_sleep_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            broker: BrokerConfig::default(),
            sink: SinkConfig::default(),
            partitions: vec![PartitionSpec { topic: "access-logs".to_string(), partition: 0 }],
            consumer_group_name: default_consumer_group_name(),
            sleep_between_fetches_ms: default_sleep_ms(),
            is_dry_run: false,
            is_perf_reporting_enabled: false,
            initial_offset_policy: indexer_core::InitialOffsetPolicy::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider BEFORE any TLS operations
    // rustls 0.23+ requires explicit crypto provider selection
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting indexer engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        brokers = ?config.broker.brokers,
        partitions = config.partitions.len(),
        "Loaded configuration"
    );

    check_health(&config).await;

    // Shared across every worker: a SIGTERM/Ctrl-C cancels it directly, a
    // second termination path distinct from the cooperative shutdown flag
    // `PartitionSupervisor::shutdown` sets via `request_shutdown()`.
    let cancellation = CancellationToken::new();

    let mut workers = Vec::with_capacity(config.partitions.len());
    for spec in &config.partitions {
        let partition_id = PartitionId::new(spec.topic.clone(), spec.partition);

        let mut partition_cfg = PartitionConfig::new(spec.topic.clone(), spec.partition);
        partition_cfg.consumer_group_name = config.consumer_group_name.clone();
        partition_cfg.initial_offset_policy = config.initial_offset_policy;

        let log_client = Arc::new(KafkaLogClient::new(config.broker.clone(), partition_cfg));

        let sink_client: Arc<dyn SinkClient> = Arc::new(
            EsSinkClient::new(config.sink.clone()).context("Failed to build search sink client")?,
        );
        let handler = Arc::new(PassthroughHandler::new(sink_client));

        let mut worker_cfg = WorkerConfig::new(spec.topic.clone(), spec.partition);
        worker_cfg.consumer_group_name = config.consumer_group_name.clone();
        worker_cfg.sleep_between_fetches_ms = config.sleep_between_fetches_ms;
        worker_cfg.is_dry_run = config.is_dry_run;
        worker_cfg.is_perf_reporting_enabled = config.is_perf_reporting_enabled;
        worker_cfg.initial_offset_policy = config.initial_offset_policy;

        let worker = Arc::new(
            IndexerWorker::new(worker_cfg, handler, log_client, cancellation.clone())
                .with_context(|| format!("invalid worker configuration for {partition_id}"))?,
        );
        workers.push(worker);
    }

    let supervisor = PartitionSupervisor::spawn(workers.clone());
    let state = AppState::new(supervisor.status_handles());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancellation))
        .await
        .context("Server error")?;

    info!("Shutting down...");
    supervisor.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("INDEXER")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    if let Ok(brokers) = std::env::var("INDEXER_BROKER_BROKERS") {
        config.broker.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Ok(username) = std::env::var("INDEXER_BROKER_SASL_USERNAME") {
        config.broker.sasl_username = Some(username);
    }
    if let Ok(password) = std::env::var("INDEXER_BROKER_SASL_PASSWORD") {
        config.broker.sasl_password = Some(password);
    }
    if let Ok(url) = std::env::var("INDEXER_SINK_URL") {
        config.sink.url = url;
    }

    Ok(config)
}

/// Check component health on startup.
async fn check_health(config: &Config) {
    let broker_healthy = logsource::health::check_connection(&config.broker).await;
    if broker_healthy {
        health().broker.set_healthy();
        info!("broker connection: healthy");
    } else {
        health().broker.set_unhealthy("connection failed");
        error!("broker connection: unhealthy");
    }

    let sink_healthy = searchsink::health::check_connection(&config.sink).await;
    if sink_healthy {
        health().sink.set_healthy();
        info!("sink connection: healthy");
    } else {
        health().sink.set_unhealthy("connection failed");
        error!("sink connection: unhealthy");
    }
}

/// Graceful shutdown signal handler. Cancels `cancellation` directly, so
/// every worker's execution context is torn down immediately rather than
/// only at its next round boundary.
async fn shutdown_signal(cancellation: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }

    cancellation.cancel();
}
