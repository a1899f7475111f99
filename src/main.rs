use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use limbscan::clients::{InferenceClient, LegAnalyzer, OpenAiClient};
use limbscan::config::{AppConfig, Args};
use limbscan::{init_tracing, server};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_args(Args::parse())?;
    init_tracing(&config.log_filter);

    let clients = config
        .credentials
        .iter()
        .cloned()
        .map(|creds| {
            OpenAiClient::new(creds, config.request_timeout)
                .map(|client| Arc::new(client) as Arc<dyn InferenceClient>)
        })
        .collect::<Result<Vec<_>>>()?;
    let analyzer = Arc::new(LegAnalyzer::new(clients, config.instruction.clone())?);

    info!(
        credentials = analyzer.client_count(),
        model = config
            .credentials
            .first()
            .map(|creds| creds.model.as_str())
            .unwrap_or_default(),
        timeout_secs = config.request_timeout.as_secs(),
        "Starting LimbScan"
    );
    server::run(&config, analyzer).await
}
