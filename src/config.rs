//! Process configuration.
//!
//! Everything is read once by the entry point, validated, and then passed
//! down explicitly. Nothing else in the crate touches the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use reqwest::Url;
use secrecy::SecretString;

use crate::clients::DEFAULT_INSTRUCTION;
use crate::models::Credentials;
use crate::models::credentials::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

#[derive(Parser, Debug, Clone)]
#[command(name = "limbscan", version, about = "Leg image analysis service")]
pub struct Args {
    /// API key(s) for the inference service, comma separated for round-robin
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_delimiter = ',')]
    pub api_key: Vec<String>,

    /// Base URL of the inference API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_ENDPOINT)]
    pub base_url: String,

    /// Vision model used for analysis
    #[arg(long, env = "LIMBSCAN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "LIMBSCAN_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Timeout of one inference call, in seconds
    #[arg(long, env = "LIMBSCAN_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Largest accepted upload, in megabytes
    #[arg(long, env = "LIMBSCAN_MAX_UPLOAD_MB", default_value_t = 10)]
    pub max_upload_mb: usize,

    /// Instruction sent to the model with every image
    #[arg(long, env = "LIMBSCAN_INSTRUCTION")]
    pub instruction: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LIMBSCAN_LOG", default_value = "info")]
    pub log: String,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub credentials: Vec<Credentials>,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub instruction: String,
    pub log_filter: String,
}

impl TryFrom<Args> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> anyhow::Result<Self> {
        let keys: Vec<String> = args
            .api_key
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            bail!("No API key configured. Set OPENAI_API_KEY or pass --api-key.");
        }

        let url = Url::parse(args.base_url.trim())
            .with_context(|| format!("Invalid base URL: '{}'", args.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Base URL must use http or https, got '{}'", url.scheme());
        }
        let endpoint = url.as_str().trim_end_matches('/').to_string();

        if args.timeout_secs == 0 {
            bail!("Timeout must be at least one second");
        }
        if args.max_upload_mb == 0 {
            bail!("Upload limit must be at least one megabyte");
        }

        let model = args.model.trim().to_string();
        if model.is_empty() {
            bail!("Model name must not be empty");
        }

        let credentials = keys
            .into_iter()
            .map(|key| Credentials {
                api_key: SecretString::from(key),
                endpoint: endpoint.clone(),
                model: model.clone(),
            })
            .collect();

        Ok(Self {
            bind: args.bind,
            credentials,
            request_timeout: Duration::from_secs(args.timeout_secs),
            max_upload_bytes: args.max_upload_mb * 1024 * 1024,
            instruction: args
                .instruction
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
            log_filter: args.log,
        })
    }
}

impl AppConfig {
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        Self::try_from(args)
    }
}
