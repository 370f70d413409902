//! CSV バッチランナー。
//!
//! `address` 列を持つ CSV を読み、1 行ずつ am-api の POST /api/addresses に
//! かけてスコアとレビュー判定を結果 CSV に書き出す。行単位のエラーでは
//! 止めず、エラー内容を結果行に残して先へ進む。

use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use am_common::logging::{init_tracing, install_panic_hook};

const PROGRESS_EVERY: usize = 25;

#[derive(Debug, Clone, Parser)]
#[command(name = "am-batch", about = "Score a CSV of addresses through am-api")]
struct Cli {
    /// Input CSV with an `address` column
    #[arg(long, default_value = "data/addresses.csv")]
    input: PathBuf,

    /// Output CSV path
    #[arg(long, default_value = "data/result.csv")]
    output: PathBuf,

    /// Base URL of a running am-api instance
    #[arg(long, env = "AM_API_BASE", default_value = "http://localhost:8000")]
    api_base: String,

    /// API key forwarded as X-API-Key (omit for unauthenticated instances)
    #[arg(long, env = "AM_API_KEY")]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Debug, Error)]
enum BatchError {
    #[error("failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("input CSV must have an `address` column (found: {found:?})")]
    MissingAddressColumn { found: Vec<String> },
    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    #[serde(default)]
    matched_address: Option<String>,
    score: f64,
    decision: String,
}

#[derive(Debug, Serialize)]
struct ResultRow {
    address: String,
    matched_address: String,
    score: f64,
    decision: String,
    error: String,
}

impl ResultRow {
    fn failed(address: String, error: String) -> Self {
        Self {
            address,
            matched_address: String::new(),
            score: 0.0,
            decision: "manual_review".into(),
            error,
        }
    }
}

fn read_addresses(path: &PathBuf) -> Result<Vec<String>, BatchError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| BatchError::Input {
        path: path.clone(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| BatchError::Input {
            path: path.clone(),
            source,
        })?
        .clone();
    let address_idx = headers
        .iter()
        .position(|h| h == "address")
        .ok_or_else(|| BatchError::MissingAddressColumn {
            found: headers.iter().map(str::to_string).collect(),
        })?;

    let mut addresses = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| BatchError::Input {
            path: path.clone(),
            source,
        })?;
        let address = record.get(address_idx).unwrap_or("").trim().to_string();
        addresses.push(address);
    }
    Ok(addresses)
}

async fn score_one(
    client: &reqwest::Client,
    cli: &Cli,
    address: &str,
) -> Result<ScoreResponse, reqwest::Error> {
    let url = format!("{}/api/addresses", cli.api_base.trim_end_matches('/'));
    let mut request = client
        .post(url)
        .json(&serde_json::json!({ "address": address }));
    if let Some(key) = &cli.api_key {
        request = request.header("x-api-key", key);
    }

    request.send().await?.error_for_status()?.json().await
}

async fn run(cli: Cli) -> Result<(), BatchError> {
    let addresses = read_addresses(&cli.input)?;
    let total = addresses.len();
    info!(input = %cli.input.display(), total, "batch started");

    if let Some(parent) = cli.output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(cli.timeout_secs))
        .build()
        .map_err(BatchError::Client)?;

    let mut rows = Vec::with_capacity(total);
    let mut failures = 0usize;

    for (idx, address) in addresses.into_iter().enumerate() {
        if address.is_empty() {
            rows.push(ResultRow::failed(address, "empty address".into()));
            continue;
        }

        match score_one(&client, &cli, &address).await {
            Ok(response) => rows.push(ResultRow {
                address,
                matched_address: response.matched_address.unwrap_or_default(),
                score: response.score,
                decision: response.decision,
                error: String::new(),
            }),
            Err(err) => {
                failures += 1;
                warn!(row = idx + 1, address = %address, error = %err, "row failed");
                rows.push(ResultRow::failed(address, err.to_string()));
            }
        }

        if (idx + 1) % PROGRESS_EVERY == 0 {
            info!(processed = idx + 1, total, "progress");
        }
    }

    let mut writer = csv::Writer::from_path(&cli.output).map_err(|source| BatchError::Output {
        path: cli.output.clone(),
        source,
    })?;
    for row in &rows {
        writer.serialize(row).map_err(|source| BatchError::Output {
            path: cli.output.clone(),
            source,
        })?;
    }
    writer.flush()?;

    info!(
        output = %cli.output.display(),
        total,
        failures,
        "batch finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing(env!("CARGO_PKG_NAME"));
    install_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "am-batch failed");
        std::process::exit(1);
    }
}
