//! `docpush` binary.
//!
//! Reads a service account key and a JSONL file, uploads every object as a
//! new document, and reports progress as it goes.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docpush_firestore::{FirestoreClient, FirestoreConfig};
use docpush_models::{CredentialRecord, LogKind, UploadLogEntry};
use docpush_upload::{
    read_jsonl_file, BatchUploader, ProgressEvent, ProgressReporter, UploadConfig, UploadSummary,
};

const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Upload newline-delimited JSON objects to a Firestore collection.
#[derive(Parser, Debug)]
#[command(name = "docpush", version, about)]
struct Cli {
    /// Service account key file
    #[arg(long, env = "DOCPUSH_CREDENTIALS")]
    credentials: PathBuf,

    /// Target collection
    #[arg(long)]
    collection: String,

    /// JSONL file with one document object per line
    #[arg(long)]
    input: PathBuf,

    /// Documents written concurrently per group
    #[arg(long)]
    batch_size: Option<usize>,

    /// Pause between groups, in milliseconds
    #[arg(long)]
    batch_delay_ms: Option<u64>,

    /// Firestore endpoint, e.g. an emulator
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(summary) if summary.all_succeeded() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_PARTIAL_FAILURE),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("docpush=info,docpush_cli=info,docpush_upload=info,docpush_firestore=info")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<UploadSummary> {
    let key = tokio::fs::read_to_string(&cli.credentials)
        .await
        .with_context(|| format!("Failed to read {}", cli.credentials.display()))?;
    let credential = CredentialRecord::from_json(&key)
        .with_context(|| format!("Invalid key file {}", cli.credentials.display()))?;

    let batch = read_jsonl_file(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    for line_error in &batch.errors {
        warn!(line = line_error.line, "Skipping line: {}", line_error.message);
    }
    info!(
        documents = batch.documents.len(),
        skipped = batch.errors.len(),
        "Loaded input"
    );

    let mut firestore_config = FirestoreConfig::from_env();
    if let Some(base_url) = cli.base_url {
        firestore_config = firestore_config.with_base_url(base_url);
    }

    let mut upload_config = UploadConfig::from_env();
    if let Some(size) = cli.batch_size {
        upload_config.batch_size = size;
    }
    if let Some(ms) = cli.batch_delay_ms {
        upload_config.batch_delay = Duration::from_millis(ms);
    }

    let client = FirestoreClient::new(firestore_config).context("Failed to build HTTP client")?;
    let mut reporter = ProgressReporter::with_capacity(upload_config.log_capacity);
    let uploader = BatchUploader::new(client, upload_config);

    let mut events = reporter.subscribe();
    let renderer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let ProgressEvent::Progress(p) = event {
                println!(
                    "[{:>3}%] {} uploaded, {} failed, {} total",
                    p.percentage, p.completed, p.failed, p.total
                );
            }
        }
    });

    let result = uploader
        .upload(&cli.collection, &credential, &batch.documents, &mut reporter)
        .await;

    // Dropping the reporter closes the event stream.
    let log = reporter.into_log();
    renderer.await.ok();
    print_log(&log);

    let summary = result.context("Upload aborted")?;
    println!(
        "Done: {} uploaded, {} failed of {} documents into '{}'",
        summary.progress.completed, summary.progress.failed, summary.progress.total, cli.collection
    );
    Ok(summary)
}

/// Print the retained log oldest first.
fn print_log(log: &[UploadLogEntry]) {
    for entry in log.iter().rev() {
        let marker = match entry.kind {
            LogKind::Success => "ok ",
            LogKind::Error => "ERR",
            LogKind::Info => "   ",
        };
        match &entry.details {
            Some(details) => println!(
                "{} {} {} ({})",
                entry.timestamp.format("%H:%M:%S%.3f"),
                marker,
                entry.message,
                details
            ),
            None => println!(
                "{} {} {}",
                entry.timestamp.format("%H:%M:%S%.3f"),
                marker,
                entry.message
            ),
        }
    }
}
