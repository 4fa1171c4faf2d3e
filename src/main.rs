use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ecg_digitize::{
    config::ClientConfig,
    models::upload::{UploadRequest, UploadResult},
    services::{capture, upload::UploadClient},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Upload an ECG capture to the digitization service and print the result as JSON.
#[derive(Debug, Parser)]
#[command(name = "ecg-digitize", version)]
struct Args {
    /// Image to upload (JPEG, PNG or WebP; non-JPEG input is re-encoded)
    #[arg(short, long)]
    image: PathBuf,

    /// Digitization endpoint, overrides DIGITIZE_ENDPOINT
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Filename reported to the server, overrides DIGITIZE_FILENAME
    #[arg(long)]
    filename: Option<String>,

    /// Extra form field as NAME=VALUE (repeatable)
    #[arg(short = 'F', long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Structured logs go to stderr; stdout carries the result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    metrics::describe_counter!("digitize_uploads_total", "Total capture uploads attempted");
    metrics::describe_counter!(
        "digitize_uploads_failed",
        "Uploads that did not produce a successful digitization"
    );
    metrics::describe_histogram!(
        "digitize_upload_seconds",
        "Round-trip time of a capture upload"
    );

    let args = Args::parse();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling upload");
            on_signal.cancel();
        }
    });

    match run(args, &cancel).await {
        Ok(Some(result)) => {
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize result");
                    return ExitCode::from(2);
                }
            }
            if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Ok(None) => ExitCode::from(130),
        Err(e) => {
            tracing::error!(error = %e, "Upload did not complete");
            ExitCode::from(2)
        }
    }
}

async fn run(
    args: Args,
    cancel: &CancellationToken,
) -> Result<Option<UploadResult>, Box<dyn std::error::Error>> {
    let mut overrides = Vec::new();
    if let Some(endpoint) = args.endpoint {
        overrides.push(("ENDPOINT", endpoint));
    }
    if let Some(filename) = args.filename {
        overrides.push(("FILENAME", filename));
    }
    let config = ClientConfig::from_env_with(overrides)?;

    tracing::info!(image = %args.image.display(), "Reading capture");
    let raw = tokio::fs::read(&args.image).await?;
    let jpeg = capture::to_jpeg(&raw, config.jpeg_quality)?;

    let mut builder = UploadRequest::builder(&config.endpoint, jpeg).filename(&config.filename);
    for (name, value) in config.extra_fields().into_iter().chain(args.fields) {
        builder = builder.field(name, value);
    }
    let request = builder.build()?;

    let client = UploadClient::new(&config.user_agent)?;
    match client.submit_until_cancelled(request, cancel).await {
        Some(outcome) => Ok(Some(outcome?)),
        None => Ok(None),
    }
}
