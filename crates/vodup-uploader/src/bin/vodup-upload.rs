//! CLI for uploading a file through the chunked upload API.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vodup_uploader::{ApiClient, Uploader};

#[derive(Parser)]
#[command(name = "vodup-upload", about = "Upload a video via the chunked upload API")]
struct Cli {
    /// File to upload
    file: PathBuf,

    /// Base URL of the vodup API
    #[arg(long, env = "VODUP_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Chunk size in bytes
    #[arg(long, default_value_t = vodup_models::CHUNK_SIZE)]
    chunk_size: usize,

    /// Skip the client-side SHA-256 integrity digest
    #[arg(long)]
    no_digest: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vodup={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {percent}%")?
            .progress_chars("=>-"),
    );
    bar.set_message(
        cli.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli.file.display().to_string()),
    );

    let progress_bar = bar.clone();
    let mut uploader = Uploader::new(ApiClient::new(&cli.api_url))
        .with_chunk_size(cli.chunk_size)
        .on_progress(move |fraction| {
            progress_bar.set_position((fraction * 100.0).round() as u64);
        });
    if cli.no_digest {
        uploader = uploader.without_digest();
    }

    let completed = uploader.upload(&cli.file).await?;
    bar.finish_and_clear();

    println!("Uploaded {} chunk(s)", completed.total_chunks);
    println!(
        "  {} ({})",
        completed.file_name,
        vodup_models::format_bytes(completed.size)
    );
    println!("  {}", completed.url);
    if !completed.cleanup_errors.is_empty() {
        eprintln!(
            "warning: server failed to clean up {} chunk object(s)",
            completed.cleanup_errors.len()
        );
    }

    Ok(())
}
