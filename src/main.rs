//! Main entry point for the loadstage CLI.
//!
//! Wires the parsed command line into the staging pipeline: pick the archive
//! source (HTTP URL or local file), run the fetch/extract/clean sequence,
//! print a short summary, then hand off to the analysis script if one was
//! configured.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::error;
use tracing_subscriber::EnvFilter;

use loadstage::{Cli, HttpSource, LocalSource, StageConfig, handoff, pipeline};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the quiet flags set the floor
    let default_filter = if cli.is_very_quiet() {
        "error"
    } else if cli.is_quiet() {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        error!(error = %e, "staging failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = StageConfig {
        data_dir: cli.data_dir.clone(),
        archive_path: cli.archive_path(),
        payload: cli.payload.clone(),
        expected_sha256: cli.sha256.clone(),
        keep_archives: cli.keep_archives,
    };

    let summary = if cli.is_http_url() {
        let source = HttpSource::new(
            cli.archive.clone(),
            std::time::Duration::from_secs(cli.timeout),
            cli.retries,
        )?;
        pipeline::stage(&source, &config).await?
    } else {
        let source = LocalSource::new(Path::new(&cli.archive));
        pipeline::stage(&source, &config).await?
    };

    if !cli.is_quiet() {
        println!(
            "Staged {} file(s) ({} CSV) into {} (fetched {})",
            summary.files_staged,
            summary.csv_files,
            cli.data_dir.display(),
            format_size(summary.bytes_fetched)
        );
    }

    // The extraction directory is populated and the archives are gone; the
    // collaborator takes it from here.
    if let Some(script) = &cli.script {
        handoff::run_script(&cli.interpreter, script).await?;
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
