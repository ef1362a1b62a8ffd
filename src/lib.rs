//! # loadstage
//!
//! Stages hourly electrical load archives for downstream analysis.
//!
//! This library implements a strictly linear acquisition pipeline: download
//! a remote ZIP archive (or copy a local one), unpack it, unpack the
//! gzip-compressed tarball nested inside it into the extraction directory,
//! delete the intermediate archives, and hand off to an external analysis
//! script. Any failure aborts the run before cleanup, leaving artifacts on
//! disk for inspection.
//!
//! ## Features
//!
//! - HTTPS fetch with explicit timeout and bounded retry with backoff
//! - Local-file sources for offline runs and tests
//! - ZIP extraction (STORED and DEFLATE entries, archive comments)
//! - Nested tar.gz payload located by exact name or wildcard pattern
//! - Optional SHA-256 pinning of the fetched archive
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use loadstage::{HttpSource, StageConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = HttpSource::new(
//!         "https://example.org/dl/archive.zip".to_string(),
//!         Duration::from_secs(30),
//!         3,
//!     )?;
//!     let config = StageConfig {
//!         data_dir: PathBuf::from("/app/data"),
//!         archive_path: PathBuf::from("/app/data.zip"),
//!         payload: "hrl_load_metered_2016-2025.tar.gz".to_string(),
//!         expected_sha256: None,
//!         keep_archives: false,
//!     };
//!
//!     let summary = pipeline::stage(&source, &config).await?;
//!     println!("staged {} files", summary.files_staged);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod checksum;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod handoff;
pub mod pipeline;

pub use cli::Cli;
pub use error::{Result, StageError};
pub use fetch::{ArchiveSource, HttpSource, LocalSource};
pub use pipeline::{StageConfig, StageSummary};
