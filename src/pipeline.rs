//! The staging pipeline.
//!
//! Strictly linear, all-or-nothing:
//!
//! fetch archive → verify checksum (optional) → unpack outer ZIP →
//! locate nested tarball → unpack inner tar.gz → delete archives →
//! census staged files.
//!
//! The first failure aborts the run. Cleanup only happens after both
//! extraction layers succeeded, so a failed run leaves its artifacts on
//! disk for diagnosis. The extraction directory is not created until the
//! archive exists locally, so a failed download leaves it absent or
//! unchanged.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::archive;
use crate::checksum;
use crate::error::{Result, StageError};
use crate::fetch::ArchiveSource;

/// Explicit inputs of one staging run.
///
/// Every path is configuration; nothing in the pipeline hard-codes a
/// location.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Directory receiving the unpacked data
    pub data_dir: PathBuf,
    /// Where the fetched archive is written before extraction
    pub archive_path: PathBuf,
    /// Exact name or `*`/`?` pattern of the nested tarball
    pub payload: String,
    /// Pinned SHA-256 of the fetched archive, if any
    pub expected_sha256: Option<String>,
    /// Skip the cleanup step
    pub keep_archives: bool,
}

/// What a successful run produced
#[derive(Debug)]
pub struct StageSummary {
    pub bytes_fetched: u64,
    pub files_staged: usize,
    pub csv_files: usize,
}

/// Run the full staging sequence.
pub async fn stage(source: &dyn ArchiveSource, config: &StageConfig) -> Result<StageSummary> {
    let bytes_fetched = source.fetch(&config.archive_path).await?;
    info!(
        origin = source.origin(),
        bytes = bytes_fetched,
        path = %config.archive_path.display(),
        "archive fetched"
    );

    if let Some(expected) = &config.expected_sha256 {
        checksum::verify_file_sha256(&config.archive_path, expected)?;
        info!("archive checksum verified");
    }

    let unpacked = archive::unpack_zip(&config.archive_path, &config.data_dir)?;
    info!(
        files = unpacked.len(),
        dir = %config.data_dir.display(),
        "outer archive unpacked"
    );

    let payload_path = locate_payload(&unpacked, &config.payload, &config.archive_path)?;

    let staged = archive::unpack_tar_gz(&payload_path, &config.data_dir)?;
    info!(
        files = staged.len(),
        payload = %payload_path.display(),
        "nested tarball unpacked"
    );

    if config.keep_archives {
        info!("keeping intermediate archives");
    } else {
        std::fs::remove_file(&config.archive_path)?;
        std::fs::remove_file(&payload_path)?;
        info!("intermediate archives removed");
    }

    let (files_staged, csv_files) = census(&config.data_dir);
    if csv_files == 0 {
        // The analysis script globs **/*.csv; an empty census means it will
        // find nothing to work with.
        warn!(dir = %config.data_dir.display(), "no CSV files staged");
    }

    Ok(StageSummary {
        bytes_fetched,
        files_staged,
        csv_files,
    })
}

/// Locate the nested tarball among the paths the outer extraction produced.
///
/// The pattern is matched against file names only. Zero matches is a hard
/// error (the upstream archive no longer contains what the run expects);
/// multiple matches are rejected rather than resolved by guessing.
fn locate_payload(unpacked: &[PathBuf], pattern: &str, archive: &Path) -> Result<PathBuf> {
    let mut matches: Vec<&PathBuf> = unpacked
        .iter()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy())
                .is_some_and(|name| name_matches(pattern, &name))
        })
        .collect();

    match matches.len() {
        0 => Err(StageError::PayloadNotFound {
            pattern: pattern.to_string(),
            archive: archive.to_path_buf(),
            entries: unpacked.len(),
        }),
        1 => Ok(matches.remove(0).to_path_buf()),
        _ => Err(StageError::AmbiguousPayload {
            pattern: pattern.to_string(),
            matches: matches
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect(),
        }),
    }
}

fn name_matches(pattern: &str, name: &str) -> bool {
    if has_glob_chars(pattern) {
        glob_match(pattern, name)
    } else {
        pattern == name
    }
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob matching: `*` matches zero or more characters, `?` exactly
/// one. Backtracking on `*`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Count regular files and CSV files under the extraction directory.
fn census(data_dir: &Path) -> (usize, usize) {
    let mut files = 0;
    let mut csv = 0;
    for entry in WalkDir::new(data_dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            files += 1;
            if entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            {
                csv += 1;
            }
        }
    }
    (files, csv)
}
