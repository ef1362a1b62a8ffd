//! Nested tarball extraction.
//!
//! The payload inside the outer ZIP is a gzip-compressed tar. `tar`'s
//! `unpack_in` refuses entries that would land outside the destination, so
//! the containment guarantee matches the ZIP side.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::error::{Result, StageError};

/// Unpack a gzip-compressed tarball into `dest`, creating it if absent.
///
/// Returns the paths of the regular files written. Malformed gzip or tar
/// data maps to a corrupt-archive error; anything else is a plain I/O error.
pub fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest)?;

    let file = File::open(archive)?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));

    let mut written = Vec::new();
    let entries = tarball
        .entries()
        .map_err(|e| classify(archive, e, "unreadable tar stream"))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| classify(archive, e, "unreadable tar entry"))?;
        let path = entry
            .path()
            .map_err(|e| classify(archive, e, "bad entry path"))?
            .into_owned();

        if !entry.unpack_in(dest).map_err(|e| classify(archive, e, "unpack failed"))? {
            warn!(path = %path.display(), "skipping entry that leaves the destination");
            continue;
        }

        if entry.header().entry_type().is_file() {
            debug!(path = %path.display(), "extracted");
            written.push(dest.join(path));
        }
    }

    Ok(written)
}

/// Decide whether an io error from the decode path means "corrupt data" or a
/// real filesystem failure. Gzip and tar corruption both surface as
/// `InvalidData`/`InvalidInput`/`UnexpectedEof` from the reader side.
fn classify(archive: &Path, err: std::io::Error, context: &str) -> StageError {
    match err.kind() {
        ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof => {
            StageError::corrupt(archive, format!("{context}: {err}"))
        }
        _ => StageError::Io(err),
    }
}
