use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ArchiveSource;
use crate::error::Result;

/// Archive source backed by a file already on disk.
///
/// Used for offline runs and for tests; the copy keeps the rest of the
/// pipeline identical to the HTTP path, intermediate archive included.
pub struct LocalSource {
    path: PathBuf,
    origin: String,
}

impl LocalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let origin = path.display().to_string();
        Self { path, origin }
    }
}

#[async_trait]
impl ArchiveSource for LocalSource {
    async fn fetch(&self, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(tokio::fs::copy(&self.path, dest).await?)
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_archive_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.zip");
        let dest = dir.path().join("nested/dir/dest.zip");
        std::fs::write(&src, b"archive bytes").unwrap();

        let source = LocalSource::new(&src);
        let n = source.fetch(&dest).await.unwrap();

        assert_eq!(n, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalSource::new(dir.path().join("absent.zip"));
        let err = source.fetch(&dir.path().join("dest.zip")).await.unwrap_err();
        assert!(matches!(err, crate::error::StageError::Io(_)));
    }
}
