mod http;
mod local;

pub use http::HttpSource;
pub use local::LocalSource;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for materializing the outer archive as a local file
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Write the full archive to `dest`, returning the number of bytes written
    async fn fetch(&self, dest: &Path) -> Result<u64>;

    /// Human-readable origin of the archive, for logs and error messages
    fn origin(&self) -> &str;
}
