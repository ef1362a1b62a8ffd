//! Archive unpacking.
//!
//! Two formats, matching the two layers of the upstream artifact:
//!
//! - [`zip`]: the outer ZIP container, parsed directly from its central
//!   directory (EOCD first, then the central directory, then each entry's
//!   local header).
//! - [`tar`]: the gzip-compressed tarball nested inside the ZIP.
//!
//! Both unpack into a destination directory and return the paths they wrote.
//! Entry names that would escape the destination are skipped, never written.
//!
//! ## Supported ZIP features
//!
//! - Standard ZIP format, STORED and DEFLATE entries
//! - Archives with a trailing comment
//!
//! ## Limitations
//!
//! - No ZIP64 (rejected with a clear error; the upstream archive is a small
//!   standard ZIP)
//! - No encryption, no multi-disk archives

pub mod tar;
pub mod zip;

pub use tar::unpack_tar_gz;
pub use zip::unpack_zip;
