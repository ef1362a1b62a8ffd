//! Shared fixture builders for integration tests.
//!
//! The upstream artifact is a ZIP wrapping a gzip-compressed tarball
//! wrapping CSV files; these helpers assemble the same shape byte-for-byte
//! so tests never need network access or checked-in binary fixtures.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Hand-assembled ZIP with STORED entries only: local file headers and data,
/// then the central directory, then the End of Central Directory record.
pub fn stored_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let lfh_offset = out.len() as u32;

        // Local File Header
        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // method: STORED
        out.extend_from_slice(&0u16.to_le_bytes()); // mod time
        out.extend_from_slice(&0u16.to_le_bytes()); // mod date
        out.extend_from_slice(&0u32.to_le_bytes()); // crc32
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra len
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);

        // Central Directory File Header
        central.extend_from_slice(b"PK\x01\x02");
        central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central.extend_from_slice(&20u16.to_le_bytes()); // version needed
        central.extend_from_slice(&0u16.to_le_bytes()); // flags
        central.extend_from_slice(&0u16.to_le_bytes()); // method: STORED
        central.extend_from_slice(&0u16.to_le_bytes()); // mod time
        central.extend_from_slice(&0u16.to_le_bytes()); // mod date
        central.extend_from_slice(&0u32.to_le_bytes()); // crc32
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // extra len
        central.extend_from_slice(&0u16.to_le_bytes()); // comment len
        central.extend_from_slice(&0u16.to_le_bytes()); // disk number
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&lfh_offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let count = entries.len() as u16;
    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);

    // End of Central Directory
    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // disk with cd
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len

    out
}

/// Gzip-compressed tarball
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// The canonical upstream shape: a ZIP containing `payload_name`, itself a
/// tar.gz containing `load.csv` with the given contents.
pub fn nested_archive(payload_name: &str, csv: &[u8]) -> Vec<u8> {
    let payload = tar_gz(&[("load.csv", csv)]);
    stored_zip(&[(payload_name, &payload)])
}

/// Write a nested fixture archive to `dir` and return its path.
pub fn write_nested_archive(dir: &Path, payload_name: &str, csv: &[u8]) -> PathBuf {
    let path = dir.join("fixture.zip");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&nested_archive(payload_name, csv)).unwrap();
    path
}

pub const CSV_BODY: &[u8] = b"datetime_beginning_ept,mw\n1/1/2016 5:00:00 AM,10432.5\n1/1/2016 6:00:00 AM,10120.0\n";
