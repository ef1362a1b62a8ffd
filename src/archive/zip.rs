//! ZIP container extraction.
//!
//! ZIP files are read from the end: the End of Central Directory (EOCD)
//! record locates the central directory, which holds the metadata for every
//! entry; each entry's Local File Header then gives the offset of its data.
//! The archive here is a local file consumed exactly once, so the whole
//! thing is read into memory and parsed in place.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use tracing::{debug, warn};

use crate::error::{Result, StageError};

const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
const EOCD_SIZE: usize = 22;
const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
const LFH_SIZE: usize = 30;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// Bounds the backward search for an EOCD preceded by a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// One entry of the central directory
struct ZipEntry {
    name: String,
    method: CompressionMethod,
    compressed_size: u64,
    uncompressed_size: u64,
    lfh_offset: u64,
    is_directory: bool,
}

struct Eocd {
    total_entries: u16,
    cd_size: u32,
    cd_offset: u32,
}

/// Unpack every entry of `archive` into `dest`, creating `dest` if absent.
///
/// Returns the paths written, in archive order. Directory entries are
/// created but not returned. Entries whose names are absolute or contain
/// `..` components are skipped with a warning rather than written.
pub fn unpack_zip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let data = std::fs::read(archive)?;
    let entries = parse_central_directory(archive, &data)?;

    std::fs::create_dir_all(dest)?;

    let mut written = Vec::new();
    for entry in &entries {
        let Some(target) = sanitized_join(dest, &entry.name) else {
            warn!(name = %entry.name, "skipping entry with unsafe path");
            continue;
        };

        if entry.is_directory {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = read_entry(archive, &data, entry)?;
        std::fs::write(&target, &contents)?;
        debug!(name = %entry.name, bytes = contents.len(), "extracted");
        written.push(target);
    }

    Ok(written)
}

/// Find and parse the EOCD record.
///
/// Fast path: no archive comment, so the record sits exactly at the end.
/// Otherwise search backwards for the signature, accepting a candidate only
/// when its comment-length field accounts for the remaining bytes.
fn find_eocd(archive: &Path, data: &[u8]) -> Result<Eocd> {
    if data.len() < EOCD_SIZE {
        return Err(StageError::corrupt(
            archive,
            format!("{} bytes is too small to be a ZIP archive", data.len()),
        ));
    }

    let tail_start = data.len() - EOCD_SIZE;
    if &data[tail_start..tail_start + 4] == EOCD_SIGNATURE
        && &data[tail_start + 20..tail_start + 22] == b"\x00\x00"
    {
        return parse_eocd(archive, &data[tail_start..]);
    }

    let search_start = data.len().saturating_sub(MAX_COMMENT_SIZE + EOCD_SIZE);
    for i in (search_start..data.len() - EOCD_SIZE).rev() {
        if &data[i..i + 4] == EOCD_SIGNATURE {
            let comment_len = u16::from_le_bytes([data[i + 20], data[i + 21]]) as usize;
            if comment_len == data.len() - i - EOCD_SIZE {
                return parse_eocd(archive, &data[i..i + EOCD_SIZE]);
            }
        }
    }

    Err(StageError::corrupt(
        archive,
        "no End of Central Directory record found",
    ))
}

fn parse_eocd(archive: &Path, record: &[u8]) -> Result<Eocd> {
    let mut cursor = Cursor::new(&record[4..]);
    let parse = |c: &mut Cursor<&[u8]>| -> std::io::Result<(u16, u16, u16, u16, u32, u32)> {
        Ok((
            c.read_u16::<LittleEndian>()?, // disk number
            c.read_u16::<LittleEndian>()?, // disk with central directory
            c.read_u16::<LittleEndian>()?, // entries on this disk
            c.read_u16::<LittleEndian>()?, // total entries
            c.read_u32::<LittleEndian>()?, // central directory size
            c.read_u32::<LittleEndian>()?, // central directory offset
        ))
    };
    let (_, _, disk_entries, total_entries, cd_size, cd_offset) = parse(&mut cursor)
        .map_err(|_| StageError::corrupt(archive, "truncated End of Central Directory"))?;

    // 0xFFFF / 0xFFFFFFFF are ZIP64 escape markers
    if disk_entries == 0xFFFF
        || total_entries == 0xFFFF
        || cd_size == 0xFFFF_FFFF
        || cd_offset == 0xFFFF_FFFF
    {
        return Err(StageError::corrupt(archive, "ZIP64 archives are not supported"));
    }

    Ok(Eocd {
        total_entries,
        cd_size,
        cd_offset,
    })
}

fn parse_central_directory(archive: &Path, data: &[u8]) -> Result<Vec<ZipEntry>> {
    let eocd = find_eocd(archive, data)?;

    let cd_start = eocd.cd_offset as usize;
    let cd_end = cd_start + eocd.cd_size as usize;
    if cd_end > data.len() {
        return Err(StageError::corrupt(
            archive,
            "central directory extends past end of file",
        ));
    }

    let mut cursor = Cursor::new(&data[cd_start..cd_end]);
    let mut entries = Vec::with_capacity(eocd.total_entries as usize);
    for _ in 0..eocd.total_entries {
        entries.push(parse_cdfh(archive, &mut cursor)?);
    }

    Ok(entries)
}

/// Parse one Central Directory File Header.
fn parse_cdfh(archive: &Path, cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry> {
    let truncated = || StageError::corrupt(archive, "truncated central directory");

    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(|_| truncated())?;
    if sig != CDFH_SIGNATURE {
        return Err(StageError::corrupt(
            archive,
            "invalid Central Directory File Header signature",
        ));
    }

    let fields = |c: &mut Cursor<&[u8]>| -> std::io::Result<(u16, u32, u32, u16, u16, u16, u32)> {
        let _version_made_by = c.read_u16::<LittleEndian>()?;
        let _version_needed = c.read_u16::<LittleEndian>()?;
        let _flags = c.read_u16::<LittleEndian>()?;
        let method = c.read_u16::<LittleEndian>()?;
        let _last_mod_time = c.read_u16::<LittleEndian>()?;
        let _last_mod_date = c.read_u16::<LittleEndian>()?;
        let _crc32 = c.read_u32::<LittleEndian>()?;
        let compressed_size = c.read_u32::<LittleEndian>()?;
        let uncompressed_size = c.read_u32::<LittleEndian>()?;
        let file_name_length = c.read_u16::<LittleEndian>()?;
        let extra_field_length = c.read_u16::<LittleEndian>()?;
        let file_comment_length = c.read_u16::<LittleEndian>()?;
        let _disk_number_start = c.read_u16::<LittleEndian>()?;
        let _internal_attrs = c.read_u16::<LittleEndian>()?;
        let _external_attrs = c.read_u32::<LittleEndian>()?;
        let lfh_offset = c.read_u32::<LittleEndian>()?;
        Ok((
            method,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_comment_length,
            lfh_offset,
        ))
    };
    let (method, compressed_size, uncompressed_size, name_len, extra_len, comment_len, lfh_offset) =
        fields(cursor).map_err(|_| truncated())?;

    if compressed_size == 0xFFFF_FFFF || uncompressed_size == 0xFFFF_FFFF || lfh_offset == 0xFFFF_FFFF
    {
        return Err(StageError::corrupt(archive, "ZIP64 archives are not supported"));
    }

    let mut name_bytes = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name_bytes).map_err(|_| truncated())?;
    // Lossy conversion keeps non-UTF8 names extractable
    let name = String::from_utf8_lossy(&name_bytes).to_string();
    let is_directory = name.ends_with('/');

    // Extra fields and the per-entry comment carry nothing this pipeline needs
    let skip = extra_len as u64 + comment_len as u64;
    cursor.set_position(cursor.position() + skip);

    Ok(ZipEntry {
        name,
        method: CompressionMethod::from_u16(method),
        compressed_size: compressed_size as u64,
        uncompressed_size: uncompressed_size as u64,
        lfh_offset: lfh_offset as u64,
        is_directory,
    })
}

/// Locate an entry's data by reading its Local File Header.
///
/// The LFH repeats the name and extra field with lengths that may differ
/// from the central directory copy, so the data offset has to be computed
/// from the LFH itself.
fn data_offset(archive: &Path, data: &[u8], entry: &ZipEntry) -> Result<usize> {
    let lfh_start = entry.lfh_offset as usize;
    let lfh_end = lfh_start + LFH_SIZE;
    if lfh_end > data.len() {
        return Err(StageError::corrupt(
            archive,
            format!("local header of '{}' out of bounds", entry.name),
        ));
    }

    let lfh = &data[lfh_start..lfh_end];
    if &lfh[0..4] != LFH_SIGNATURE {
        return Err(StageError::corrupt(
            archive,
            format!("invalid Local File Header for '{}'", entry.name),
        ));
    }

    let name_len = u16::from_le_bytes([lfh[26], lfh[27]]) as usize;
    let extra_len = u16::from_le_bytes([lfh[28], lfh[29]]) as usize;

    Ok(lfh_end + name_len + extra_len)
}

fn read_entry(archive: &Path, data: &[u8], entry: &ZipEntry) -> Result<Vec<u8>> {
    let start = data_offset(archive, data, entry)?;
    let end = start + entry.compressed_size as usize;
    if end > data.len() {
        return Err(StageError::corrupt(
            archive,
            format!("data of '{}' extends past end of file", entry.name),
        ));
    }
    let raw = &data[start..end];

    match entry.method {
        CompressionMethod::Stored => {
            if entry.compressed_size != entry.uncompressed_size {
                return Err(StageError::corrupt(
                    archive,
                    format!("stored entry '{}' has inconsistent sizes", entry.name),
                ));
            }
            Ok(raw.to_vec())
        }
        CompressionMethod::Deflate => {
            let mut inflated = Vec::with_capacity(entry.uncompressed_size as usize);
            DeflateDecoder::new(raw)
                .read_to_end(&mut inflated)
                .map_err(|e| {
                    StageError::corrupt(
                        archive,
                        format!("bad deflate stream in '{}': {e}", entry.name),
                    )
                })?;
            if inflated.len() as u64 != entry.uncompressed_size {
                return Err(StageError::corrupt(
                    archive,
                    format!(
                        "entry '{}' inflated to {} bytes, expected {}",
                        entry.name,
                        inflated.len(),
                        entry.uncompressed_size
                    ),
                ));
            }
            Ok(inflated)
        }
        CompressionMethod::Unknown(m) => Err(StageError::corrupt(
            archive,
            format!("entry '{}' uses unsupported compression method {m}", entry.name),
        )),
    }
}

/// Join an archive entry name onto `dest`, refusing names that would land
/// outside it (absolute paths, `..` components).
fn sanitized_join(dest: &Path, name: &str) -> Option<PathBuf> {
    let mut target = dest.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if target == dest { None } else { Some(target) }
}
