//! ZIP central-directory indexing and entry extraction.
//!
//! Two interchangeable backing strategies sit behind one type: direct random
//! access over the opened file, or -- when in-place indexing fails -- a
//! whole-file memory buffer with strict size verification. Entry paths are
//! forward-slash, case-sensitive. Only STORED and DEFLATE entries are
//! accepted; DEFLATE streams are inflated with `miniz_oxide` and verified
//! against the directory's CRC-32 with `crc32fast`.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::ArchiveError;

const EOCD_SIG: u32 = 0x0605_4b50;
const CD_SIG: u32 = 0x0201_4b50;
const LOCAL_SIG: u32 = 0x0403_4b50;

/// Minimum end-of-central-directory record length.
const EOCD_MIN_LEN: usize = 22;
/// Fixed portion of a central directory file header.
const CD_HEADER_LEN: usize = 46;
/// Fixed portion of a local file header.
const LOCAL_HEADER_LEN: usize = 30;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

#[inline]
fn le_u16(d: &[u8], o: usize) -> u16 {
    u16::from_le_bytes([d[o], d[o + 1]])
}

#[inline]
fn le_u32(d: &[u8], o: usize) -> u32 {
    u32::from_le_bytes([d[o], d[o + 1], d[o + 2], d[o + 3]])
}

/// Safety limits applied while indexing and extracting archive entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Maximum uncompressed (and compressed) size accepted for one entry.
    pub max_entry_bytes: usize,
    /// How far back from end-of-file to scan for the end-of-central-directory
    /// record. Bounded by the zip comment field, so 64 KiB covers any
    /// well-formed archive.
    pub max_eocd_scan_bytes: usize,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entry_bytes: 4 * 1024 * 1024,
            max_eocd_scan_bytes: 64 * 1024,
        }
    }
}

impl ArchiveLimits {
    /// Limits with an explicit per-entry size cap.
    pub fn new(max_entry_bytes: usize) -> Self {
        Self {
            max_entry_bytes,
            ..Self::default()
        }
    }

    /// Override the end-of-central-directory scan window.
    pub fn with_max_eocd_scan(mut self, max_eocd_scan_bytes: usize) -> Self {
        self.max_eocd_scan_bytes = max_eocd_scan_bytes;
        self
    }
}

/// Byte source backing an open archive: one of the two access strategies.
enum ArchiveSource {
    /// Direct random access over the open file handle.
    File(File),
    /// Whole-file fallback buffer, size-verified at load time.
    Memory(Cursor<Vec<u8>>),
}

impl Read for ArchiveSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::File(f) => f.read(buf),
            Self::Memory(m) => m.read(buf),
        }
    }
}

impl Seek for ArchiveSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Self::File(f) => f.seek(pos),
            Self::Memory(m) => m.seek(pos),
        }
    }
}

/// One central-directory record.
#[derive(Clone, Debug)]
struct EntryRecord {
    name: String,
    method: u16,
    comp_size: u32,
    uncomp_size: u32,
    crc32: u32,
    local_offset: u32,
}

/// An open zip container with a parsed central-directory index.
///
/// The archive exclusively owns its byte source (and, in the buffered
/// fallback, the whole-file buffer) for its entire lifetime; dropping it
/// releases everything. Construction never returns a partial archive.
pub struct ZipArchive {
    source: ArchiveSource,
    entries: Vec<EntryRecord>,
    limits: ArchiveLimits,
}

impl core::fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("entry_count", &self.entries.len())
            .field("limits", &self.limits)
            .field(
                "source",
                match self.source {
                    ArchiveSource::File(_) => &"file",
                    ArchiveSource::Memory(_) => &"memory",
                },
            )
            .finish()
    }
}

impl ZipArchive {
    /// Open an archive from disk with default limits.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        Self::open_with_limits(path, ArchiveLimits::default())
    }

    /// Open an archive from disk with explicit limits.
    ///
    /// Tries direct random access first; if the central directory cannot be
    /// indexed in place, retries once from a fully buffered copy of the file.
    pub fn open_with_limits<P: AsRef<Path>>(
        path: P,
        limits: ArchiveLimits,
    ) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;
        match Self::from_source(ArchiveSource::File(file), limits) {
            Ok(archive) => Ok(archive),
            Err(err) => {
                log::warn!(
                    "direct archive indexing failed ({}); retrying from memory buffer",
                    err
                );
                Self::open_buffered(path, limits)
            }
        }
    }

    /// Open an archive over an in-memory byte buffer with default limits.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Self::from_bytes_with_limits(bytes, ArchiveLimits::default())
    }

    /// Open an archive over an in-memory byte buffer with explicit limits.
    pub fn from_bytes_with_limits(
        bytes: Vec<u8>,
        limits: ArchiveLimits,
    ) -> Result<Self, ArchiveError> {
        Self::from_source(ArchiveSource::Memory(Cursor::new(bytes)), limits)
    }

    /// Whole-file fallback: read everything into one buffer, verifying that
    /// the byte count matches the size reported by the filesystem.
    fn open_buffered(path: &Path, limits: ArchiveLimits) -> Result<Self, ArchiveError> {
        let mut file =
            File::open(path).map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;
        let expected = file
            .metadata()
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?
            .len();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;
        let actual = buf.len() as u64;
        if actual != expected {
            return Err(ArchiveError::IncompleteRead { expected, actual });
        }
        Self::from_bytes_with_limits(buf, limits)
    }

    fn from_source(
        mut source: ArchiveSource,
        limits: ArchiveLimits,
    ) -> Result<Self, ArchiveError> {
        let file_len = source
            .seek(SeekFrom::End(0))
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;
        if (file_len as usize) < EOCD_MIN_LEN {
            return Err(ArchiveError::OpenFailed(
                "file too short to be an archive".into(),
            ));
        }

        let scan_len = limits
            .max_eocd_scan_bytes
            .max(EOCD_MIN_LEN)
            .min(file_len as usize);
        let mut tail = vec![0u8; scan_len];
        source
            .seek(SeekFrom::Start(file_len - scan_len as u64))
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;
        source
            .read_exact(&mut tail)
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;

        let eocd = find_eocd(&tail).ok_or_else(|| {
            ArchiveError::OpenFailed("end-of-central-directory record not found".into())
        })?;
        let cd_size = le_u32(&tail, eocd + 12) as u64;
        let cd_offset = le_u32(&tail, eocd + 16) as u64;
        if cd_offset.saturating_add(cd_size) > file_len {
            return Err(ArchiveError::OpenFailed(
                "central directory extends past end of file".into(),
            ));
        }

        let mut cd = vec![0u8; cd_size as usize];
        source
            .seek(SeekFrom::Start(cd_offset))
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;
        source
            .read_exact(&mut cd)
            .map_err(|e| ArchiveError::OpenFailed(format!("{}", e)))?;

        let entries = parse_central_directory(&cd)?;
        Ok(Self {
            source,
            entries,
            limits,
        })
    }

    /// Number of indexed entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether an entry with the exact path exists.
    pub fn contains(&self, entry_path: &str) -> bool {
        self.find(entry_path).is_some()
    }

    /// Iterate indexed entry paths in central-directory order.
    pub fn entry_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    fn find(&self, entry_path: &str) -> Option<&EntryRecord> {
        self.entries.iter().find(|e| e.name == entry_path)
    }

    /// Extract one entry to an owned byte buffer.
    ///
    /// Fails `NotFound` when the path is absent and `CorruptEntry` when the
    /// local header is inconsistent, the entry exceeds the size limit,
    /// inflation fails, or the CRC-32 does not match the directory record.
    pub fn extract(&mut self, entry_path: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .find(entry_path)
            .cloned()
            .ok_or(ArchiveError::NotFound)?;

        let largest = entry.uncomp_size.max(entry.comp_size) as usize;
        if largest > self.limits.max_entry_bytes {
            return Err(ArchiveError::CorruptEntry(format!(
                "entry '{}' exceeds size limit ({} > {} bytes)",
                entry_path, largest, self.limits.max_entry_bytes
            )));
        }

        let mut header = [0u8; LOCAL_HEADER_LEN];
        self.source
            .seek(SeekFrom::Start(entry.local_offset as u64))
            .map_err(|e| ArchiveError::CorruptEntry(format!("{}", e)))?;
        self.source
            .read_exact(&mut header)
            .map_err(|_| ArchiveError::CorruptEntry("truncated local header".into()))?;
        if le_u32(&header, 0) != LOCAL_SIG {
            return Err(ArchiveError::CorruptEntry(
                "bad local header signature".into(),
            ));
        }
        let name_len = le_u16(&header, 26) as u64;
        let extra_len = le_u16(&header, 28) as u64;
        let data_offset = entry.local_offset as u64 + LOCAL_HEADER_LEN as u64 + name_len + extra_len;

        let mut compressed = vec![0u8; entry.comp_size as usize];
        self.source
            .seek(SeekFrom::Start(data_offset))
            .map_err(|e| ArchiveError::CorruptEntry(format!("{}", e)))?;
        self.source
            .read_exact(&mut compressed)
            .map_err(|_| ArchiveError::CorruptEntry("truncated entry data".into()))?;

        let data = match entry.method {
            METHOD_STORED => compressed,
            METHOD_DEFLATE => miniz_oxide::inflate::decompress_to_vec_with_limit(
                &compressed,
                entry.uncomp_size as usize,
            )
            .map_err(|_| {
                ArchiveError::CorruptEntry(format!("deflate stream for '{}' is corrupt", entry_path))
            })?,
            other => {
                return Err(ArchiveError::CorruptEntry(format!(
                    "unsupported compression method {}",
                    other
                )))
            }
        };

        if data.len() != entry.uncomp_size as usize {
            return Err(ArchiveError::CorruptEntry(format!(
                "inflated size mismatch for '{}': expected {}, got {}",
                entry_path, entry.uncomp_size, data.len()
            )));
        }
        if crc32fast::hash(&data) != entry.crc32 {
            return Err(ArchiveError::CorruptEntry(format!(
                "crc mismatch for '{}'",
                entry_path
            )));
        }
        Ok(data)
    }
}

/// Locate the end-of-central-directory signature, scanning backwards so a
/// trailing comment does not hide it.
fn find_eocd(tail: &[u8]) -> Option<usize> {
    let mut i = tail.len().checked_sub(EOCD_MIN_LEN)?;
    loop {
        if le_u32(tail, i) == EOCD_SIG {
            return Some(i);
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    }
}

fn parse_central_directory(cd: &[u8]) -> Result<Vec<EntryRecord>, ArchiveError> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos + CD_HEADER_LEN <= cd.len() {
        if le_u32(cd, pos) != CD_SIG {
            break;
        }
        let method = le_u16(cd, pos + 10);
        let crc32 = le_u32(cd, pos + 16);
        let comp_size = le_u32(cd, pos + 20);
        let uncomp_size = le_u32(cd, pos + 24);
        let name_len = le_u16(cd, pos + 28) as usize;
        let extra_len = le_u16(cd, pos + 30) as usize;
        let comment_len = le_u16(cd, pos + 32) as usize;
        let local_offset = le_u32(cd, pos + 42);

        let name_start = pos + CD_HEADER_LEN;
        let record_end = name_start + name_len + extra_len + comment_len;
        if record_end > cd.len() {
            return Err(ArchiveError::OpenFailed(
                "central directory record extends past buffer".into(),
            ));
        }

        let name = String::from_utf8_lossy(&cd[name_start..name_start + name_len]).into_owned();
        entries.push(EntryRecord {
            name,
            method,
            comp_size,
            uncomp_size,
            crc32,
            local_offset,
        });
        pos = record_end;
    }

    if entries.is_empty() {
        return Err(ArchiveError::OpenFailed(
            "no entries in central directory".into(),
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_helpers() {
        let data = [0x50, 0x4b, 0x05, 0x06];
        assert_eq!(le_u16(&data, 0), 0x4b50);
        assert_eq!(le_u32(&data, 0), EOCD_SIG);
    }

    #[test]
    fn test_short_buffer_is_not_an_archive() {
        let err = ZipArchive::from_bytes(vec![0u8; 4]).expect_err("must reject");
        assert!(matches!(err, ArchiveError::OpenFailed(_)));
    }

    #[test]
    fn test_garbage_buffer_has_no_eocd() {
        let err = ZipArchive::from_bytes(vec![0xAA; 128]).expect_err("must reject");
        assert!(matches!(err, ArchiveError::OpenFailed(_)));
    }

    #[test]
    fn test_find_eocd_at_exact_tail() {
        let mut tail = vec![0u8; 40];
        let at = tail.len() - EOCD_MIN_LEN;
        tail[at..at + 4].copy_from_slice(&EOCD_SIG.to_le_bytes());
        assert_eq!(find_eocd(&tail), Some(at));
    }

    #[test]
    fn test_find_eocd_behind_comment() {
        // Signature buried before a 6-byte trailing comment.
        let mut tail = vec![0u8; 48];
        let at = tail.len() - EOCD_MIN_LEN - 6;
        tail[at..at + 4].copy_from_slice(&EOCD_SIG.to_le_bytes());
        assert_eq!(find_eocd(&tail), Some(at));
    }
}
