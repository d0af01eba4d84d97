//! Error types for archive access and book structure parsing.
//!
//! Two narrow enums cover the two failure domains -- the zip container
//! ([`ArchiveError`]) and the book documents inside it ([`StructureError`]) --
//! with [`BookError`] as the umbrella surfaced by high-level open/read APIs.

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Errors from opening a zip container or extracting its entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    /// The requested entry path is not present in the archive.
    NotFound,
    /// The container file could not be opened or its directory indexed.
    OpenFailed(String),
    /// The whole-file fallback read returned fewer bytes than the file
    /// reports on disk.
    IncompleteRead {
        /// Size reported by file metadata.
        expected: u64,
        /// Bytes actually read.
        actual: u64,
    },
    /// Entry data is unreadable, fails decompression, or fails checksum
    /// verification.
    CorruptEntry(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "archive entry not found"),
            Self::OpenFailed(reason) => write!(f, "unable to open archive: {}", reason),
            Self::IncompleteRead { expected, actual } => write!(
                f,
                "incomplete archive read: expected {} bytes, got {}",
                expected, actual
            ),
            Self::CorruptEntry(reason) => write!(f, "corrupt archive entry: {}", reason),
        }
    }
}

/// Structural failures while locating or parsing the book documents.
///
/// Any of these during open aborts the whole operation; no partially
/// constructed book is ever observable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructureError {
    /// The fixed container descriptor entry is missing from the archive.
    MissingContainer,
    /// The package document named by the container descriptor is missing.
    MissingPackage {
        /// Archive path the container descriptor pointed at.
        path: String,
    },
    /// Container or package XML is unparseable or lacks a required piece.
    MalformedXml(String),
    /// Spine resolution produced zero readable chapters.
    EmptySpine,
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContainer => write!(f, "container descriptor missing from archive"),
            Self::MissingPackage { path } => {
                write!(f, "package document missing from archive: {}", path)
            }
            Self::MalformedXml(reason) => write!(f, "malformed book document: {}", reason),
            Self::EmptySpine => write!(f, "spine resolved to zero chapters"),
        }
    }
}

/// Umbrella error for `Book` operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookError {
    /// Archive-level failure.
    Archive(ArchiveError),
    /// Structural parse failure during open.
    Structure(StructureError),
    /// Chapter index outside the spine.
    ChapterOutOfBounds {
        /// Requested chapter index.
        index: usize,
        /// Number of chapters in the spine.
        chapter_count: usize,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive(err) => write!(f, "{}", err),
            Self::Structure(err) => write!(f, "{}", err),
            Self::ChapterOutOfBounds {
                index,
                chapter_count,
            } => write!(
                f,
                "chapter index {} out of bounds ({} chapters)",
                index, chapter_count
            ),
        }
    }
}

impl From<ArchiveError> for BookError {
    fn from(err: ArchiveError) -> Self {
        Self::Archive(err)
    }
}

impl From<StructureError> for BookError {
    fn from(err: StructureError) -> Self {
        Self::Structure(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ArchiveError {}

#[cfg(feature = "std")]
impl std::error::Error for StructureError {}

#[cfg(feature = "std")]
impl std::error::Error for BookError {}
