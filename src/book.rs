//! High-level book handle: open once, read chapters many times.
//!
//! `Book::open` runs the whole structural pipeline -- archive indexing,
//! container resolution, package parsing -- and either returns a fully
//! populated book or fails; partial state is never observable. Chapter text
//! extraction afterwards is tolerant: a missing or unreadable chapter entry
//! yields empty text so the rest of the book stays navigable.

use std::path::Path;

use crate::container;
use crate::error::{ArchiveError, BookError, StructureError};
use crate::package::{self, Chapter};
use crate::strip;
use crate::zip::{ArchiveLimits, ZipArchive};

/// Fixed archive path of the container descriptor.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Options for opening a book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Archive indexing/extraction limits.
    pub limits: ArchiveLimits,
}

impl OpenOptions {
    /// Options with explicit archive limits.
    pub fn with_limits(limits: ArchiveLimits) -> Self {
        Self { limits }
    }
}

/// An opened book: the owning archive plus the resolved chapter list.
///
/// The archive and the chapter list share the book's lifetime; dropping the
/// book releases the archive and invalidates nothing else, because all
/// chapter text is handed out as owned strings.
pub struct Book {
    archive: ZipArchive,
    package_path: String,
    chapters: Vec<Chapter>,
}

impl core::fmt::Debug for Book {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Book")
            .field("package_path", &self.package_path)
            .field("chapter_count", &self.chapters.len())
            .finish()
    }
}

impl Book {
    /// Open a book from disk with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BookError> {
        Self::open_with_options(path, OpenOptions::default())
    }

    /// Open a book from disk with explicit options.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: OpenOptions,
    ) -> Result<Self, BookError> {
        let archive = ZipArchive::open_with_limits(path, options.limits)?;
        Self::from_archive(archive)
    }

    /// Open a book over an in-memory archive buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, BookError> {
        Self::from_bytes_with_options(bytes, OpenOptions::default())
    }

    /// Open a book over an in-memory archive buffer with explicit options.
    pub fn from_bytes_with_options(
        bytes: Vec<u8>,
        options: OpenOptions,
    ) -> Result<Self, BookError> {
        let archive = ZipArchive::from_bytes_with_limits(bytes, options.limits)?;
        Self::from_archive(archive)
    }

    fn from_archive(mut archive: ZipArchive) -> Result<Self, BookError> {
        let container_xml = match archive.extract(CONTAINER_PATH) {
            Ok(bytes) => bytes,
            Err(ArchiveError::NotFound) => {
                return Err(StructureError::MissingContainer.into())
            }
            Err(err) => return Err(err.into()),
        };
        let package_path =
            container::resolve_rootfile(&String::from_utf8_lossy(&container_xml))?;

        let package_xml = match archive.extract(&package_path) {
            Ok(bytes) => bytes,
            Err(ArchiveError::NotFound) => {
                return Err(StructureError::MissingPackage { path: package_path }.into())
            }
            Err(err) => return Err(err.into()),
        };
        let doc = package::parse_package(&String::from_utf8_lossy(&package_xml))?;

        let chapters = doc.chapters(&package_path);
        if chapters.is_empty() {
            return Err(StructureError::EmptySpine.into());
        }
        log::info!(
            "opened book: {} chapters via {}",
            chapters.len(),
            package_path
        );

        Ok(Self {
            archive,
            package_path,
            chapters,
        })
    }

    /// Archive path of the package document.
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    /// Resolved chapters in spine order. Never empty.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Number of chapters in the spine.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Chapter descriptor by spine index.
    pub fn chapter(&self, index: usize) -> Result<&Chapter, BookError> {
        self.chapters
            .get(index)
            .ok_or(BookError::ChapterOutOfBounds {
                index,
                chapter_count: self.chapters.len(),
            })
    }

    /// Extract and sanitize one chapter into plain text.
    ///
    /// An out-of-range index is an error. A chapter whose archive entry is
    /// missing or unreadable is a local failure: it yields empty text (with a
    /// warning) so navigation to the other chapters keeps working.
    pub fn chapter_plain_text(&mut self, index: usize) -> Result<String, BookError> {
        let path = self.chapter(index)?.path.clone();
        let raw = match self.archive.extract(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("chapter '{}' unreadable: {}", path, err);
                return Ok(String::new());
            }
        };
        Ok(strip::strip_chapter_html(&String::from_utf8_lossy(&raw)))
    }
}
