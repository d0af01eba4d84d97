//! quire -- EPUB structure parsing and plain-text extraction for
//! fixed-page readers
//!
//! Turns a zip-packaged e-book into an ordered chapter list and sanitized
//! chapter text, ready for a deterministic pagination engine (see the
//! companion `quire-layout` crate). Designed for constrained reader devices:
//! the parsing core is allocation-light and the heavy pieces (file I/O,
//! decompression) sit behind the `std` feature.
//!
//! # Features
//!
//! - `std` (default) -- enables the zip archive reader, `Book`, and logging

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod container;
pub mod error;
pub mod package;
pub mod strip;

#[cfg(feature = "std")]
pub mod book;

#[cfg(feature = "std")]
pub mod zip;

// Re-export key types for convenience
#[cfg(feature = "std")]
pub use book::{Book, OpenOptions, CONTAINER_PATH};
pub use container::resolve_rootfile;
pub use error::{ArchiveError, BookError, StructureError};
pub use package::{parse_package, Chapter, ManifestItem, PackageDoc};
pub use strip::strip_chapter_html;
#[cfg(feature = "std")]
pub use zip::{ArchiveLimits, ZipArchive};
