//! Reader-shell building blocks around the `quire` core.
//!
//! Everything a device frontend needs between raw input events and the
//! parsing/layout crates: a single-slot background loader, an explicit
//! state-transition table, the persisted reading-position contract, and
//! library directory scanning. No rendering happens here; the shell emits
//! effects and the loader emits payloads for the frontend to act on.

#![warn(missing_docs)]

mod library;
mod loader;
mod position;
mod shell;

pub use library::scan_library;
pub use loader::{ChapterPayload, LoaderError, LoaderOutcome, LoaderSlot, RejectedChapterLoad};
pub use position::{ReadingPosition, DEFAULT_TEXT_SIZE, MAX_TEXT_SIZE, MIN_TEXT_SIZE};
pub use shell::{Effect, LoadResult, Shell, ShellEvent, ShellState};
