//! Persisted reading positions.
//!
//! The storage format and location are owned by the frontend; this module
//! only fixes the token shape and the restore contract: after any
//! repagination the stored page index clamps into the new page count.

use serde::{Deserialize, Serialize};

/// Smallest supported text size (renderer scale steps).
pub const MIN_TEXT_SIZE: u32 = 1;
/// Largest supported text size (renderer scale steps).
pub const MAX_TEXT_SIZE: u32 = 8;
/// Text size used before the reader has a stored preference.
pub const DEFAULT_TEXT_SIZE: u32 = 2;

/// Persisted reading position, keyed externally by book identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPosition {
    /// 0-based chapter index in spine order.
    pub chapter_index: usize,
    /// 0-based page index within the chapter, in the pagination the position
    /// was saved under.
    pub page_index: usize,
    /// Text size the pagination was computed with.
    pub text_size: u32,
}

impl Default for ReadingPosition {
    fn default() -> Self {
        Self {
            chapter_index: 0,
            page_index: 0,
            text_size: DEFAULT_TEXT_SIZE,
        }
    }
}

impl ReadingPosition {
    /// Position at the start of a chapter.
    pub fn chapter_start(chapter_index: usize, text_size: u32) -> Self {
        Self {
            chapter_index,
            page_index: 0,
            text_size,
        }
    }

    /// Effective page after repagination: `min(page_index, page_count - 1)`,
    /// or `0` when the chapter has no pages at all.
    pub fn clamped_page(&self, page_count: usize) -> usize {
        if page_count == 0 {
            0
        } else {
            self.page_index.min(page_count - 1)
        }
    }

    /// Stored text size clamped into the supported range.
    pub fn clamped_text_size(&self) -> u32 {
        self.text_size.clamp(MIN_TEXT_SIZE, MAX_TEXT_SIZE)
    }
}
