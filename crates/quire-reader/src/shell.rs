//! Explicit state-transition table for the reader frontend.
//!
//! The shell holds only navigation state -- which mode, which chapter, which
//! page -- and maps `(state, event)` pairs to new state plus a list of
//! effects. It never touches the parser, the layout engine, or a display;
//! the frontend executes the effects and feeds loader completions back in as
//! events.

use std::path::PathBuf;

use crate::position::ReadingPosition;

/// Coarse reader mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShellState {
    /// Browsing the library list; no book is open.
    #[default]
    Library,
    /// A loader operation is in flight; input is ignored until it completes.
    Loading,
    /// A book is open and a page is on screen.
    Reading,
}

/// Summarized result of a finished loader operation, as the shell sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadResult {
    /// A chapter is ready to show.
    Loaded {
        /// Chapter that was loaded.
        chapter_index: usize,
        /// Total chapters in the book.
        chapter_count: usize,
        /// Pages in the loaded chapter's pagination.
        page_count: usize,
    },
    /// The operation failed; the shell falls back to the library.
    Failed {
        /// Message for the frontend to surface.
        message: String,
    },
}

/// Input to the transition table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellEvent {
    /// The user picked a book in the library list.
    OpenRequested {
        /// Path of the chosen book.
        path: PathBuf,
    },
    /// The in-flight loader operation finished.
    LoaderFinished(LoadResult),
    /// Forward page flip.
    NextPage,
    /// Backward page flip.
    PrevPage,
    /// Leave the book and return to the library.
    CloseBook,
}

/// Work the frontend must carry out after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Begin a background open of the given book.
    StartOpen {
        /// Book path.
        path: PathBuf,
    },
    /// Begin a background load of the given chapter.
    StartChapterLoad {
        /// Spine index to load.
        index: usize,
    },
    /// The visible page changed; redraw the reading surface.
    RedrawPage,
    /// The library list should be (re)drawn.
    RedrawLibrary,
    /// Surface an error message.
    ShowError {
        /// Message text.
        message: String,
    },
}

/// Navigation state machine for the reader frontend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Shell {
    state: ShellState,
    chapter_index: usize,
    chapter_count: usize,
    page_index: usize,
    page_count: usize,
    /// Page to land on when the next chapter load completes, clamped into
    /// the fresh pagination on arrival.
    target_page: usize,
}

impl Shell {
    /// A shell in the library, nothing open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Current chapter index (meaningful while reading).
    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    /// Current page index within the chapter.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Page count of the current chapter's pagination.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Apply one event; returns the effects the frontend must execute.
    ///
    /// Events that have no meaning in the current state are dropped -- in
    /// particular all input while `Loading`, because a started loader
    /// operation always runs to completion.
    pub fn handle(&mut self, event: ShellEvent) -> Vec<Effect> {
        match (self.state, event) {
            (ShellState::Library, ShellEvent::OpenRequested { path }) => {
                self.state = ShellState::Loading;
                self.target_page = 0;
                vec![Effect::StartOpen { path }]
            }
            (ShellState::Loading, ShellEvent::LoaderFinished(result)) => match result {
                LoadResult::Loaded {
                    chapter_index,
                    chapter_count,
                    page_count,
                } => {
                    self.state = ShellState::Reading;
                    self.chapter_index = chapter_index;
                    self.chapter_count = chapter_count;
                    self.page_count = page_count;
                    self.page_index = clamp_page(self.target_page, page_count);
                    self.target_page = 0;
                    vec![Effect::RedrawPage]
                }
                LoadResult::Failed { message } => {
                    self.state = ShellState::Library;
                    self.reset_book_state();
                    vec![Effect::ShowError { message }, Effect::RedrawLibrary]
                }
            },
            (ShellState::Reading, ShellEvent::NextPage) => {
                if self.page_index + 1 < self.page_count {
                    self.page_index += 1;
                    vec![Effect::RedrawPage]
                } else if self.chapter_index + 1 < self.chapter_count {
                    self.state = ShellState::Loading;
                    self.target_page = 0;
                    vec![Effect::StartChapterLoad {
                        index: self.chapter_index + 1,
                    }]
                } else {
                    Vec::new()
                }
            }
            (ShellState::Reading, ShellEvent::PrevPage) => {
                if self.page_index > 0 {
                    self.page_index -= 1;
                    vec![Effect::RedrawPage]
                } else if self.chapter_index > 0 {
                    self.state = ShellState::Loading;
                    self.target_page = 0;
                    vec![Effect::StartChapterLoad {
                        index: self.chapter_index - 1,
                    }]
                } else {
                    Vec::new()
                }
            }
            (ShellState::Reading, ShellEvent::CloseBook) => {
                self.state = ShellState::Library;
                self.reset_book_state();
                vec![Effect::RedrawLibrary]
            }
            _ => Vec::new(),
        }
    }

    /// Jump toward a persisted position after the book has opened.
    ///
    /// Requests the chapter load when needed; the stored page index becomes
    /// the landing target and is clamped into the fresh pagination when the
    /// load completes, per the restore contract.
    pub fn restore(&mut self, position: &ReadingPosition) -> Vec<Effect> {
        if self.state != ShellState::Reading || self.chapter_count == 0 {
            return Vec::new();
        }
        let chapter = position.chapter_index.min(self.chapter_count - 1);
        if chapter == self.chapter_index {
            self.page_index = clamp_page(position.page_index, self.page_count);
            vec![Effect::RedrawPage]
        } else {
            self.state = ShellState::Loading;
            self.target_page = position.page_index;
            vec![Effect::StartChapterLoad { index: chapter }]
        }
    }

    /// Re-apply the current page against a fresh pagination of the same
    /// chapter (text size or viewport change).
    pub fn apply_repagination(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.page_index = clamp_page(self.page_index, page_count);
    }

    /// Snapshot the current position for persistence.
    pub fn position(&self, text_size: u32) -> ReadingPosition {
        ReadingPosition {
            chapter_index: self.chapter_index,
            page_index: self.page_index,
            text_size,
        }
    }

    fn reset_book_state(&mut self) {
        self.chapter_index = 0;
        self.chapter_count = 0;
        self.page_index = 0;
        self.page_count = 0;
        self.target_page = 0;
    }
}

fn clamp_page(target: usize, page_count: usize) -> usize {
    if page_count == 0 {
        0
    } else {
        target.min(page_count - 1)
    }
}
