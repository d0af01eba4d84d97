//! Single-slot background loader.
//!
//! Opening an archive, extracting a chapter, sanitizing it, and paginating
//! the result are grouped into one operation that runs off the interactive
//! thread. At most one operation is ever in flight: the slot refuses new
//! requests while busy, and a started operation always runs to completion --
//! there is no cancellation. Book ownership moves into the worker with the
//! request and comes back out through the completion channel, so no state is
//! ever shared between threads.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use quire::{Book, BookError};
use quire_layout::{LayoutEngine, PageSpan, TextMetrics};

/// One loaded chapter: sanitized text plus its page spans.
#[derive(Clone, Debug)]
pub struct ChapterPayload {
    /// Spine index of the chapter.
    pub index: usize,
    /// Sanitized plain text. Empty when the chapter entry was unreadable --
    /// a tolerated local failure, not an operation failure.
    pub text: String,
    /// Page spans over `text` for the engine/metrics the request carried.
    pub spans: Vec<PageSpan>,
}

/// Completion message of one loader operation.
#[derive(Debug)]
pub enum LoaderOutcome {
    /// Open succeeded; chapter 0 is sanitized and paginated.
    Opened {
        /// The fully opened book, ownership handed to the caller.
        book: Book,
        /// First chapter payload.
        chapter: ChapterPayload,
    },
    /// A chapter load finished; book ownership returns to the caller.
    ChapterLoaded {
        /// The book handed back.
        book: Book,
        /// Loaded chapter payload.
        chapter: ChapterPayload,
    },
    /// A chapter load failed hard (index out of range); the book survives.
    ChapterFailed {
        /// The book handed back.
        book: Book,
        /// What went wrong.
        error: BookError,
    },
    /// Open failed; no book state survives.
    OpenFailed {
        /// What went wrong.
        error: BookError,
    },
    /// The worker disappeared without reporting (its thread panicked).
    WorkerLost,
}

/// Errors starting a loader operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoaderError {
    /// An operation is already in flight; serialize requests.
    Busy,
    /// The worker thread could not be spawned.
    Spawn(String),
}

impl core::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "a loader operation is already in flight"),
            Self::Spawn(reason) => write!(f, "unable to start loader worker: {}", reason),
        }
    }
}

impl std::error::Error for LoaderError {}

/// A rejected chapter-load request, handing the book back untouched.
#[derive(Debug)]
pub struct RejectedChapterLoad {
    /// The book that was not loaded from.
    pub book: Book,
    /// Why the request was refused.
    pub error: LoaderError,
}

/// Handle to the single background loader slot.
///
/// `poll` is non-blocking and yields each outcome exactly once; `wait`
/// blocks for callers without an event loop.
#[derive(Default)]
pub struct LoaderSlot {
    pending: Option<Receiver<LoaderOutcome>>,
}

impl LoaderSlot {
    /// An idle slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start opening a book; the outcome carries the book and its first
    /// chapter, sanitized and paginated.
    pub fn start_open(
        &mut self,
        path: PathBuf,
        engine: LayoutEngine,
        metrics: Arc<dyn TextMetrics>,
    ) -> Result<(), LoaderError> {
        if self.is_busy() {
            return Err(LoaderError::Busy);
        }
        log::info!("loader: opening {}", path.display());
        self.spawn("book-open-worker", move || match Book::open(&path) {
            Ok(mut book) => match chapter_payload(&mut book, 0, engine, metrics.as_ref()) {
                Ok(chapter) => LoaderOutcome::Opened { book, chapter },
                Err(error) => LoaderOutcome::OpenFailed { error },
            },
            Err(error) => LoaderOutcome::OpenFailed { error },
        })
    }

    /// Start loading one chapter of an already opened book.
    ///
    /// The book moves into the operation and is handed back in the outcome.
    /// Any rejected request -- busy slot, failed thread spawn -- returns the
    /// book intact: it is only released to the worker once the worker exists.
    pub fn start_chapter(
        &mut self,
        book: Book,
        index: usize,
        engine: LayoutEngine,
        metrics: Arc<dyn TextMetrics>,
    ) -> Result<(), RejectedChapterLoad> {
        if self.is_busy() {
            return Err(RejectedChapterLoad {
                book,
                error: LoaderError::Busy,
            });
        }
        log::info!("loader: loading chapter {}", index);

        let (book_tx, book_rx) = mpsc::channel::<Book>();
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("chapter-load-worker".to_string())
            .spawn(move || {
                let Ok(mut book) = book_rx.recv() else {
                    return;
                };
                let outcome = match chapter_payload(&mut book, index, engine, metrics.as_ref()) {
                    Ok(chapter) => LoaderOutcome::ChapterLoaded { book, chapter },
                    Err(error) => LoaderOutcome::ChapterFailed { book, error },
                };
                let _ = tx.send(outcome);
            });
        if let Err(e) = spawned {
            return Err(RejectedChapterLoad {
                book,
                error: LoaderError::Spawn(e.to_string()),
            });
        }
        if let Err(mpsc::SendError(book)) = book_tx.send(book) {
            return Err(RejectedChapterLoad {
                book,
                error: LoaderError::Spawn("worker exited before taking the book".into()),
            });
        }
        self.pending = Some(rx);
        Ok(())
    }

    fn spawn(
        &mut self,
        name: &str,
        op: impl FnOnce() -> LoaderOutcome + Send + 'static,
    ) -> Result<(), LoaderError> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _ = tx.send(op());
            })
            .map_err(|e| LoaderError::Spawn(e.to_string()))?;
        self.pending = Some(rx);
        Ok(())
    }

    /// Non-blocking poll for the in-flight operation's outcome.
    ///
    /// Returns `None` while the operation is still running (or when the slot
    /// is idle); each outcome is delivered exactly once.
    pub fn poll(&mut self) -> Option<LoaderOutcome> {
        let outcome = match self.pending.as_ref()?.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => LoaderOutcome::WorkerLost,
        };
        self.pending = None;
        Some(outcome)
    }

    /// Block until the in-flight operation completes.
    ///
    /// Returns `None` when the slot is idle.
    pub fn wait(&mut self) -> Option<LoaderOutcome> {
        let receiver = self.pending.take()?;
        Some(receiver.recv().unwrap_or(LoaderOutcome::WorkerLost))
    }
}

fn chapter_payload(
    book: &mut Book,
    index: usize,
    engine: LayoutEngine,
    metrics: &dyn TextMetrics,
) -> Result<ChapterPayload, BookError> {
    let text = book.chapter_plain_text(index)?;
    let spans = engine.paginate(&text, metrics);
    Ok(ChapterPayload { index, text, spans })
}
