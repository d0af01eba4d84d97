//! Greedy line packing: page-boundary computation and draw-time replay.

use crate::ir::{PageSpan, PlacedWord, Viewport};

/// Word-width and line-height measurement capability supplied by the
/// renderer. Pagination consumes nothing else about the font.
pub trait TextMetrics: Send + Sync {
    /// Rendered advance width of `text`, in layout units.
    fn measure_width(&self, text: &str) -> i32;

    /// Height of one text line, in layout units.
    fn line_height(&self) -> i32;
}

/// Fixed-advance metrics for tests and host-side previews, standing in for
/// a real font backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedMetrics {
    /// Advance width of every character.
    pub char_width: i32,
    /// Line height.
    pub line_height: i32,
}

impl TextMetrics for FixedMetrics {
    fn measure_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.char_width
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }
}

/// Where one run of the packing routine stopped.
enum PackEnd {
    /// The next line no longer fits; the page closes and the following page
    /// resumes at this byte offset.
    PageFull { resume: usize },
    /// The byte range ran out before the page did.
    InputExhausted,
}

/// Deterministic greedy layout engine for one viewport.
///
/// `paginate` and `draw_span` drive the same private packing routine; there
/// is deliberately no second line-breaking implementation, so a span's first
/// line renders exactly where pagination decided it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEngine {
    viewport: Viewport,
}

impl LayoutEngine {
    /// Engine for an explicit viewport.
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    /// Convenience for a display size.
    pub fn for_display(width: i32, height: i32) -> Self {
        Self::new(Viewport::new(width, height))
    }

    /// The viewport this engine packs into.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Compute page boundaries over `text`.
    ///
    /// Returns a gapless, monotonically increasing partition of
    /// `[0, text.len())`; empty text yields no pages. Identical inputs give
    /// identical spans. Every closed page consumed at least one byte, so the
    /// pass terminates even for degenerate viewports.
    pub fn paginate(&self, text: &str, metrics: &dyn TextMetrics) -> Vec<PageSpan> {
        let mut spans = Vec::new();
        if text.is_empty() {
            return spans;
        }

        let mut start = 0;
        loop {
            match pack_range(text, start, text.len(), self.viewport, metrics, &mut |_| {}) {
                PackEnd::PageFull { resume } => {
                    spans.push(PageSpan::new(start, resume - start));
                    start = resume;
                }
                PackEnd::InputExhausted => {
                    if start < text.len() {
                        spans.push(PageSpan::new(start, text.len() - start));
                    }
                    break;
                }
            }
        }
        log::debug!("paginated {} bytes into {} pages", text.len(), spans.len());
        spans
    }

    /// Replay layout for one span, streaming placement commands in order.
    ///
    /// Runs the identical packing routine restricted to the span's byte
    /// range; never reads past it. Out-of-range spans are clamped to the
    /// text, matching the tolerance of the drawing path they feed.
    pub fn draw_span<'t, F>(
        &self,
        text: &'t str,
        span: PageSpan,
        metrics: &dyn TextMetrics,
        mut sink: F,
    ) where
        F: FnMut(PlacedWord<'t>),
    {
        let start = span.start.min(text.len());
        let end = span.end().min(text.len());
        if start >= end {
            return;
        }
        let _ = pack_range(text, start, end, self.viewport, metrics, &mut sink);
    }

    /// Collect a span's placement commands into a vector.
    pub fn placed_words<'t>(
        &self,
        text: &'t str,
        span: PageSpan,
        metrics: &dyn TextMetrics,
    ) -> Vec<PlacedWord<'t>> {
        let mut words = Vec::new();
        self.draw_span(text, span, metrics, |word| words.push(word));
        words
    }
}

/// The one packing routine both passes share.
///
/// Walks `text[start..end]` with a greedy cursor: explicit newlines advance
/// the line without measurement; words wrap when they no longer fit a
/// non-empty line; a word wider than the whole viewport sits at line start
/// and overflows horizontally rather than being split. After a word, exactly
/// one separating space is consumed. Returns at the first line that no
/// longer fits vertically, or when the range is exhausted. The resume offset
/// of a full page is always past `start`: a newline break consumed the
/// newline, and a wrap break requires a word already placed on the page.
fn pack_range<'t>(
    text: &'t str,
    start: usize,
    end: usize,
    viewport: Viewport,
    metrics: &dyn TextMetrics,
    sink: &mut dyn FnMut(PlacedWord<'t>),
) -> PackEnd {
    let bytes = text.as_bytes();
    let line_height = metrics.line_height();
    let space_width = metrics.measure_width(" ");

    let mut x = 0;
    let mut y = 0;
    let mut i = start;

    while i < end {
        if bytes[i] == b'\n' {
            x = 0;
            y += line_height;
            i += 1;
            if y + line_height > viewport.height {
                return PackEnd::PageFull { resume: i };
            }
            continue;
        }

        let word_start = i;
        let mut word_end = i;
        while word_end < end && bytes[word_end] != b' ' && bytes[word_end] != b'\n' {
            word_end += 1;
        }
        let word = &text[word_start..word_end];
        let word_width = metrics.measure_width(word);

        if x + word_width > viewport.width && x > 0 {
            x = 0;
            y += line_height;
            if y + line_height > viewport.height {
                return PackEnd::PageFull { resume: word_start };
            }
        }

        if !word.is_empty() {
            sink(PlacedWord { x, y, text: word });
        }
        x += word_width;
        i = word_end;

        if i < end && bytes[i] == b' ' {
            x += space_width;
            i += 1;
        }
    }

    PackEnd::InputExhausted
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: FixedMetrics = FixedMetrics {
        char_width: 10,
        line_height: 10,
    };

    fn span_texts<'t>(text: &'t str, spans: &[PageSpan]) -> Vec<&'t str> {
        spans.iter().map(|s| &text[s.start..s.end()]).collect()
    }

    #[test]
    fn test_empty_text_yields_no_pages() {
        let engine = LayoutEngine::for_display(100, 100);
        assert!(engine.paginate("", &METRICS).is_empty());
    }

    #[test]
    fn test_short_text_is_a_single_page() {
        let engine = LayoutEngine::for_display(200, 100);
        let spans = engine.paginate("hello world", &METRICS);
        assert_eq!(spans, vec![PageSpan::new(0, 11)]);
    }

    #[test]
    fn test_boundary_after_wrap_that_overflows_the_page() {
        // "one two" packs onto the first line; "three" no longer fits the
        // line, and the viewport has no room for a second one, so the page
        // closes right after "two" and its separator.
        let engine = LayoutEngine::for_display(100, 10);
        let text = "one two three\nfour";
        let spans = engine.paginate(text, &METRICS);
        assert_eq!(span_texts(text, &spans), vec!["one two ", "three\n", "four"]);
    }

    #[test]
    fn test_two_line_page_breaks_after_newline() {
        // With room for two lines, "three" wraps within the page and the
        // explicit newline is what overflows it.
        let engine = LayoutEngine::for_display(100, 20);
        let text = "one two three\nfour";
        let spans = engine.paginate(text, &METRICS);
        assert_eq!(span_texts(text, &spans), vec!["one two three\n", "four"]);
    }

    #[test]
    fn test_newline_is_consumed_without_measurement() {
        let engine = LayoutEngine::for_display(30, 100);
        let text = "a\nb";
        let words = engine.placed_words(text, PageSpan::new(0, 3), &METRICS);
        assert_eq!(words.len(), 2);
        assert_eq!((words[0].x, words[0].y), (0, 0));
        assert_eq!((words[1].x, words[1].y), (0, 10));
    }

    #[test]
    fn test_oversized_word_overflows_horizontally() {
        let engine = LayoutEngine::for_display(50, 100);
        let text = "overlong a";
        let spans = engine.paginate(text, &METRICS);
        assert_eq!(spans.len(), 1);
        let words = engine.placed_words(text, spans[0], &METRICS);
        // Placed at line start despite being 80 units wide; never split.
        assert_eq!((words[0].x, words[0].y), (0, 0));
        // The next word wraps under it.
        assert_eq!((words[1].x, words[1].y), (0, 10));
    }

    #[test]
    fn test_exact_fit_does_not_wrap() {
        // Ten chars exactly fill a 100-unit line.
        let engine = LayoutEngine::for_display(100, 100);
        let text = "abcdefghij next";
        let words = engine.placed_words(text, PageSpan::new(0, text.len()), &METRICS);
        assert_eq!((words[0].x, words[0].y), (0, 0));
        assert_eq!((words[1].x, words[1].y), (0, 10));
    }

    #[test]
    fn test_zero_height_viewport_terminates() {
        let engine = LayoutEngine::for_display(50, 0);
        let text = "a b c d";
        let spans = engine.paginate(text, &METRICS);
        assert!(!spans.is_empty());
        assert_partition(text, &spans);
    }

    #[test]
    fn test_paginate_is_deterministic() {
        let engine = LayoutEngine::for_display(70, 30);
        let text = "some words flow across pages\nwith breaks\n\nand paragraphs";
        assert_eq!(engine.paginate(text, &METRICS), engine.paginate(text, &METRICS));
    }

    #[test]
    fn test_partition_over_mixed_inputs() {
        let samples = [
            "word",
            "two words",
            "a\n\nb\n\nc",
            "tail space ",
            "\n\n\n",
            "supercalifragilistic tiny words here and there\nnext line",
        ];
        for viewport in [(40, 10), (100, 20), (10, 10), (300, 300)] {
            let engine = LayoutEngine::for_display(viewport.0, viewport.1);
            for text in samples {
                let spans = engine.paginate(text, &METRICS);
                assert_partition(text, &spans);
            }
        }
    }

    fn assert_partition(text: &str, spans: &[PageSpan]) {
        let mut expected_start = 0;
        for span in spans {
            assert_eq!(span.start, expected_start, "gap or overlap in {:?}", text);
            assert!(span.len > 0, "empty span for {:?}", text);
            expected_start = span.end();
        }
        assert_eq!(expected_start, text.len(), "spans do not cover {:?}", text);
    }
}
