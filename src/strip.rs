//! Chapter markup sanitization.
//!
//! One left-to-right scan strips tags and discards `style`/`script`/`head`
//! content; block-level tags become single newlines. A short sequence of
//! post passes decodes the fixed entity table and normalizes whitespace.
//! Output depends only on the input, so repeated runs are bit-identical.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

/// Entity decode table, applied as literal substring replacement in order.
const ENTITY_TABLE: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#8217;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
];

/// Strip one chapter's HTML down to normalized plain text.
///
/// Soft line breaks come out as single newlines, paragraph boundaries as
/// double newlines; all other whitespace collapses to single spaces.
pub fn strip_chapter_html(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut inside_tag = false;
    let mut ignore_content = false;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'<' {
            inside_tag = true;

            if prefix_icase(bytes, i, b"<style")
                || prefix_icase(bytes, i, b"<script")
                || prefix_icase(bytes, i, b"<head")
            {
                ignore_content = true;
            }

            if prefix_icase(bytes, i, b"<p>")
                || prefix_icase(bytes, i, b"<p ")
                || prefix_icase(bytes, i, b"<div")
                || prefix_icase(bytes, i, b"<br")
            {
                push_block_break(&mut out);
            }

            if prefix_icase(bytes, i, b"</style>")
                || prefix_icase(bytes, i, b"</script>")
                || prefix_icase(bytes, i, b"</head>")
            {
                ignore_content = false;
            }

            if prefix_icase(bytes, i, b"</p>") || prefix_icase(bytes, i, b"</div>") {
                push_block_break(&mut out);
            }

            continue;
        }

        if b == b'>' {
            inside_tag = false;
            continue;
        }

        if !inside_tag && !ignore_content {
            // Raw whitespace carries no layout meaning in markup; line
            // structure comes from the block tags above.
            let c = if b == b'\n' || b == b'\r' || b == b'\t' {
                b' '
            } else {
                b
            };
            out.push(c);
        }
    }

    // The scan only drops or substitutes ASCII bytes, so the buffer is
    // still valid UTF-8.
    let mut text = String::from_utf8_lossy(&out).into_owned();

    for &(entity, replacement) in ENTITY_TABLE {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    while text.contains("  ") {
        text = text.replace("  ", " ");
    }

    text = text.replace(" \n", "\n");
    text = text.replace("\n ", "\n");

    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }

    text
}

/// Case-insensitive ASCII prefix check at a byte offset.
#[inline]
fn prefix_icase(bytes: &[u8], pos: usize, pattern: &[u8]) -> bool {
    bytes.len() - pos >= pattern.len()
        && bytes[pos..pos + pattern.len()].eq_ignore_ascii_case(pattern)
}

/// Emit one newline for a block-level tag, never duplicating one.
#[inline]
fn push_block_break(out: &mut Vec<u8>) {
    if !out.is_empty() && out.last() != Some(&b'\n') {
        out.push(b'\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_decoding() {
        assert_eq!(strip_chapter_html("A &amp; B"), "A & B");
        assert_eq!(strip_chapter_html("&lt;tag&gt;"), "<tag>");
        assert_eq!(strip_chapter_html("&#8220;hi&#8221;"), "\"hi\"");
        assert_eq!(strip_chapter_html("it&#8217;s"), "it's");
    }

    #[test]
    fn test_block_break_normalization() {
        // Exactly one newline between paragraphs, no tag remnants.
        assert_eq!(strip_chapter_html("<p>Hi</p><p>Bye</p>"), "Hi\nBye\n");
    }

    #[test]
    fn test_br_and_div_force_breaks() {
        assert_eq!(strip_chapter_html("one<br/>two"), "one\ntwo");
        assert_eq!(strip_chapter_html("<div>one</div><div>two</div>"), "one\ntwo\n");
    }

    #[test]
    fn test_no_leading_break() {
        // A block tag before any content emits nothing.
        assert!(!strip_chapter_html("<p>first</p>").starts_with('\n'));
    }

    #[test]
    fn test_style_script_head_content_is_discarded() {
        assert_eq!(
            strip_chapter_html("<style>p { color: red; }</style>body text"),
            "body text"
        );
        assert_eq!(
            strip_chapter_html("<script>var x = 1 < 2;</script>after"),
            "after"
        );
        assert_eq!(
            strip_chapter_html("<head><title>T</title></head><p>body</p>"),
            "body\n"
        );
    }

    #[test]
    fn test_case_insensitive_tags() {
        assert_eq!(strip_chapter_html("<P>Hi</P><DIV>Bye</DIV>"), "Hi\nBye\n");
        assert_eq!(
            strip_chapter_html("<STYLE>x</STYLE>kept"),
            "kept"
        );
    }

    #[test]
    fn test_raw_whitespace_collapses_to_single_spaces() {
        assert_eq!(strip_chapter_html("one\n\ttwo\r\nthree"), "one two three");
        assert_eq!(strip_chapter_html("a     b"), "a b");
    }

    #[test]
    fn test_spaces_adjacent_to_breaks_are_removed() {
        assert_eq!(strip_chapter_html("<p>one </p><p> two</p>"), "one\ntwo\n");
    }

    #[test]
    fn test_break_runs_collapse_to_paragraph_boundary() {
        assert_eq!(
            strip_chapter_html("<p>a</p><br/><br/><br/><p>b</p>"),
            "a\nb\n"
        );
    }

    #[test]
    fn test_inter_paragraph_whitespace_becomes_paragraph_boundary() {
        // Source whitespace between paragraphs yields the two-newline
        // paragraph marker after the adjacency passes.
        assert_eq!(strip_chapter_html("<p>a</p>\n<p>b</p>"), "a\n\nb\n");
    }

    #[test]
    fn test_attributes_never_leak() {
        assert_eq!(
            strip_chapter_html(r#"<p class="x" id="y">text</p>"#),
            "text\n"
        );
    }

    #[test]
    fn test_deterministic() {
        let input = "<p>Same &amp; same</p>\n<div>again</div>";
        assert_eq!(strip_chapter_html(input), strip_chapter_html(input));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_chapter_html(""), "");
    }

    #[test]
    fn test_multibyte_text_survives() {
        assert_eq!(strip_chapter_html("<p>héllo wörld</p>"), "héllo wörld\n");
    }
}
