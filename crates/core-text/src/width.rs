//! Grapheme-cluster display width.
//!
//! One authoritative function, `egc_width`, gives the terminal column width
//! for a single grapheme cluster. Width decisions should flow through here
//! rather than calling `unicode_width` directly, so future East-Asian-width
//! or emoji-presentation fixes land in one place.

use unicode_segmentation::UnicodeSegmentation;

/// Width, in terminal cells, of a single extended grapheme cluster.
///
/// Multi-codepoint clusters (combining marks, ZWJ emoji sequences, flags)
/// take the max width of their constituent scalars, which avoids
/// undercounting wide bases followed by zero-width marks while not
/// overcounting plain combining sequences.
pub fn egc_width(egc: &str) -> u16 {
    egc.chars()
        .map(crate::codec::char_width)
        .max()
        .unwrap_or(0) as u16
}

/// Visual width of an entire line (sum of cluster widths), with tabs
/// expanded to `tab_width` columns measured from the running column.
pub fn line_visual_width(line: &str, tab_width: usize) -> usize {
    let mut col = 0usize;
    for g in line.graphemes(true) {
        if g == "\t" {
            let advance = tab_width - (col % tab_width);
            col += advance;
        } else {
            col += egc_width(g) as usize;
        }
    }
    col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert_eq!(egc_width("a"), 1);
    }

    #[test]
    fn cjk_is_wide() {
        assert_eq!(egc_width("界"), 2);
    }

    #[test]
    fn combining_mark_follows_base() {
        assert_eq!(egc_width("e\u{0301}"), 1);
    }

    #[test]
    fn emoji_is_wide() {
        assert_eq!(egc_width("😀"), 2);
    }

    #[test]
    fn tabs_expand_to_stop() {
        assert_eq!(line_visual_width("a\tb", 4), 5); // 'a' + 3 to next stop + 'b'
        assert_eq!(line_visual_width("\t", 4), 4);
    }
}
