//! Centralized normalization + segmentation adapter.
//!
//! Contract:
//! - Input: `&str` raw input (may originate from a paste or a single keystroke).
//! - Output: (normalized NFC string, grapheme segments) where each segment
//!   carries its byte range in the normalized string and its display width.
//! - Guarantees: segments are ordered, non-overlapping, and their clusters
//!   concatenate back to the normalized string.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub cluster: String,
    pub start: usize,
    pub end: usize,
    pub width: u16,
}

pub fn normalize_and_segment(input: &str) -> (String, Vec<Segment>) {
    let normalized: String = input.nfc().collect();
    let mut out = Vec::new();
    let mut byte = 0usize;
    for g in normalized.graphemes(true) {
        let len = g.len();
        out.push(Segment {
            cluster: g.to_string(),
            start: byte,
            end: byte + len,
            width: crate::width::egc_width(g),
        });
        byte += len;
    }
    (normalized, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nfc_equivalence_and_segmentation_single_cluster() {
        let decomposed = "e\u{0301}";
        let composed = "\u{00E9}";
        let (n1, s1) = normalize_and_segment(decomposed);
        let (n2, s2) = normalize_and_segment(composed);
        assert_eq!(n1, n2);
        assert_eq!(s1.len(), 1);
        assert_eq!(s2.len(), 1);
        assert_eq!(s1[0].cluster, "\u{00E9}");
        assert_eq!(s1[0].width, s2[0].width);
    }

    #[test]
    fn segmentation_family_and_cjk() {
        let s = "汉😀👨‍👩‍👧‍👦a";
        let (_n, segs) = normalize_and_segment(s);
        assert!(segs.len() >= 4);
        let mut prev_end = 0usize;
        let mut join = String::new();
        for seg in &segs {
            assert_eq!(seg.start, prev_end);
            assert!(seg.end >= seg.start);
            prev_end = seg.end;
            join.push_str(&seg.cluster);
        }
        assert_eq!(join, s.nfc().collect::<String>());
    }
}
