//! Line-indexed mutable text store.
//!
//! Invariants (spec §3/§4.2):
//! - No line's byte buffer contains `\n`.
//! - An empty store has zero lines.
//! - Byte indices crossing the API are UTF-8 boundary-aligned.
//! - A column is a code-point offset, not a byte offset.

use thiserror::Error;

use crate::codec;
use crate::location::{Location, Region};

#[derive(Debug, Error)]
pub enum Error {
    #[error("line index {0} out of range")]
    LineOutOfRange(usize),
}

/// One line's owned byte buffer plus a changed-flag the renderer can use to
/// skip unmodified lines.
#[derive(Debug, Clone, Default)]
pub struct Line {
    bytes: Vec<u8>,
    pub changed: bool,
}

impl Line {
    fn from_str(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
            changed: true,
        }
    }

    pub fn as_str(&self) -> &str {
        // Safety/invariant: all mutation paths only insert valid UTF-8
        // substrings at char boundaries, so `bytes` is always valid UTF-8.
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }
}

/// A borrowed or owned chunk of text returned from a query. `get_line`
/// always borrows into the store; `get_region` spanning multiple lines
/// allocates an owned concatenation.
pub enum Chunk<'a> {
    Borrowed(&'a str),
    Owned(String),
}

impl<'a> Chunk<'a> {
    pub fn as_str(&self) -> &str {
        match self {
            Chunk::Borrowed(s) => s,
            Chunk::Owned(s) => s.as_str(),
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self, Chunk::Owned(_))
    }
}

/// Either a palette index (8/256-color) or a 24-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Indexed(u8),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorAttr {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Colors(ColorAttr),
    UserData(u64),
}

#[derive(Debug, Clone)]
pub struct Span {
    pub region: Region,
    pub property: Property,
}

/// A mutable sequence of lines with no embedded newlines, plus an unordered
/// set of text-property spans over it.
#[derive(Debug, Clone, Default)]
pub struct TextStore {
    lines: Vec<Line>,
    spans: Vec<Span>,
}

impl TextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(content: &str) -> Self {
        let mut store = Self::new();
        if !content.is_empty() {
            store.insert_at(Location::origin(), content.as_bytes());
        }
        store
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn num_chars(&self, line: usize) -> usize {
        self.lines.get(line).map(|l| l.char_len()).unwrap_or(0)
    }

    pub fn line_byte_len(&self, line: usize) -> usize {
        self.lines.get(line).map(|l| l.byte_len()).unwrap_or(0)
    }

    /// Borrowed view into a single line (always `Chunk::Borrowed`).
    pub fn get_line(&self, line: usize) -> Chunk<'_> {
        Chunk::Borrowed(self.lines.get(line).map(|l| l.as_str()).unwrap_or(""))
    }

    fn ensure_line(&mut self, idx: usize) {
        while self.lines.len() <= idx {
            self.lines.push(Line::default());
        }
    }

    fn col_to_byte(&self, line: usize, col: usize) -> usize {
        self.lines
            .get(line)
            .map(|l| codec::nbytes(l.as_str(), col))
            .unwrap_or(0)
    }

    fn byte_to_col(&self, line: usize, byte: usize) -> usize {
        self.lines
            .get(line)
            .map(|l| codec::nchars(l.as_str(), byte))
            .unwrap_or(0)
    }

    /// Append bytes (which may contain `\n`) to the end of the store.
    /// Returns the number of lines added.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let at = self.end();
        self.insert_at(at, bytes)
    }

    /// Insert `bytes` (which may contain `\n`) at `(line, col)`, splitting
    /// the input on newlines. Out-of-range line indices extend the store
    /// with empty lines first. Returns the number of lines added.
    pub fn insert_at(&mut self, at: Location, bytes: &[u8]) -> usize {
        self.ensure_line(at.line);
        let text = String::from_utf8_lossy(bytes).into_owned();
        let byte_col = self.col_to_byte(at.line, at.col).min(self.lines[at.line].byte_len());

        let mut segments: Vec<&str> = text.split('\n').collect();
        if segments.is_empty() {
            segments.push("");
        }
        let added = segments.len() - 1;

        let original = self.lines[at.line].as_str().to_string();
        let (before, after) = original.split_at(byte_col.min(original.len()));

        let mut new_lines = Vec::with_capacity(segments.len());
        new_lines.push(Line::from_str(&format!("{before}{}", segments[0])));
        for seg in &segments[1..segments.len() - 1] {
            new_lines.push(Line::from_str(seg));
        }
        if segments.len() > 1 {
            let last = *segments.last().unwrap();
            new_lines.push(Line::from_str(&format!("{last}{after}")));
        } else {
            let only = new_lines.pop().unwrap();
            new_lines.push(Line::from_str(&format!("{}{after}", only.as_str())));
        }

        self.lines.splice(at.line..=at.line, new_lines);
        added
    }

    /// Delete the inclusive `[start, end)` range, clamping out-of-range
    /// columns to end-of-line. Dropping to empty content yields zero lines.
    pub fn delete(&mut self, region: Region) {
        if self.lines.is_empty() || !region.has_size() {
            return;
        }
        let Region { begin, end } = region;
        let end_line = end.line.min(self.lines.len() - 1);
        let begin_line = begin.line.min(end_line);

        let begin_byte = self.col_to_byte(begin_line, begin.col).min(self.lines[begin_line].byte_len());
        let end_byte = self.col_to_byte(end_line, end.col).min(self.lines[end_line].byte_len());

        let head = self.lines[begin_line].as_str()[..begin_byte].to_string();
        let tail = self.lines[end_line].as_str()[end_byte..].to_string();
        let merged = format!("{head}{tail}");

        self.lines.splice(begin_line..=end_line, [Line::from_str(&merged)]);

        if self.lines.len() == 1 && self.lines[0].byte_len() == 0 {
            self.lines.clear();
        }
    }

    /// Visit `count` lines starting at `start`, in order.
    pub fn for_each_line<F: FnMut(&str, usize)>(&self, start: usize, count: usize, mut callback: F) {
        let end = (start + count).min(self.lines.len());
        for idx in start.min(end)..end {
            callback(self.lines[idx].as_str(), idx);
        }
    }

    /// `get_line` for a single line, `get_region` (owned, `\n`-joined) when
    /// the region spans multiple lines.
    pub fn get_region(&self, region: Region) -> Chunk<'static> {
        let Region { begin, end } = region;
        if self.lines.is_empty() {
            return Chunk::Owned(String::new());
        }
        let end_line = end.line.min(self.lines.len() - 1);
        let begin_line = begin.line.min(end_line);
        if begin_line == end_line {
            let byte_start = self.col_to_byte(begin_line, begin.col);
            let byte_end = self.col_to_byte(end_line, end.col).max(byte_start);
            let s = self.lines[begin_line].as_str();
            let e = byte_end.min(s.len());
            let b = byte_start.min(e);
            return Chunk::Owned(s[b..e].to_string());
        }
        let mut out = String::new();
        let byte_start = self.col_to_byte(begin_line, begin.col);
        out.push_str(&self.lines[begin_line].as_str()[byte_start.min(self.lines[begin_line].byte_len())..]);
        for idx in begin_line + 1..end_line {
            out.push('\n');
            out.push_str(self.lines[idx].as_str());
        }
        out.push('\n');
        let byte_end = self.col_to_byte(end_line, end.col).min(self.lines[end_line].byte_len());
        out.push_str(&self.lines[end_line].as_str()[..byte_end]);
        Chunk::Owned(out)
    }

    pub fn col_from_byte(&self, line: usize, byte: usize) -> usize {
        self.byte_to_col(line, byte)
    }

    pub fn byte_from_col(&self, line: usize, col: usize) -> usize {
        self.col_to_byte(line, col)
    }

    pub fn clamp(&self, mut loc: Location) -> Location {
        if self.lines.is_empty() {
            return Location::origin();
        }
        if loc.line >= self.lines.len() {
            loc.line = self.lines.len() - 1;
        }
        let max_col = self.num_chars(loc.line);
        if loc.col > max_col {
            loc.col = max_col;
        }
        loc
    }

    pub fn end(&self) -> Location {
        if self.lines.is_empty() {
            Location::origin()
        } else {
            let last = self.lines.len() - 1;
            Location::new(last, self.num_chars(last))
        }
    }

    pub fn add_property(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn properties_at(&self, loc: Location) -> Vec<&Property> {
        self.spans
            .iter()
            .filter(|s| s.region.contains(loc))
            .map(|s| &s.property)
            .collect()
    }

    pub fn clear_properties(&mut self) {
        self.spans.clear();
    }

    /// Total logical content, joining lines with `\n`, no trailing newline.
    /// Used by the round-trip testable property and by `write_to_file`.
    pub fn to_string_lossless(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_zero_lines() {
        let store = TextStore::new();
        assert_eq!(store.num_lines(), 0);
    }

    #[test]
    fn insert_splits_on_newlines_and_reports_added_count() {
        let mut store = TextStore::new();
        let added = store.insert_at(Location::origin(), b"ab\ncd\nef");
        assert_eq!(added, 2);
        assert_eq!(store.num_lines(), 3);
        assert_eq!(store.get_line(0).as_str(), "ab");
        assert_eq!(store.get_line(1).as_str(), "cd");
        assert_eq!(store.get_line(2).as_str(), "ef");
    }

    #[test]
    fn insert_in_middle_of_line() {
        let mut store = TextStore::from_str("hello world");
        store.insert_at(Location::new(0, 5), b",");
        assert_eq!(store.get_line(0).as_str(), "hello, world");
    }

    #[test]
    fn delete_merges_tail_into_first_line() {
        let mut store = TextStore::from_str("a\nb\nc");
        store.delete(Region::new(Location::new(0, 1), Location::new(2, 0)));
        assert_eq!(store.num_lines(), 1);
        assert_eq!(store.get_line(0).as_str(), "ac");
    }

    #[test]
    fn delete_everything_drops_to_zero_lines() {
        let mut store = TextStore::from_str("abc");
        store.delete(Region::new(Location::new(0, 0), Location::new(0, 3)));
        assert_eq!(store.num_lines(), 0);
    }

    #[test]
    fn get_region_joins_with_newline_when_multiline() {
        let store = TextStore::from_str("abc\ndef\nghi");
        let chunk = store.get_region(Region::new(Location::new(0, 1), Location::new(2, 2)));
        assert_eq!(chunk.as_str(), "bc\ndef\ngh");
        assert!(chunk.is_allocated());
    }

    #[test]
    fn round_trip_matches_get_region_of_whole_buffer() {
        let store = TextStore::from_str("one\ntwo\nthree");
        let whole = store.get_region(Region::new(Location::origin(), store.end()));
        assert_eq!(whole.as_str(), store.to_string_lossless());
    }

    #[test]
    fn properties_are_unordered_and_overlap_allowed() {
        let mut store = TextStore::from_str("hello world");
        store.add_property(Span {
            region: Region::new(Location::new(0, 0), Location::new(0, 5)),
            property: Property::Colors(ColorAttr {
                fg: Some(Color::Indexed(1)),
                bg: None,
            }),
        });
        store.add_property(Span {
            region: Region::new(Location::new(0, 2), Location::new(0, 8)),
            property: Property::UserData(7),
        });
        let at = store.properties_at(Location::new(0, 3));
        assert_eq!(at.len(), 2);
        store.clear_properties();
        assert!(store.properties_at(Location::new(0, 3)).is_empty());
    }
}
