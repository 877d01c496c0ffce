//! Buffers: text store + undo log + hook dispatch + language metadata.
//!
//! The kill ring is *not* owned here: it is explicit top-level state shared
//! across every buffer and threaded through command contexts, so
//! `copy`/`cut`/`paste` below take a `&mut KillRing`.

pub mod arena;
pub mod killring;
pub mod undo;

pub use arena::{BufferArena, BufferId};

use std::path::PathBuf;
use std::time::SystemTime;

use thiserror::Error;
use tracing::trace;

use core_text::{Chunk, Location, Region, TextStore};
use killring::KillRing;
use undo::{Inverse, Record, UndoLog};

#[derive(Debug, Error)]
pub enum Error {
    #[error("buffer is read-only")]
    ReadOnly,
    #[error("buffer has no backing file")]
    NoBackingFile,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Default)]
pub struct LanguageDescriptor {
    pub name: String,
    pub tab_width: usize,
}

/// Reason a hook fired, mirroring spec §4.4's hook taxonomy.
pub enum HookEvent<'a> {
    Create,
    Insert { region: Region, bytes: &'a [u8] },
    Delete { region: Region, bytes: &'a [u8] },
    Reload,
    Destroy,
}

pub type Hook = Box<dyn FnMut(HookEvent) + Send>;

/// A per-buffer update hook, run once per render (spec §3 "text-property
/// lifecycle", §4.5 `view_update` step 1). Receives `&mut Buffer` so it can
/// re-add text-property spans directly (the mechanism spec §3 describes
/// for persistent decoration, since properties are cleared every frame),
/// and returns a left-fringe margin contribution in columns.
pub type UpdateHook = Box<dyn FnMut(&mut Buffer) -> u16 + Send>;

pub type HookId = u64;

#[derive(Default)]
struct Hooks {
    create: Vec<(HookId, Hook)>,
    insert: Vec<(HookId, Hook)>,
    delete: Vec<(HookId, Hook)>,
    reload: Vec<(HookId, Hook)>,
    destroy: Vec<(HookId, Hook)>,
    update: Vec<(HookId, UpdateHook)>,
    next_id: HookId,
}

/// Word-motion delimiter set: whitespace plus common punctuation, so
/// next-word/previous-word land at the start of the following token rather
/// than stopping at its first internal punctuation mark.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || ".()\",;:!?[]{}'".contains(c)
}

pub struct Buffer {
    pub name: String,
    pub path: Option<PathBuf>,
    pub last_written: Option<SystemTime>,
    pub modified: bool,
    pub read_only: bool,
    pub language: LanguageDescriptor,
    /// When set, inserts that add new lines grow the store lazily rather
    /// than pre-splitting; preserved from spec §3 as a buffer-level flag
    /// even though this port's `TextStore::insert_at` always computes the
    /// split eagerly (no behavioral difference observable at this layer).
    pub lazy_row_add: bool,
    store: TextStore,
    undo: UndoLog,
    hooks: Hooks,
}

impl Buffer {
    pub fn create(name: impl Into<String>) -> Self {
        let mut buffer = Self {
            name: name.into(),
            path: None,
            last_written: None,
            modified: false,
            read_only: false,
            language: LanguageDescriptor::default(),
            lazy_row_add: false,
            store: TextStore::new(),
            undo: UndoLog::new(),
            hooks: Hooks::default(),
        };
        buffer.fire(HookEvent::Create);
        buffer
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let mut buffer = Self::create(name);
        buffer.store = TextStore::from_str(&content);
        buffer.last_written = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        buffer.path = Some(path);
        Ok(buffer)
    }

    fn fire(&mut self, event: HookEvent) {
        let hooks = match &event {
            HookEvent::Create => &mut self.hooks.create,
            HookEvent::Insert { .. } => &mut self.hooks.insert,
            HookEvent::Delete { .. } => &mut self.hooks.delete,
            HookEvent::Reload => &mut self.hooks.reload,
            HookEvent::Destroy => &mut self.hooks.destroy,
        };
        for (_, hook) in hooks.iter_mut() {
            let event = match &event {
                HookEvent::Create => HookEvent::Create,
                HookEvent::Insert { region, bytes } => HookEvent::Insert {
                    region: *region,
                    bytes,
                },
                HookEvent::Delete { region, bytes } => HookEvent::Delete {
                    region: *region,
                    bytes,
                },
                HookEvent::Reload => HookEvent::Reload,
                HookEvent::Destroy => HookEvent::Destroy,
            };
            hook(event);
        }
    }

    fn next_hook_id(&mut self) -> HookId {
        self.hooks.next_id += 1;
        self.hooks.next_id
    }

    pub fn add_insert_hook(&mut self, hook: Hook) -> HookId {
        let id = self.next_hook_id();
        self.hooks.insert.push((id, hook));
        id
    }

    pub fn add_delete_hook(&mut self, hook: Hook) -> HookId {
        let id = self.next_hook_id();
        self.hooks.delete.push((id, hook));
        id
    }

    pub fn add_reload_hook(&mut self, hook: Hook) -> HookId {
        let id = self.next_hook_id();
        self.hooks.reload.push((id, hook));
        id
    }

    pub fn add_destroy_hook(&mut self, hook: Hook) -> HookId {
        let id = self.next_hook_id();
        self.hooks.destroy.push((id, hook));
        id
    }

    /// Register a per-frame update hook (spec §4.4's hook taxonomy, §4.5
    /// `view_update` step 1). Returns an id usable with
    /// [`Buffer::remove_update_hook`].
    pub fn add_update_hook(&mut self, hook: UpdateHook) -> HookId {
        let id = self.next_hook_id();
        self.hooks.update.push((id, hook));
        id
    }

    pub fn remove_insert_hook(&mut self, id: HookId) {
        self.hooks.insert.retain(|(hid, _)| *hid != id);
    }

    pub fn remove_delete_hook(&mut self, id: HookId) {
        self.hooks.delete.retain(|(hid, _)| *hid != id);
    }

    pub fn remove_update_hook(&mut self, id: HookId) {
        self.hooks.update.retain(|(hid, _)| *hid != id);
    }

    /// Run every registered update hook, letting each re-add text
    /// properties to the store directly, and return the sum of their
    /// requested left-fringe margin contributions.
    pub fn run_update_hooks(&mut self) -> u16 {
        let mut hooks = std::mem::take(&mut self.hooks.update);
        let mut margin = 0u16;
        for (_, hook) in hooks.iter_mut() {
            margin += hook(self);
        }
        self.hooks.update = hooks;
        margin
    }

    /// Clear text properties and run every update hook (which may re-add
    /// their own), returning the sum of requested left-fringe margins.
    /// This is the one per-frame entry point a view drives before reading
    /// the buffer for rendering.
    pub fn buffer_update(&mut self) -> u16 {
        self.store.clear_properties();
        self.run_update_hooks()
    }

    pub fn destroy(mut self) {
        self.fire(HookEvent::Destroy);
    }

    pub fn num_lines(&self) -> usize {
        self.store.num_lines()
    }

    pub fn num_chars(&self, line: usize) -> usize {
        self.store.num_chars(line)
    }

    pub fn line(&self, line: usize) -> Chunk<'_> {
        self.store.get_line(line)
    }

    pub fn clamp(&self, loc: Location) -> Location {
        self.store.clamp(loc)
    }

    pub fn end(&self) -> Location {
        self.store.end()
    }

    /// One character forward, wrapping onto the next line at end-of-line.
    /// A no-op at buffer end, so `previous_char(next_char(L)) == L`
    /// whenever `L` is not already there (spec §8).
    pub fn next_char(&self, loc: Location) -> Location {
        let loc = self.store.clamp(loc);
        let line_len = self.store.num_chars(loc.line);
        if loc.col < line_len {
            Location::new(loc.line, loc.col + 1)
        } else if loc.line + 1 < self.store.num_lines() {
            Location::new(loc.line + 1, 0)
        } else {
            loc
        }
    }

    /// One character backward, wrapping onto the end of the previous line.
    /// A no-op at (0, 0).
    pub fn previous_char(&self, loc: Location) -> Location {
        let loc = self.store.clamp(loc);
        if loc.col > 0 {
            Location::new(loc.line, loc.col - 1)
        } else if loc.line > 0 {
            Location::new(loc.line - 1, self.store.num_chars(loc.line - 1))
        } else {
            loc
        }
    }

    /// One line down, clamping the column into the destination line.
    pub fn next_line(&self, loc: Location) -> Location {
        let loc = self.store.clamp(loc);
        let target = (loc.line + 1).min(self.store.num_lines().saturating_sub(1));
        self.store.clamp(Location::new(target, loc.col))
    }

    /// One line up, clamping the column into the destination line.
    pub fn previous_line(&self, loc: Location) -> Location {
        let loc = self.store.clamp(loc);
        let target = loc.line.saturating_sub(1);
        self.store.clamp(Location::new(target, loc.col))
    }

    pub fn store(&self) -> &TextStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TextStore {
        &mut self.store
    }

    /// Insert `bytes` at `location`. Returns the location after the
    /// inserted text. No-op (returns `location` unchanged) on a read-only
    /// buffer.
    pub fn add(&mut self, location: Location, bytes: &[u8]) -> Location {
        if self.read_only {
            trace!("add on read-only buffer ignored");
            return location;
        }
        let loc = self.store.clamp(location);
        let added_lines = self.store.insert_at(loc, bytes);
        let end = if added_lines == 0 {
            Location::new(loc.line, loc.col + core_text::codec::nchars(std::str::from_utf8(bytes).unwrap_or(""), bytes.len()))
        } else {
            let text = String::from_utf8_lossy(bytes);
            let last_seg = text.rsplit('\n').next().unwrap_or("");
            Location::new(loc.line + added_lines, core_text::codec::nchars(last_seg, last_seg.len()))
        };
        self.undo.push_add(loc, end);
        self.modified = true;
        self.fire(HookEvent::Insert {
            region: Region::new(loc, end),
            bytes,
        });
        if added_lines > 0 {
            self.undo.push_boundary(false);
        }
        end
    }

    /// Delete `region`. Returns `region.begin`, the location the caller's
    /// cursor should move to.
    pub fn delete(&mut self, region: Region) -> Location {
        if self.read_only || !region.has_size() {
            return region.begin;
        }
        let chunk = self.store.get_region(region);
        let bytes = chunk.as_str().as_bytes().to_vec();
        self.store.delete(region);
        self.undo.push_delete(region.begin, bytes.clone());
        self.modified = true;
        self.fire(HookEvent::Delete {
            region,
            bytes: &bytes,
        });
        region.begin
    }

    pub fn newline(&mut self, location: Location) -> Location {
        self.add(location, b"\n")
    }

    /// Insert tab-width spaces (capped at 16) at `location`.
    pub fn indent(&mut self, location: Location, tab_width: usize) -> Location {
        let width = tab_width.min(16);
        self.add(location, " ".repeat(width).as_bytes())
    }

    pub fn push_boundary(&mut self, savepoint: bool) {
        self.undo.push_boundary(savepoint);
        if savepoint {
            self.modified = false;
        }
    }

    /// Undo one group, returning the post-undo location. The inverses are
    /// applied through the same `add`/`delete` primitives a normal edit
    /// uses, so while `in_progress` is set they push their own records onto
    /// the tail of the log instead of mutating the store directly; once
    /// `next()` bottoms out and resets `top` to the end of the log, those
    /// pushed records are what redo picks up.
    pub fn undo(&mut self, location: Location) -> Location {
        self.undo.begin();
        let group = self.undo.next();
        let mut loc = location;
        for record in group {
            loc = self.apply_inverse(record, loc);
        }
        self.undo.end();
        loc
    }

    fn apply_inverse(&mut self, record: Record, loc: Location) -> Location {
        match undo::invert(record) {
            Inverse::Delete(region) => self.delete(region),
            Inverse::Add { position, bytes } => self.add(position, &bytes),
            Inverse::ClearModified => {
                self.modified = false;
                loc
            }
            Inverse::Noop => loc,
        }
    }

    pub fn word_at(&self, location: Location) -> Region {
        let chunk = self.store.get_line(location.line);
        let line = chunk.as_str();
        let chars: Vec<char> = line.chars().collect();
        let col = location.col.min(chars.len());
        if chars.is_empty() {
            return Region::new(location, location);
        }
        let at = col.min(chars.len() - 1);
        if is_delimiter(chars[at]) {
            return Region::new(location, Location::new(location.line, at + 1));
        }
        let mut start = at;
        while start > 0 && !is_delimiter(chars[start - 1]) {
            start -= 1;
        }
        let mut end = at;
        while end < chars.len() && !is_delimiter(chars[end]) {
            end += 1;
        }
        Region::new(
            Location::new(location.line, start),
            Location::new(location.line, end),
        )
    }

    /// Skip the word run under/after `location`, then skip the following
    /// delimiter run, landing at the start of the next token.
    pub fn next_word(&self, location: Location) -> Location {
        let mut line_idx = location.line.min(self.store.num_lines().saturating_sub(1));
        let mut chars = self.line_chars(line_idx);
        let mut col = location.col.min(chars.len());

        while !is_delimiter_at(&chars, col) {
            col += 1;
        }
        loop {
            while col < chars.len() && is_delimiter(chars[col]) {
                col += 1;
            }
            if col < chars.len() {
                return Location::new(line_idx, col);
            }
            if line_idx + 1 >= self.store.num_lines() {
                return Location::new(line_idx, chars.len());
            }
            line_idx += 1;
            chars = self.line_chars(line_idx);
            col = 0;
            if !chars.is_empty() && !is_delimiter(chars[0]) {
                return Location::new(line_idx, 0);
            }
        }
    }

    pub fn previous_word(&self, location: Location) -> Location {
        let mut line_idx = location.line.min(self.store.num_lines().saturating_sub(1));
        let mut chars = self.line_chars(line_idx);
        let mut col = location.col.min(chars.len());

        loop {
            while col > 0 && is_delimiter(chars[col - 1]) {
                col -= 1;
            }
            if col > 0 {
                break;
            }
            if line_idx == 0 {
                return Location::new(0, 0);
            }
            line_idx -= 1;
            chars = self.line_chars(line_idx);
            col = chars.len();
        }
        while col > 0 && !is_delimiter(chars[col - 1]) {
            col -= 1;
        }
        Location::new(line_idx, col)
    }

    fn line_chars(&self, idx: usize) -> Vec<char> {
        self.store.get_line(idx).as_str().chars().collect()
    }

    pub fn copy_region(&self, region: Region, kill_ring: &mut KillRing) {
        let chunk = self.store.get_region(region);
        kill_ring.push(chunk.as_str().as_bytes().to_vec());
    }

    pub fn cut_region(&mut self, region: Region, kill_ring: &mut KillRing) -> Location {
        let chunk = self.store.get_region(region);
        kill_ring.push(chunk.as_str().as_bytes().to_vec());
        self.delete(region)
    }

    /// Cut from `location` through end-of-line, consuming at least one
    /// character (the newline) when already at end-of-line.
    pub fn kill_line(&mut self, location: Location, kill_ring: &mut KillRing) -> Location {
        let line_len = self.store.num_chars(location.line);
        let mut count = line_len.saturating_sub(location.col);
        if count == 0 {
            count = 1;
        }
        let end = Location::new(location.line, location.col + count);
        self.cut_region(Region::new(location, end), kill_ring)
    }

    pub fn paste(&mut self, location: Location, kill_ring: &mut KillRing) -> Location {
        let Some(bytes) = kill_ring.paste().map(<[u8]>::to_vec) else {
            return location;
        };
        self.add(location, &bytes)
    }

    /// Replace the just-pasted region with the prior ring entry.
    pub fn paste_older(&mut self, pasted: Region, kill_ring: &mut KillRing) -> Option<Location> {
        let bytes = kill_ring.paste_older()?.to_vec();
        self.delete(pasted);
        Some(self.add(pasted.begin, &bytes))
    }

    pub fn sort_lines(&mut self, region: Region) {
        let start = region.begin.line;
        let end = region.end.line.min(self.store.num_lines().saturating_sub(1));
        if start >= end {
            return;
        }
        let mut lines: Vec<String> = (start..=end)
            .map(|i| self.store.get_line(i).as_str().to_string())
            .collect();
        lines.sort();
        let whole = Region::new(Location::new(start, 0), Location::new(end, self.store.num_chars(end)));
        let joined = lines.join("\n");
        self.store.delete(whole);
        self.store.insert_at(Location::new(start, 0), joined.as_bytes());
    }

    pub fn write_to_file(&mut self, path: Option<PathBuf>) -> Result<()> {
        let target = path.or_else(|| self.path.clone()).ok_or(Error::NoBackingFile)?;
        let content = self.store.to_string_lossless();
        std::fs::write(&target, content)?;
        self.path = Some(std::fs::canonicalize(&target).unwrap_or(target));
        self.last_written = std::fs::metadata(self.path.as_ref().unwrap())
            .and_then(|m| m.modified())
            .ok();
        self.modified = false;
        Ok(())
    }

    pub fn reload(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(Error::NoBackingFile)?;
        let content = std::fs::read_to_string(&path)?;
        self.store = TextStore::from_str(&content);
        self.modified = false;
        self.fire(HookEvent::Reload);
        Ok(())
    }
}

fn is_delimiter_at(chars: &[char], col: usize) -> bool {
    col >= chars.len() || is_delimiter(chars[col])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize, col: usize) -> Location {
        Location::new(line, col)
    }

    #[test]
    fn insert_and_undo_restores_empty_buffer() {
        let mut buf = Buffer::create("t");
        let mut at = loc(0, 0);
        at = buf.add(at, b"a");
        at = buf.add(at, b"b");
        let _ = buf.add(at, b"c");
        buf.push_boundary(false);
        assert_eq!(buf.store.get_line(0).as_str(), "abc");

        let post = buf.undo(loc(0, 3));
        assert_eq!(buf.num_lines(), 0);
        assert_eq!(post, loc(0, 0));
    }

    #[test]
    fn selection_replace_scenario() {
        let mut buf = Buffer::create("t");
        buf.add(loc(0, 0), b"hello world");
        let region = Region::new(loc(0, 0), loc(0, 5));
        buf.delete(region);
        buf.add(loc(0, 0), b"HELLO");
        assert_eq!(buf.store.get_line(0).as_str(), "HELLO world");
    }

    #[test]
    fn multi_line_delete_merges_to_single_line() {
        let mut buf = Buffer::create("t");
        buf.add(loc(0, 0), b"a\nb\nc");
        buf.delete(Region::new(loc(0, 1), loc(2, 0)));
        assert_eq!(buf.num_lines(), 1);
        assert_eq!(buf.store.get_line(0).as_str(), "ac");
    }

    #[test]
    fn word_motion_across_punctuation() {
        let mut buf = Buffer::create("t");
        buf.add(loc(0, 0), " word1, word2 \"word3\" word4".as_bytes());
        let mut pos = loc(0, 0);
        let expected = [1, 8, 15, 22];
        for col in expected {
            pos = buf.next_word(pos);
            assert_eq!(pos.col, col);
        }
    }

    #[test]
    fn kill_ring_paste_and_paste_older() {
        let mut buf = Buffer::create("t");
        let mut ring = KillRing::new();
        buf.copy_region(Region::new(loc(0, 0), loc(0, 0)), &mut ring); // no-op, degenerate
        ring.push(b"one".to_vec());
        ring.push(b"two".to_vec());
        let end = buf.paste(loc(0, 0), &mut ring);
        assert_eq!(buf.store.get_line(0).as_str(), "two");
        buf.paste_older(Region::new(loc(0, 0), end), &mut ring);
        assert_eq!(buf.store.get_line(0).as_str(), "one");
    }

    #[test]
    fn char_motion_round_trips() {
        let mut buf = Buffer::create("t");
        buf.add(loc(0, 0), b"ab\ncd");
        let mid = loc(0, 1);
        let fwd = buf.next_char(mid);
        assert_eq!(buf.previous_char(fwd), mid);
        let start = loc(0, 0);
        let back = buf.next_char(buf.previous_char(buf.next_char(start)));
        assert_eq!(back, buf.next_char(start));
    }

    #[test]
    fn next_char_wraps_to_next_line() {
        let mut buf = Buffer::create("t");
        buf.add(loc(0, 0), b"ab\ncd");
        assert_eq!(buf.next_char(loc(0, 2)), loc(1, 0));
        assert_eq!(buf.previous_char(loc(1, 0)), loc(0, 2));
    }

    #[test]
    fn update_hooks_contribute_margin_and_can_add_properties() {
        let mut buf = Buffer::create("t");
        buf.add(loc(0, 0), b"hello");
        buf.add_update_hook(Box::new(|b| {
            b.store_mut().add_property(core_text::Span {
                region: Region::new(loc(0, 0), loc(0, 1)),
                property: core_text::Property::UserData(1),
            });
            3
        }));
        let margin = buf.run_update_hooks();
        assert_eq!(margin, 3);
        assert!(!buf.store().properties_at(loc(0, 0)).is_empty());
    }

    #[test]
    fn indent_caps_at_sixteen() {
        let mut buf = Buffer::create("t");
        buf.indent(loc(0, 0), 40);
        assert_eq!(buf.store.get_line(0).as_str().chars().count(), 16);
    }
}
