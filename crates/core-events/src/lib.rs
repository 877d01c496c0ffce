//! Shared input vocabulary: the `Keystroke` type produced by the key
//! parser (`core-keymap`) and consumed by the keymap resolver, plus the
//! file-watch event shape produced by the reactor.
//!
//! This crate owns no decoding logic itself (that lives in `core-keymap`
//! and `core-reactor` respectively); it exists so those two crates, and
//! the buffer/command layers above them, share one vocabulary without a
//! circular dependency.

use bitflags::bitflags;

bitflags! {
    /// Keystroke modifier mask. `Spec` marks a function/arrow-key sequence
    /// rather than a literal held modifier key; membership is always an
    /// explicit "bit is set" test, not an operator-precedence puzzle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE = 0;
        const CTRL = 0b001;
        const META = 0b010;
        const SPEC = 0b100;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Modifiers::NONE
    }
}

/// A resolved key identity, independent of how many modifier bits are set
/// alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A single decoded code point (ASCII or multi-byte UTF-8).
    Char(char),
    /// A coalesced run of plain (mod=None) code points, built by merging
    /// adjacent simple keystrokes for efficient self-insert handling.
    Text(String),
    /// A function/arrow-key escape sequence, identified by its CSI/SS3
    /// lead byte and terminator.
    Spec(SpecKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecKey {
    /// `[` (CSI) or `O` (SS3).
    pub lead: u8,
    /// First numeric parameter, if any (e.g. `3` in `ESC [ 3 ~`).
    pub param: Option<u32>,
    /// Terminating byte (`~`, or a letter such as `A` for the up arrow).
    pub terminator: u8,
}

impl SpecKey {
    /// A conventional lowercase name for the common xterm sequences; falls
    /// back to the lowercased terminator for anything not in the table,
    /// matching the `special-X` key-name syntax used in prompt display.
    pub fn name(&self) -> String {
        let named = match (self.lead, self.param, self.terminator) {
            (b'[', None, b'A') => Some("up"),
            (b'[', None, b'B') => Some("down"),
            (b'[', None, b'C') => Some("right"),
            (b'[', None, b'D') => Some("left"),
            (b'[', None, b'H') | (b'O', None, b'H') => Some("home"),
            (b'[', None, b'F') | (b'O', None, b'F') => Some("end"),
            (b'[', Some(1), b'~') => Some("home"),
            (b'[', Some(3), b'~') => Some("delete"),
            (b'[', Some(4), b'~') => Some("end"),
            (b'[', Some(5), b'~') => Some("pageup"),
            (b'[', Some(6), b'~') => Some("pagedown"),
            (b'O', None, b'P') => Some("f1"),
            (b'O', None, b'Q') => Some("f2"),
            (b'O', None, b'R') => Some("f3"),
            (b'O', None, b'S') => Some("f4"),
            _ => None,
        };
        named
            .map(str::to_string)
            .unwrap_or_else(|| (self.terminator as char).to_ascii_lowercase().to_string())
    }
}

/// A single resolved keystroke: a modifier mask, a key identity, and the
/// byte span in the input stream it was decoded from.
///
/// Equality and hashing deliberately ignore `start`/`end`: they record
/// provenance in the input stream, not the keystroke's identity, and a
/// keymap binding built with literal `0, 0` offsets still has to match a
/// keystroke the parser decoded from byte 4812 of a real input stream.
#[derive(Debug, Clone)]
pub struct Keystroke {
    pub modifiers: Modifiers,
    pub key: Key,
    pub start: usize,
    pub end: usize,
}

impl PartialEq for Keystroke {
    fn eq(&self, other: &Self) -> bool {
        self.modifiers == other.modifiers && self.key == other.key
    }
}

impl Eq for Keystroke {}

impl std::hash::Hash for Keystroke {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.modifiers.hash(state);
        self.key.hash(state);
    }
}

impl Keystroke {
    pub fn new(modifiers: Modifiers, key: Key, start: usize, end: usize) -> Self {
        Self {
            modifiers,
            key,
            start,
            end,
        }
    }

    /// Render using the minibuffer's key-name syntax: `c-X` for Ctrl, `m-X`
    /// for Meta, `special-X` for function/arrow keys, lowercased base key.
    /// Modifiers compose left to right (`c-m-x`).
    pub fn display_name(&self) -> String {
        let mut out = String::new();
        if self.modifiers.contains(Modifiers::CTRL) {
            out.push_str("c-");
        }
        if self.modifiers.contains(Modifiers::META) {
            out.push_str("m-");
        }
        match &self.key {
            Key::Char(c) => out.push_str(&c.to_lowercase().to_string()),
            Key::Text(s) => out.push_str(s),
            Key::Spec(spec) => {
                out.push_str("special-");
                out.push_str(&spec.name());
            }
        }
        out
    }
}

/// A file-watch notification produced by the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileEvent {
    pub watch_id: u64,
    pub kind: FileEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Written,
    Removed,
    /// The watch became invalid (e.g. the underlying inode was replaced)
    /// and must be re-armed by the caller.
    LastEvent,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileWatchMask: u8 {
        const WRITTEN = 0b01;
        const REMOVED = 0b10;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_composes_modifiers() {
        let ks = Keystroke::new(Modifiers::CTRL, Key::Char('x'), 0, 1);
        assert_eq!(ks.display_name(), "c-x");
        let ks = Keystroke::new(Modifiers::CTRL | Modifiers::META, Key::Char('x'), 0, 1);
        assert_eq!(ks.display_name(), "c-m-x");
    }

    #[test]
    fn spec_key_names_common_arrows() {
        let up = SpecKey {
            lead: b'[',
            param: None,
            terminator: b'A',
        };
        assert_eq!(up.name(), "up");
    }

    #[test]
    fn equality_ignores_byte_offsets() {
        let bound_at_origin = Keystroke::new(Modifiers::CTRL, Key::Char('x'), 0, 0);
        let decoded_mid_stream = Keystroke::new(Modifiers::CTRL, Key::Char('x'), 4812, 4813);
        assert_eq!(bound_at_origin, decoded_mid_stream);

        let mut hasher_a = std::collections::hash_map::DefaultHasher::new();
        let mut hasher_b = std::collections::hash_map::DefaultHasher::new();
        std::hash::Hash::hash(&bound_at_origin, &mut hasher_a);
        std::hash::Hash::hash(&decoded_mid_stream, &mut hasher_b);
        assert_eq!(
            std::hash::Hasher::finish(&hasher_a),
            std::hash::Hasher::finish(&hasher_b)
        );
    }
}
