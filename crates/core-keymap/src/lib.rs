//! Multi-stroke keymap resolver and the raw-byte key parser that feeds it.
//!
//! A [`Keymap`] is a named table from [`Keystroke`] to [`Binding`]. A
//! binding may itself be a keymap, in which case it becomes a *prefix*:
//! the frame loop narrows subsequent lookups to just that map until a
//! terminal binding (or an unbound key) is found.

pub mod parser;

use ahash::AHashMap;
use core_events::Keystroke;

/// What a keystroke resolves to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A command looked up by name at execution time (late-bound, so
    /// keymaps can be built before the command registry is populated).
    CommandName(String),
    /// An anonymous command, identified only by a caller-assigned id.
    /// This crate has no registry dependency, so it carries an opaque id
    /// the command layer interprets rather than a function pointer.
    CommandId(u64),
    /// A prefix: resolving this binding sets `keymap` as the map consulted
    /// for the *next* keystroke only.
    Keymap(String),
}

/// Result of a single-keystroke lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Command(Binding),
    /// The keystroke is a prefix; its name is the keymap to consult next.
    Prefix(String),
    NotFound,
}

#[derive(Debug, Default, Clone)]
pub struct Keymap {
    pub name: String,
    bindings: AHashMap<Keystroke, Binding>,
}

impl Keymap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: AHashMap::new(),
        }
    }

    pub fn bind(&mut self, key: Keystroke, binding: Binding) {
        self.bindings.insert(key, binding);
    }

    pub fn get(&self, key: &Keystroke) -> Option<&Binding> {
        self.bindings.get(key)
    }
}

/// The set of named keymaps known to the editor, plus helpers to resolve
/// a keystroke against a stack of maps (innermost — the current prefix,
/// if any — first).
#[derive(Debug, Default)]
pub struct KeymapRegistry {
    maps: AHashMap<String, Keymap>,
}

impl KeymapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, map: Keymap) {
        self.maps.insert(map.name.clone(), map);
    }

    pub fn get(&self, name: &str) -> Option<&Keymap> {
        self.maps.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Keymap> {
        self.maps.get_mut(name)
    }

    /// Try `stack` (innermost first), returning the first hit. A `Keymap`
    /// binding is reported as `Lookup::Prefix` rather than resolved
    /// further; the caller re-invokes `lookup` with just that one map on
    /// the next keystroke.
    pub fn lookup(&self, stack: &[&str], key: &Keystroke) -> Lookup {
        for map_name in stack {
            let Some(map) = self.maps.get(*map_name) else {
                continue;
            };
            if let Some(binding) = map.get(key) {
                return match binding {
                    Binding::Keymap(name) => Lookup::Prefix(name.clone()),
                    other => Lookup::Command(other.clone()),
                };
            }
        }
        Lookup::NotFound
    }
}
