//! Command registry: name- and hash-addressed command lookup, plus the
//! `CommandCtx` every command body executes against.
//!
//! A fresh context is built for every invocation rather than reused, and
//! the registry itself is a flat table keyed by a string hash so binding a
//! keystroke to a command never needs to carry a live function pointer
//! across the wire (`core_keymap::Binding::CommandName` stores the name,
//! not an id, for exactly this reason; `CommandId` exists for callers that
//! already resolved the hash once and want to skip the second lookup).

use ahash::AHashMap;

use core_buffer::killring::KillRing;
use core_buffer::BufferArena;
use core_config::Config;
use core_view::window::WindowTree;

use crate::minibuffer::Minibuffer;

/// djb2: `hash = 5381; hash = hash * 33 + byte`.
pub fn djb2(name: &str) -> u64 {
    let mut hash: u64 = 5381;
    for b in name.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as u64);
    }
    hash
}

pub type CommandFn = fn(&mut CommandCtx, &[String]) -> i32;

#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub hash: u64,
    pub func: CommandFn,
}

/// Everything a command body can touch. Built fresh by the frame loop for
/// every dispatch, including the reentrant re-invocation a minibuffer
/// prompt triggers on submit.
pub struct CommandCtx<'a> {
    pub buffers: &'a mut BufferArena,
    pub windows: &'a mut WindowTree,
    pub kill_ring: &'a mut KillRing,
    pub config: &'a mut Config,
    pub minibuffer: &'a mut Minibuffer,
    pub registry: &'a CommandRegistry,
    pub running: &'a mut bool,
}

#[derive(Default)]
pub struct CommandRegistry {
    by_name: AHashMap<String, Command>,
    names_by_hash: AHashMap<u64, &'static str>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, func: CommandFn) {
        let hash = djb2(name);
        self.names_by_hash.insert(hash, name);
        self.by_name.insert(name.to_string(), Command { name, hash, func });
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.by_name.get(name)
    }

    pub fn lookup_by_hash(&self, hash: u64) -> Option<&Command> {
        self.names_by_hash.get(&hash).and_then(|name| self.by_name.get(*name))
    }

    pub fn for_each(&self, mut f: impl FnMut(&Command)) {
        let mut names: Vec<_> = self.by_name.keys().collect();
        names.sort();
        for name in names {
            f(&self.by_name[name]);
        }
    }

    /// Look up `name` and invoke it with `argv`. An unknown name echoes
    /// `command %s not found` and returns 11, matching `run_interactive`'s
    /// miss path exactly.
    pub fn execute(&self, ctx: &mut CommandCtx, name: &str, argv: &[String]) -> i32 {
        match self.lookup(name).copied() {
            Some(cmd) => (cmd.func)(ctx, argv),
            None => {
                ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("command {name} not found"));
                11
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn djb2_is_deterministic_and_distinguishes_names() {
        assert_eq!(djb2("exit"), djb2("exit"));
        assert_ne!(djb2("exit"), djb2("find-file"));
        assert_eq!(djb2(""), 5381);
    }

    #[test]
    fn register_and_lookup_round_trip() {
        fn noop(_ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
            0
        }
        let mut reg = CommandRegistry::new();
        reg.register("noop", noop);
        let cmd = reg.lookup("noop").expect("registered command");
        assert_eq!(cmd.hash, djb2("noop"));
        assert!(reg.lookup_by_hash(djb2("noop")).is_some());
        assert!(reg.lookup("missing").is_none());
    }
}
