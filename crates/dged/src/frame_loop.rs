//! The single-threaded frame loop: the one piece of orchestration that ties
//! every core crate together.
//!
//! One blocking point per tick: everything between two `Reactor::update`
//! calls runs to completion on this thread before the next wait.

use std::collections::HashMap;
use std::io::Write as _;
use std::os::fd::AsRawFd;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::warn;

use core_buffer::arena::{BufferArena, BufferId};
use core_buffer::killring::KillRing;
use core_buffer::Buffer;
use core_commands::{register_baseline_commands, CommandCtx, CommandRegistry, Minibuffer};
use core_config::Config;
use core_events::{FileEventKind, FileWatchMask, Key, Keystroke, Modifiers};
use core_keymap::{parser, Binding, KeymapRegistry, Lookup};
use core_reactor::{Interest, InterestId, Reactor};
use core_render::CommandList;
use core_terminal::CrosstermBackend;
use core_text::Location;
use core_view::window::{Rect, WindowTree};

use crate::keymap::{self, BUFFER_DEFAULT, GLOBAL};

/// Everything the frame loop needs across ticks: the arena of open buffers,
/// the window split tree, the registries, and the reactor's stdin
/// registration. Owned by `main`, driven one `tick` per reactor wakeup.
pub struct Editor {
    buffers: BufferArena,
    windows: WindowTree,
    kill_ring: KillRing,
    config: Config,
    minibuffer: Minibuffer,
    registry: CommandRegistry,
    keymaps: KeymapRegistry,
    reactor: Reactor,
    stdin_interest: InterestId,
    /// Watch id -> buffer id, so a `Written` event knows which buffer to
    /// reload; re-populated whenever a `LastEvent` arrives (the watcher
    /// only fires once per registration).
    watches: HashMap<u64, BufferId>,
    /// Active prefix keymap name, set by a `Lookup::Prefix` and consumed by
    /// exactly the next keystroke.
    prefix: Option<String>,
    /// Window focused before a prompt was opened, restored when the prompt
    /// closes (submit or abort).
    pre_prompt_focus: Option<core_view::window::WindowId>,
    running: bool,
    size: (u16, u16),
    last_tick: Instant,
}

impl Editor {
    pub fn new(config: Config, initial_buffer: Buffer, width: u16, height: u16) -> Result<Self> {
        let mut buffers = BufferArena::new();
        let watch_path = initial_buffer.path.clone();
        let buffer_id = buffers.insert(initial_buffer);
        let minibuffer_id = buffers.insert(Buffer::create("*minibuffer*"));

        let windows = WindowTree::init(buffer_id, minibuffer_id, width, height.max(1));

        let mut registry = CommandRegistry::new();
        register_baseline_commands(&mut registry);

        let mut keymaps = KeymapRegistry::new();
        keymap::register_default_keymaps(&mut keymaps);

        let mut reactor = Reactor::new().context("initializing reactor")?;
        let stdin_fd = std::io::stdin().as_raw_fd();
        let stdin_interest = reactor
            .register_interest(stdin_fd, Interest::Read)
            .context("registering stdin with the reactor")?;

        let mut watches = HashMap::new();
        if let Some(path) = watch_path
            && let Ok(watch_id) = reactor.watch_file(path, FileWatchMask::WRITTEN | FileWatchMask::REMOVED)
        {
            watches.insert(watch_id, buffer_id);
        }

        Ok(Self {
            buffers,
            windows,
            kill_ring: KillRing::new(),
            config,
            minibuffer: Minibuffer::new(minibuffer_id),
            registry,
            keymaps,
            reactor,
            stdin_interest,
            watches,
            prefix: None,
            pre_prompt_focus: None,
            running: true,
            size: (width, height.max(1)),
            last_tick: Instant::now(),
        })
    }

    /// Pre-position the initial window's dot per `-l`/`-e`; a no-op if
    /// neither flag was given.
    pub fn position_initial_dot(&mut self, line: Option<usize>, end: bool) {
        let focused = self.windows.focused_id();
        let Some(buffer_id) = self.windows.view(focused).map(|v| v.buffer_id) else {
            return;
        };
        let Some(buffer) = self.buffers.get(buffer_id) else {
            return;
        };
        let loc = if end {
            buffer.end()
        } else if let Some(n) = line {
            let idx = n.saturating_sub(1).min(buffer.num_lines().saturating_sub(1));
            buffer.clamp(Location::new(idx, 0))
        } else {
            return;
        };
        if let Some(view) = self.windows.view_mut(focused) {
            view.dot = loc;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one full tick: resize check, render+flush, block in the reactor,
    /// drain keyboard and file-watch events. Returns whether the editor
    /// should keep running.
    pub fn tick(&mut self, backend: &mut CrosstermBackend) -> Result<bool> {
        self.check_resize(backend)?;
        self.render_and_flush(backend)?;

        self.reactor.update().context("reactor update")?;

        if self.reactor.poll_event(self.stdin_interest) {
            let bytes = backend.read_available().context("reading stdin")?;
            if !bytes.is_empty() {
                for keystroke in parser::decode(&bytes) {
                    self.dispatch(keystroke);
                }
            }
        }

        self.minibuffer.update(&mut self.buffers, Instant::now());
        self.drain_file_events();

        Ok(self.running)
    }

    fn check_resize(&mut self, backend: &CrosstermBackend) -> Result<()> {
        use core_terminal::TerminalBackend as _;
        let size = backend.size().unwrap_or(self.size);
        if size != self.size && size.0 > 0 && size.1 > 0 {
            self.size = size;
            self.windows.resize(size.0, size.1.saturating_sub(1).max(1));
        }
        Ok(())
    }

    fn drain_file_events(&mut self) {
        loop {
            let mut out = None;
            if !self.reactor.next_file_event(&mut out) {
                break;
            }
            let Some(event) = out else { break };
            match event.kind {
                FileEventKind::Written => {
                    if let Some(&buffer_id) = self.watches.get(&event.watch_id)
                        && let Some(buffer) = self.buffers.get_mut(buffer_id)
                        && !buffer.modified
                        && buffer.reload().is_ok()
                    {
                        buffer.push_boundary(true);
                    }
                }
                FileEventKind::Removed => {
                    // Leave the in-memory buffer as-is; the next explicit
                    // save recreates the file.
                }
                FileEventKind::LastEvent => {
                    if let Some(buffer_id) = self.watches.remove(&event.watch_id)
                        && let Some(buffer) = self.buffers.get(buffer_id)
                        && let Some(path) = buffer.path.clone()
                        && let Ok(new_watch) =
                            self.reactor.watch_file(path, FileWatchMask::WRITTEN | FileWatchMask::REMOVED)
                    {
                        self.watches.insert(new_watch, buffer_id);
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, keystroke: Keystroke) {
        if self.prefix.is_none() && self.windows.focused_id() == self.windows.minibuffer_id() && is_enter(&keystroke) {
            self.submit_minibuffer();
            return;
        }

        let stack: Vec<&str> = match &self.prefix {
            Some(name) => vec![name.as_str()],
            None => vec![GLOBAL, BUFFER_DEFAULT],
        };
        let was_prefixed = self.prefix.is_some();

        match self.keymaps.lookup(&stack, &keystroke) {
            Lookup::Prefix(name) => self.prefix = Some(name),
            Lookup::Command(Binding::CommandName(name)) => {
                self.prefix = None;
                self.execute_named(&name, &[]);
            }
            Lookup::Command(Binding::CommandId(hash)) => {
                self.prefix = None;
                warn!(hash, "command-id bindings are unused by the default keymap");
            }
            Lookup::Command(Binding::Keymap(_)) => {
                // `KeymapRegistry::lookup` always turns a `Keymap` binding
                // into `Lookup::Prefix` before returning; this arm only
                // exists because `Binding` is a three-variant enum.
                self.prefix = None;
            }
            Lookup::NotFound => {
                self.prefix = None;
                if was_prefixed {
                    self.minibuffer.echo_timeout(
                        &mut self.buffers,
                        3,
                        format!("{} is undefined", keystroke.display_name()),
                    );
                } else if keystroke.modifiers == Modifiers::NONE {
                    self.self_insert(&keystroke);
                }
            }
        }
    }

    fn self_insert(&mut self, keystroke: &Keystroke) {
        let mut buf = [0u8; 4];
        let bytes: &[u8] = match &keystroke.key {
            Key::Text(s) => s.as_bytes(),
            Key::Char(c) => c.encode_utf8(&mut buf).as_bytes(),
            Key::Spec(_) => return,
        };
        let buffer_id = self.windows.focused_view().buffer_id;
        if let Some(buffer) = self.buffers.get_mut(buffer_id) {
            let view = self.windows.focused_view_mut();
            view.add(buffer, &mut self.kill_ring, bytes);
        }
    }

    /// Submit the minibuffer's pending prompt: restore the window that was
    /// focused before the prompt opened, then run the continuation command
    /// with the saved + typed argv. A command that reprompts (e.g.
    /// `switch-buffer` -> `do-switch-buffer`) refocuses the minibuffer
    /// again from the restored window, so multi-step prompts chain
    /// correctly.
    fn submit_minibuffer(&mut self) {
        if let Some((name, argv)) = self.minibuffer.take_submission(&mut self.buffers) {
            if let Some(prev) = self.pre_prompt_focus.take() {
                self.windows.focus(prev);
            }
            self.execute_named(&name, &argv);
        }
    }

    fn execute_named(&mut self, name: &str, argv: &[String]) -> i32 {
        let was_active = self.minibuffer.is_prompt_active();
        let status = {
            let mut ctx = CommandCtx {
                buffers: &mut self.buffers,
                windows: &mut self.windows,
                kill_ring: &mut self.kill_ring,
                config: &mut self.config,
                minibuffer: &mut self.minibuffer,
                registry: &self.registry,
                running: &mut self.running,
            };
            self.registry.execute(&mut ctx, name, argv)
        };
        let now_active = self.minibuffer.is_prompt_active();
        if !was_active && now_active {
            self.pre_prompt_focus = Some(self.windows.focused_id());
            self.windows.focus(self.windows.minibuffer_id());
        } else if was_active && !now_active {
            if let Some(prev) = self.pre_prompt_focus.take() {
                self.windows.focus(prev);
            }
        }
        status
    }

    fn render_and_flush(&mut self, backend: &mut CrosstermBackend) -> Result<()> {
        let tab_width = self.config.tab_width();
        let show_whitespace = self.config.show_whitespace();
        let frame_time_ms = self.last_tick.elapsed().as_secs_f64() * 1000.0;
        self.last_tick = Instant::now();

        let (width, height) = self.size;
        let body_height = height.saturating_sub(1);

        let mut root = CommandList::new((0, 0));
        for id in self.windows.ids() {
            let Some(rect) = self.windows.rect(id) else { continue };
            let Some(buffer_id) = self.windows.view(id).map(|v| v.buffer_id) else { continue };
            let Some(buffer) = self.buffers.get_mut(buffer_id) else { continue };
            let Some(view) = self.windows.view_mut(id) else { continue };
            let list = view.view_update(
                buffer,
                (rect.x, rect.y),
                rect.width,
                rect.height,
                tab_width,
                show_whitespace,
                frame_time_ms,
            );
            root.draw_list(list);
        }

        let minibuffer_buffer_id = self.windows.minibuffer_view().buffer_id;
        if let Some(buffer) = self.buffers.get_mut(minibuffer_buffer_id) {
            let mini_rect = Rect::new(0, body_height, width, 1);
            let view = self.windows.minibuffer_view_mut();
            let list = view.view_update(
                buffer,
                (mini_rect.x, mini_rect.y),
                mini_rect.width,
                mini_rect.height,
                tab_width,
                show_whitespace,
                frame_time_ms,
            );
            root.draw_list(list);
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"\x1b[?25l");
        core_render::output::render(&root, show_whitespace, &mut out)?;

        let (col, row) = self.cursor_position(tab_width, body_height);
        write!(out, "\x1b[{};{}H", row + 1, col + 1)?;
        out.extend_from_slice(b"\x1b[?25h");

        backend.write_all(&out)?;
        backend.flush()?;
        Ok(())
    }

    fn cursor_position(&self, tab_width: usize, body_height: u16) -> (u16, u16) {
        let focused = self.windows.focused_id();
        if focused == self.windows.minibuffer_id() {
            let view = self.windows.minibuffer_view();
            let col = self.buffers.get(view.buffer_id).map(|b| view.screen_col(b, tab_width)).unwrap_or(0);
            return (col, body_height);
        }
        let rect = self.windows.rect(focused).unwrap_or(Rect::new(0, 0, 0, 0));
        let Some(view) = self.windows.view(focused) else { return (rect.x, rect.y) };
        let col = rect.x + self.buffers.get(view.buffer_id).map(|b| view.screen_col(b, tab_width)).unwrap_or(0);
        let row = rect.y + view.screen_row();
        (col, row)
    }
}

fn is_enter(keystroke: &Keystroke) -> bool {
    keystroke.modifiers == Modifiers::CTRL && matches!(keystroke.key, Key::Char('m'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(c: char) -> Keystroke {
        Keystroke::new(Modifiers::NONE, Key::Char(c), 0, 0)
    }

    fn ctrl(c: char) -> Keystroke {
        Keystroke::new(Modifiers::CTRL, Key::Char(c), 0, 0)
    }

    fn harness() -> Editor {
        Editor::new(Config::default(), Buffer::create("scratch"), 80, 24).unwrap()
    }

    #[test]
    fn unbound_plain_key_self_inserts() {
        let mut editor = harness();
        editor.dispatch(plain('h'));
        editor.dispatch(plain('i'));
        let id = editor.windows.focused_view().buffer_id;
        let buffer = editor.buffers.get(id).unwrap();
        assert_eq!(buffer.line(0).as_str(), "hi");
    }

    #[test]
    fn ctrl_x_ctrl_c_stops_the_editor() {
        let mut editor = harness();
        editor.dispatch(ctrl('x'));
        assert!(editor.prefix.is_some());
        editor.dispatch(ctrl('c'));
        assert!(!editor.is_running());
    }

    #[test]
    fn unbound_key_inside_prefix_echoes_and_clears_prefix() {
        let mut editor = harness();
        editor.dispatch(ctrl('x'));
        editor.dispatch(plain('q'));
        assert!(editor.prefix.is_none());
        let text = editor.minibuffer.content(&editor.buffers);
        assert!(text.contains("undefined"));
    }

    #[test]
    fn meta_x_run_command_opens_the_minibuffer_prompt() {
        let mut editor = harness();
        editor.dispatch(Keystroke::new(Modifiers::META, Key::Char('x'), 0, 0));
        assert!(editor.minibuffer.is_prompt_active());
        assert_eq!(editor.windows.focused_id(), editor.windows.minibuffer_id());
    }
}
