//! Baseline command set: everything bound by the default keymap (global,
//! `c-x`, windows, and per-buffer maps).
//!
//! `delete-word`/`backward-delete-word` are built from
//! `Buffer::next_word`/`previous_word` plus the kill ring, the same way
//! `kill-line` is built. `goto-line` is a minibuffer prompt feeding a
//! parsed line number, the same shape as `find-file`'s path prompt.
//! `buffer-list` opens a fresh read-only buffer in a new window listing
//! every open buffer's name and path.

use std::path::PathBuf;

use core_buffer::killring::KillRing;
use core_buffer::Buffer;
use core_text::{Location, Region};
use core_view::view::BufferView;

use crate::registry::{CommandCtx, CommandRegistry};

/// Borrow the focused window's view and its backing buffer as two
/// independent mutable references (disjoint fields of `CommandCtx`, no
/// kill ring needed).
fn view_buffer<'c>(ctx: &'c mut CommandCtx) -> (&'c mut BufferView, &'c mut Buffer) {
    let buffer_id = ctx.windows.focused_view().buffer_id;
    let view = ctx.windows.focused_view_mut();
    let buffer = ctx
        .buffers
        .get_mut(buffer_id)
        .expect("focused window always references a live buffer");
    (view, buffer)
}

/// Same as [`view_buffer`] but also hands back the kill ring, for the
/// editing commands that cut or paste.
fn view_buffer_kill<'c>(ctx: &'c mut CommandCtx) -> (&'c mut BufferView, &'c mut Buffer, &'c mut KillRing) {
    let (view, buffer) = view_buffer(ctx);
    (view, buffer, &mut *ctx.kill_ring)
}

// --- global commands (bound from the global and ctrl-x maps) -----------

pub fn abort(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    ctx.minibuffer.abort_prompt(ctx.buffers);
    ctx.minibuffer.echo_timeout(ctx.buffers, 4, "\u{1f4a3} aborted");
    0
}

pub fn exit(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    *ctx.running = false;
    0
}

pub fn find_file(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    let Some(path_str) = argv.first() else {
        ctx.minibuffer.prompt(ctx.buffers, "find file: ", "find-file", vec![]);
        return 0;
    };
    let path = PathBuf::from(path_str);
    if path.is_dir() {
        ctx.minibuffer.echo_timeout(ctx.buffers, 4, "TODO: implement dired!");
        return 1;
    }
    match Buffer::from_file(&path) {
        Ok(buffer) => {
            let name = buffer.name.clone();
            let id = ctx.buffers.insert(buffer);
            ctx.windows.focused_view_mut().set_buffer(id);
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("buffer \"{name}\" loaded"));
            0
        }
        Err(err) => {
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("could not load {}: {err}", path.display()));
            1
        }
    }
}

pub fn write_file(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    let Some(path_str) = argv.first() else {
        ctx.minibuffer.prompt(ctx.buffers, "write to file: ", "write-file", vec![]);
        return 0;
    };
    let path = PathBuf::from(path_str);
    let buffer_id = ctx.windows.focused_view().buffer_id;
    let result = match ctx.buffers.get_mut(buffer_id) {
        Some(buffer) => buffer.write_to_file(Some(path.clone())),
        None => return 1,
    };
    match result {
        Ok(()) => {
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("wrote {}", path.display()));
            0
        }
        Err(err) => {
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("could not write {}: {err}", path.display()));
            1
        }
    }
}

pub fn run_command_interactive(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    if argv.is_empty() {
        ctx.minibuffer.prompt(ctx.buffers, "execute: ", "run-command-interactive", vec![]);
        return 0;
    }
    let name = argv[0].clone();
    let rest = &argv[1..];
    let registry = ctx.registry;
    registry.execute(ctx, &name, rest)
}

pub fn switch_buffer(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    if argv.is_empty() {
        ctx.minibuffer.prompt(ctx.buffers, "switch to buffer: ", "do-switch-buffer", vec![]);
        return 0;
    }
    do_switch_buffer(ctx, argv)
}

/// The command `switch-buffer`'s prompt re-invokes by name once a buffer
/// name has been entered, rather than `switch-buffer` calling itself.
pub fn do_switch_buffer(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    let Some(name) = argv.first() else {
        return 1;
    };
    let Some(id) = ctx.buffers.find_by_name(name) else {
        ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("buffer \"{name}\" not found"));
        return 1;
    };
    ctx.windows.focused_view_mut().set_buffer(id);
    0
}

pub fn buffer_list(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let mut listing = Buffer::create("*buffers*");
    let mut names: Vec<String> = ctx.buffers.iter().map(|(_, b)| b.name.clone()).collect();
    names.sort();
    let mut loc = Location::origin();
    for name in names {
        loc = listing.add(loc, name.as_bytes());
        loc = listing.newline(loc);
    }
    listing.read_only = true;
    listing.modified = false;
    let id = ctx.buffers.insert(listing);
    ctx.windows.split_auto(id);
    0
}

// --- per-buffer commands (bound from the buffer-default map) -----------

pub fn backward_char(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_previous_char(buffer);
    0
}

pub fn forward_char(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_next_char(buffer);
    0
}

pub fn backward_word(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_previous_word(buffer);
    0
}

pub fn forward_word(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_next_word(buffer);
    0
}

pub fn backward_line(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_previous_line(buffer);
    0
}

pub fn forward_line(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_next_line(buffer);
    0
}

pub fn beginning_of_line(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, _buffer) = view_buffer(ctx);
    view.dot = Location::new(view.dot.line, 0);
    0
}

pub fn end_of_line(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    let n = buffer.num_chars(view.dot.line);
    view.dot = Location::new(view.dot.line, n);
    0
}

pub fn goto_beginning(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, _buffer) = view_buffer(ctx);
    view.dot = Location::origin();
    0
}

pub fn goto_end(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.move_end(buffer);
    0
}

/// Prompts for a 1-based line number the same way `find-file` prompts for
/// a path, then clamps and jumps to it.
pub fn goto_line(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    let Some(arg) = argv.first() else {
        ctx.minibuffer.prompt(ctx.buffers, "goto line: ", "goto-line", vec![]);
        return 0;
    };
    let Ok(n) = arg.parse::<usize>() else {
        ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("not a number: {arg}"));
        return 1;
    };
    let (view, buffer) = view_buffer(ctx);
    let line = n.saturating_sub(1).min(buffer.num_lines().saturating_sub(1));
    view.dot = buffer.clamp(Location::new(line, 0));
    0
}

pub fn newline(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.newline(buffer, kill_ring);
    0
}

pub fn indent(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let tab_width = ctx.config.tab_width();
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.indent(buffer, kill_ring, tab_width);
    0
}

pub fn kill_line(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.kill_line(buffer, kill_ring);
    0
}

pub fn delete_char(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.delete_forward_char(buffer, kill_ring);
    0
}

pub fn backward_delete_char(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.delete_backward_char(buffer, kill_ring);
    0
}

/// Built from the same word-motion + kill-ring primitives `kill-line`
/// already uses.
pub fn delete_word(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    let end = buffer.next_word(view.dot);
    let loc = buffer.cut_region(Region::new(view.dot, end), kill_ring);
    view.dot = loc;
    0
}

pub fn backward_delete_word(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    let start = buffer.previous_word(view.dot);
    let loc = buffer.cut_region(Region::new(start, view.dot), kill_ring);
    view.dot = loc;
    0
}

pub fn set_mark(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    ctx.windows.focused_view_mut().set_mark();
    0
}

pub fn clear_mark(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    ctx.windows.focused_view_mut().clear_mark();
    0
}

pub fn copy(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.copy_region(buffer, kill_ring);
    0
}

pub fn cut(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.cut_region(buffer, kill_ring);
    0
}

pub fn paste(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.paste(buffer, kill_ring);
    0
}

pub fn paste_older(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer, kill_ring) = view_buffer_kill(ctx);
    view.paste_older(buffer, kill_ring);
    0
}

pub fn undo(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let (view, buffer) = view_buffer(ctx);
    view.undo(buffer);
    0
}

pub fn buffer_write_to_file(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let buffer_id = ctx.windows.focused_view().buffer_id;
    let result = match ctx.buffers.get_mut(buffer_id) {
        Some(buffer) => buffer.write_to_file(None).map(|()| buffer.name.clone()),
        None => return 1,
    };
    match result {
        Ok(name) => {
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("wrote {name}"));
            0
        }
        Err(err) => {
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("{err}"));
            1
        }
    }
}

pub fn reload(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let buffer_id = ctx.windows.focused_view().buffer_id;
    let result = match ctx.buffers.get_mut(buffer_id) {
        Some(buffer) => buffer.reload(),
        None => return 1,
    };
    match result {
        Ok(()) => 0,
        Err(err) => {
            ctx.minibuffer.echo_timeout(ctx.buffers, 4, format!("{err}"));
            1
        }
    }
}

fn scroll_by(ctx: &mut CommandCtx, forward: bool) -> i32 {
    let focused = ctx.windows.focused_id();
    let page = ctx.windows.rect(focused).map(|r| r.height as usize).unwrap_or(1).max(1);
    let (view, buffer) = view_buffer(ctx);
    for _ in 0..page {
        view.dot = if forward { buffer.next_line(view.dot) } else { buffer.previous_line(view.dot) };
    }
    0
}

pub fn scroll_down(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    scroll_by(ctx, true)
}

pub fn scroll_up(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    scroll_by(ctx, false)
}

// --- window commands (bound from ctrl-x and the windows map) -----------

pub fn window_close(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    if ctx.windows.close_focused() {
        0
    } else {
        1
    }
}

pub fn window_close_others(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    ctx.windows.close_others();
    0
}

pub fn window_split(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let buffer_id = ctx.windows.focused_view().buffer_id;
    ctx.windows.split_auto(buffer_id);
    0
}

pub fn window_split_vertical(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let buffer_id = ctx.windows.focused_view().buffer_id;
    ctx.windows.split_vertical(buffer_id);
    0
}

pub fn window_split_horizontal(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    let buffer_id = ctx.windows.focused_view().buffer_id;
    ctx.windows.split_horizontal(buffer_id);
    0
}

pub fn window_focus_next(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
    ctx.windows.focus_next();
    0
}

fn window_focus_index(ctx: &mut CommandCtx, n: usize) -> i32 {
    match ctx.windows.ids().get(n) {
        Some(id) => {
            ctx.windows.focus(*id);
            0
        }
        None => 1,
    }
}

pub fn window_focus(ctx: &mut CommandCtx, argv: &[String]) -> i32 {
    match argv.first().and_then(|s| s.parse::<usize>().ok()) {
        Some(n) => window_focus_index(ctx, n),
        None => 1,
    }
}

macro_rules! window_focus_n {
    ($name:ident, $n:expr) => {
        pub fn $name(ctx: &mut CommandCtx, _argv: &[String]) -> i32 {
            window_focus_index(ctx, $n)
        }
    };
}

window_focus_n!(window_focus_0, 0);
window_focus_n!(window_focus_1, 1);
window_focus_n!(window_focus_2, 2);
window_focus_n!(window_focus_3, 3);
window_focus_n!(window_focus_4, 4);
window_focus_n!(window_focus_5, 5);
window_focus_n!(window_focus_6, 6);
window_focus_n!(window_focus_7, 7);
window_focus_n!(window_focus_8, 8);
window_focus_n!(window_focus_9, 9);

/// Register every baseline command under the names the default keymap
/// binds.
pub fn register_baseline_commands(registry: &mut CommandRegistry) {
    registry.register("abort", abort);
    registry.register("exit", exit);
    registry.register("find-file", find_file);
    registry.register("write-file", write_file);
    registry.register("run-command-interactive", run_command_interactive);
    registry.register("switch-buffer", switch_buffer);
    registry.register("do-switch-buffer", do_switch_buffer);
    registry.register("buffer-list", buffer_list);

    registry.register("backward-char", backward_char);
    registry.register("forward-char", forward_char);
    registry.register("backward-word", backward_word);
    registry.register("forward-word", forward_word);
    registry.register("backward-line", backward_line);
    registry.register("forward-line", forward_line);
    registry.register("beginning-of-line", beginning_of_line);
    registry.register("end-of-line", end_of_line);
    registry.register("goto-beginning", goto_beginning);
    registry.register("goto-end", goto_end);
    registry.register("goto-line", goto_line);
    registry.register("newline", newline);
    registry.register("indent", indent);
    registry.register("kill-line", kill_line);
    registry.register("delete-char", delete_char);
    registry.register("backward-delete-char", backward_delete_char);
    registry.register("delete-word", delete_word);
    registry.register("backward-delete-word", backward_delete_word);
    registry.register("set-mark", set_mark);
    registry.register("clear-mark", clear_mark);
    registry.register("copy", copy);
    registry.register("cut", cut);
    registry.register("paste", paste);
    registry.register("paste-older", paste_older);
    registry.register("undo", undo);
    registry.register("buffer-write-to-file", buffer_write_to_file);
    registry.register("reload", reload);
    registry.register("scroll-down", scroll_down);
    registry.register("scroll-up", scroll_up);

    registry.register("window-close", window_close);
    registry.register("window-close-others", window_close_others);
    registry.register("window-split", window_split);
    registry.register("window-split-vertical", window_split_vertical);
    registry.register("window-split-horizontal", window_split_horizontal);
    registry.register("window-focus-next", window_focus_next);
    registry.register("window-focus", window_focus);
    registry.register("window-focus-0", window_focus_0);
    registry.register("window-focus-1", window_focus_1);
    registry.register("window-focus-2", window_focus_2);
    registry.register("window-focus-3", window_focus_3);
    registry.register("window-focus-4", window_focus_4);
    registry.register("window-focus-5", window_focus_5);
    registry.register("window-focus-6", window_focus_6);
    registry.register("window-focus-7", window_focus_7);
    registry.register("window-focus-8", window_focus_8);
    registry.register("window-focus-9", window_focus_9);
}
