//! Default keymaps: global, the `c-x` prefix, the `c-x w` window-select
//! prefix, and the buffer-default map.
//!
//! Plain self-insert has no entry here: a keystroke with no modifiers that
//! misses every map in the active stack falls through to self-insert in
//! the frame loop, so ordinary typing never needs a registered command.

use core_events::{Key, Keystroke, Modifiers, SpecKey};
use core_keymap::{Binding, Keymap, KeymapRegistry};

fn ctrl(c: char) -> Keystroke {
    Keystroke::new(Modifiers::CTRL, Key::Char(c), 0, 0)
}

fn meta(c: char) -> Keystroke {
    Keystroke::new(Modifiers::META, Key::Char(c), 0, 0)
}

fn plain(c: char) -> Keystroke {
    Keystroke::new(Modifiers::NONE, Key::Char(c), 0, 0)
}

fn spec(lead: u8, param: Option<u32>, terminator: u8) -> Keystroke {
    Keystroke::new(Modifiers::SPEC, Key::Spec(SpecKey { lead, param, terminator }), 0, 0)
}

/// Raw byte 0x0D; the parser decodes every C0 control byte as Ctrl+<letter>,
/// so Enter arrives as Ctrl-M, never a literal `\r` keystroke.
fn enter() -> Keystroke {
    ctrl('m')
}

/// Raw byte 0x09, decoded as Ctrl-I for the same reason.
fn tab() -> Keystroke {
    ctrl('i')
}

/// Raw byte 0x7F decodes as Ctrl-? (see `decode_one`), not a plain key.
fn backspace() -> Keystroke {
    Keystroke::new(Modifiers::CTRL, Key::Char('?'), 0, 0)
}

fn cmd(name: &str) -> Binding {
    Binding::CommandName(name.to_string())
}

/// Names of the four maps this module registers, for the frame loop's
/// keymap stack (buffer-default is always the outermost/fallback map).
pub const GLOBAL: &str = "global";
pub const CTRL_X: &str = "ctrl-x-map";
pub const WINDOWS: &str = "windows-map";
pub const BUFFER_DEFAULT: &str = "buffer-default";

pub fn register_default_keymaps(registry: &mut KeymapRegistry) {
    let mut global = Keymap::new(GLOBAL);
    global.bind(ctrl('x'), Binding::Keymap(CTRL_X.to_string()));
    global.bind(ctrl('g'), cmd("abort"));
    global.bind(meta('x'), cmd("run-command-interactive"));
    registry.register(global);

    let mut ctrl_x = Keymap::new(CTRL_X);
    ctrl_x.bind(ctrl('c'), cmd("exit"));
    ctrl_x.bind(ctrl('s'), cmd("buffer-write-to-file"));
    ctrl_x.bind(ctrl('f'), cmd("find-file"));
    ctrl_x.bind(ctrl('w'), cmd("write-file"));
    ctrl_x.bind(plain('b'), cmd("switch-buffer"));
    ctrl_x.bind(ctrl('b'), cmd("buffer-list"));
    ctrl_x.bind(plain('0'), cmd("window-close"));
    ctrl_x.bind(plain('1'), cmd("window-close-others"));
    ctrl_x.bind(plain('2'), cmd("window-split-horizontal"));
    ctrl_x.bind(plain('3'), cmd("window-split-vertical"));
    ctrl_x.bind(plain('o'), cmd("window-focus-next"));
    ctrl_x.bind(plain('w'), Binding::Keymap(WINDOWS.to_string()));
    registry.register(ctrl_x);

    let mut windows = Keymap::new(WINDOWS);
    for digit in 0..=9u8 {
        let c = (b'0' + digit) as char;
        windows.bind(plain(c), cmd(&format!("window-focus-{digit}")));
    }
    registry.register(windows);

    let mut buffer_default = Keymap::new(BUFFER_DEFAULT);
    buffer_default.bind(ctrl('b'), cmd("backward-char"));
    buffer_default.bind(spec(b'[', None, b'D'), cmd("backward-char"));
    buffer_default.bind(ctrl('f'), cmd("forward-char"));
    buffer_default.bind(spec(b'[', None, b'C'), cmd("forward-char"));

    buffer_default.bind(ctrl('p'), cmd("backward-line"));
    buffer_default.bind(spec(b'[', None, b'A'), cmd("backward-line"));
    buffer_default.bind(ctrl('n'), cmd("forward-line"));
    buffer_default.bind(spec(b'[', None, b'B'), cmd("forward-line"));

    buffer_default.bind(meta('f'), cmd("forward-word"));
    buffer_default.bind(meta('b'), cmd("backward-word"));

    buffer_default.bind(ctrl('a'), cmd("beginning-of-line"));
    buffer_default.bind(ctrl('e'), cmd("end-of-line"));

    buffer_default.bind(meta('g'), cmd("goto-line"));
    buffer_default.bind(meta('<'), cmd("goto-beginning"));
    buffer_default.bind(meta('>'), cmd("goto-end"));

    buffer_default.bind(ctrl('v'), cmd("scroll-down"));
    buffer_default.bind(meta('v'), cmd("scroll-up"));
    buffer_default.bind(spec(b'[', Some(6), b'~'), cmd("scroll-down"));
    buffer_default.bind(spec(b'[', Some(5), b'~'), cmd("scroll-up"));

    buffer_default.bind(enter(), cmd("newline"));
    buffer_default.bind(tab(), cmd("indent"));

    buffer_default.bind(ctrl('k'), cmd("kill-line"));
    buffer_default.bind(spec(b'[', Some(3), b'~'), cmd("delete-char"));
    buffer_default.bind(ctrl('d'), cmd("delete-char"));
    buffer_default.bind(meta('d'), cmd("delete-word"));
    buffer_default.bind(meta('D'), cmd("backward-delete-word"));
    buffer_default.bind(backspace(), cmd("backward-delete-char"));

    buffer_default.bind(ctrl('@'), cmd("set-mark"));

    buffer_default.bind(ctrl('w'), cmd("cut"));
    buffer_default.bind(ctrl('y'), cmd("paste"));
    buffer_default.bind(meta('y'), cmd("paste-older"));
    buffer_default.bind(meta('w'), cmd("copy"));

    buffer_default.bind(ctrl('_'), cmd("undo"));
    registry.register(buffer_default);
}
