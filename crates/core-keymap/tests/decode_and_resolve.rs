use core_events::{Key, Keystroke, Modifiers};
use core_keymap::{parser, Binding, Keymap, KeymapRegistry, Lookup};
use pretty_assertions::assert_eq;

fn cmd(name: &str) -> Binding {
    Binding::CommandName(name.to_string())
}

#[test]
fn ctrl_x_ctrl_c_decodes_and_resolves_through_a_prefix_map() {
    let mut registry = KeymapRegistry::new();
    let mut global = Keymap::new("global");
    global.bind(Keystroke::new(Modifiers::CTRL, Key::Char('x'), 0, 0), Binding::Keymap("ctrl-x".to_string()));
    registry.register(global);
    let mut ctrl_x = Keymap::new("ctrl-x");
    ctrl_x.bind(Keystroke::new(Modifiers::CTRL, Key::Char('c'), 0, 0), cmd("exit"));
    registry.register(ctrl_x);

    let bytes = [0x18, 0x03]; // Ctrl-X, Ctrl-C
    let keystrokes = parser::decode(&bytes);
    assert_eq!(keystrokes.len(), 2);

    let first = registry.lookup(&["global"], &keystrokes[0]);
    let prefix = match first {
        Lookup::Prefix(name) => name,
        other => panic!("expected a prefix, got {other:?}"),
    };
    let second = registry.lookup(&[prefix.as_str()], &keystrokes[1]);
    assert!(matches!(second, Lookup::Command(Binding::CommandName(name)) if name == "exit"));
}

#[test]
fn a_self_insert_run_stays_as_one_coalesced_keystroke_through_lookup() {
    let bytes = b"abc";
    let keystrokes = parser::decode(bytes);
    assert_eq!(keystrokes.len(), 1);
    assert!(matches!(&keystrokes[0].key, Key::Text(s) if s == "abc"));

    let mut registry = KeymapRegistry::new();
    registry.register(Keymap::new("buffer-default"));
    assert!(matches!(
        registry.lookup(&["buffer-default"], &keystrokes[0]),
        Lookup::NotFound
    ));
}

#[test]
fn an_unbound_ctrl_key_inside_a_prefix_reports_not_found_rather_than_falling_through() {
    let mut registry = KeymapRegistry::new();
    let mut ctrl_x = Keymap::new("ctrl-x");
    ctrl_x.bind(Keystroke::new(Modifiers::CTRL, Key::Char('c'), 0, 0), cmd("exit"));
    registry.register(ctrl_x);

    let bytes = [0x11]; // Ctrl-Q, not bound in the ctrl-x map
    let keystrokes = parser::decode(&bytes);
    assert!(matches!(
        registry.lookup(&["ctrl-x"], &keystrokes[0]),
        Lookup::NotFound
    ));
}
