//! Final ANSI translation: walks a [`CommandList`] tree and writes CSI
//! sequences to a sink.
//!
//! Cursor motion is always absolute (`CSI row;col H`, 1-based), format
//! fragments are joined as `ESC [ 0 ; f1 ; f2 … m` (always anchored at the
//! neutral baseline `0` so stale attributes from a previous primitive
//! never leak forward), and whitespace substitution happens here rather
//! than at record time so `set_show_whitespace` can toggle mid-list.

use std::io::{self, Write};

use crate::{CommandList, Primitive};

const MID_DOT: char = '\u{00B7}';
const TAB_ARROW: char = '\u{2192}';
const WHITESPACE_COLOR: &str = "90";

struct RenderState {
    format_stack: Vec<String>,
    show_whitespace: bool,
}

impl RenderState {
    fn baseline(show_whitespace: bool) -> Self {
        Self {
            format_stack: Vec::new(),
            show_whitespace,
        }
    }
}

/// Render `list` (whose own `origin` is treated as an absolute screen
/// position) to `out`.
pub fn render(list: &CommandList<'_>, default_show_whitespace: bool, out: &mut impl Write) -> io::Result<()> {
    let mut state = RenderState::baseline(default_show_whitespace);
    render_list(list, list.origin, &mut state, out)
}

fn render_list(
    list: &CommandList<'_>,
    absolute_origin: (u16, u16),
    state: &mut RenderState,
    out: &mut impl Write,
) -> io::Result<()> {
    for primitive in list.primitives() {
        match primitive {
            Primitive::DrawText { col, row, bytes } => {
                move_cursor(out, absolute_origin, *col, *row)?;
                write_text(out, bytes, state)?;
            }
            Primitive::DrawRepeated {
                col,
                row,
                codepoint,
                n,
            } => {
                move_cursor(out, absolute_origin, *col, *row)?;
                let mut buf = [0u8; 4];
                let encoded = codepoint.encode_utf8(&mut buf);
                for _ in 0..*n {
                    out.write_all(encoded.as_bytes())?;
                }
            }
            Primitive::PushFormat(fragment) => state.format_stack.push(fragment.clone()),
            Primitive::ClearFormat => state.format_stack.clear(),
            Primitive::SetShowWhitespace(on) => state.show_whitespace = *on,
            Primitive::DrawList(child) => {
                let child_origin = (
                    absolute_origin.0 + child.origin.0,
                    absolute_origin.1 + child.origin.1,
                );
                // A nested list inherits no format/whitespace state.
                let mut child_state = RenderState::baseline(state.show_whitespace);
                render_list(child, child_origin, &mut child_state, out)?;
            }
        }
    }
    Ok(())
}

fn move_cursor(out: &mut impl Write, origin: (u16, u16), col: u16, row: u16) -> io::Result<()> {
    let abs_col = origin.0 + col + 1;
    let abs_row = origin.1 + row + 1;
    write!(out, "\x1b[{abs_row};{abs_col}H")
}

fn apply_format(out: &mut impl Write, state: &RenderState) -> io::Result<()> {
    write!(out, "\x1b[0")?;
    for fragment in &state.format_stack {
        write!(out, ";{fragment}")?;
    }
    write!(out, "m")
}

fn write_text(out: &mut impl Write, bytes: &[u8], state: &mut RenderState) -> io::Result<()> {
    apply_format(out, state)?;
    let text = String::from_utf8_lossy(bytes);
    for c in text.chars() {
        if c == ' ' && state.show_whitespace {
            write!(out, "\x1b[{WHITESPACE_COLOR}m")?;
            write!(out, "{MID_DOT}")?;
            apply_format(out, state)?;
        } else if c == '\t' {
            if state.show_whitespace {
                write!(out, "{TAB_ARROW}   ")?;
            }
            // else: tab suppressed outright when whitespace isn't shown.
        } else if c.is_control() {
            // control bytes are suppressed verbatim
        } else {
            write!(out, "{c}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(list: &CommandList<'_>, whitespace: bool) -> String {
        let mut buf = Vec::new();
        render(list, whitespace, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn draw_text_moves_cursor_absolutely() {
        let mut list = CommandList::new((0, 0));
        list.draw_text_copy(3, 1, b"hi");
        let out = render_to_string(&list, false);
        assert!(out.contains("\x1b[2;4H"));
        assert!(out.ends_with("hi"));
    }

    #[test]
    fn whitespace_mode_substitutes_space_and_tab() {
        let mut list = CommandList::new((0, 0));
        list.set_show_whitespace(true);
        list.draw_text_copy(0, 0, b" \t");
        let out = render_to_string(&list, false);
        assert!(out.contains('\u{00B7}'));
        assert!(out.contains('\u{2192}'));
    }

    #[test]
    fn control_bytes_suppressed_without_whitespace_mode() {
        let mut list = CommandList::new((0, 0));
        list.draw_text_copy(0, 0, b"a\tb");
        let out = render_to_string(&list, false);
        assert!(!out.contains('\t'));
        assert!(out.contains('a'));
        assert!(out.contains('b'));
    }

    #[test]
    fn nested_list_offsets_by_combined_origin() {
        let mut parent = CommandList::new((5, 5));
        let mut child = CommandList::new((2, 2));
        child.draw_text_copy(0, 0, b"x");
        parent.draw_list(child);
        let out = render_to_string(&parent, false);
        // absolute: (5+2, 5+2) -> 1-based row 8, col 8
        assert!(out.contains("\x1b[8;8H"));
    }

    #[test]
    fn format_stack_joins_with_neutral_baseline() {
        let mut list = CommandList::new((0, 0));
        list.push_format("31");
        list.push_format("1");
        list.draw_text_copy(0, 0, b"x");
        let out = render_to_string(&list, false);
        assert!(out.contains("\x1b[0;31;1m"));
    }
}
