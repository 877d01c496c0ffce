//! SGR (Select Graphic Rendition) fragment builders.
//!
//! These produce the *parameter* portion of an SGR escape (no leading
//! `ESC [` / trailing `m`); [`CommandList::push_format`] stores fragments
//! and the final renderer joins them with `;` inside one `ESC [ … m`.

use core_text::{Color, ColorAttr};

/// `30+n`/`40+n` for palette 0-7, `90+n`/`100+n` for 8-15, `38;5;n`/`48;5;n`
/// otherwise.
pub fn indexed(n: u8, bg: bool) -> String {
    match n {
        0..=7 => format!("{}", if bg { 40 + n } else { 30 + n }),
        8..=15 => format!("{}", if bg { 100 + (n - 8) } else { 90 + (n - 8) }),
        _ => format!("{};5;{n}", if bg { 48 } else { 38 }),
    }
}

/// `38;2;r;g;b` / `48;2;r;g;b` for 24-bit truecolor.
pub fn rgb(r: u8, g: u8, b: u8, bg: bool) -> String {
    format!("{};2;{r};{g};{b}", if bg { 48 } else { 38 })
}

fn color_fragment(color: Color, bg: bool) -> String {
    match color {
        Color::Indexed(n) => indexed(n, bg),
        Color::Rgb(r, g, b) => rgb(r, g, b, bg),
    }
}

/// Every SGR fragment implied by a [`ColorAttr`] (fg then bg, in that
/// order, when present).
pub fn attr_fragments(attr: &ColorAttr) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(fg) = attr.fg {
        out.push(color_fragment(fg, false));
    }
    if let Some(bg) = attr.bg {
        out.push(color_fragment(bg, true));
    }
    out
}

/// The neutral baseline fragment: `0` (reset all attributes).
pub const RESET: &str = "0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_palette_uses_30_40_series() {
        assert_eq!(indexed(3, false), "33");
        assert_eq!(indexed(3, true), "43");
    }

    #[test]
    fn bright_palette_uses_90_100_series() {
        assert_eq!(indexed(9, false), "91");
        assert_eq!(indexed(9, true), "101");
    }

    #[test]
    fn wide_palette_uses_256_color_form() {
        assert_eq!(indexed(200, false), "38;5;200");
        assert_eq!(indexed(200, true), "48;5;200");
    }

    #[test]
    fn truecolor_form() {
        assert_eq!(rgb(1, 2, 3, false), "38;2;1;2;3");
        assert_eq!(rgb(1, 2, 3, true), "48;2;1;2;3");
    }
}
