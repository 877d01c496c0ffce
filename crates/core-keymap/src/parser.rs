//! Raw-byte key parser: turns a byte stream from the terminal into a
//! sequence of [`Keystroke`]s.
//!
//! Simple-keystroke coalescing looks only at the previously-emitted
//! keystroke's modifier, never ahead, so a self-insert run only grows
//! backward into an already-open run.

use core_events::{Key, Keystroke, Modifiers, SpecKey};

/// Decode every keystroke in `bytes`, coalescing adjacent plain (mod=None)
/// keystrokes into a single `Key::Text` run.
pub fn decode(bytes: &[u8]) -> Vec<Keystroke> {
    let mut out: Vec<Keystroke> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let (ks, consumed) = decode_one(bytes, i);
        i += consumed.max(1);
        push_coalesced(&mut out, ks);
    }
    out
}

fn push_coalesced(out: &mut Vec<Keystroke>, ks: Keystroke) {
    let is_simple = ks.modifiers == Modifiers::NONE && matches!(ks.key, Key::Char(_));
    if is_simple
        && let Some(prev) = out.last_mut()
        && prev.modifiers == Modifiers::NONE
    {
        match (&mut prev.key, &ks.key) {
            (Key::Text(s), Key::Char(c)) => {
                s.push(*c);
                prev.end = ks.end;
                return;
            }
            (Key::Char(existing), Key::Char(c)) => {
                let mut s = String::new();
                s.push(*existing);
                s.push(*c);
                prev.key = Key::Text(s);
                prev.end = ks.end;
                return;
            }
            _ => {}
        }
    }
    out.push(ks);
}

/// Decode exactly one keystroke starting at `bytes[start]`. Returns the
/// keystroke and the number of bytes consumed.
fn decode_one(bytes: &[u8], start: usize) -> (Keystroke, usize) {
    let b = bytes[start];
    match b {
        0x1B => decode_escape(bytes, start),
        0x7F => (
            Keystroke::new(Modifiers::CTRL, Key::Char('?'), start, start + 1),
            1,
        ),
        0x00..=0x1F => {
            let base = (b | 0x40) as char;
            (
                Keystroke::new(Modifiers::CTRL, Key::Char(base.to_ascii_lowercase()), start, start + 1),
                1,
            )
        }
        _ => decode_utf8_char(bytes, start, Modifiers::NONE),
    }
}

/// Decode a (possibly multi-byte) UTF-8 code point at `start`, skipping a
/// lone/invalid continuation byte by reporting it as a single replacement
/// char rather than failing (codec's documented failure mode).
fn decode_utf8_char(bytes: &[u8], start: usize, modifiers: Modifiers) -> (Keystroke, usize) {
    let len = core_text::codec::leading_byte_len(bytes[start]).min(bytes.len() - start);
    let slice = &bytes[start..start + len];
    match std::str::from_utf8(slice) {
        Ok(s) if s.chars().count() == 1 => {
            let c = s.chars().next().unwrap();
            (
                Keystroke::new(modifiers, Key::Char(c), start, start + len),
                len,
            )
        }
        _ => (
            Keystroke::new(
                modifiers,
                Key::Char(char::REPLACEMENT_CHARACTER),
                start,
                start + 1,
            ),
            1,
        ),
    }
}

/// Handle an ESC-led sequence: either a Meta keystroke (ESC + one base
/// key) or a Spec (function/arrow key) sequence when the next byte is `[`
/// or `O` and is itself followed by an alphanumeric byte.
fn decode_escape(bytes: &[u8], start: usize) -> (Keystroke, usize) {
    let Some(&b1) = bytes.get(start + 1) else {
        return (
            Keystroke::new(Modifiers::META, Key::Char('\u{1b}'), start, start + 1),
            1,
        );
    };
    if (b1 == b'[' || b1 == b'O')
        && bytes
            .get(start + 2)
            .is_some_and(|b| b.is_ascii_alphanumeric())
    {
        return decode_spec(bytes, start, b1);
    }
    // Meta + base key: re-apply the single-byte decode rules to b1.
    let (inner, inner_len) = decode_one(bytes, start + 1);
    let modifiers = inner.modifiers | Modifiers::META;
    (
        Keystroke::new(modifiers, inner.key, start, start + 1 + inner_len),
        1 + inner_len,
    )
}

/// Consume a CSI (`ESC [ …`) or SS3 (`ESC O …`) sequence: numeric
/// parameters and `;` separators, then a terminator byte that is consumed
/// unconditionally, whether or not it is `~`.
fn decode_spec(bytes: &[u8], start: usize, lead: u8) -> (Keystroke, usize) {
    let mut i = start + 2;
    let param_start = i - 1; // byte right after the lead
    while let Some(&b) = bytes.get(i) {
        if b.is_ascii_digit() || b == b';' {
            i += 1;
        } else {
            break;
        }
    }
    let terminator = *bytes.get(i).unwrap_or(&bytes[i - 1]);
    let consumed_terminator = bytes.get(i).is_some();
    if consumed_terminator {
        i += 1;
    }
    let param: Option<u32> = bytes[param_start..i.saturating_sub(1).max(param_start)]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(None, |acc: Option<u32>, b| {
            Some(acc.unwrap_or(0) * 10 + (*b - b'0') as u32)
        });
    (
        Keystroke::new(
            Modifiers::SPEC,
            Key::Spec(SpecKey {
                lead,
                param,
                terminator,
            }),
            start,
            i,
        ),
        i - start,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_coalesces_into_text() {
        let ks = decode(b"abc");
        assert_eq!(ks.len(), 1);
        assert_eq!(ks[0].key, Key::Text("abc".to_string()));
        assert_eq!((ks[0].start, ks[0].end), (0, 3));
    }

    #[test]
    fn ctrl_byte_breaks_the_run() {
        let ks = decode(b"ab\x18cd");
        assert_eq!(ks.len(), 3);
        assert_eq!(ks[0].key, Key::Text("ab".to_string()));
        assert_eq!(ks[1].modifiers, Modifiers::CTRL);
        assert_eq!(ks[1].key, Key::Char('x'));
        assert_eq!(ks[2].key, Key::Text("cd".to_string()));
    }

    #[test]
    fn del_is_ctrl_question_mark() {
        let ks = decode(&[0x7F]);
        assert_eq!(ks[0].modifiers, Modifiers::CTRL);
        assert_eq!(ks[0].key, Key::Char('?'));
    }

    #[test]
    fn meta_plus_base_key() {
        let ks = decode(&[0x1B, b'x']);
        assert_eq!(ks.len(), 1);
        assert_eq!(ks[0].modifiers, Modifiers::META);
        assert_eq!(ks[0].key, Key::Char('x'));
    }

    #[test]
    fn arrow_key_csi_sequence() {
        let ks = decode(&[0x1B, b'[', b'A']);
        assert_eq!(ks.len(), 1);
        assert!(ks[0].modifiers.contains(Modifiers::SPEC));
        match &ks[0].key {
            Key::Spec(spec) => assert_eq!(spec.name(), "up"),
            _ => panic!("expected Spec key"),
        }
    }

    #[test]
    fn csi_with_numeric_param_and_tilde_terminator() {
        let ks = decode(&[0x1B, b'[', b'3', b'~']);
        match &ks[0].key {
            Key::Spec(spec) => {
                assert_eq!(spec.param, Some(3));
                assert_eq!(spec.terminator, b'~');
                assert_eq!(spec.name(), "delete");
            }
            _ => panic!("expected Spec key"),
        }
    }

    #[test]
    fn multi_byte_utf8_is_one_keystroke() {
        let s = "界";
        let ks = decode(s.as_bytes());
        assert_eq!(ks.len(), 1);
        assert_eq!((ks[0].start, ks[0].end), (0, s.len()));
    }

    #[test]
    fn lone_continuation_byte_is_skipped_not_fatal() {
        let bytes = [0x80, b'a'];
        let ks = decode(&bytes);
        assert!(!ks.is_empty());
    }

    #[test]
    fn simple_run_only_grows_backward_into_open_run() {
        // A ctrl keystroke interrupts; a following plain run starts fresh.
        let ks = decode(b"a\x01bc");
        assert_eq!(ks.len(), 3);
        assert_eq!(ks[0].key, Key::Char('a'));
        assert_eq!(ks[2].key, Key::Text("bc".to_string()));
    }
}
