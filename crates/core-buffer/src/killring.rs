//! Fixed-capacity kill ring with paste/paste-older cycling.
//!
//! The cursor advance is `(write_cursor + 1) % CAPACITY`: parenthesized so
//! the wraparound actually happens, rather than folding only the literal
//! `1` through the modulus.

const CAPACITY: usize = 64;

#[derive(Debug)]
pub struct KillRing {
    entries: Vec<Vec<u8>>,
    write_cursor: usize,
    paste_cursor: usize,
    paste_up_to_date: bool,
}

impl Default for KillRing {
    fn default() -> Self {
        Self::new()
    }
}

impl KillRing {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(CAPACITY),
            write_cursor: 0,
            paste_cursor: 0,
            paste_up_to_date: false,
        }
    }

    /// Copy (or cut) a chunk of text into the ring, overwriting the oldest
    /// entry once full.
    pub fn push(&mut self, bytes: Vec<u8>) {
        if self.entries.len() < CAPACITY {
            self.entries.push(bytes);
            self.write_cursor = self.entries.len() % CAPACITY;
        } else {
            self.entries[self.write_cursor] = bytes;
            self.write_cursor = (self.write_cursor + 1) % CAPACITY;
        }
        self.paste_cursor = self.last_index();
        self.paste_up_to_date = false;
    }

    fn last_index(&self) -> usize {
        if self.entries.is_empty() {
            0
        } else if self.entries.len() < CAPACITY {
            self.entries.len() - 1
        } else {
            (self.write_cursor + CAPACITY - 1) % CAPACITY
        }
    }

    /// Most recent entry, for a plain paste. Marks the next action as
    /// paste-eligible for `paste_older`.
    pub fn paste(&mut self) -> Option<&[u8]> {
        if self.entries.is_empty() {
            return None;
        }
        self.paste_cursor = self.last_index();
        self.paste_up_to_date = true;
        self.entries.get(self.paste_cursor).map(Vec::as_slice)
    }

    /// Replace the just-pasted text with the entry one step older. Only
    /// meaningful immediately after a `paste`; any other action clears the
    /// `paste_up_to_date` flag so a later `paste_older` behaves like a
    /// fresh `paste`.
    pub fn paste_older(&mut self) -> Option<&[u8]> {
        if self.entries.is_empty() {
            return None;
        }
        if !self.paste_up_to_date {
            return self.paste();
        }
        let count = self.entries.len();
        self.paste_cursor = (self.paste_cursor + count - 1) % count;
        self.paste_up_to_date = true;
        self.entries.get(self.paste_cursor).map(Vec::as_slice)
    }

    /// Any non-paste editing action invalidates `paste_up_to_date`.
    pub fn note_non_paste_action(&mut self) {
        self.paste_up_to_date = false;
    }

    pub fn is_paste_up_to_date(&self) -> bool {
        self.paste_up_to_date
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_then_paste_older_cycles_backward() {
        let mut ring = KillRing::new();
        ring.push(b"one".to_vec());
        ring.push(b"two".to_vec());
        assert_eq!(ring.paste(), Some(&b"two"[..]));
        assert_eq!(ring.paste_older(), Some(&b"one"[..]));
    }

    #[test]
    fn non_paste_action_resets_paste_older_to_fresh_paste() {
        let mut ring = KillRing::new();
        ring.push(b"one".to_vec());
        ring.push(b"two".to_vec());
        assert_eq!(ring.paste(), Some(&b"two"[..]));
        ring.note_non_paste_action();
        assert_eq!(ring.paste_older(), Some(&b"two"[..]));
    }

    #[test]
    fn wraps_at_capacity_without_growing_unbounded() {
        let mut ring = KillRing::new();
        for i in 0..(CAPACITY + 5) {
            ring.push(vec![i as u8]);
        }
        assert_eq!(ring.len(), CAPACITY);
        assert_eq!(ring.paste(), Some(&[(CAPACITY + 4) as u8][..]));
    }
}
