//! Append-only undo log.
//!
//! The log is a flat `Vec<Record>` plus a `top` cursor. Pushing never
//! removes a record; `next` walks backward from `top`, consumes one group
//! (a run of non-boundary records bounded by the next boundary or index
//! 0, including that bounding boundary itself), and returns it newest-first
//! — the reverse of storage order, and the order the records must be
//! inverted in to correctly reconstruct an earlier state when a group holds
//! more than one content record.

use core_text::{Location, Region};

/// One entry in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Text was inserted across `[begin, end)`.
    Add { begin: Location, end: Location },
    /// Text was removed starting at `position`; the log owns the deleted
    /// bytes so they can be written back on undo.
    Delete { position: Location, bytes: Vec<u8> },
    /// A grouping marker. `savepoint` marks "buffer matched disk" at the
    /// time of the push; at most one record in the whole log carries
    /// `savepoint = true`.
    Boundary { savepoint: bool },
}

/// `top` can point one past the sentinel meaning "nothing left to undo";
/// `next()` resets it to the end of the log, which is what makes redo
/// implicit once you've walked all the way back.
const INVALID_TOP: usize = usize::MAX;

#[derive(Debug, Default)]
pub struct UndoLog {
    records: Vec<Record>,
    top: usize,
    in_progress: bool,
}

impl UndoLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            top: INVALID_TOP,
            in_progress: false,
        }
    }

    fn advance_top_on_push(&mut self) {
        if !self.in_progress {
            self.top = self.records.len();
        }
    }

    /// Append a boundary. When `savepoint` is true, clear the flag from any
    /// prior boundary first, preserving the "at most one savepoint" rule.
    pub fn push_boundary(&mut self, savepoint: bool) {
        if savepoint {
            for record in self.records.iter_mut() {
                if let Record::Boundary { savepoint: sp } = record {
                    *sp = false;
                }
            }
        }
        self.records.push(Record::Boundary { savepoint });
        self.advance_top_on_push();
    }

    /// Append an Add record, coalescing with the immediately previous
    /// record if it is also an Add whose range directly abuts this one.
    pub fn push_add(&mut self, begin: Location, end: Location) {
        if let Some(Record::Add { end: prev_end, .. }) = self.records.last_mut()
            && *prev_end == begin
        {
            *prev_end = end;
            self.advance_top_on_push();
            return;
        }
        self.records.push(Record::Add { begin, end });
        self.advance_top_on_push();
    }

    /// Append a Delete record; the log takes ownership of `bytes`.
    pub fn push_delete(&mut self, position: Location, bytes: Vec<u8>) {
        self.records.push(Record::Delete { position, bytes });
        self.advance_top_on_push();
    }

    /// Bracket an undo traversal: while in progress, pushes do not advance
    /// `top`, so the inverse records emitted while undoing become redo
    /// fodder instead of new undo entries.
    pub fn begin(&mut self) {
        self.in_progress = true;
    }

    pub fn end(&mut self) {
        self.in_progress = false;
    }

    /// Consume one group starting at `top`: first a leading run of boundary
    /// records at `top` itself, then a run of non-boundary records down to
    /// (and including) the next boundary, or down to index 0 if no further
    /// boundary is found. Returns the consumed records newest-first. If the
    /// walk reaches index 0, `top` becomes `INVALID_TOP`; otherwise `top` is
    /// left pointing at the boundary that closed the group, ready for the
    /// one-step pre-decrement the next call applies before it resumes the
    /// walk. If `top` was `INVALID_TOP` on entry, it is first reset to the
    /// end of the log — this is what makes redo implicit once undo has
    /// walked all the way back: the inverses `Buffer::undo` pushed while
    /// undoing were appended past the old end of the log, so resetting
    /// `top` there picks them straight back up.
    pub fn next(&mut self) -> Vec<Record> {
        if self.records.is_empty() {
            return Vec::new();
        }
        if self.top == INVALID_TOP {
            self.top = self.records.len() - 1;
        } else if self.top == 0 {
            return Vec::new();
        } else {
            self.top -= 1;
        }

        let mut out = Vec::new();

        // Leading boundary run at the current position.
        while matches!(self.records.get(self.top), Some(Record::Boundary { .. })) {
            out.push(self.records[self.top].clone());
            if self.top == 0 {
                self.top = INVALID_TOP;
                return out;
            }
            self.top -= 1;
        }

        // Non-boundary run, plus the boundary that closes it (if reached
        // before index 0).
        loop {
            let is_boundary = matches!(self.records[self.top], Record::Boundary { .. });
            out.push(self.records[self.top].clone());
            if is_boundary {
                if self.top == 0 {
                    self.top = INVALID_TOP;
                }
                break;
            }
            if self.top == 0 {
                self.top = INVALID_TOP;
                break;
            }
            self.top -= 1;
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Invert a consumed record against the buffer's mutation primitives.
/// `core_buffer::Buffer::undo` applies these in order.
#[derive(Debug, Clone)]
pub enum Inverse {
    Delete(Region),
    Add { position: Location, bytes: Vec<u8> },
    /// Only a savepoint boundary flips `modified`; a plain grouping
    /// boundary inverts to `Noop`.
    ClearModified,
    Noop,
}

pub fn invert(record: Record) -> Inverse {
    match record {
        Record::Add { begin, end } => Inverse::Delete(Region::new(begin, end)),
        Record::Delete { position, bytes } => Inverse::Add { position, bytes },
        Record::Boundary { savepoint: true } => Inverse::ClearModified,
        Record::Boundary { savepoint: false } => Inverse::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize, col: usize) -> Location {
        Location::new(line, col)
    }

    #[test]
    fn adjacent_adds_coalesce() {
        let mut log = UndoLog::new();
        log.push_add(loc(0, 0), loc(0, 1));
        log.push_add(loc(0, 1), loc(0, 2));
        log.push_add(loc(0, 2), loc(0, 3));
        assert_eq!(log.record_count(), 1);
        let group = log.next();
        assert_eq!(
            group,
            vec![Record::Add {
                begin: loc(0, 0),
                end: loc(0, 3)
            }]
        );
    }

    #[test]
    fn non_adjacent_adds_do_not_coalesce() {
        let mut log = UndoLog::new();
        log.push_add(loc(0, 0), loc(0, 1));
        log.push_add(loc(0, 5), loc(0, 6));
        assert_eq!(log.record_count(), 2);
    }

    #[test]
    fn only_one_savepoint_survives() {
        let mut log = UndoLog::new();
        log.push_boundary(true);
        log.push_add(loc(0, 0), loc(0, 1));
        log.push_boundary(true);
        let savepoints = log
            .records
            .iter()
            .filter(|r| matches!(r, Record::Boundary { savepoint: true }))
            .count();
        assert_eq!(savepoints, 1);
    }

    #[test]
    fn next_includes_the_bounding_boundaries_newest_first() {
        let mut log = UndoLog::new();
        log.push_boundary(true); // index 0
        log.push_add(loc(0, 0), loc(0, 1)); // index 1
        log.push_add(loc(0, 1), loc(0, 2)); // coalesced into index 1
        log.push_boundary(false); // index 2

        // One call walks all the way from the trailing boundary back
        // through the add to the leading savepoint boundary, since index 0
        // is reached before any further boundary is found; every boundary
        // it crosses is part of the returned group, newest first.
        let group = log.next();
        assert_eq!(
            group,
            vec![
                Record::Boundary { savepoint: false },
                Record::Add {
                    begin: loc(0, 0),
                    end: loc(0, 2)
                },
                Record::Boundary { savepoint: true },
            ]
        );

        // Nothing new was pushed, so the reset-to-end behavior on the next
        // call just replays the same group rather than yielding nothing.
        let group2 = log.next();
        assert_eq!(group2, group);
    }

    #[test]
    fn next_resets_from_invalid_top_and_replays_without_new_pushes() {
        let mut log = UndoLog::new();
        log.push_add(loc(0, 0), loc(0, 1)); // index 0
        log.push_boundary(false); // index 1
        log.push_add(loc(0, 5), loc(0, 6)); // index 2
        log.push_boundary(false); // index 3

        let first = log.next();
        assert_eq!(
            first,
            vec![
                Record::Boundary { savepoint: false },
                Record::Add {
                    begin: loc(0, 5),
                    end: loc(0, 6)
                },
                Record::Boundary { savepoint: false },
            ]
        );

        let second = log.next();
        assert_eq!(
            second,
            vec![Record::Add {
                begin: loc(0, 0),
                end: loc(0, 1)
            }]
        );

        // Bottomed out to INVALID_TOP; with nothing new pushed in between,
        // the next call resets to the end of the log and replays `first`.
        let third = log.next();
        assert_eq!(third, first);
    }

    #[test]
    fn pushes_during_traversal_do_not_advance_top() {
        let mut log = UndoLog::new();
        log.push_add(loc(0, 0), loc(0, 1));
        log.push_boundary(false);
        let before = log.top;
        log.begin();
        log.push_delete(loc(0, 0), vec![b'a']);
        assert_eq!(log.top, before);
        log.end();
        log.push_delete(loc(0, 1), vec![b'b']);
        assert_ne!(log.top, before);
    }
}
