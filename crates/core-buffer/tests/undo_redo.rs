use core_buffer::arena::BufferArena;
use core_buffer::killring::KillRing;
use core_buffer::Buffer;
use core_text::{Location, Region};
use pretty_assertions::assert_eq;

#[test]
fn arena_ids_stay_stable_across_unrelated_removals() {
    let mut arena = BufferArena::new();
    let a = arena.insert(Buffer::create("a"));
    let b = arena.insert(Buffer::create("b"));
    let c = arena.insert(Buffer::create("c"));

    arena.remove(b);

    assert_eq!(arena.get(a).unwrap().name, "a");
    assert!(arena.get(b).is_none());
    assert_eq!(arena.get(c).unwrap().name, "c");
}

#[test]
fn undo_walks_back_through_each_boundary_group_via_the_arena() {
    let mut arena = BufferArena::new();
    let id = arena.insert(Buffer::create("scratch"));

    let buffer = arena.get_mut(id).unwrap();
    buffer.add(Location::new(0, 0), b"hello");
    buffer.push_boundary(true);
    buffer.add(Location::new(0, 5), b" world");
    buffer.push_boundary(true);
    assert_eq!(buffer.line(0).as_str(), "hello world");

    // undo twice: removes " world", then "hello"
    let loc = buffer.end();
    buffer.undo(loc);
    assert_eq!(buffer.line(0).as_str(), "hello");
    let loc = buffer.end();
    buffer.undo(loc);
    assert_eq!(buffer.line(0).as_str(), "");
    assert!(!buffer.modified);

    // Each undo above applied its inverse through the normal add/delete
    // path, so the deletes that undid the two adds were themselves logged.
    // Once `top` walks off the front of the log it resets to the end,
    // landing on exactly those logged deletes: undoing them is a redo,
    // restoring the text the first two calls removed.
    let loc = buffer.end();
    buffer.undo(loc);
    assert_eq!(buffer.line(0).as_str(), "hello world");
    assert!(!buffer.modified);
}

#[test]
fn cut_then_paste_older_restores_an_earlier_kill_through_two_buffers() {
    let mut arena = BufferArena::new();
    let mut kill_ring = KillRing::new();
    let first = arena.insert(Buffer::create("first"));
    let second = arena.insert(Buffer::create("second"));

    let buffer = arena.get_mut(first).unwrap();
    buffer.add(Location::new(0, 0), b"alpha beta");
    buffer.cut_region(Region::new(Location::new(0, 0), Location::new(0, 5)), &mut kill_ring);

    let buffer = arena.get_mut(second).unwrap();
    buffer.add(Location::new(0, 0), b"gamma delta");
    buffer.cut_region(Region::new(Location::new(0, 0), Location::new(0, 5)), &mut kill_ring);

    // Most recent kill pastes first...
    let buffer = arena.get_mut(second).unwrap();
    let at = buffer.paste(Location::new(0, 0), &mut kill_ring);
    assert_eq!(buffer.line(0).as_str(), "gamma delta");

    // ...then paste-older swaps it for the previous kill-ring entry in place.
    let pasted_region = Region::new(Location::new(0, 0), at);
    let buffer = arena.get_mut(second).unwrap();
    buffer.paste_older(pasted_region, &mut kill_ring).unwrap();
    assert_eq!(buffer.line(0).as_str(), "alpha delta");
}
