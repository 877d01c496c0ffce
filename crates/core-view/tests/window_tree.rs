use core_buffer::arena::BufferArena;
use core_buffer::killring::KillRing;
use core_buffer::Buffer;
use core_text::Location;
use core_view::window::WindowTree;
use pretty_assertions::assert_eq;

fn harness() -> (BufferArena, WindowTree) {
    let mut buffers = BufferArena::new();
    let root_buffer = buffers.insert(Buffer::create("scratch"));
    let mini_buffer = buffers.insert(Buffer::create("*minibuffer*"));
    let windows = WindowTree::init(root_buffer, mini_buffer, 80, 24);
    (buffers, windows)
}

#[test]
fn vertical_split_halves_width_not_height() {
    let (buffers, mut windows) = harness();
    let buffer_id = windows.focused_view().buffer_id;
    let original = windows.focused_id();
    let before = windows.rect(original).unwrap();

    // A split focuses the new (right-hand) leaf, leaving the original
    // leaf's id and rect in place on the left.
    let new_id = windows.split_vertical(buffer_id);
    assert_eq!(windows.focused_id(), new_id);

    let left = windows.rect(original).unwrap();
    let right = windows.rect(new_id).unwrap();
    assert_eq!(left.height, before.height);
    assert_eq!(right.height, before.height);
    assert_eq!(left.width + right.width, before.width);
    drop(buffers);
}

#[test]
fn horizontal_split_halves_height_not_width() {
    let (buffers, mut windows) = harness();
    let buffer_id = windows.focused_view().buffer_id;
    let original = windows.focused_id();
    let before = windows.rect(original).unwrap();

    let new_id = windows.split_horizontal(buffer_id);

    let top = windows.rect(original).unwrap();
    let bottom = windows.rect(new_id).unwrap();
    assert_eq!(top.width, before.width);
    assert_eq!(bottom.width, before.width);
    assert_eq!(top.height + bottom.height, before.height);
    drop(buffers);
}

#[test]
fn split_copies_dot_into_the_new_sibling_view() {
    let (_buffers, mut windows) = harness();
    let buffer_id = windows.focused_view().buffer_id;
    let original = windows.focused_id();
    windows.focused_view_mut().dot = Location::new(3, 7);

    let new_id = windows.split_vertical(buffer_id);

    assert_eq!(windows.view(original).unwrap().dot, Location::new(3, 7));
    assert_eq!(windows.view(new_id).unwrap().dot, Location::new(3, 7));
}

#[test]
fn closing_a_window_gives_its_rect_back_to_the_sibling() {
    let (_buffers, mut windows) = harness();
    let buffer_id = windows.focused_view().buffer_id;
    let full = windows.rect(windows.focused_id()).unwrap();

    // split_vertical focuses the new leaf; close it to leave the original
    // leaf as the sole survivor, reclaiming the full original rectangle.
    windows.split_vertical(buffer_id);
    assert!(windows.close_focused());

    let remaining = windows.ids();
    assert_eq!(remaining.len(), 1);
    assert_eq!(windows.rect(remaining[0]).unwrap(), full);
}

#[test]
fn focus_next_cycles_through_every_leaf_and_back() {
    let (_buffers, mut windows) = harness();
    let buffer_id = windows.focused_view().buffer_id;
    let first = windows.focused_id();
    let second = windows.split_vertical(buffer_id);
    assert_eq!(windows.focused_id(), second);

    windows.focus(first);
    windows.focus_next();
    assert_eq!(windows.focused_id(), second);
    windows.focus_next();
    assert_eq!(windows.focused_id(), first);
}

#[test]
fn editing_through_a_window_s_view_mutates_the_buffer_behind_its_id() {
    let (mut buffers, mut windows) = harness();
    let mut kill_ring = KillRing::new();

    let buffer_id = windows.focused_view().buffer_id;
    {
        let buffer = buffers.get_mut(buffer_id).unwrap();
        let view = windows.focused_view_mut();
        view.add(buffer, &mut kill_ring, b"hi there");
    }

    let buffer = buffers.get(buffer_id).unwrap();
    assert_eq!(buffer.line(0).as_str(), "hi there");
}
