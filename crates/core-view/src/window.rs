//! Binary window-split tree: every leaf holds one [`BufferView`], splits
//! stack leaves either top/bottom or left/right, and a single minibuffer
//! window lives pinned outside the tree.

use core_buffer::BufferId;

use crate::view::BufferView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

/// `Horizontal` stacks children top/bottom (Vim's `:split`), `Vertical`
/// stacks them left/right (Vim's `:vsplit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

enum Node {
    Split {
        axis: Axis,
        rect: Rect,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        id: WindowId,
        rect: Rect,
        view: BufferView,
    },
}

impl Node {
    fn rect(&self) -> Rect {
        match self {
            Node::Split { rect, .. } => *rect,
            Node::Leaf { rect, .. } => *rect,
        }
    }

    fn set_rect(&mut self, rect: Rect) {
        match self {
            Node::Split { rect: r, .. } => *r = rect,
            Node::Leaf { rect: r, .. } => *r = rect,
        }
    }
}

/// A single window tree plus the pinned echo-area/minibuffer window and
/// the id of the currently focused leaf.
pub struct WindowTree {
    root: Option<Node>,
    minibuffer: WindowId,
    minibuffer_view: BufferView,
    focused: WindowId,
    next_id: u64,
}

impl WindowTree {
    /// Build the initial tree: one full-height leaf (minus one row
    /// reserved for the minibuffer) showing `buffer_id`.
    pub fn init(buffer_id: BufferId, minibuffer_buffer_id: BufferId, width: u16, height: u16) -> Self {
        let mut next_id = 0u64;
        let root_id = WindowId(next_id);
        next_id += 1;
        let mini_id = WindowId(next_id);
        next_id += 1;

        let content_height = height.saturating_sub(1);
        Self {
            root: Some(Node::Leaf {
                id: root_id,
                rect: Rect::new(0, 0, width, content_height),
                view: BufferView::new(buffer_id),
            }),
            minibuffer: mini_id,
            minibuffer_view: {
                let mut v = BufferView::new(minibuffer_buffer_id);
                v.show_modeline = false;
                v
            },
            focused: root_id,
            next_id,
        }
    }

    fn root(&self) -> &Node {
        self.root.as_ref().expect("window tree always has a root")
    }

    fn root_mut(&mut self) -> &mut Node {
        self.root.as_mut().expect("window tree always has a root")
    }

    pub fn minibuffer_id(&self) -> WindowId {
        self.minibuffer
    }

    pub fn minibuffer_view(&self) -> &BufferView {
        &self.minibuffer_view
    }

    pub fn minibuffer_view_mut(&mut self) -> &mut BufferView {
        &mut self.minibuffer_view
    }

    pub fn focused_id(&self) -> WindowId {
        self.focused
    }

    pub fn focused_view(&self) -> &BufferView {
        self.view(self.focused).expect("focused window always exists")
    }

    pub fn focused_view_mut(&mut self) -> &mut BufferView {
        self.view_mut(self.focused).expect("focused window always exists")
    }

    pub fn view(&self, id: WindowId) -> Option<&BufferView> {
        Self::find(self.root(), id).map(|(_, view)| view)
    }

    pub fn view_mut(&mut self, id: WindowId) -> Option<&mut BufferView> {
        Self::find_mut(self.root.as_mut().expect("window tree always has a root"), id).map(|(_, view)| view)
    }

    pub fn rect(&self, id: WindowId) -> Option<Rect> {
        Self::find(self.root(), id).map(|(rect, _)| rect)
    }

    fn find(node: &Node, id: WindowId) -> Option<(Rect, &BufferView)> {
        match node {
            Node::Leaf { id: nid, rect, view } if *nid == id => Some((*rect, view)),
            Node::Leaf { .. } => None,
            Node::Split { left, right, .. } => Self::find(left, id).or_else(|| Self::find(right, id)),
        }
    }

    fn find_mut(node: &mut Node, id: WindowId) -> Option<(Rect, &mut BufferView)> {
        match node {
            Node::Leaf { id: nid, rect, view } if *nid == id => Some((*rect, view)),
            Node::Leaf { .. } => None,
            Node::Split { left, right, .. } => match Self::find_mut(left, id) {
                Some(found) => Some(found),
                None => Self::find_mut(right, id),
            },
        }
    }

    fn alloc_id(&mut self) -> WindowId {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Split the focused leaf into a top half (kept, re-focused) and a
    /// bottom half (new, showing `buffer_id`).
    pub fn split_horizontal(&mut self, buffer_id: BufferId) -> WindowId {
        self.split(Axis::Horizontal, buffer_id)
    }

    /// Split the focused leaf into a left half (kept, re-focused) and a
    /// right half (new, showing `buffer_id`).
    pub fn split_vertical(&mut self, buffer_id: BufferId) -> WindowId {
        self.split(Axis::Vertical, buffer_id)
    }

    /// Split the focused leaf along the axis a square-ish window would
    /// naturally grow on: horizontal (top/bottom) when the window is
    /// taller than it is wide two-to-one, vertical otherwise.
    pub fn split_auto(&mut self, buffer_id: BufferId) -> WindowId {
        let rect = self.rect(self.focused).expect("focused window always exists");
        let axis = if rect.height as u32 * 2 > rect.width as u32 {
            Axis::Horizontal
        } else {
            Axis::Vertical
        };
        self.split(axis, buffer_id)
    }

    fn split(&mut self, axis: Axis, buffer_id: BufferId) -> WindowId {
        let new_id = self.alloc_id();
        let target = self.focused;
        Self::split_node(self.root_mut(), target, axis, new_id, buffer_id);
        self.focused = new_id;
        new_id
    }

    fn split_node(node: &mut Node, target: WindowId, axis: Axis, new_id: WindowId, buffer_id: BufferId) -> bool {
        match node {
            Node::Leaf { id, rect, .. } if *id == target => {
                let rect = *rect;
                let (left_rect, right_rect) = split_rect(rect, axis);
                let taken = std::mem::replace(
                    node,
                    Node::Split {
                        axis,
                        rect,
                        left: Box::new(Node::Leaf {
                            id: WindowId(0),
                            rect: left_rect,
                            view: BufferView::new(buffer_id),
                        }),
                        right: Box::new(Node::Leaf {
                            id: new_id,
                            rect: right_rect,
                            view: BufferView::new(buffer_id),
                        }),
                    },
                );
                let Node::Leaf { id: old_id, view: old_view, .. } = taken else {
                    unreachable!("matched Leaf above")
                };
                // Both children show the same buffer with the same dot, per
                // spec: the new sibling starts as a clone of the split
                // leaf's view rather than a fresh one at the origin.
                let new_view = old_view.clone();
                let Node::Split { left, right, .. } = node else {
                    unreachable!("just constructed a Split")
                };
                **left = Node::Leaf {
                    id: old_id,
                    rect: left_rect,
                    view: old_view,
                };
                **right = Node::Leaf {
                    id: new_id,
                    rect: right_rect,
                    view: new_view,
                };
                true
            }
            Node::Leaf { .. } => false,
            Node::Split { left, right, .. } => {
                Self::split_node(left, target, axis, new_id, buffer_id)
                    || Self::split_node(right, target, axis, new_id, buffer_id)
            }
        }
    }

    /// Close the focused window. Refuses when it is the last leaf in the
    /// tree (the root must always show something); focus moves to the
    /// sibling subtree's first leaf.
    pub fn close_focused(&mut self) -> bool {
        if matches!(self.root(), Node::Leaf { .. }) {
            return false;
        }
        let target = self.focused;
        let old_root = self.root.take().expect("window tree always has a root");
        let (new_root, focus) = close_rec(old_root, target);
        self.root = Some(new_root);
        if let Some(id) = focus {
            self.focused = id;
        }
        true
    }

    /// Collapse every other window into the focused one.
    pub fn close_others(&mut self) {
        let focused = self.focused;
        let old_root = self.root.take().expect("window tree always has a root");
        let full_rect = old_root.rect();
        let Some(mut survivor) = extract_owned(old_root, focused) else {
            // Target vanished somehow; nothing sane to do but leave the
            // tree empty of content, which never happens in practice.
            return;
        };
        survivor.set_rect(full_rect);
        self.root = Some(survivor);
    }

    /// Resize the whole tree to a new top-level rect, proportionally
    /// scaling every split; the trailing child absorbs rounding error.
    pub fn resize(&mut self, width: u16, height: u16) {
        let content_height = height.saturating_sub(1);
        resize_node(self.root_mut(), Rect::new(0, 0, width, content_height));
    }

    /// In-order traversal: move focus to the next leaf, wrapping around.
    pub fn focus_next(&mut self) {
        let mut ids = Vec::new();
        collect_ids(self.root(), &mut ids);
        if ids.is_empty() {
            return;
        }
        let pos = ids.iter().position(|id| *id == self.focused).unwrap_or(0);
        self.focused = ids[(pos + 1) % ids.len()];
    }

    pub fn focus(&mut self, id: WindowId) -> bool {
        if Self::find(self.root(), id).is_some() {
            self.focused = id;
            true
        } else {
            false
        }
    }

    /// All leaf ids in left-to-right in-order traversal, for indexed focus
    /// commands (`window-focus-0`..`window-focus-9`).
    pub fn ids(&self) -> Vec<WindowId> {
        let mut ids = Vec::new();
        collect_ids(self.root(), &mut ids);
        ids
    }
}

/// Consumes `node`, removing the leaf named `target` and returning the
/// subtree that replaces it, plus the id focus should move to if `target`
/// was found directly beneath this node.
fn close_rec(node: Node, target: WindowId) -> (Node, Option<WindowId>) {
    match node {
        Node::Leaf { .. } => (node, None),
        Node::Split { axis, rect, left, right } => {
            let left_is_target = matches!(*left, Node::Leaf { id, .. } if id == target);
            let right_is_target = matches!(*right, Node::Leaf { id, .. } if id == target);
            if left_is_target {
                let mut survivor = *right;
                survivor.set_rect(rect);
                let focus = first_leaf_id(&survivor);
                return (survivor, Some(focus));
            }
            if right_is_target {
                let mut survivor = *left;
                survivor.set_rect(rect);
                let focus = first_leaf_id(&survivor);
                return (survivor, Some(focus));
            }
            let (new_left, focus_l) = close_rec(*left, target);
            if let Some(focus) = focus_l {
                return (
                    Node::Split {
                        axis,
                        rect,
                        left: Box::new(new_left),
                        right,
                    },
                    Some(focus),
                );
            }
            let (new_right, focus_r) = close_rec(*right, target);
            (
                Node::Split {
                    axis,
                    rect,
                    left: Box::new(new_left),
                    right: Box::new(new_right),
                },
                focus_r,
            )
        }
    }
}

fn extract_owned(node: Node, target: WindowId) -> Option<Node> {
    match node {
        Node::Leaf { id, .. } if id == target => Some(node),
        Node::Leaf { .. } => None,
        Node::Split { left, right, .. } => extract_owned(*left, target).or_else(|| extract_owned(*right, target)),
    }
}

fn first_leaf_id(node: &Node) -> WindowId {
    match node {
        Node::Leaf { id, .. } => *id,
        Node::Split { left, .. } => first_leaf_id(left),
    }
}

fn collect_ids(node: &Node, out: &mut Vec<WindowId>) {
    match node {
        Node::Leaf { id, .. } => out.push(*id),
        Node::Split { left, right, .. } => {
            collect_ids(left, out);
            collect_ids(right, out);
        }
    }
}

fn split_rect(rect: Rect, axis: Axis) -> (Rect, Rect) {
    match axis {
        Axis::Horizontal => {
            let top_h = rect.height / 2;
            let bottom_h = rect.height - top_h;
            (
                Rect::new(rect.x, rect.y, rect.width, top_h),
                Rect::new(rect.x, rect.y + top_h, rect.width, bottom_h),
            )
        }
        Axis::Vertical => {
            let left_w = rect.width / 2;
            let right_w = rect.width - left_w;
            (
                Rect::new(rect.x, rect.y, left_w, rect.height),
                Rect::new(rect.x + left_w, rect.y, right_w, rect.height),
            )
        }
    }
}

fn resize_node(node: &mut Node, rect: Rect) {
    match node {
        Node::Leaf { rect: r, .. } => *r = rect,
        Node::Split { axis, rect: r, left, right } => {
            let old = *r;
            *r = rect;
            match axis {
                Axis::Horizontal => {
                    let ratio = if old.height == 0 {
                        0.5
                    } else {
                        left.rect().height as f64 / old.height as f64
                    };
                    let top_h = (((rect.height as f64) * ratio).round() as u16).min(rect.height);
                    let bottom_h = rect.height - top_h;
                    resize_node(left, Rect::new(rect.x, rect.y, rect.width, top_h));
                    resize_node(right, Rect::new(rect.x, rect.y + top_h, rect.width, bottom_h));
                }
                Axis::Vertical => {
                    let ratio = if old.width == 0 {
                        0.5
                    } else {
                        left.rect().width as f64 / old.width as f64
                    };
                    let left_w = (((rect.width as f64) * ratio).round() as u16).min(rect.width);
                    let right_w = rect.width - left_w;
                    resize_node(left, Rect::new(rect.x, rect.y, left_w, rect.height));
                    resize_node(right, Rect::new(rect.x + left_w, rect.y, right_w, rect.height));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_buffer::BufferArena;

    fn ids() -> (BufferId, BufferId) {
        let mut arena = BufferArena::new();
        let a = arena.insert(core_buffer::Buffer::create("a"));
        let b = arena.insert(core_buffer::Buffer::create("mini"));
        (a, b)
    }

    #[test]
    fn init_reserves_one_row_for_minibuffer() {
        let (buf, mini) = ids();
        let tree = WindowTree::init(buf, mini, 80, 24);
        let rect = tree.rect(tree.focused_id()).unwrap();
        assert_eq!(rect.height, 23);
    }

    #[test]
    fn split_vertical_creates_two_leaves_side_by_side() {
        let (buf, mini) = ids();
        let mut tree = WindowTree::init(buf, mini, 80, 24);
        let original = tree.focused_id();
        let new_id = tree.split_vertical(buf);
        assert_ne!(original, new_id);
        let left = tree.rect(original).unwrap();
        let right = tree.rect(new_id).unwrap();
        assert_eq!(left.width + right.width, 80);
        assert_eq!(left.height, right.height);
        assert_eq!(tree.focused_id(), new_id);
    }

    #[test]
    fn split_horizontal_stacks_top_and_bottom() {
        let (buf, mini) = ids();
        let mut tree = WindowTree::init(buf, mini, 80, 24);
        let original = tree.focused_id();
        let new_id = tree.split_horizontal(buf);
        let top = tree.rect(original).unwrap();
        let bottom = tree.rect(new_id).unwrap();
        assert_eq!(top.height + bottom.height, 23);
        assert_eq!(top.width, bottom.width);
    }

    #[test]
    fn closing_the_only_window_is_refused() {
        let (buf, mini) = ids();
        let mut tree = WindowTree::init(buf, mini, 80, 24);
        assert!(!tree.close_focused());
    }

    #[test]
    fn close_focused_restores_sibling_rect() {
        let (buf, mini) = ids();
        let mut tree = WindowTree::init(buf, mini, 80, 24);
        let original = tree.focused_id();
        tree.split_vertical(buf);
        tree.focus(original);
        assert!(tree.close_focused());
        let rect = tree.rect(tree.focused_id()).unwrap();
        assert_eq!(rect.width, 80);
    }

    #[test]
    fn focus_next_cycles_through_all_leaves() {
        let (buf, mini) = ids();
        let mut tree = WindowTree::init(buf, mini, 80, 24);
        let a = tree.focused_id();
        let b = tree.split_vertical(buf);
        tree.focus_next();
        assert_eq!(tree.focused_id(), a);
        tree.focus_next();
        assert_eq!(tree.focused_id(), b);
    }

    #[test]
    fn close_others_collapses_tree_to_one_leaf() {
        let (buf, mini) = ids();
        let mut tree = WindowTree::init(buf, mini, 80, 24);
        let original = tree.focused_id();
        tree.split_vertical(buf);
        tree.focus(original);
        tree.close_others();
        let rect = tree.rect(tree.focused_id()).unwrap();
        assert_eq!(rect.width, 80);
        assert_eq!(tree.focused_id(), original);
    }
}
