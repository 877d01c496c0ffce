//! Buffer views and the window-split tree that arranges them on screen.

pub mod view;
pub mod window;

pub use view::BufferView;
pub use window::{Axis, Rect, WindowId, WindowTree};
