//! UTF-8 codec, grapheme/width helpers, and the line-indexed text store.
//!
//! This crate has no notion of undo, buffers, or views; it is the pure data
//! layer that `core-buffer` composes into a full editing buffer.

pub mod codec;
pub mod location;
pub mod segment;
pub mod store;
pub mod width;

pub use location::{Location, Region};
pub use store::{Chunk, Color, ColorAttr, Error, Property, Span, TextStore};
pub use width::egc_width;
