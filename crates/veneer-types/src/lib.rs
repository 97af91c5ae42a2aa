//! Foundation types for the veneer re-theming engine.
//!
//! This crate contains the vocabulary shared by every veneer crate: geometry
//! (vectors, rectangles, offsets), 8-bit and float colors, the error
//! taxonomy, and the resource abstraction used to read skin documents and
//! sprite images.

pub mod color;
pub mod error;
pub mod geometry;
pub mod resources;

pub use color::{Color32, Colorf};
pub use error::{Result, SkinError};
pub use geometry::{Rect, RectOffset, Vec2, Vec3, Vec4};
pub use resources::{DirResources, MemResources, Resources};
