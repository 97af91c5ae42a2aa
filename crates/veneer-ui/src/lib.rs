//! The live component tree veneer re-themes, and the typed property surface
//! the skin engine mutates it through.
//!
//! The host owns this tree: it creates and destroys components on its own
//! schedule. The skin engine only reads and writes existing properties, by
//! name, through the [`PropertyRegistry`] -- a per-class table of declared
//! types and accessors built once and injected wherever properties are
//! resolved.

pub mod registry;
pub mod tree;
pub mod value;

pub use registry::{PropDescriptor, PropertyRegistry};
pub use tree::{
    Component, ComponentId, ComponentTree, MultiStateSprites, SpriteLayer, SpriteSet, WidgetClass,
};
pub use value::{EnumKind, PropKind, PropValue};
