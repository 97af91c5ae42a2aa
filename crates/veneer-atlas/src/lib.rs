//! Sprite atlas packing for veneer skins.
//!
//! Each `SpriteAtlas` block in a skin document becomes one fixed-size packed
//! texture built here. Packing is deterministic: the same ordered sprite set
//! always produces the same regions, so a skin's UVs are stable across
//! reloads.

mod packer;

pub use packer::{AtlasPacker, PackedAtlas, PxRect, SpriteRegion, SpriteSource, UvRect};
