//! Shelf packer: rows of sprites, largest area first.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use image::{RgbaImage, imageops};
use veneer_types::error::{Result, SkinError};

/// Default atlas texture edge, in pixels.
pub const DEFAULT_SIZE: u32 = 2048;

/// Gap kept between packed sprites and around the atlas border, in pixels.
pub const MARGIN: u32 = 2;

/// One pending sprite image plus its stable content identity.
///
/// `key` is the identity used for duplicate detection -- the source path of
/// the image, not the sprite name. Two sprites loaded from the same file
/// share one packed region regardless of how many names point at it.
#[derive(Debug, Clone)]
pub struct SpriteSource {
    pub key: String,
    pub image: Arc<RgbaImage>,
}

impl SpriteSource {
    pub fn new(key: impl Into<String>, image: Arc<RgbaImage>) -> Self {
        Self {
            key: key.into(),
            image,
        }
    }
}

/// Pixel-space placement of a sprite inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PxRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Fractional texture coordinates, inset one texel per side so bilinear
/// sampling does not bleed in neighboring sprites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// A packed sprite: where its pixels live and what UVs to sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteRegion {
    pub px: PxRect,
    pub uv: UvRect,
}

/// The output of a packing run: one texture plus per-name regions.
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    pub name: String,
    pub image: RgbaImage,
    sprites: HashMap<String, SpriteRegion>,
}

impl PackedAtlas {
    /// Look up a sprite's region by name.
    pub fn sprite(&self, name: &str) -> Option<&SpriteRegion> {
        self.sprites.get(name)
    }

    /// Iterate over `(name, region)` pairs in unspecified order.
    pub fn sprites(&self) -> impl Iterator<Item = (&str, &SpriteRegion)> {
        self.sprites.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

/// Accumulates sprites and packs them into one fixed-size texture.
pub struct AtlasPacker {
    width: u32,
    height: u32,
    margin: u32,
    pending: Vec<(String, SpriteSource)>,
}

impl AtlasPacker {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_SIZE, DEFAULT_SIZE)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin: MARGIN,
            pending: Vec::new(),
        }
    }

    /// Queue a sprite for the next [`build`](Self::build).
    pub fn add_sprite(&mut self, name: impl Into<String>, source: SpriteSource) {
        self.pending.push((name.into(), source));
    }

    /// Number of queued sprite entries (duplicates included).
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pack all queued sprites into a single texture.
    ///
    /// Placement order is by descending pixel area (stable: equal areas keep
    /// insertion order), left to right in shelf rows. Fails with
    /// [`SkinError::CapacityExceeded`] when a row would start past the
    /// bottom edge -- the caller should move some sprites to another atlas.
    pub fn build(&self, atlas_name: &str) -> Result<PackedAtlas> {
        let mut order: Vec<usize> = (0..self.pending.len()).collect();
        order.sort_by_key(|&i| {
            let img = &self.pending[i].1.image;
            Reverse(u64::from(img.width()) * u64::from(img.height()))
        });

        let mut canvas = RgbaImage::new(self.width, self.height);
        let mut placed: HashMap<&str, SpriteRegion> = HashMap::new();

        let mut x = self.margin;
        let mut y = self.margin;
        let mut row_max = 0u32;

        for &i in &order {
            let source = &self.pending[i].1;
            if placed.contains_key(source.key.as_str()) {
                continue;
            }

            let (w, h) = (source.image.width(), source.image.height());
            if w == 0 || h == 0 {
                log::warn!("skipping empty sprite image \"{}\"", source.key);
                continue;
            }

            if x + w + self.margin > self.width {
                x = self.margin;
                y += row_max + self.margin;
                row_max = 0;
            }
            if x + w + self.margin > self.width || y + h + self.margin > self.height {
                return Err(SkinError::CapacityExceeded {
                    atlas: atlas_name.to_string(),
                    row_y: y,
                    needed: h,
                    height: self.height,
                });
            }

            imageops::replace(&mut canvas, source.image.as_ref(), i64::from(x), i64::from(y));

            let px = PxRect { x, y, w, h };
            placed.insert(source.key.as_str(), self.region(px));

            x += w + self.margin;
            row_max = row_max.max(h);
        }

        // Name assignment runs in insertion order so the first definition of
        // a duplicated sprite name wins.
        let mut sprites: HashMap<String, SpriteRegion> = HashMap::new();
        for (name, source) in &self.pending {
            let Some(region) = placed.get(source.key.as_str()) else {
                continue; // empty image skipped above
            };
            if sprites.contains_key(name) {
                log::warn!("duplicate sprite name \"{name}\" in atlas \"{atlas_name}\", ignoring");
                continue;
            }
            sprites.insert(name.clone(), *region);
        }

        Ok(PackedAtlas {
            name: atlas_name.to_string(),
            image: canvas,
            sprites,
        })
    }

    fn region(&self, px: PxRect) -> SpriteRegion {
        // One-texel inset against filter bleed; degenerate sprites (<= 2px on
        // an axis) keep their full extent.
        let ix = if px.w > 2 { 1 } else { 0 };
        let iy = if px.h > 2 { 1 } else { 0 };
        let fw = self.width as f32;
        let fh = self.height as f32;
        SpriteRegion {
            px,
            uv: UvRect {
                u0: (px.x + ix) as f32 / fw,
                v0: (px.y + iy) as f32 / fh,
                u1: (px.x + px.w - ix) as f32 / fw,
                v1: (px.y + px.h - iy) as f32 / fh,
            },
        }
    }
}

impl Default for AtlasPacker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, value: u8) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(w, h, Rgba([value, value, value, 255])))
    }

    fn packer_with(sprites: &[(&str, &str, u32, u32)]) -> AtlasPacker {
        let mut packer = AtlasPacker::with_size(256, 256);
        for (name, key, w, h) in sprites {
            packer.add_sprite(*name, SpriteSource::new(*key, solid(*w, *h, 128)));
        }
        packer
    }

    #[test]
    fn two_sprites_share_first_row() {
        let packer = packer_with(&[("a", "a.png", 64, 64), ("b", "b.png", 64, 64)]);
        let atlas = packer.build("Icons").unwrap();
        let a = atlas.sprite("a").unwrap().px;
        let b = atlas.sprite("b").unwrap().px;
        assert_eq!(a, PxRect { x: 2, y: 2, w: 64, h: 64 });
        assert_eq!(b, PxRect { x: 68, y: 2, w: 64, h: 64 });
    }

    #[test]
    fn larger_area_packs_first() {
        // Insertion order small-then-large; placement must be large-then-small.
        let packer = packer_with(&[("small", "s.png", 16, 16), ("large", "l.png", 64, 64)]);
        let atlas = packer.build("Icons").unwrap();
        assert_eq!(atlas.sprite("large").unwrap().px.x, 2);
        assert_eq!(atlas.sprite("small").unwrap().px.x, 68);
    }

    #[test]
    fn row_breaks_at_right_edge() {
        let mut packer = AtlasPacker::with_size(100, 256);
        for (name, key) in [("a", "a.png"), ("b", "b.png"), ("c", "c.png")] {
            packer.add_sprite(name, SpriteSource::new(key, solid(40, 20, 1)));
        }
        let atlas = packer.build("Icons").unwrap();
        // 2+40+2+40+2 = 86 <= 100, third sprite would end at 128 > 100.
        assert_eq!(atlas.sprite("a").unwrap().px.y, 2);
        assert_eq!(atlas.sprite("b").unwrap().px.y, 2);
        let c = atlas.sprite("c").unwrap().px;
        assert_eq!(c.x, 2);
        assert_eq!(c.y, 24); // 2 + row height 20 + margin 2
    }

    #[test]
    fn capacity_exceeded_on_height_overflow() {
        let packer = {
            let mut p = AtlasPacker::with_size(64, 64);
            p.add_sprite("a", SpriteSource::new("a.png", solid(60, 30, 1)));
            p.add_sprite("b", SpriteSource::new("b.png", solid(60, 30, 1)));
            p
        };
        let err = packer.build("Tiny").unwrap_err();
        assert!(matches!(err, SkinError::CapacityExceeded { .. }));
    }

    #[test]
    fn sprite_wider_than_atlas_fails() {
        let mut packer = AtlasPacker::with_size(64, 256);
        packer.add_sprite("wide", SpriteSource::new("w.png", solid(100, 8, 1)));
        assert!(matches!(
            packer.build("Tiny"),
            Err(SkinError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn duplicate_key_packs_once() {
        let img = solid(32, 32, 7);
        let mut packer = AtlasPacker::with_size(256, 256);
        packer.add_sprite("first", SpriteSource::new("shared.png", Arc::clone(&img)));
        packer.add_sprite("second", SpriteSource::new("shared.png", Arc::clone(&img)));
        packer.add_sprite("other", SpriteSource::new("other.png", solid(32, 32, 9)));
        let atlas = packer.build("Icons").unwrap();
        assert_eq!(atlas.sprite("first"), atlas.sprite("second"));
        // Only two placements: shared + other.
        assert_ne!(atlas.sprite("first").unwrap().px, atlas.sprite("other").unwrap().px);
        assert_eq!(atlas.len(), 3);
    }

    #[test]
    fn duplicate_name_first_definition_wins() {
        let mut packer = AtlasPacker::with_size(256, 256);
        packer.add_sprite("icon", SpriteSource::new("a.png", solid(64, 64, 1)));
        packer.add_sprite("icon", SpriteSource::new("b.png", solid(16, 16, 2)));
        let atlas = packer.build("Icons").unwrap();
        // a.png is larger, so it packs at the row start; "icon" refers to it.
        assert_eq!(atlas.sprite("icon").unwrap().px.w, 64);
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn uv_inset_stays_inside_pixel_rect() {
        let packer = packer_with(&[("a", "a.png", 64, 48)]);
        let atlas = packer.build("Icons").unwrap();
        let r = atlas.sprite("a").unwrap();
        let fw = 256.0;
        let fh = 256.0;
        assert!(r.uv.u0 > r.px.x as f32 / fw);
        assert!(r.uv.v0 > r.px.y as f32 / fh);
        assert!(r.uv.u1 < (r.px.x + r.px.w) as f32 / fw);
        assert!(r.uv.v1 < (r.px.y + r.px.h) as f32 / fh);
        assert!(r.uv.u0 < r.uv.u1);
        assert!(r.uv.v0 < r.uv.v1);
    }

    #[test]
    fn pixels_are_copied_into_place() {
        let packer = packer_with(&[("a", "a.png", 8, 8)]);
        let atlas = packer.build("Icons").unwrap();
        let px = atlas.sprite("a").unwrap().px;
        assert_eq!(atlas.image.get_pixel(px.x, px.y), &Rgba([128, 128, 128, 255]));
        // Outside the placement the canvas is still clear.
        assert_eq!(atlas.image.get_pixel(200, 200), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn empty_image_is_skipped() {
        let mut packer = AtlasPacker::with_size(64, 64);
        packer.add_sprite("ghost", SpriteSource::new("g.png", solid(0, 0, 1)));
        packer.add_sprite("real", SpriteSource::new("r.png", solid(8, 8, 1)));
        let atlas = packer.build("Icons").unwrap();
        assert!(atlas.sprite("ghost").is_none());
        assert!(atlas.sprite("real").is_some());
    }

    #[test]
    fn empty_packer_builds_empty_atlas() {
        let packer = AtlasPacker::with_size(64, 64);
        let atlas = packer.build("Empty").unwrap();
        assert!(atlas.is_empty());
        assert_eq!(atlas.name, "Empty");
    }

    /// True when the two sprites are closer than the packing margin on both
    /// axes (each rect padded by the margin on its trailing edges).
    fn overlaps(a: PxRect, b: PxRect) -> bool {
        let ax1 = a.x + a.w + MARGIN;
        let ay1 = a.y + a.h + MARGIN;
        let bx1 = b.x + b.w + MARGIN;
        let by1 = b.y + b.h + MARGIN;
        a.x < bx1 && b.x < ax1 && a.y < by1 && b.y < ay1
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn packing_is_deterministic(
                dims in proptest::collection::vec((1u32..48, 1u32..48), 1..20)
            ) {
                let build = || {
                    let mut packer = AtlasPacker::with_size(256, 256);
                    for (i, (w, h)) in dims.iter().enumerate() {
                        packer.add_sprite(
                            format!("s{i}"),
                            SpriteSource::new(format!("s{i}.png"), solid(*w, *h, 1)),
                        );
                    }
                    packer.build("P")
                };
                match (build(), build()) {
                    (Ok(a), Ok(b)) => {
                        for (name, region) in a.sprites() {
                            prop_assert_eq!(Some(region), b.sprite(name));
                        }
                    },
                    (Err(_), Err(_)) => {},
                    _ => prop_assert!(false, "one build failed, the other did not"),
                }
            }

            #[test]
            fn packed_sprites_never_overlap(
                dims in proptest::collection::vec((1u32..48, 1u32..48), 1..20)
            ) {
                let mut packer = AtlasPacker::with_size(256, 256);
                for (i, (w, h)) in dims.iter().enumerate() {
                    packer.add_sprite(
                        format!("s{i}"),
                        SpriteSource::new(format!("s{i}.png"), solid(*w, *h, 1)),
                    );
                }
                if let Ok(atlas) = packer.build("P") {
                    let rects: Vec<PxRect> = atlas.sprites().map(|(_, r)| r.px).collect();
                    for (i, a) in rects.iter().enumerate() {
                        prop_assert!(a.x + a.w <= 256 && a.y + a.h <= 256);
                        for b in &rects[i + 1..] {
                            prop_assert!(!overlaps(*a, *b), "overlap: {a:?} vs {b:?}");
                        }
                    }
                }
            }
        }
    }
}
