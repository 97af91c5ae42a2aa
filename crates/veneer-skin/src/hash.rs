//! Structural hashing of component rectangles.
//!
//! Skins can target "whatever component currently sits at this rect" when
//! host-generated names are unstable across versions. The digest is
//! collision-tolerant on purpose: components sharing all four truncated
//! dimensions hash alike, which is exactly the granularity a rect selector
//! wants. It is a selector filter, not an identity key.

use veneer_types::Rect;

const SEED: u64 = 18_021_301;

/// One distinct prime per rect field.
const FIELD_PRIMES: [u64; 4] = [8_100_529, 12_474_907, 15_485_039, 21_768_739];

/// 64-bit digest of a rectangle's truncated fields.
pub fn hash_rect(rect: Rect) -> u64 {
    let mut state = SEED;
    for (value, prime) in [rect.x, rect.y, rect.w, rect.h].into_iter().zip(FIELD_PRIMES) {
        state ^= (value as i64 as u64).wrapping_mul(prime);
    }
    state
}

/// Fixed-width uppercase hex rendering, for comparison against skin-document
/// hash literals.
pub fn hash_hex(hash: u64) -> String {
    format!("{hash:016X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_rects_hash_equal() {
        let a = Rect::new(10.0, 20.0, 300.0, 40.0);
        let b = Rect::new(10.0, 20.0, 300.0, 40.0);
        assert_eq!(hash_rect(a), hash_rect(b));
    }

    #[test]
    fn fields_are_position_sensitive() {
        // Same component values in different fields must not collide: each
        // field multiplies a distinct prime.
        let a = Rect::new(100.0, 0.0, 0.0, 0.0);
        let b = Rect::new(0.0, 100.0, 0.0, 0.0);
        let c = Rect::new(0.0, 0.0, 100.0, 0.0);
        let d = Rect::new(0.0, 0.0, 0.0, 100.0);
        let hashes = [hash_rect(a), hash_rect(b), hash_rect(c), hash_rect(d)];
        for i in 0..hashes.len() {
            for j in i + 1..hashes.len() {
                assert_ne!(hashes[i], hashes[j], "field {i} vs {j}");
            }
        }
    }

    #[test]
    fn fractional_parts_are_ignored() {
        let a = Rect::new(10.9, 20.1, 300.5, 40.7);
        let b = Rect::new(10.0, 20.0, 300.0, 40.0);
        assert_eq!(hash_rect(a), hash_rect(b));
    }

    #[test]
    fn negative_coordinates_hash() {
        let a = Rect::new(-10.0, -20.0, 300.0, 40.0);
        let b = Rect::new(10.0, 20.0, 300.0, 40.0);
        assert_ne!(hash_rect(a), hash_rect(b));
    }

    #[test]
    fn hex_is_fixed_width_uppercase() {
        let h = hash_hex(hash_rect(Rect::new(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, h.to_uppercase());
        // Small values pad on the left.
        assert_eq!(hash_hex(0xAB), "00000000000000AB");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn hash_is_deterministic(
                x in -10_000i32..10_000,
                y in -10_000i32..10_000,
                w in 0i32..10_000,
                h in 0i32..10_000,
            ) {
                let rect = Rect::new(x as f32, y as f32, w as f32, h as f32);
                prop_assert_eq!(hash_rect(rect), hash_rect(rect));
                prop_assert_eq!(hash_hex(hash_rect(rect)).len(), 16);
            }

            #[test]
            fn truncation_invariance(
                x in -1_000i32..1_000,
                frac in 0.0f32..0.99,
            ) {
                // Adding a sub-integer fraction (away from the integer
                // boundary for negatives) never changes the digest.
                let base = Rect::new(x as f32, 0.0, 10.0, 10.0);
                let nudged = Rect::new(x as f32 + if x < 0 { -frac } else { frac }, 0.0, 10.0, 10.0);
                prop_assert_eq!(hash_rect(base), hash_rect(nudged));
            }
        }
    }
}
