//! Coercion of skin-document literals into typed property values.
//!
//! Pure functions: a target kind plus a text literal in, a [`PropValue`]
//! out. Color-name indirection is handled one level up in the engine; by the
//! time a literal reaches [`coerce`] it is already raw.

use std::collections::HashMap;
use std::sync::Arc;

use veneer_atlas::PackedAtlas;
use veneer_types::error::{Result, SkinError};
use veneer_types::{Color32, Colorf, Rect, RectOffset, Vec2, Vec3, Vec4};
use veneer_ui::value::{EnumKind, PropKind, PropValue};

/// The engine's loaded atlases, by name.
pub type AtlasRegistry = HashMap<String, Arc<PackedAtlas>>;

/// Coerce `text` into a value of `kind`.
///
/// Fails with `MalformedValue` when the literal cannot be parsed for the
/// kind (the message names the expected arity or format), `UnknownAtlas`
/// for unresolved atlas references, and `UnsupportedType` never -- every
/// kind in [`PropKind`] has a rule; the variant exists for hosts that
/// extend the registry with kinds the skin format cannot express.
pub fn coerce(
    kind: PropKind,
    text: &str,
    node: &str,
    atlases: &AtlasRegistry,
) -> Result<PropValue> {
    if text.is_empty() && kind != PropKind::String {
        return Err(SkinError::malformed(
            format!("empty value for type \"{}\" is not allowed", kind.name()),
            node,
        ));
    }

    match kind {
        PropKind::Int => text
            .trim()
            .parse::<i32>()
            .map(PropValue::Int)
            .map_err(|_| SkinError::malformed("incorrect format for integer value", node)),
        PropKind::UInt => text
            .trim()
            .parse::<u32>()
            .map(PropValue::UInt)
            .map_err(|_| SkinError::malformed("incorrect format for unsigned integer value", node)),
        PropKind::Float => text
            .trim()
            .parse::<f32>()
            .map(PropValue::Float)
            .map_err(|_| SkinError::malformed("incorrect format for float value", node)),
        PropKind::Double => text
            .trim()
            .parse::<f64>()
            .map(PropValue::Double)
            .map_err(|_| SkinError::malformed("incorrect format for double value", node)),
        PropKind::Bool => match text.trim() {
            "true" | "1" => Ok(PropValue::Bool(true)),
            "false" | "0" => Ok(PropValue::Bool(false)),
            _ => Err(SkinError::malformed("incorrect format for boolean value", node)),
        },
        PropKind::String => Ok(PropValue::String(text.to_string())),
        PropKind::Vec2 => {
            let v = floats(text, node, "Vector2 definition must have two components", 2, 2)?;
            Ok(PropValue::Vec2(Vec2::new(v[0], v[1])))
        },
        PropKind::Vec3 => {
            // Two components are accepted; z defaults to zero.
            let v = floats(
                text,
                node,
                "Vector3 definition must have two or three components",
                2,
                3,
            )?;
            let z = v.get(2).copied().unwrap_or(0.0);
            Ok(PropValue::Vec3(Vec3::new(v[0], v[1], z)))
        },
        PropKind::Vec4 => {
            let v = floats(text, node, "Vector4 definition must have four components", 4, 4)?;
            Ok(PropValue::Vec4(Vec4::new(v[0], v[1], v[2], v[3])))
        },
        PropKind::Rect => Ok(PropValue::Rect(parse_rect_literal(text, node)?)),
        PropKind::RectOffset => {
            let parts = split_components(text, node, "RectOffset definition must have four components", 4, 4)?;
            let mut ints = [0i32; 4];
            for (slot, raw) in ints.iter_mut().zip(&parts) {
                *slot = raw.parse().map_err(|_| {
                    SkinError::malformed("RectOffset can contain only integer values", node)
                })?;
            }
            Ok(PropValue::RectOffset(RectOffset::new(
                ints[0], ints[1], ints[2], ints[3],
            )))
        },
        PropKind::Colorf => {
            let v = floats(text, node, "Color definition must have four components", 4, 4)?;
            Ok(PropValue::Colorf(Colorf::new(v[0], v[1], v[2], v[3])))
        },
        PropKind::Color32 => Ok(PropValue::Color32(parse_color32_literal(text, node)?)),
        PropKind::Atlas => {
            let name = text.trim();
            match atlases.get(name) {
                Some(atlas) => Ok(PropValue::Atlas(Some(Arc::clone(atlas)))),
                None => Err(SkinError::UnknownAtlas {
                    name: name.to_string(),
                    node: node.to_string(),
                }),
            }
        },
        PropKind::Enum(enum_kind) => coerce_enum(enum_kind, text, node),
    }
}

fn coerce_enum(kind: EnumKind, text: &str, node: &str) -> Result<PropValue> {
    let member = |name: &str| {
        kind.parse_member(name).ok_or_else(|| {
            SkinError::malformed(
                format!("invalid value \"{name}\" for enum \"{}\"", kind.name()),
                node,
            )
        })
    };

    let bits = if kind.is_flags() && text.contains('|') {
        let mut bits = 0i64;
        for part in text.split('|') {
            bits |= member(part.trim())?;
        }
        bits
    } else {
        member(text.trim())?
    };

    Ok(PropValue::Enum { kind, bits })
}

/// Parse a color literal: `#RRGGBB` hex (opaque) or a 4-component decimal
/// byte list.
pub fn parse_color32_literal(text: &str, node: &str) -> Result<Color32> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SkinError::malformed("empty value for type \"Color32\" is not allowed", node));
    }
    if text.starts_with('#') {
        return Color32::from_hex(text).ok_or_else(|| {
            SkinError::malformed(format!("\"{text}\" is not a valid #RRGGBB color"), node)
        });
    }
    let parts = split_components(text, node, "Color32 definition must have four components", 4, 4)?;
    let mut bytes = [0u8; 4];
    for (slot, raw) in bytes.iter_mut().zip(&parts) {
        *slot = raw
            .parse()
            .map_err(|_| SkinError::malformed("Color32 can contain only byte values", node))?;
    }
    Ok(Color32::rgba(bytes[0], bytes[1], bytes[2], bytes[3]))
}

/// Parse a 4-component `x,y,w,h` rectangle literal.
pub fn parse_rect_literal(text: &str, node: &str) -> Result<Rect> {
    let v = floats(text, node, "Rect definition must have four components", 4, 4)?;
    Ok(Rect::new(v[0], v[1], v[2], v[3]))
}

fn split_components(
    text: &str,
    node: &str,
    arity_msg: &str,
    min: usize,
    max: usize,
) -> Result<Vec<String>> {
    let parts: Vec<String> = text.split(',').map(|p| p.trim().to_string()).collect();
    if parts.len() < min || parts.len() > max {
        return Err(SkinError::malformed(arity_msg, node));
    }
    Ok(parts)
}

fn floats(text: &str, node: &str, arity_msg: &str, min: usize, max: usize) -> Result<Vec<f32>> {
    let parts = split_components(text, node, arity_msg, min, max)?;
    let mut out = Vec::with_capacity(parts.len());
    for part in &parts {
        out.push(part.parse::<f32>().map_err(|_| {
            SkinError::malformed(format!("\"{part}\" is not a valid number"), node)
        })?);
    }
    Ok(out)
}
