//! Typed property values and the semantic type vocabulary.

use std::sync::Arc;

use veneer_atlas::PackedAtlas;
use veneer_types::{Color32, Colorf, Rect, RectOffset, Vec2, Vec3, Vec4};

/// The closed set of host enum families a property can be declared as.
///
/// Flag-style families combine `|`-delimited members with bitwise OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    TextAlign,
    Pivot,
    SpriteMode,
    Anchor,
}

impl EnumKind {
    /// Whether members of this family combine as bit flags.
    pub fn is_flags(self) -> bool {
        matches!(self, Self::Anchor)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TextAlign => "TextAlign",
            Self::Pivot => "Pivot",
            Self::SpriteMode => "SpriteMode",
            Self::Anchor => "Anchor",
        }
    }

    /// Symbolic members and their numeric values.
    pub fn members(self) -> &'static [(&'static str, i64)] {
        match self {
            Self::TextAlign => &[("Left", 0), ("Center", 1), ("Right", 2)],
            Self::Pivot => &[
                ("TopLeft", 0),
                ("TopCenter", 1),
                ("TopRight", 2),
                ("MiddleLeft", 3),
                ("Center", 4),
                ("MiddleRight", 5),
                ("BottomLeft", 6),
                ("BottomCenter", 7),
                ("BottomRight", 8),
            ],
            Self::SpriteMode => &[("Stretch", 0), ("Scale", 1), ("Tile", 2), ("Fill", 3)],
            Self::Anchor => &[
                ("Top", 1),
                ("Bottom", 2),
                ("Left", 4),
                ("Right", 8),
                ("CenterHorizontal", 16),
                ("CenterVertical", 32),
                ("All", 15),
            ],
        }
    }

    /// Resolve one symbolic member name.
    pub fn parse_member(self, name: &str) -> Option<i64> {
        self.members()
            .iter()
            .find(|(member, _)| *member == name)
            .map(|(_, value)| *value)
    }
}

/// Declared semantic type of a component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Int,
    UInt,
    Float,
    Double,
    Bool,
    String,
    Vec2,
    Vec3,
    Vec4,
    Rect,
    RectOffset,
    Colorf,
    Color32,
    Atlas,
    Enum(EnumKind),
}

impl PropKind {
    /// Human-readable type name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Vec2 => "Vector2",
            Self::Vec3 => "Vector3",
            Self::Vec4 => "Vector4",
            Self::Rect => "Rect",
            Self::RectOffset => "RectOffset",
            Self::Colorf => "Color",
            Self::Color32 => "Color32",
            Self::Atlas => "TextureAtlas",
            Self::Enum(kind) => kind.name(),
        }
    }
}

/// A concrete runtime property value.
///
/// `Atlas` holds an optional shared handle: components start with no atlas
/// assigned, and rollback must be able to restore that state.
#[derive(Debug, Clone)]
pub enum PropValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Rect(Rect),
    RectOffset(RectOffset),
    Colorf(Colorf),
    Color32(Color32),
    Atlas(Option<Arc<PackedAtlas>>),
    Enum { kind: EnumKind, bits: i64 },
}

impl PropValue {
    /// The declared kind this value inhabits.
    pub fn kind(&self) -> PropKind {
        match self {
            Self::Int(_) => PropKind::Int,
            Self::UInt(_) => PropKind::UInt,
            Self::Float(_) => PropKind::Float,
            Self::Double(_) => PropKind::Double,
            Self::Bool(_) => PropKind::Bool,
            Self::String(_) => PropKind::String,
            Self::Vec2(_) => PropKind::Vec2,
            Self::Vec3(_) => PropKind::Vec3,
            Self::Vec4(_) => PropKind::Vec4,
            Self::Rect(_) => PropKind::Rect,
            Self::RectOffset(_) => PropKind::RectOffset,
            Self::Colorf(_) => PropKind::Colorf,
            Self::Color32(_) => PropKind::Color32,
            Self::Atlas(_) => PropKind::Atlas,
            Self::Enum { kind, .. } => PropKind::Enum(*kind),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Vec2(a), Self::Vec2(b)) => a == b,
            (Self::Vec3(a), Self::Vec3(b)) => a == b,
            (Self::Vec4(a), Self::Vec4(b)) => a == b,
            (Self::Rect(a), Self::Rect(b)) => a == b,
            (Self::RectOffset(a), Self::RectOffset(b)) => a == b,
            (Self::Colorf(a), Self::Colorf(b)) => a == b,
            (Self::Color32(a), Self::Color32(b)) => a == b,
            // Atlas handles compare by identity: a rebuilt atlas is a new
            // texture even when it carries the same name.
            (Self::Atlas(a), Self::Atlas(b)) => match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (
                Self::Enum { kind: ka, bits: ba },
                Self::Enum { kind: kb, bits: bb },
            ) => ka == kb && ba == bb,
            _ => false,
        }
    }
}
