//! Per-class property capability registry.
//!
//! For every widget class this maps property names to a declared kind plus
//! getter/setter accessors over [`Component`]. The table is built once with
//! [`PropertyRegistry::standard`] and injected into the skin engine; there
//! is no runtime type inspection and no global state.

use std::collections::HashMap;

use crate::tree::{Component, WidgetClass};
use crate::value::{EnumKind, PropKind, PropValue};

/// Read accessor: produce the property's current value.
pub type Getter = fn(&Component) -> PropValue;

/// Write accessor: returns `false` when the value's variant does not match
/// the declared kind (the coercion layer should make that impossible).
pub type Setter = fn(&mut Component, &PropValue) -> bool;

/// Declared type and accessors for one named property.
pub struct PropDescriptor {
    pub kind: PropKind,
    get: Getter,
    set: Option<Setter>,
}

impl PropDescriptor {
    pub fn value(&self, component: &Component) -> PropValue {
        (self.get)(component)
    }

    /// Write the property. `false` for read-only descriptors or a variant
    /// mismatch.
    pub fn assign(&self, component: &mut Component, value: &PropValue) -> bool {
        match self.set {
            Some(set) => set(component, value),
            None => false,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }
}

macro_rules! copy_prop {
    ($kind:expr, $field:ident, $variant:ident) => {
        PropDescriptor {
            kind: $kind,
            get: |c| PropValue::$variant(c.$field),
            set: Some(|c, v| match v {
                PropValue::$variant(x) => {
                    c.$field = *x;
                    true
                },
                _ => false,
            }),
        }
    };
}

macro_rules! string_prop {
    ($field:ident) => {
        PropDescriptor {
            kind: PropKind::String,
            get: |c| PropValue::String(c.$field.clone()),
            set: Some(|c, v| match v {
                PropValue::String(x) => {
                    c.$field.clone_from(x);
                    true
                },
                _ => false,
            }),
        }
    };
}

macro_rules! enum_prop {
    ($enum_kind:expr, $field:ident) => {
        PropDescriptor {
            kind: PropKind::Enum($enum_kind),
            get: |c| PropValue::Enum {
                kind: $enum_kind,
                bits: c.$field,
            },
            set: Some(|c, v| match v {
                PropValue::Enum { bits, .. } => {
                    c.$field = *bits;
                    true
                },
                _ => false,
            }),
        }
    };
}

fn common_props() -> Vec<(&'static str, PropDescriptor)> {
    vec![
        (
            "relative_position",
            copy_prop!(PropKind::Vec3, relative_position, Vec3),
        ),
        ("size", copy_prop!(PropKind::Vec2, size, Vec2)),
        (
            // Derived from position and size; the host computes it, skins
            // can only read it (and hash it).
            "area",
            PropDescriptor {
                kind: PropKind::Rect,
                get: |c| PropValue::Rect(c.area()),
                set: None,
            },
        ),
        ("color", copy_prop!(PropKind::Color32, color, Color32)),
        (
            "disabled_color",
            copy_prop!(PropKind::Color32, disabled_color, Color32),
        ),
        ("opacity", copy_prop!(PropKind::Float, opacity, Float)),
        ("visible", copy_prop!(PropKind::Bool, visible, Bool)),
        ("enabled", copy_prop!(PropKind::Bool, enabled, Bool)),
        ("z_order", copy_prop!(PropKind::Int, z_order, Int)),
        ("tooltip", string_prop!(tooltip)),
        ("anchor", enum_prop!(EnumKind::Anchor, anchor)),
        ("pivot", enum_prop!(EnumKind::Pivot, pivot)),
        (
            "clip_children",
            copy_prop!(PropKind::Bool, clip_children, Bool),
        ),
        (
            "atlas",
            PropDescriptor {
                kind: PropKind::Atlas,
                get: |c| PropValue::Atlas(c.atlas.clone()),
                set: Some(|c, v| match v {
                    PropValue::Atlas(x) => {
                        c.atlas.clone_from(x);
                        true
                    },
                    _ => false,
                }),
            },
        ),
    ]
}

fn text_props() -> Vec<(&'static str, PropDescriptor)> {
    vec![
        ("text", string_prop!(text)),
        ("text_color", copy_prop!(PropKind::Color32, text_color, Color32)),
        ("font_size", copy_prop!(PropKind::Int, font_size, Int)),
        (
            "text_alignment",
            enum_prop!(EnumKind::TextAlign, text_alignment),
        ),
        ("autosize", copy_prop!(PropKind::Bool, autosize, Bool)),
    ]
}

fn sprite_props() -> Vec<(&'static str, PropDescriptor)> {
    vec![
        ("background_sprite", string_prop!(background_sprite)),
        ("foreground_sprite", string_prop!(foreground_sprite)),
        (
            "sprite_mode",
            enum_prop!(EnumKind::SpriteMode, sprite_mode),
        ),
    ]
}

/// The full per-class property schema.
pub struct PropertyRegistry {
    classes: HashMap<WidgetClass, HashMap<&'static str, PropDescriptor>>,
}

impl PropertyRegistry {
    /// Build the standard host schema.
    pub fn standard() -> Self {
        let mut classes = HashMap::new();
        for class in [
            WidgetClass::Panel,
            WidgetClass::Button,
            WidgetClass::Label,
            WidgetClass::Sprite,
            WidgetClass::MultiStateButton,
        ] {
            let mut table: HashMap<&'static str, PropDescriptor> =
                common_props().into_iter().collect();
            match class {
                WidgetClass::Panel => {
                    table.extend(sprite_props());
                    table.insert(
                        "padding",
                        copy_prop!(PropKind::RectOffset, padding, RectOffset),
                    );
                    table.insert("autosize", copy_prop!(PropKind::Bool, autosize, Bool));
                },
                WidgetClass::Button | WidgetClass::MultiStateButton => {
                    table.extend(text_props());
                    table.extend(sprite_props());
                    table.insert(
                        "padding",
                        copy_prop!(PropKind::RectOffset, padding, RectOffset),
                    );
                },
                WidgetClass::Label => {
                    table.extend(text_props());
                    table.insert(
                        "padding",
                        copy_prop!(PropKind::RectOffset, padding, RectOffset),
                    );
                },
                WidgetClass::Sprite => {
                    table.extend(sprite_props());
                },
            }
            classes.insert(class, table);
        }
        Self { classes }
    }

    /// Look up the descriptor for `name` on `class`.
    pub fn descriptor(&self, class: WidgetClass, name: &str) -> Option<&PropDescriptor> {
        self.classes.get(&class)?.get(name)
    }
}
