//! Error taxonomy for the veneer engine.
//!
//! Every error raised while walking a skin document carries a `node` string:
//! the rendered path of the offending document node (for example
//! `UIView/Component[name="Button"]/color`), so diagnostics can point at the
//! exact declaration without holding a borrow of the document.

use std::io;

/// Errors produced by the veneer framework.
#[derive(Debug, thiserror::Error)]
pub enum SkinError {
    /// Structurally invalid document: missing root, duplicate names, unknown
    /// module class, bad attribute syntax.
    #[error("parse error at {node}: {msg}")]
    Parse { msg: String, node: String },

    /// A literal could not be coerced to the target property type.
    #[error("malformed value at {node}: {msg}")]
    MalformedValue { msg: String, node: String },

    /// No coercion rule exists for the target property type.
    #[error("unsupported type \"{kind}\" at {node}")]
    UnsupportedType { kind: String, node: String },

    /// A required attribute is absent.
    #[error("missing attribute \"{attribute}\" at {node}")]
    MissingAttribute { attribute: String, node: String },

    /// A required attribute is present but empty.
    #[error("missing value for attribute \"{attribute}\" at {node}")]
    MissingAttributeValue { attribute: String, node: String },

    /// A non-optional selector matched nothing at the top level.
    #[error("no component \"{name}\" under \"{parent}\" at {node}")]
    ComponentNotFound {
        name: String,
        parent: String,
        node: String,
    },

    /// An assignment targets a property the component does not have (or one
    /// that is not writable).
    #[error("missing property \"{property}\" on component \"{component}\" at {node}")]
    MissingProperty {
        property: String,
        component: String,
        node: String,
    },

    /// A symbolic atlas reference did not resolve.
    #[error("unknown atlas \"{name}\" at {node}")]
    UnknownAtlas { name: String, node: String },

    /// A symbolic color reference did not resolve.
    #[error("unknown color \"{name}\" at {node}")]
    UnknownColor { name: String, node: String },

    /// A multi-state sprite index is outside the component's state array.
    #[error("sprite state index {index} out of range (component has {len} states) at {node}")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        node: String,
    },

    /// Shelf packing overflowed the atlas height; some sprites must move to
    /// another atlas.
    #[error("atlas \"{atlas}\" capacity exceeded: row at y={row_y} needs {needed}px of {height}px")]
    CapacityExceeded {
        atlas: String,
        row_y: u32,
        needed: u32,
        height: u32,
    },

    /// A skin resource (module file, sprite image) could not be read or
    /// decoded.
    #[error("resource error: {0}")]
    Resource(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkinError>;

impl SkinError {
    /// Shorthand for a [`SkinError::Parse`] with formatted context.
    pub fn parse(msg: impl Into<String>, node: impl Into<String>) -> Self {
        Self::Parse {
            msg: msg.into(),
            node: node.into(),
        }
    }

    /// Shorthand for a [`SkinError::MalformedValue`].
    pub fn malformed(msg: impl Into<String>, node: impl Into<String>) -> Self {
        Self::MalformedValue {
            msg: msg.into(),
            node: node.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let e = SkinError::parse("missing root UIView node", "menu.xml");
        assert_eq!(
            format!("{e}"),
            "parse error at menu.xml: missing root UIView node"
        );
    }

    #[test]
    fn malformed_value_display() {
        let e = SkinError::malformed(
            "Vector2 definition must have two components",
            "UIView/Component[name=\"Panel\"]/size",
        );
        let msg = format!("{e}");
        assert!(msg.contains("two components"));
        assert!(msg.contains("Panel"));
    }

    #[test]
    fn component_not_found_display() {
        let e = SkinError::ComponentNotFound {
            name: "TSBar".into(),
            parent: "(root)".into(),
            node: "UIView/Component[name=\"TSBar\"]".into(),
        };
        assert!(format!("{e}").contains("no component \"TSBar\""));
    }

    #[test]
    fn missing_property_display() {
        let e = SkinError::MissingProperty {
            property: "bgcolor".into(),
            component: "MainPanel".into(),
            node: "n".into(),
        };
        assert!(format!("{e}").contains("\"bgcolor\""));
        assert!(format!("{e}").contains("\"MainPanel\""));
    }

    #[test]
    fn capacity_exceeded_display() {
        let e = SkinError::CapacityExceeded {
            atlas: "Icons".into(),
            row_y: 2000,
            needed: 64,
            height: 2048,
        };
        let msg = format!("{e}");
        assert!(msg.contains("Icons"));
        assert!(msg.contains("2048"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: SkinError = io_err.into();
        assert!(format!("{e}").contains("gone"));
    }

    #[test]
    fn result_alias() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok.unwrap(), 7);
        let err: Result<u32> = Err(SkinError::Resource("nope".into()));
        assert!(err.is_err());
    }
}
