//! Skin document model.
//!
//! `quick-xml` events are folded into a small owned DOM ([`XmlNode`]), which
//! is then validated into the typed skin model. The DOM keeps a rendered
//! path per node (`menu.xml:/UIView/Component[name="Panel"]/color`) so every
//! later error can point at the exact declaration; nothing else of the XML
//! layer survives validation.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use veneer_types::error::{Result, SkinError};
use veneer_types::{Color32, Rect};
use veneer_ui::tree::{SpriteLayer, SpriteSet};

use crate::values::{parse_color32_literal, parse_rect_literal};

/// Join a skin-relative path onto a directory prefix.
pub(crate) fn join_path(dir: &str, rel: &str) -> String {
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{rel}", dir.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Owned DOM
// ---------------------------------------------------------------------------

/// One element of a parsed skin document.
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub tag: String,
    attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
    path: String,
}

impl XmlNode {
    /// Parse an XML string into its root element. `source` names the file
    /// for diagnostics.
    pub fn parse_str(xml: &str, source: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let node = Self::open(&e, stack.last(), source)?;
                    stack.push(node);
                },
                Ok(Event::Empty(e)) => {
                    let node = Self::open(&e, stack.last(), source)?;
                    Self::close(node, &mut stack, &mut root, source)?;
                },
                Ok(Event::End(_)) => {
                    let Some(node) = stack.pop() else {
                        return Err(SkinError::parse("unexpected closing tag", source));
                    };
                    Self::close(node, &mut stack, &mut root, source)?;
                },
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| SkinError::parse(format!("bad text content: {e}"), source))?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(text.trim());
                    }
                },
                Ok(Event::CData(t)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text
                            .push_str(String::from_utf8_lossy(&t.into_inner()).trim());
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {}, // declaration, comments, processing instructions
                Err(e) => {
                    return Err(SkinError::parse(format!("XML error: {e}"), source));
                },
            }
        }

        if let Some(unclosed) = stack.last() {
            return Err(SkinError::parse(
                format!("unclosed element <{}>", unclosed.tag),
                source,
            ));
        }
        root.ok_or_else(|| SkinError::parse("document has no root element", source))
    }

    fn open(start: &BytesStart<'_>, parent: Option<&XmlNode>, source: &str) -> Result<Self> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr
                .map_err(|e| SkinError::parse(format!("bad attribute in <{tag}>: {e}"), source))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| SkinError::parse(format!("bad attribute in <{tag}>: {e}"), source))?
                .into_owned();
            attrs.push((key, value));
        }

        let label = match attrs.iter().find(|(k, _)| k == "name") {
            Some((_, name)) => format!("{tag}[name=\"{name}\"]"),
            None => tag.clone(),
        };
        let path = match parent {
            Some(p) => format!("{}/{label}", p.path),
            None => format!("{source}:/{label}"),
        };

        Ok(Self {
            tag,
            attrs,
            text: String::new(),
            children: Vec::new(),
            path,
        })
    }

    fn close(
        node: XmlNode,
        stack: &mut Vec<XmlNode>,
        root: &mut Option<XmlNode>,
        source: &str,
    ) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                if root.is_some() {
                    return Err(SkinError::parse("multiple root elements", source));
                }
                *root = Some(node);
            },
        }
        Ok(())
    }

    /// Rendered location of this node, for diagnostics.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// An attribute's value, if present and non-empty.
    pub fn attr_opt(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// A required attribute: absent fails with `MissingAttribute`, empty
    /// with `MissingAttributeValue`.
    pub fn attr(&self, name: &str) -> Result<&str> {
        match self.attrs.iter().find(|(k, _)| k == name) {
            Some((_, v)) if !v.is_empty() => Ok(v),
            Some(_) => Err(SkinError::MissingAttributeValue {
                attribute: name.to_string(),
                node: self.path.clone(),
            }),
            None => Err(SkinError::MissingAttribute {
                attribute: name.to_string(),
                node: self.path.clone(),
            }),
        }
    }

    /// An optional boolean attribute; absent reads as `false`, anything but
    /// `true`/`false` is a parse error.
    pub fn bool_attr(&self, name: &str) -> Result<bool> {
        match self.attr_opt(name) {
            None => Ok(false),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(SkinError::parse(
                format!("\"{other}\" is not a valid value for boolean attribute \"{name}\""),
                &self.path,
            )),
        }
    }

    /// A required unsigned integer attribute.
    pub fn usize_attr(&self, name: &str) -> Result<usize> {
        let raw = self.attr(name)?;
        raw.parse().map_err(|_| {
            SkinError::parse(
                format!("\"{raw}\" is not a valid value for integer attribute \"{name}\""),
                &self.path,
            )
        })
    }

    /// First child element with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All child elements with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

// ---------------------------------------------------------------------------
// Typed skin model
// ---------------------------------------------------------------------------

/// Application mode a module is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleClass {
    MainMenu,
    InGame,
    MapEditor,
    AssetEditor,
}

impl ModuleClass {
    pub const ALL: [Self; 4] = [Self::MainMenu, Self::InGame, Self::MapEditor, Self::AssetEditor];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainMenu => "MainMenu",
            Self::InGame => "InGame",
            Self::MapEditor => "MapEditor",
            Self::AssetEditor => "AssetEditor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MainMenu" => Some(Self::MainMenu),
            "InGame" => Some(Self::InGame),
            "MapEditor" => Some(Self::MapEditor),
            "AssetEditor" => Some(Self::AssetEditor),
            _ => None,
        }
    }
}

/// Screen aspect buckets assignments can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    R16x9,
    R16x10,
    R4x3,
    R21x9,
}

impl AspectRatio {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "16:9" => Some(Self::R16x9),
            "16:10" => Some(Self::R16x10),
            "4:3" => Some(Self::R4x3),
            "21:9" => Some(Self::R21x9),
            _ => None,
        }
    }

    /// Bucket an actual render size. Anything unrecognized lands in the
    /// dominant 16:9 bucket.
    pub fn from_render_size(width: f32, height: f32) -> Self {
        let aspect = width / height;
        let close = |target: f32| (aspect - target).abs() < 0.05;
        if close(16.0 / 10.0) {
            Self::R16x10
        } else if close(4.0 / 3.0) {
            Self::R4x3
        } else if close(21.0 / 9.0) {
            Self::R21x9
        } else {
            Self::R16x9
        }
    }
}

/// Aspect gate on an assignment: `Any` applies everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectFilter {
    Any,
    Only(AspectRatio),
}

impl AspectFilter {
    pub fn allows(self, current: AspectRatio) -> bool {
        match self {
            Self::Any => true,
            Self::Only(ratio) => ratio == current,
        }
    }
}

/// One sprite entry of an atlas block: sprite name plus source image path.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDef {
    pub name: String,
    pub path: String,
    pub node: String,
}

/// A named `SpriteAtlas` block.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasDef {
    pub name: String,
    pub sprites: Vec<SpriteDef>,
    pub node: String,
}

/// Reference to a module file, tagged with its class.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRef {
    pub class: ModuleClass,
    pub path: String,
}

/// The validated `skin.xml` model.
#[derive(Debug, Clone)]
pub struct SkinDocument {
    pub name: String,
    pub author: String,
    pub colors: std::collections::HashMap<String, Color32>,
    pub atlases: Vec<AtlasDef>,
    pub modules: Vec<ModuleRef>,
    pub render_area: Option<Rect>,
}

impl SkinDocument {
    pub fn from_xml(root: &XmlNode) -> Result<Self> {
        if root.tag != "VeneerSkin" {
            return Err(SkinError::parse(
                "skin missing root VeneerSkin node",
                root.path(),
            ));
        }
        let name = root.attr("name")?.to_string();
        let author = root.attr("author")?.to_string();

        let mut colors = std::collections::HashMap::new();
        if let Some(block) = root.child("Colors") {
            for node in block.children_named("Color") {
                let color_name = node.attr("name")?;
                if node.text.is_empty() {
                    return Err(SkinError::parse(
                        format!("empty value for color \"{color_name}\""),
                        node.path(),
                    ));
                }
                if colors.contains_key(color_name) {
                    log::warn!("duplicate color name \"{color_name}\", ignoring second definition");
                    continue;
                }
                let color = parse_color32_literal(&node.text, node.path())?;
                colors.insert(color_name.to_string(), color);
            }
        }

        let mut atlases: Vec<AtlasDef> = Vec::new();
        for node in root.children_named("SpriteAtlas") {
            let atlas_name = node.attr("name")?;
            if atlases.iter().any(|a| a.name == atlas_name) {
                return Err(SkinError::parse(
                    format!("duplicate atlas name \"{atlas_name}\""),
                    node.path(),
                ));
            }
            let mut sprites = Vec::new();
            for sprite in node.children_named("Sprite") {
                let sprite_name = sprite.attr("name")?;
                if sprite.text.is_empty() {
                    return Err(SkinError::parse(
                        format!("sprite \"{sprite_name}\" has no source path"),
                        sprite.path(),
                    ));
                }
                sprites.push(SpriteDef {
                    name: sprite_name.to_string(),
                    path: sprite.text.clone(),
                    node: sprite.path().to_string(),
                });
            }
            atlases.push(AtlasDef {
                name: atlas_name.to_string(),
                sprites,
                node: node.path().to_string(),
            });
        }

        let mut modules = Vec::new();
        for node in root.children_named("Module") {
            let class_name = node.attr("class")?;
            let Some(class) = ModuleClass::parse(class_name) else {
                return Err(SkinError::parse(
                    format!("invalid module class \"{class_name}\""),
                    node.path(),
                ));
            };
            if node.text.is_empty() {
                return Err(SkinError::parse("module has no file path", node.path()));
            }
            modules.push(ModuleRef {
                class,
                path: node.text.clone(),
            });
        }

        let render_area = match root.child("Settings").and_then(|s| s.child("render_area")) {
            Some(node) => Some(parse_rect_literal(&node.text, node.path())?),
            None => None,
        };

        Ok(Self {
            name,
            author,
            colors,
            atlases,
            modules,
            render_area,
        })
    }
}

// ---------------------------------------------------------------------------
// Module documents
// ---------------------------------------------------------------------------

/// A component selector: which live components the nested declarations
/// target.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorNode {
    pub name: String,
    pub regex: bool,
    pub recursive: bool,
    pub optional: bool,
    pub hash: Option<String>,
    pub children: Vec<ModuleItem>,
    pub node: String,
}

/// A property assignment leaf: tag name is the property, text the literal.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentNode {
    pub property: String,
    pub value: String,
    pub raw: bool,
    pub sticky: bool,
    pub optional: bool,
    pub aspect: AspectFilter,
    pub node: String,
}

/// One state slot of a `SpriteState` block.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteStateEntry {
    pub state: String,
    pub sprite: String,
    pub node: String,
}

/// A multi-state sprite declaration addressing one indexed slot of a
/// multi-state button's sprite array.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteStateNode {
    pub index: usize,
    pub layer: SpriteLayer,
    pub entries: Vec<SpriteStateEntry>,
    pub node: String,
}

/// A node of a module's declaration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    Selector(SelectorNode),
    Assignment(AssignmentNode),
    SpriteState(SpriteStateNode),
}

/// A parsed module file: the selector forest under its `UIView` root.
#[derive(Debug, Clone)]
pub struct ModuleDocument {
    pub source: String,
    pub items: Vec<ModuleItem>,
}

impl ModuleDocument {
    pub fn from_xml(root: &XmlNode, source: &str) -> Result<Self> {
        if root.tag != "UIView" {
            return Err(SkinError::parse(
                "module missing root UIView node",
                root.path(),
            ));
        }
        let items = parse_items(&root.children, false)?;
        Ok(Self {
            source: source.to_string(),
            items,
        })
    }
}

fn parse_items(children: &[XmlNode], inside_component: bool) -> Result<Vec<ModuleItem>> {
    let mut items = Vec::new();
    for child in children {
        match child.tag.as_str() {
            "Component" => items.push(ModuleItem::Selector(parse_selector(child)?)),
            "SpriteState" => {
                if !inside_component {
                    return Err(SkinError::parse(
                        "SpriteState must appear inside a Component",
                        child.path(),
                    ));
                }
                items.push(ModuleItem::SpriteState(parse_sprite_state(child)?));
            },
            _ => {
                if !inside_component {
                    return Err(SkinError::parse(
                        "setting properties on the root view is not allowed",
                        child.path(),
                    ));
                }
                items.push(ModuleItem::Assignment(parse_assignment(child)?));
            },
        }
    }
    Ok(items)
}

fn parse_selector(node: &XmlNode) -> Result<SelectorNode> {
    Ok(SelectorNode {
        name: node.attr("name")?.to_string(),
        regex: node.bool_attr("name_regex")?,
        recursive: node.bool_attr("recursive")?,
        optional: node.bool_attr("optional")?,
        hash: node.attr_opt("hash").map(str::to_string),
        children: parse_items(&node.children, true)?,
        node: node.path().to_string(),
    })
}

fn parse_assignment(node: &XmlNode) -> Result<AssignmentNode> {
    let aspect = match node.attr_opt("aspect") {
        None | Some("any") => AspectFilter::Any,
        Some(raw) => match AspectRatio::parse(raw) {
            Some(ratio) => AspectFilter::Only(ratio),
            None => {
                return Err(SkinError::parse(
                    format!("invalid aspect ratio \"{raw}\""),
                    node.path(),
                ));
            },
        },
    };
    Ok(AssignmentNode {
        property: node.tag.clone(),
        value: node.text.clone(),
        raw: node.bool_attr("raw")?,
        sticky: node.bool_attr("sticky")?,
        optional: node.bool_attr("optional")?,
        aspect,
        node: node.path().to_string(),
    })
}

fn parse_sprite_state(node: &XmlNode) -> Result<SpriteStateNode> {
    let index = node.usize_attr("index")?;
    let layer_name = node.attr("type")?;
    let Some(layer) = SpriteLayer::parse(layer_name) else {
        return Err(SkinError::parse(
            format!(
                "invalid value \"{layer_name}\" for SpriteState attribute \"type\" \
                 (only \"background\" and \"foreground\" are allowed)"
            ),
            node.path(),
        ));
    };
    let mut entries = Vec::new();
    for entry in &node.children {
        if !SpriteSet::SLOTS.contains(&entry.tag.as_str()) {
            return Err(SkinError::parse(
                format!(
                    "invalid property \"{}\" for SpriteState, allowed are \
                     \"normal\", \"hovered\", \"focused\", \"pressed\", \"disabled\"",
                    entry.tag
                ),
                entry.path(),
            ));
        }
        entries.push(SpriteStateEntry {
            state: entry.tag.clone(),
            sprite: entry.text.clone(),
            node: entry.path().to_string(),
        });
    }
    Ok(SpriteStateNode {
        index,
        layer,
        entries,
        node: node.path().to_string(),
    })
}
