//! Arena-backed live component tree.
//!
//! Components are created by the host and never destroyed by the skin
//! engine; ids stay valid for the lifetime of the tree. Traversal order is
//! creation order within each parent, which is what "document order" means
//! for selector results.

use std::sync::Arc;

use veneer_atlas::PackedAtlas;
use veneer_types::{Color32, Rect, RectOffset, Vec2, Vec3};

/// Opaque handle to a component in a [`ComponentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Host widget classes the property registry knows schemas for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetClass {
    Panel,
    Button,
    Label,
    Sprite,
    MultiStateButton,
}

impl WidgetClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panel => "Panel",
            Self::Button => "Button",
            Self::Label => "Label",
            Self::Sprite => "Sprite",
            Self::MultiStateButton => "MultiStateButton",
        }
    }
}

/// Which sprite array of a multi-state button a declaration addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteLayer {
    Background,
    Foreground,
}

impl SpriteLayer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Foreground => "foreground",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "background" => Some(Self::Background),
            "foreground" => Some(Self::Foreground),
            _ => None,
        }
    }
}

/// Per-state sprite names of one multi-state slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpriteSet {
    pub normal: String,
    pub hovered: String,
    pub focused: String,
    pub pressed: String,
    pub disabled: String,
}

impl SpriteSet {
    /// The valid state slot names, in declaration order.
    pub const SLOTS: [&'static str; 5] = ["normal", "hovered", "focused", "pressed", "disabled"];

    pub fn slot(&self, state: &str) -> Option<&str> {
        match state {
            "normal" => Some(&self.normal),
            "hovered" => Some(&self.hovered),
            "focused" => Some(&self.focused),
            "pressed" => Some(&self.pressed),
            "disabled" => Some(&self.disabled),
            _ => None,
        }
    }

    /// Write one state slot; `false` when `state` is not a valid slot name.
    pub fn set_slot(&mut self, state: &str, value: &str) -> bool {
        let target = match state {
            "normal" => &mut self.normal,
            "hovered" => &mut self.hovered,
            "focused" => &mut self.focused,
            "pressed" => &mut self.pressed,
            "disabled" => &mut self.disabled,
            _ => return false,
        };
        value.clone_into(target);
        true
    }
}

/// The indexed sprite arrays of a multi-state button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStateSprites {
    pub background: Vec<SpriteSet>,
    pub foreground: Vec<SpriteSet>,
}

impl MultiStateSprites {
    pub fn layer(&self, layer: SpriteLayer) -> &[SpriteSet] {
        match layer {
            SpriteLayer::Background => &self.background,
            SpriteLayer::Foreground => &self.foreground,
        }
    }

    pub fn layer_mut(&mut self, layer: SpriteLayer) -> &mut Vec<SpriteSet> {
        match layer {
            SpriteLayer::Background => &mut self.background,
            SpriteLayer::Foreground => &mut self.foreground,
        }
    }
}

/// One live widget. Field names follow the host's property vocabulary; the
/// enum-typed fields (`text_alignment`, `anchor`, `pivot`, `sprite_mode`)
/// store the member's numeric value.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub class: WidgetClass,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,

    pub relative_position: Vec3,
    pub size: Vec2,
    pub color: Color32,
    pub text_color: Color32,
    pub disabled_color: Color32,
    pub opacity: f32,
    pub visible: bool,
    pub enabled: bool,
    pub z_order: i32,
    pub tooltip: String,
    pub text: String,
    pub font_size: i32,
    pub text_alignment: i64,
    pub anchor: i64,
    pub pivot: i64,
    pub sprite_mode: i64,
    pub atlas: Option<Arc<PackedAtlas>>,
    pub background_sprite: String,
    pub foreground_sprite: String,
    pub padding: RectOffset,
    pub autosize: bool,
    pub clip_children: bool,

    /// Multi-state sprite arrays; empty on every class but `MultiStateButton`.
    pub sprites: MultiStateSprites,
}

impl Component {
    fn new(name: &str, class: WidgetClass) -> Self {
        Self {
            name: name.to_string(),
            class,
            parent: None,
            children: Vec::new(),
            relative_position: Vec3::default(),
            size: Vec2::default(),
            color: Color32::WHITE,
            text_color: Color32::WHITE,
            disabled_color: Color32::rgb(128, 128, 128),
            opacity: 1.0,
            visible: true,
            enabled: true,
            z_order: 0,
            tooltip: String::new(),
            text: String::new(),
            font_size: 12,
            text_alignment: 0,
            anchor: 0,
            pivot: 0,
            sprite_mode: 0,
            atlas: None,
            background_sprite: String::new(),
            foreground_sprite: String::new(),
            padding: RectOffset::default(),
            autosize: false,
            clip_children: false,
            sprites: MultiStateSprites::default(),
        }
    }

    /// Screen rectangle: position plus size. This is what the structural
    /// hash digests.
    pub fn area(&self) -> Rect {
        Rect::new(
            self.relative_position.x,
            self.relative_position.y,
            self.size.x,
            self.size.y,
        )
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// Read a multi-state sprite slot.
    pub fn sprite_slot(&self, layer: SpriteLayer, index: usize, state: &str) -> Option<&str> {
        self.sprites.layer(layer).get(index)?.slot(state)
    }

    /// Write a multi-state sprite slot; `false` when the index or state name
    /// does not exist.
    pub fn set_sprite_slot(
        &mut self,
        layer: SpriteLayer,
        index: usize,
        state: &str,
        value: &str,
    ) -> bool {
        match self.sprites.layer_mut(layer).get_mut(index) {
            Some(set) => set.set_slot(state, value),
            None => false,
        }
    }
}

/// The whole live tree. The synthetic root is not a component: top-level
/// components are "roots" and selector resolution without a parent starts
/// there.
#[derive(Debug, Default)]
pub struct ComponentTree {
    nodes: Vec<Component>,
    roots: Vec<ComponentId>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a component under `parent` (or at the top level). Host-side
    /// only; the skin engine never calls this.
    pub fn insert(
        &mut self,
        parent: Option<ComponentId>,
        class: WidgetClass,
        name: &str,
    ) -> ComponentId {
        let id = ComponentId(self.nodes.len() as u32);
        let mut component = Component::new(name, class);
        component.parent = parent;
        self.nodes.push(component);
        match parent {
            Some(p) => self.nodes[p.index()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: ComponentId) -> &Component {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.nodes[id.index()]
    }

    /// Direct children of `parent`, or the top-level components when absent.
    pub fn children_of(&self, parent: Option<ComponentId>) -> &[ComponentId] {
        match parent {
            Some(id) => &self.nodes[id.index()].children,
            None => &self.roots,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All components in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, c)| (ComponentId(i as u32), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_builds_hierarchy() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, WidgetClass::Panel, "Menu");
        let child = tree.insert(Some(root), WidgetClass::Button, "Play");
        assert_eq!(tree.children_of(None), &[root]);
        assert_eq!(tree.children_of(Some(root)), &[child]);
        assert_eq!(tree.get(child).parent(), Some(root));
        assert_eq!(tree.get(child).name, "Play");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn children_keep_creation_order() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, WidgetClass::Panel, "Menu");
        let a = tree.insert(Some(root), WidgetClass::Button, "A");
        let b = tree.insert(Some(root), WidgetClass::Button, "B");
        let c = tree.insert(Some(root), WidgetClass::Button, "C");
        assert_eq!(tree.children_of(Some(root)), &[a, b, c]);
    }

    #[test]
    fn area_combines_position_and_size() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(None, WidgetClass::Panel, "P");
        let c = tree.get_mut(id);
        c.relative_position = Vec3::new(10.0, 20.0, 0.0);
        c.size = Vec2::new(300.0, 40.0);
        assert_eq!(tree.get(id).area(), Rect::new(10.0, 20.0, 300.0, 40.0));
    }

    #[test]
    fn sprite_set_slot_roundtrip() {
        let mut set = SpriteSet::default();
        assert!(set.set_slot("hovered", "ButtonHover"));
        assert_eq!(set.slot("hovered"), Some("ButtonHover"));
        assert!(!set.set_slot("sparkling", "x"));
        assert_eq!(set.slot("sparkling"), None);
    }

    #[test]
    fn sprite_slot_through_component() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(None, WidgetClass::MultiStateButton, "Toggle");
        tree.get_mut(id).sprites.background = vec![SpriteSet::default(), SpriteSet::default()];
        assert!(tree.get_mut(id).set_sprite_slot(SpriteLayer::Background, 1, "pressed", "On"));
        assert_eq!(
            tree.get(id).sprite_slot(SpriteLayer::Background, 1, "pressed"),
            Some("On")
        );
        // Out-of-range index and wrong layer read as absent.
        assert!(!tree.get_mut(id).set_sprite_slot(SpriteLayer::Background, 2, "normal", "x"));
        assert_eq!(tree.get(id).sprite_slot(SpriteLayer::Foreground, 0, "normal"), None);
    }

    #[test]
    fn defaults_are_visible_and_opaque() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(None, WidgetClass::Label, "L");
        let c = tree.get(id);
        assert!(c.visible);
        assert!(c.enabled);
        assert_eq!(c.opacity, 1.0);
        assert_eq!(c.color, Color32::WHITE);
        assert!(c.atlas.is_none());
    }

    #[test]
    fn layer_accessors() {
        let mut sprites = MultiStateSprites::default();
        sprites.foreground.push(SpriteSet::default());
        assert_eq!(sprites.layer(SpriteLayer::Foreground).len(), 1);
        assert_eq!(sprites.layer(SpriteLayer::Background).len(), 0);
        assert_eq!(SpriteLayer::parse("background"), Some(SpriteLayer::Background));
        assert_eq!(SpriteLayer::parse("Background"), None);
    }
}
