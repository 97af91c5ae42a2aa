//! The skin application engine.
//!
//! Owns everything a loaded skin resolves to -- color table, packed atlases,
//! module documents -- plus the per-pass rollback ledger and sticky list.
//! The host drives it from its main update callback: `apply` on skin
//! selection, `apply_sticky` once per frame, `reload_if_changed` when the
//! watcher flag is up, `rollback` on deselect. A failed pass never leaves a
//! half-applied skin visible: the engine rolls back everything it touched in
//! that pass and marks itself invalid.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;

use veneer_atlas::{AtlasPacker, SpriteSource};
use veneer_types::error::{Result, SkinError};
use veneer_types::resources::Resources;
use veneer_types::{Color32, Rect};
use veneer_ui::registry::PropertyRegistry;
use veneer_ui::tree::{ComponentId, ComponentTree, WidgetClass};
use veneer_ui::value::{PropKind, PropValue};

use crate::document::{
    AspectRatio, AssignmentNode, ModuleClass, ModuleDocument, ModuleItem, SkinDocument,
    SpriteStateNode, XmlNode, join_path,
};
use crate::ledger::{RollbackLedger, TargetSlot, write_slot};
use crate::selector::resolve;
use crate::values::{AtlasRegistry, coerce};
use crate::watch::ReloadFlag;

/// Engine lifecycle. `Invalid` is reached on any parse or apply failure and
/// left only by a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Parsed and resolved, nothing applied.
    Parsed,
    /// The most recent apply pass succeeded.
    Applied,
    /// Parsing or applying failed; the skin will not be applied again until
    /// it reloads successfully.
    Invalid,
}

/// One sticky assignment: the resolved component, slot, and value recorded
/// during the last full apply pass, rewritten every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StickyProperty {
    pub component: ComponentId,
    pub slot: TargetSlot,
    pub value: PropValue,
}

/// A loaded skin plus its application state.
pub struct SkinEngine {
    root_dir: String,
    name: String,
    author: String,
    state: EngineState,
    colors: HashMap<String, Color32>,
    atlases: AtlasRegistry,
    modules: Vec<(ModuleClass, ModuleDocument)>,
    render_area: Option<Rect>,
    ledger: RollbackLedger,
    sticky: Vec<StickyProperty>,
    aspect: AspectRatio,
    reload: ReloadFlag,
    applied_class: Option<ModuleClass>,
}

impl SkinEngine {
    /// Load a skin package: parse `skin.xml`, resolve colors, pack every
    /// atlas block, and parse all referenced module documents.
    ///
    /// Any failure aborts the load -- there is no partially loaded skin.
    pub fn load(res: &dyn Resources, root_dir: &str) -> Result<Self> {
        let xml = res.read_to_string(&join_path(root_dir, "skin.xml"))?;
        let root = XmlNode::parse_str(&xml, "skin.xml")?;
        let doc = SkinDocument::from_xml(&root)?;

        let atlases = build_atlases(res, root_dir, &doc)?;

        let mut modules = Vec::new();
        for module_ref in &doc.modules {
            let module_xml = res.read_to_string(&join_path(root_dir, &module_ref.path))?;
            let module_root = XmlNode::parse_str(&module_xml, &module_ref.path)?;
            let module = ModuleDocument::from_xml(&module_root, &module_ref.path)?;
            modules.push((module_ref.class, module));
        }

        log::info!(
            "loaded skin \"{}\" by {} ({} atlases, {} modules)",
            doc.name,
            doc.author,
            atlases.len(),
            modules.len()
        );

        Ok(Self {
            root_dir: root_dir.to_string(),
            name: doc.name,
            author: doc.author,
            state: EngineState::Parsed,
            colors: doc.colors,
            atlases,
            modules,
            render_area: doc.render_area,
            ledger: RollbackLedger::new(),
            sticky: Vec::new(),
            aspect: AspectRatio::R16x9,
            reload: ReloadFlag::new(),
            applied_class: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state != EngineState::Invalid
    }

    /// Render-area override from the skin's settings block, if any.
    pub fn render_area(&self) -> Option<Rect> {
        self.render_area
    }

    /// Packed-atlas lookup used by host-side construction.
    pub fn atlas(&self, name: &str) -> Option<&Arc<veneer_atlas::PackedAtlas>> {
        self.atlases.get(name)
    }

    /// Handle for the external watcher to raise on file changes.
    pub fn reload_flag(&self) -> ReloadFlag {
        self.reload.clone()
    }

    /// Tell the engine the host's render size so aspect-gated assignments
    /// resolve against the actual screen.
    pub fn set_render_size(&mut self, width: f32, height: f32) {
        self.aspect = AspectRatio::from_render_size(width, height);
    }

    /// Apply every module of `class`, in document order, through the
    /// rollback ledger.
    ///
    /// On any failure the whole pass is rolled back, the engine goes
    /// `Invalid`, and the error is returned -- the tree is bit-identical to
    /// its pre-apply state.
    pub fn apply(
        &mut self,
        class: ModuleClass,
        tree: &mut ComponentTree,
        registry: &PropertyRegistry,
    ) -> Result<()> {
        if self.state == EngineState::Invalid {
            return Err(SkinError::parse(
                "skin is marked invalid; reload before applying",
                &self.root_dir,
            ));
        }

        self.ledger.clear();
        self.sticky.clear();
        log::info!("applying skin \"{}\" ({})", self.name, class.as_str());

        match self.apply_pass(class, tree, registry) {
            Ok(()) => {
                self.state = EngineState::Applied;
                self.applied_class = Some(class);
                log::info!("skin \"{}\" applied", self.name);
                Ok(())
            },
            Err(e) => {
                log::error!("error while applying skin \"{}\": {e}", self.name);
                self.ledger.rollback(tree, registry);
                self.sticky.clear();
                self.state = EngineState::Invalid;
                self.applied_class = None;
                Err(e)
            },
        }
    }

    fn apply_pass(
        &mut self,
        class: ModuleClass,
        tree: &mut ComponentTree,
        registry: &PropertyRegistry,
    ) -> Result<()> {
        let Self {
            modules,
            colors,
            atlases,
            aspect,
            ledger,
            sticky,
            ..
        } = self;
        let mut pass = ApplyPass {
            colors,
            atlases,
            aspect: *aspect,
            ledger,
            sticky,
            registry,
            tree,
        };
        for (module_class, module) in modules.iter() {
            if *module_class != class {
                continue;
            }
            log::debug!("applying skin module \"{}\"", module.source);
            pass.walk(&module.items, None)?;
        }
        Ok(())
    }

    /// Undo the current pass and return to `Parsed`. Safe to call in any
    /// state; rollback itself is best-effort and never fails.
    pub fn rollback(&mut self, tree: &mut ComponentTree, registry: &PropertyRegistry) {
        log::info!("rolling back skin \"{}\"", self.name);
        self.sticky.clear();
        self.ledger.rollback(tree, registry);
        self.applied_class = None;
        if self.state == EngineState::Applied {
            self.state = EngineState::Parsed;
        }
    }

    /// Rewrite every sticky assignment recorded by the last apply pass.
    ///
    /// Intended to run once per host frame, countering the host overwriting
    /// skinned properties on its own update cycle. Writes bypass the ledger
    /// (it already holds the pre-skin originals), so N replays leave exactly
    /// the same state as one. Outside `Applied` this is a no-op.
    pub fn apply_sticky(&mut self, tree: &mut ComponentTree, registry: &PropertyRegistry) {
        if self.state != EngineState::Applied {
            return;
        }
        for sticky in &self.sticky {
            if let Err(e) = write_slot(
                tree,
                registry,
                sticky.component,
                &sticky.slot,
                &sticky.value,
                "(sticky)",
            ) {
                log::warn!("sticky replay failed for {}: {e}", sticky.slot);
            }
        }
    }

    /// Consume the watcher flag and, when raised, reparse the skin package.
    ///
    /// A failed reparse preserves the previously applied state but marks the
    /// skin invalid. A successful reparse rolls the old pass back, swaps in
    /// the new documents and atlases, and reapplies the class that was
    /// active. Returns whether a reload happened.
    pub fn reload_if_changed(
        &mut self,
        res: &dyn Resources,
        tree: &mut ComponentTree,
        registry: &PropertyRegistry,
    ) -> Result<bool> {
        if !self.reload.take() {
            return Ok(false);
        }
        log::info!("skin \"{}\" changed, reloading", self.name);

        let mut fresh = match Self::load(res, &self.root_dir) {
            Ok(fresh) => fresh,
            Err(e) => {
                log::error!("reload of skin \"{}\" failed: {e}", self.name);
                self.state = EngineState::Invalid;
                return Err(e);
            },
        };

        let applied_class = self.applied_class;
        if applied_class.is_some() {
            self.rollback(tree, registry);
        }
        fresh.reload = self.reload.clone();
        fresh.aspect = self.aspect;
        *self = fresh;

        if let Some(class) = applied_class {
            self.apply(class, tree, registry)?;
        }
        Ok(true)
    }
}

fn build_atlases(
    res: &dyn Resources,
    root_dir: &str,
    doc: &SkinDocument,
) -> Result<AtlasRegistry> {
    // Source images are cached across atlas blocks so one file referenced
    // from several atlases decodes once.
    let mut texture_cache: HashMap<String, Arc<RgbaImage>> = HashMap::new();
    let mut atlases = AtlasRegistry::new();

    for def in &doc.atlases {
        let mut packer = AtlasPacker::new();
        for sprite in &def.sprites {
            let image = match texture_cache.get(&sprite.path) {
                Some(image) => Arc::clone(image),
                None => {
                    let bytes = res.read(&join_path(root_dir, &sprite.path))?;
                    let decoded = image::load_from_memory(&bytes)
                        .map_err(|e| {
                            SkinError::Resource(format!("sprite \"{}\": {e}", sprite.path))
                        })?
                        .to_rgba8();
                    let image = Arc::new(decoded);
                    texture_cache.insert(sprite.path.clone(), Arc::clone(&image));
                    image
                },
            };
            packer.add_sprite(&sprite.name, SpriteSource::new(&sprite.path, image));
        }
        let atlas = packer.build(&def.name)?;
        log::info!("atlas \"{}\" packed ({} sprites)", def.name, atlas.len());
        atlases.insert(def.name.clone(), Arc::new(atlas));
    }
    Ok(atlases)
}

/// Borrowed view of one apply pass.
struct ApplyPass<'a> {
    colors: &'a HashMap<String, Color32>,
    atlases: &'a AtlasRegistry,
    aspect: AspectRatio,
    ledger: &'a mut RollbackLedger,
    sticky: &'a mut Vec<StickyProperty>,
    registry: &'a PropertyRegistry,
    tree: &'a mut ComponentTree,
}

impl ApplyPass<'_> {
    fn walk(&mut self, items: &[ModuleItem], parent: Option<ComponentId>) -> Result<()> {
        for item in items {
            match item {
                ModuleItem::Selector(selector) => {
                    let matched = resolve(self.tree, parent, selector)?;
                    for id in matched {
                        self.walk(&selector.children, Some(id))?;
                    }
                },
                ModuleItem::Assignment(assignment) => {
                    // Document parsing rejects root-level assignments; the
                    // parent is always present here.
                    let Some(id) = parent else {
                        return Err(SkinError::parse(
                            "assignment outside of a component",
                            &assignment.node,
                        ));
                    };
                    self.apply_assignment(assignment, id)?;
                },
                ModuleItem::SpriteState(state) => {
                    let Some(id) = parent else {
                        return Err(SkinError::parse(
                            "SpriteState outside of a component",
                            &state.node,
                        ));
                    };
                    self.apply_sprite_state(state, id)?;
                },
            }
        }
        Ok(())
    }

    fn apply_assignment(&mut self, assignment: &AssignmentNode, id: ComponentId) -> Result<()> {
        if !assignment.aspect.allows(self.aspect) {
            return Ok(());
        }

        let component = self.tree.get(id);
        let class = component.class;
        let component_name = component.name.clone();

        let Some(descriptor) = self.registry.descriptor(class, &assignment.property) else {
            if assignment.optional {
                return Ok(());
            }
            return Err(SkinError::MissingProperty {
                property: assignment.property.clone(),
                component: component_name,
                node: assignment.node.clone(),
            });
        };
        if !descriptor.is_writable() {
            if assignment.optional {
                return Ok(());
            }
            return Err(SkinError::MissingProperty {
                property: assignment.property.clone(),
                component: component_name,
                node: assignment.node.clone(),
            });
        }

        // Color32 targets go through the skin's named-color table unless the
        // assignment opts out with `raw`.
        let value = if descriptor.kind == PropKind::Color32 && !assignment.raw {
            let color_name = assignment.value.trim();
            let Some(color) = self.colors.get(color_name) else {
                return Err(SkinError::UnknownColor {
                    name: color_name.to_string(),
                    node: assignment.node.clone(),
                });
            };
            PropValue::Color32(*color)
        } else {
            coerce(
                descriptor.kind,
                &assignment.value,
                &assignment.node,
                self.atlases,
            )?
        };

        let slot = TargetSlot::Property(assignment.property.clone());
        self.ledger.set(
            self.tree,
            self.registry,
            id,
            slot.clone(),
            value.clone(),
            &assignment.node,
        )?;

        if assignment.sticky {
            self.sticky.push(StickyProperty {
                component: id,
                slot,
                value,
            });
        }
        Ok(())
    }

    fn apply_sprite_state(&mut self, state: &SpriteStateNode, id: ComponentId) -> Result<()> {
        let component = self.tree.get(id);
        if component.class != WidgetClass::MultiStateButton {
            return Err(SkinError::parse(
                format!(
                    "SpriteState is only valid on MultiStateButton components, \
                     \"{}\" is a {}",
                    component.name,
                    component.class.as_str()
                ),
                &state.node,
            ));
        }
        let len = component.sprites.layer(state.layer).len();
        if state.index >= len {
            return Err(SkinError::IndexOutOfRange {
                index: state.index,
                len,
                node: state.node.clone(),
            });
        }
        for entry in &state.entries {
            self.ledger.set(
                self.tree,
                self.registry,
                id,
                TargetSlot::SpriteSlot {
                    layer: state.layer,
                    index: state.index,
                    state: entry.state.clone(),
                },
                PropValue::String(entry.sprite.clone()),
                &entry.node,
            )?;
        }
        Ok(())
    }
}
