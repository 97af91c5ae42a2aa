//! Mutation/rollback ledger.
//!
//! Every property write during an apply pass goes through [`RollbackLedger::set`].
//! The first touch of a `(component, slot)` pair captures the pre-pass value;
//! later touches of the same pair write directly, so rollback always restores
//! the state that existed before the pass, no matter how many assignments
//! fought over one property.

use std::collections::HashMap;

use veneer_types::error::{Result, SkinError};
use veneer_ui::registry::PropertyRegistry;
use veneer_ui::tree::{ComponentId, ComponentTree, SpriteLayer};
use veneer_ui::value::PropValue;

/// What a single write targets: a named property or one state slot of a
/// multi-state sprite array. Both flow through the same capture/replay
/// machinery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetSlot {
    Property(String),
    SpriteSlot {
        layer: SpriteLayer,
        index: usize,
        state: String,
    },
}

impl std::fmt::Display for TargetSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property(name) => write!(f, "{name}"),
            Self::SpriteSlot { layer, index, state } => {
                write!(f, "{}[{index}].{state}", layer.as_str())
            },
        }
    }
}

/// Read a slot's current value.
pub(crate) fn read_slot(
    tree: &ComponentTree,
    registry: &PropertyRegistry,
    id: ComponentId,
    slot: &TargetSlot,
    node: &str,
) -> Result<PropValue> {
    let component = tree.get(id);
    match slot {
        TargetSlot::Property(name) => match registry.descriptor(component.class, name) {
            Some(desc) => Ok(desc.value(component)),
            None => Err(SkinError::MissingProperty {
                property: name.clone(),
                component: component.name.clone(),
                node: node.to_string(),
            }),
        },
        TargetSlot::SpriteSlot { layer, index, state } => {
            match component.sprite_slot(*layer, *index, state) {
                Some(sprite) => Ok(PropValue::String(sprite.to_string())),
                None => Err(SkinError::IndexOutOfRange {
                    index: *index,
                    len: component.sprites.layer(*layer).len(),
                    node: node.to_string(),
                }),
            }
        },
    }
}

/// Write a slot, without any capture. Also used by sticky replay.
pub(crate) fn write_slot(
    tree: &mut ComponentTree,
    registry: &PropertyRegistry,
    id: ComponentId,
    slot: &TargetSlot,
    value: &PropValue,
    node: &str,
) -> Result<()> {
    let component = tree.get_mut(id);
    match slot {
        TargetSlot::Property(name) => {
            let class = component.class;
            let component_name = component.name.clone();
            let Some(desc) = registry.descriptor(class, name) else {
                return Err(SkinError::MissingProperty {
                    property: name.clone(),
                    component: component_name,
                    node: node.to_string(),
                });
            };
            if !desc.is_writable() {
                return Err(SkinError::MissingProperty {
                    property: name.clone(),
                    component: component_name,
                    node: node.to_string(),
                });
            }
            if !desc.assign(component, value) {
                return Err(SkinError::malformed(
                    format!(
                        "value of type \"{}\" cannot be assigned to property \"{name}\" \
                         (declared \"{}\")",
                        value.kind().name(),
                        desc.kind.name()
                    ),
                    node,
                ));
            }
            Ok(())
        },
        TargetSlot::SpriteSlot { layer, index, state } => {
            let PropValue::String(sprite) = value else {
                return Err(SkinError::malformed(
                    "sprite state slots only accept sprite names",
                    node,
                ));
            };
            if component.set_sprite_slot(*layer, *index, state, sprite) {
                Ok(())
            } else {
                Err(SkinError::IndexOutOfRange {
                    index: *index,
                    len: component.sprites.layer(*layer).len(),
                    node: node.to_string(),
                })
            }
        },
    }
}

/// Per-pass record of original values, replayed in reverse to undo a pass.
#[derive(Default)]
pub struct RollbackLedger {
    captured: HashMap<(ComponentId, TargetSlot), PropValue>,
    order: Vec<(ComponentId, TargetSlot)>,
}

impl RollbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of captured `(component, slot)` pairs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop all captured state without replaying it.
    pub fn clear(&mut self) {
        self.captured.clear();
        self.order.clear();
    }

    /// The original value captured for a pair, if that pair was touched this
    /// pass.
    pub fn captured_original(&self, id: ComponentId, slot: &TargetSlot) -> Option<&PropValue> {
        self.captured.get(&(id, slot.clone()))
    }

    /// Write `value` through the ledger.
    ///
    /// First touch of the pair captures the current value. The write is
    /// skipped (but the capture kept) when `value` equals the captured
    /// original, to avoid redundant host-side change notifications.
    pub fn set(
        &mut self,
        tree: &mut ComponentTree,
        registry: &PropertyRegistry,
        id: ComponentId,
        slot: TargetSlot,
        value: PropValue,
        node: &str,
    ) -> Result<()> {
        let key = (id, slot);
        let original = match self.captured.get(&key) {
            Some(original) => original.clone(),
            None => {
                let current = read_slot(tree, registry, id, &key.1, node)?;
                self.captured.insert(key.clone(), current.clone());
                self.order.push(key.clone());
                current
            },
        };

        if original == value {
            return Ok(());
        }
        write_slot(tree, registry, id, &key.1, &value, node)
    }

    /// Replay captured originals strictly in reverse insertion order, then
    /// clear the ledger. Best-effort: a failed restore is logged and the
    /// replay continues -- partial rollback beats none.
    pub fn rollback(&mut self, tree: &mut ComponentTree, registry: &PropertyRegistry) {
        let order = std::mem::take(&mut self.order);
        for (id, slot) in order.iter().rev() {
            let Some(original) = self.captured.get(&(*id, slot.clone())) else {
                continue;
            };
            if let Err(e) = write_slot(tree, registry, *id, slot, original, "(rollback)") {
                log::error!(
                    "rollback: failed to restore {slot} on \"{}\": {e}",
                    tree.get(*id).name
                );
            }
        }
        self.captured.clear();
    }
}
