//! Skin engine -- declarative, run-time re-theming of a live component tree.
//!
//! A skin is a directory of XML documents: `skin.xml` names the skin and
//! declares colors, sprite atlases, and per-mode modules; each module is a
//! tree of component selectors whose leaves overwrite named properties.
//! [`SkinEngine`] resolves those declarations against the host's live
//! [`ComponentTree`](veneer_ui::ComponentTree), mutates it transactionally
//! (every pass can be fully rolled back), and replays "sticky" assignments
//! every frame to fight the host re-asserting its own values.

pub mod config;
pub mod discovery;
pub mod document;
pub mod engine;
pub mod hash;
pub mod ledger;
pub mod selector;
pub mod values;
pub mod watch;

pub use config::Configuration;
pub use discovery::{SkinMetadata, find_skins};
pub use document::{
    AspectFilter, AspectRatio, AssignmentNode, AtlasDef, ModuleClass, ModuleDocument, ModuleItem,
    ModuleRef, SelectorNode, SkinDocument, SpriteDef, SpriteStateEntry, SpriteStateNode, XmlNode,
};
pub use engine::{EngineState, SkinEngine, StickyProperty};
pub use hash::{hash_hex, hash_rect};
pub use ledger::{RollbackLedger, TargetSlot};
pub use selector::resolve;
pub use values::{AtlasRegistry, coerce, parse_color32_literal};
pub use watch::{ReloadFlag, StampWatcher};
