//! Skin discovery: scan candidate directories for skin packages.
//!
//! The host's mod loader supplies the candidate roots; anything with a
//! `skin.xml` is offered in the skin list. Unreadable or invalid candidates
//! are logged and skipped -- one broken mod must not hide the others.

use veneer_types::error::{Result, SkinError};
use veneer_types::resources::Resources;

use crate::document::{XmlNode, join_path};

/// Name and author of a discovered skin, without loading its modules or
/// packing its atlases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinMetadata {
    pub name: String,
    pub author: String,
    /// Directory the skin loads from, relative to the resource root.
    pub path: String,
}

/// Read just the root attributes of a skin directory's `skin.xml`.
pub fn peek_metadata(res: &dyn Resources, dir: &str) -> Result<SkinMetadata> {
    let xml = res.read_to_string(&join_path(dir, "skin.xml"))?;
    let root = XmlNode::parse_str(&xml, "skin.xml")?;
    if root.tag != "VeneerSkin" {
        return Err(SkinError::parse(
            "skin missing root VeneerSkin node",
            root.path(),
        ));
    }
    Ok(SkinMetadata {
        name: root.attr("name")?.to_string(),
        author: root.attr("author")?.to_string(),
        path: dir.to_string(),
    })
}

/// Collect metadata for every skin package found under the given roots.
pub fn find_skins(res: &dyn Resources, roots: &[&str]) -> Vec<SkinMetadata> {
    let mut skins = Vec::new();
    for root in roots {
        let dirs = match res.subdirs(root) {
            Ok(dirs) => dirs,
            Err(e) => {
                log::warn!("cannot scan skin root \"{root}\": {e}");
                continue;
            },
        };
        for dir in dirs {
            let skin_dir = join_path(root, &dir);
            if !res.exists(&join_path(&skin_dir, "skin.xml")) {
                continue;
            }
            match peek_metadata(res, &skin_dir) {
                Ok(metadata) => skins.push(metadata),
                Err(e) => log::warn!("skipping invalid skin at \"{skin_dir}\": {e}"),
            }
        }
    }
    skins
}
