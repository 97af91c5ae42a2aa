//! Selector resolution over the live component tree.
//!
//! A selector matches direct children of its context by exact name or
//! regular expression; recursive selectors keep descending whether or not
//! the current node matched, so a component and its descendant can both
//! match independently. Results come back in document order -- that order
//! drives assignment application and therefore rollback capture order.

use regex::Regex;

use veneer_types::error::{Result, SkinError};
use veneer_ui::tree::{ComponentId, ComponentTree};

use crate::document::SelectorNode;
use crate::hash::{hash_hex, hash_rect};

enum NameMatcher<'a> {
    Exact(&'a str),
    Pattern(Regex),
}

impl NameMatcher<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => *expected == name,
            Self::Pattern(regex) => regex.is_match(name),
        }
    }
}

enum HashFilter {
    Exact(String),
    Pattern(Regex),
}

impl HashFilter {
    fn new(literal: &str, node: &str) -> Result<Self> {
        // A full 16-digit literal is an exact match; anything else is a
        // regex, which permits partial-hash matching.
        if literal.len() == 16 && literal.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Self::Exact(literal.to_uppercase()));
        }
        let regex = Regex::new(literal).map_err(|e| {
            SkinError::parse(format!("invalid hash pattern \"{literal}\": {e}"), node)
        })?;
        Ok(Self::Pattern(regex))
    }

    fn matches(&self, hex: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == hex,
            Self::Pattern(regex) => regex.is_match(hex),
        }
    }
}

/// Resolve a selector under `parent` (absent = the tree's top level).
///
/// Fails with `ComponentNotFound` when a non-optional selector matches
/// nothing; zero matches deeper inside a recursive search are not an error.
pub fn resolve(
    tree: &ComponentTree,
    parent: Option<ComponentId>,
    selector: &SelectorNode,
) -> Result<Vec<ComponentId>> {
    let matcher = if selector.regex {
        NameMatcher::Pattern(Regex::new(&selector.name).map_err(|e| {
            SkinError::parse(
                format!("invalid name pattern \"{}\": {e}", selector.name),
                &selector.node,
            )
        })?)
    } else {
        NameMatcher::Exact(&selector.name)
    };

    let hash_filter = match &selector.hash {
        Some(literal) => Some(HashFilter::new(literal, &selector.node)?),
        None => None,
    };

    let mut results = Vec::new();
    collect(
        tree,
        parent,
        &matcher,
        hash_filter.as_ref(),
        selector.recursive,
        &mut results,
    );

    if results.is_empty() && !selector.optional {
        let parent_name = match parent {
            Some(id) => tree.get(id).name.clone(),
            None => "(root)".to_string(),
        };
        return Err(SkinError::ComponentNotFound {
            name: selector.name.clone(),
            parent: parent_name,
            node: selector.node.clone(),
        });
    }
    Ok(results)
}

fn collect(
    tree: &ComponentTree,
    parent: Option<ComponentId>,
    matcher: &NameMatcher<'_>,
    hash_filter: Option<&HashFilter>,
    recursive: bool,
    out: &mut Vec<ComponentId>,
) {
    for &child in tree.children_of(parent) {
        let component = tree.get(child);
        let name_hit = matcher.matches(&component.name);
        let hash_hit = hash_filter
            .map(|f| f.matches(&hash_hex(hash_rect(component.area()))))
            .unwrap_or(true);
        if name_hit && hash_hit {
            out.push(child);
        }
        if recursive {
            collect(tree, Some(child), matcher, hash_filter, true, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_types::{Vec2, Vec3};
    use veneer_ui::tree::WidgetClass;

    fn selector(name: &str) -> SelectorNode {
        SelectorNode {
            name: name.to_string(),
            regex: false,
            recursive: false,
            optional: false,
            hash: None,
            children: Vec::new(),
            node: format!("test:/UIView/Component[name=\"{name}\"]"),
        }
    }

    /// A -> B("X") -> C("X"), plus an unrelated sibling.
    fn fixture() -> (ComponentTree, ComponentId, ComponentId, ComponentId) {
        let mut tree = ComponentTree::new();
        let a = tree.insert(None, WidgetClass::Panel, "A");
        let b = tree.insert(Some(a), WidgetClass::Panel, "X");
        let c = tree.insert(Some(b), WidgetClass::Button, "X");
        tree.insert(None, WidgetClass::Panel, "Other");
        (tree, a, b, c)
    }

    #[test]
    fn exact_match_direct_children_only() {
        let (tree, a, b, _) = fixture();
        let found = resolve(&tree, Some(a), &selector("X")).unwrap();
        assert_eq!(found, vec![b]);
    }

    #[test]
    fn recursive_matches_node_and_descendant() {
        let (tree, a, b, c) = fixture();
        let mut sel = selector("X");
        sel.recursive = true;
        let found = resolve(&tree, Some(a), &sel).unwrap();
        assert_eq!(found, vec![b, c], "document order, both levels");
    }

    #[test]
    fn missing_component_fails_unless_optional() {
        let (tree, a, ..) = fixture();
        let err = resolve(&tree, Some(a), &selector("Nope")).unwrap_err();
        assert!(matches!(err, SkinError::ComponentNotFound { .. }));

        let mut sel = selector("Nope");
        sel.optional = true;
        assert!(resolve(&tree, Some(a), &sel).unwrap().is_empty());
    }

    #[test]
    fn root_search_without_parent() {
        let (tree, a, ..) = fixture();
        let found = resolve(&tree, None, &selector("A")).unwrap();
        assert_eq!(found, vec![a]);
    }

    #[test]
    fn regex_matching() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, WidgetClass::Panel, "Menu");
        let one = tree.insert(Some(root), WidgetClass::Button, "Btn1");
        let two = tree.insert(Some(root), WidgetClass::Button, "Btn2");
        tree.insert(Some(root), WidgetClass::Label, "Title");

        let mut sel = selector("^Btn[0-9]+$");
        sel.regex = true;
        let found = resolve(&tree, Some(root), &sel).unwrap();
        assert_eq!(found, vec![one, two]);
    }

    #[test]
    fn invalid_regex_is_a_parse_error() {
        let (tree, a, ..) = fixture();
        let mut sel = selector("([unclosed");
        sel.regex = true;
        let err = resolve(&tree, Some(a), &sel).unwrap_err();
        assert!(matches!(err, SkinError::Parse { .. }));
    }

    fn place(tree: &mut ComponentTree, id: ComponentId, x: f32, y: f32, w: f32, h: f32) {
        let c = tree.get_mut(id);
        c.relative_position = Vec3::new(x, y, 0.0);
        c.size = Vec2::new(w, h);
    }

    #[test]
    fn hash_filter_narrows_same_named_components() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, WidgetClass::Panel, "Menu");
        let first = tree.insert(Some(root), WidgetClass::Button, "Btn");
        let second = tree.insert(Some(root), WidgetClass::Button, "Btn");
        place(&mut tree, first, 0.0, 0.0, 100.0, 30.0);
        place(&mut tree, second, 0.0, 40.0, 100.0, 30.0);

        let target = hash_hex(hash_rect(tree.get(second).area()));
        let mut sel = selector("Btn");
        sel.hash = Some(target);
        let found = resolve(&tree, Some(root), &sel).unwrap();
        assert_eq!(found, vec![second]);
    }

    #[test]
    fn partial_hash_matches_as_regex() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, WidgetClass::Panel, "Menu");
        let btn = tree.insert(Some(root), WidgetClass::Button, "Btn");
        place(&mut tree, btn, 8.0, 16.0, 120.0, 24.0);

        let full = hash_hex(hash_rect(tree.get(btn).area()));
        let mut sel = selector("Btn");
        sel.hash = Some(format!("^{}", &full[..6]));
        let found = resolve(&tree, Some(root), &sel).unwrap();
        assert_eq!(found, vec![btn]);
    }

    #[test]
    fn hash_mismatch_yields_not_found() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, WidgetClass::Panel, "Menu");
        let btn = tree.insert(Some(root), WidgetClass::Button, "Btn");
        place(&mut tree, btn, 8.0, 16.0, 120.0, 24.0);

        let mut sel = selector("Btn");
        sel.hash = Some("0000000000000000".to_string());
        assert!(resolve(&tree, Some(root), &sel).is_err());
    }

    #[test]
    fn document_order_across_subtrees() {
        // Menu -> (Left -> X), (Right -> X): recursive search from Menu
        // returns Left's X before Right's X.
        let mut tree = ComponentTree::new();
        let menu = tree.insert(None, WidgetClass::Panel, "Menu");
        let left = tree.insert(Some(menu), WidgetClass::Panel, "Left");
        let right = tree.insert(Some(menu), WidgetClass::Panel, "Right");
        let in_left = tree.insert(Some(left), WidgetClass::Button, "X");
        let in_right = tree.insert(Some(right), WidgetClass::Button, "X");

        let mut sel = selector("X");
        sel.recursive = true;
        let found = resolve(&tree, Some(menu), &sel).unwrap();
        assert_eq!(found, vec![in_left, in_right]);
    }
}
