//! Label and identifier lookups inside the canonical category tree.
//!
//! All searches are explicit pre-order depth-first walks: a node is tested before
//! any of its children, and children are visited in their canonical order. The
//! first matching node wins.

use crate::category::CategoryNode;
use crate::error::{Result, WegError};

/// Pre-order iterator over a subtree, `start` included.
pub struct PreOrder<'a> {
    stack: Vec<&'a CategoryNode>,
}

impl<'a> PreOrder<'a> {
    pub fn new(start: &'a CategoryNode) -> Self {
        Self { stack: vec![start] }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a CategoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse push so the first child is popped next.
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Finds the first node under `start` (inclusive) whose display name equals
/// `label`, ignoring case and surrounding whitespace.
pub fn find_descendant_by_label<'a>(start: &'a CategoryNode, label: &str) -> Result<&'a CategoryNode> {
    let target = label.trim();
    if target.is_empty() {
        return Err(WegError::Validation("category label cannot be empty".to_string()));
    }

    PreOrder::new(start)
        .find(|node| label_matches(&node.display_name, target))
        .ok_or_else(|| {
            WegError::not_found(
                "category label",
                format!("{target} (under '{}')", start.display_name),
            )
        })
}

/// Resolves `label` to the identifier used in query clauses.
pub fn resolve_identifier_by_label(start: &CategoryNode, label: &str) -> Result<String> {
    let node = find_descendant_by_label(start, label)?;
    node.identifier
        .clone()
        .ok_or_else(|| WegError::Unqueryable {
            label: node.display_name.clone(),
        })
}

/// First node under `start` (inclusive) carrying exactly `identifier`.
pub fn find_by_identifier<'a>(start: &'a CategoryNode, identifier: &str) -> Option<&'a CategoryNode> {
    PreOrder::new(start).find(|node| node.identifier.as_deref() == Some(identifier))
}

/// [`find_by_identifier`] across several roots, in order.
pub fn find_in_roots<'a>(roots: &'a [CategoryNode], identifier: &str) -> Option<&'a CategoryNode> {
    roots.iter().find_map(|root| find_by_identifier(root, identifier))
}

fn label_matches(display_name: &str, target: &str) -> bool {
    let name = display_name.trim();
    name.eq_ignore_ascii_case(target) || name.to_lowercase() == target.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land() -> CategoryNode {
        CategoryNode::new("Land", Some("land-f5e1db"))
            .with_child(
                CategoryNode::new("Infantry Weapons", Some("infantry-weapons-6965ab"))
                    .with_child(CategoryNode::new("Mortars", Some("mortars-3a9f21")))
                    .with_child(CategoryNode::new("Rifles", Some("rifles-11aa"))),
            )
            .with_child(
                CategoryNode::new("Artillery", Some("artillery-22bb"))
                    .with_child(CategoryNode::new("Mortars", Some("mortars-late")))
                    .with_child(CategoryNode::new("Unlisted", None)),
            )
    }

    #[test]
    fn pre_order_visits_parent_then_children_in_order() {
        let tree = land();
        let names: Vec<_> = PreOrder::new(&tree).map(|n| n.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Land", "Infantry Weapons", "Mortars", "Rifles", "Artillery", "Mortars", "Unlisted"]
        );
    }

    #[test]
    fn first_match_wins_case_insensitively() {
        let tree = land();
        let node = find_descendant_by_label(&tree, "  mORTARS ").unwrap();
        assert_eq!(node.identifier.as_deref(), Some("mortars-3a9f21"));
        assert_eq!(find_descendant_by_label(&tree, "land").unwrap().display_name, "Land");
    }

    #[test]
    fn search_is_scoped_to_start_subtree() {
        let tree = land();
        let artillery = &tree.children[1];
        assert_eq!(
            resolve_identifier_by_label(artillery, "Mortars").unwrap(),
            "mortars-late"
        );
        let err = find_descendant_by_label(artillery, "Rifles").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_label_is_not_found() {
        let tree = land();
        assert!(matches!(
            find_descendant_by_label(&tree, "Submarines"),
            Err(WegError::NotFound { .. })
        ));
        assert!(matches!(
            find_descendant_by_label(&tree, "   "),
            Err(WegError::Validation(_))
        ));
    }

    #[test]
    fn node_without_identifier_cannot_be_resolved() {
        let tree = land();
        assert!(find_descendant_by_label(&tree, "Unlisted").is_ok());
        assert!(matches!(
            resolve_identifier_by_label(&tree, "Unlisted"),
            Err(WegError::Unqueryable { .. })
        ));
    }

    #[test]
    fn find_by_identifier_searches_all_roots() {
        let roots = vec![CategoryNode::new("Other", Some("other")), land()];
        let node = find_in_roots(&roots, "rifles-11aa").unwrap();
        assert_eq!(node.display_name, "Rifles");
        assert_eq!(node.parent_identifier.as_deref(), Some("infantry-weapons-6965ab"));
        assert!(find_in_roots(&roots, "nope").is_none());
    }
}
