//! Category taxonomy: the raw subnav shape, the canonical tree and its cache file.
//!
//! The subnav endpoint returns children as a JSON object keyed by arbitrary
//! strings. Children are deserialized into a `BTreeMap`, so normalization always
//! walks them in ascending key order and the canonical tree is identical across
//! runs regardless of how the payload happened to order its keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, WegError};

/// Display name given to nodes whose raw name is blank.
pub const UNNAMED_CATEGORY: &str = "(Unnamed)";

// ─────────────────────────────────────────────────────────────
//  Raw subnav payload
// ─────────────────────────────────────────────────────────────

/// `{ "content": { ... } }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubnavResponse {
    pub content: Option<RawCategoryNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategoryNode {
    pub name: Option<String>,
    pub key: Option<String>,
    pub variable: Option<String>,
    pub inode: Option<String>,
    #[serde(default)]
    pub children: Option<BTreeMap<String, RawCategoryNode>>,
}

// ─────────────────────────────────────────────────────────────
//  Canonical tree
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryNode {
    pub display_name: String,
    /// `None` when the raw node had a blank variable. Such nodes stay navigable
    /// but cannot be turned into a query clause.
    pub identifier: Option<String>,
    pub parent_identifier: Option<String>,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(display_name: impl Into<String>, identifier: Option<&str>) -> Self {
        Self {
            display_name: display_name.into(),
            identifier: identifier.map(str::to_string),
            parent_identifier: None,
            children: Vec::new(),
        }
    }

    /// Appends `child`, stamping it with this node's identifier as its parent.
    pub fn with_child(mut self, mut child: CategoryNode) -> Self {
        child.parent_identifier = self.identifier.clone();
        self.children.push(child);
        self
    }

    pub fn is_queryable(&self) -> bool {
        self.identifier.is_some()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::subtree_len).sum::<usize>()
    }
}

/// Persisted snapshot of the normalized taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryCache {
    pub retrieved_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub root_nodes: Vec<CategoryNode>,
}

impl CategoryCache {
    /// Loads a cache file. Any read or parse failure is fatal: every later stage
    /// depends on a structurally valid tree.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let cache: CategoryCache =
            serde_json::from_str(&json).map_err(|e| WegError::MalformedInput {
                what: "category cache",
                details: format!("{}: {e}", path.display()),
            })?;
        debug!(path = %path.display(), roots = cache.root_nodes.len(), "loaded category cache");
        Ok(cache)
    }

    /// Writes the whole snapshot; there are no partial updates.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "wrote category cache");
        Ok(())
    }

    pub fn root(&self) -> Result<&CategoryNode> {
        self.root_nodes
            .first()
            .ok_or_else(|| WegError::not_found("root category", "(empty cache)"))
    }
}

// ─────────────────────────────────────────────────────────────
//  Normalization
// ─────────────────────────────────────────────────────────────

/// Converts one raw node (and its whole subtree) into a canonical node.
///
/// Never drops a node: a blank variable becomes `identifier: None` rather than
/// removing the node or inventing a value.
pub fn normalize(raw: &RawCategoryNode, parent_identifier: Option<&str>) -> CategoryNode {
    let display_name = match raw.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNNAMED_CATEGORY.to_string(),
    };

    let identifier = raw
        .variable
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let children = raw
        .children
        .iter()
        .flat_map(|children| children.values())
        .map(|child| normalize(child, identifier.as_deref()))
        .collect();

    CategoryNode {
        display_name,
        identifier,
        parent_identifier: parent_identifier.map(str::to_string),
        children,
    }
}

/// Normalizes a full subnav document. A document without `content` is rejected.
pub fn normalize_response(response: &RawSubnavResponse) -> Result<CategoryNode> {
    let content = response
        .content
        .as_ref()
        .ok_or_else(|| WegError::MalformedInput {
            what: "category taxonomy",
            details: "missing `content` node".to_string(),
        })?;
    Ok(normalize(content, None))
}

/// Parses raw subnav JSON and wraps the normalized tree in a fresh cache snapshot.
pub fn build_cache(raw_json: &str, retrieved_at: DateTime<Utc>) -> Result<CategoryCache> {
    let response: RawSubnavResponse =
        serde_json::from_str(raw_json).map_err(|e| WegError::MalformedInput {
            what: "category taxonomy",
            details: e.to_string(),
        })?;
    let root = normalize_response(&response)?;
    info!(nodes = root.subtree_len(), "normalized category taxonomy");
    Ok(CategoryCache {
        retrieved_timestamp: retrieved_at,
        root_nodes: vec![root],
    })
}

// ─────────────────────────────────────────────────────────────
//  Dropdown options
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    /// Empty when the child has no identifier.
    pub value: String,
}

/// Direct children of `parent` as options, sorted by label.
pub fn dropdown_options(parent: &CategoryNode) -> Vec<DropdownOption> {
    let mut options: Vec<DropdownOption> = parent
        .children
        .iter()
        .map(|c| DropdownOption {
            label: c.display_name.clone(),
            value: c.identifier.clone().unwrap_or_default(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.value.cmp(&b.value)));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RAW: &str = r#"{
        "content": {
            "name": " WEG ",
            "key": "weg",
            "variable": "weg",
            "inode": "1",
            "children": {
                "zeta": { "name": "Sea", "variable": "sea-637ec6", "children": {} },
                "alpha": {
                    "name": "Land",
                    "variable": " land-f5e1db ",
                    "children": {
                        "b": { "name": "Mortars", "variable": "mortars-3a9f21" },
                        "a": { "name": "  ", "variable": "   " }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn normalize_orders_children_by_raw_key() {
        let cache = build_cache(RAW, Utc::now()).unwrap();
        let root = cache.root().unwrap();
        assert_eq!(root.display_name, "WEG");
        let names: Vec<_> = root.children.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Land", "Sea"]);

        let land = &root.children[0];
        assert_eq!(land.identifier.as_deref(), Some("land-f5e1db"));
        assert_eq!(land.parent_identifier.as_deref(), Some("weg"));
        assert_eq!(land.children[0].display_name, UNNAMED_CATEGORY);
        assert_eq!(land.children[1].parent_identifier.as_deref(), Some("land-f5e1db"));
    }

    #[test]
    fn blank_identifier_is_kept_as_absent() {
        let cache = build_cache(RAW, Utc::now()).unwrap();
        let unnamed = &cache.root().unwrap().children[0].children[0];
        assert_eq!(unnamed.identifier, None);
        assert!(!unnamed.is_queryable());
        assert_eq!(cache.root().unwrap().subtree_len(), 5);
    }

    #[test]
    fn missing_content_is_rejected() {
        let err = build_cache(r#"{ "other": 1 }"#, Utc::now()).unwrap_err();
        assert!(matches!(err, WegError::MalformedInput { .. }));
        assert!(build_cache("not json", Utc::now()).is_err());
    }

    #[test]
    fn cache_round_trips_through_disk() {
        let retrieved = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let cache = build_cache(RAW, retrieved).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weg-categories.json");
        cache.save(&path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"RetrievedTimestamp\""));
        assert!(json.contains("\"DisplayName\": \"Land\""));

        assert_eq!(CategoryCache::load(&path).unwrap(), cache);
    }

    #[test]
    fn corrupt_cache_fails_hard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"RootNodes\": 5 }").unwrap();
        assert!(matches!(
            CategoryCache::load(&path),
            Err(WegError::MalformedInput { .. })
        ));
    }

    #[test]
    fn dropdown_options_sorted_by_label() {
        let parent = CategoryNode::new("Domain", Some("domain"))
            .with_child(CategoryNode::new("Sea", Some("sea-1")))
            .with_child(CategoryNode::new("Air", Some("air-1")))
            .with_child(CategoryNode::new("Land", None));
        let options = dropdown_options(&parent);
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Air", "Land", "Sea"]);
        assert_eq!(options[1].value, "");
    }
}
