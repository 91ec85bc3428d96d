//! Test catalog model.
//!
//! The catalog is a three-level tree, `category → sub-category → test`, whose tests are one of
//! four node shapes (see [`CatalogNode`]). A single template is built at startup (the built-in
//! [`Catalog::standard`] or a YAML file) and each registration session works on its own clone.
//!
//! Sub-category subtrees sit behind `Arc`, so cloning a catalog is cheap and toggling a leaf
//! copies only the sub-category it touches (`Arc::make_mut`). A session clone therefore never
//! observes another session's selections, and the template is never mutated.

mod path;
mod standard;

pub use path::TestPath;

use crate::descriptor::find_reserved_tag;
use crate::keyed::KeyedList;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Errors raised while loading a catalog definition.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog schema mismatch at {path}: {message}")]
    Schema { path: String, message: String },
    #[error("catalog is empty")]
    Empty,
    #[error("invalid test path '{0}': expected category/subCategory/test[/variant]")]
    InvalidPath(String),
}

/// One selectable assay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestLeaf {
    pub name: String,
    pub normal_range: String,
    #[serde(default)]
    pub selected: bool,
    /// Only populated during results entry; always `None` in a registration catalog.
    #[serde(default)]
    pub result: Option<String>,
}

impl TestLeaf {
    pub fn new(name: impl Into<String>, normal_range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normal_range: normal_range.into(),
            selected: false,
            result: None,
        }
    }
}

/// Shape of a catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CatalogNode {
    /// A single assay.
    Simple(TestLeaf),
    /// An antibody test offered as IgM and/or IgG.
    IgPair {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        igm: Option<TestLeaf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        igg: Option<TestLeaf>,
    },
    /// Widal agglutination panel, split by Salmonella serotype group.
    WidalPanel {
        name: String,
        #[serde(rename = "salmonellaTyphi")]
        salmonella_typhi: KeyedList<TestLeaf>,
        #[serde(rename = "salmonellaParatyphi")]
        salmonella_paratyphi: KeyedList<TestLeaf>,
    },
    /// Brucella species panel; each leaf name is already fully qualified.
    BrucellaPanel { variants: KeyedList<TestLeaf> },
}

/// Isotype selector of an [`CatalogNode::IgPair`].
pub const IGM: &str = "igm";
pub const IGG: &str = "igg";

/// Group selectors of a [`CatalogNode::WidalPanel`].
pub const SALMONELLA_TYPHI: &str = "salmonellaTyphi";
pub const SALMONELLA_PARATYPHI: &str = "salmonellaParatyphi";

impl CatalogNode {
    /// Iterate `(variant, leaf)` pairs in display order.
    ///
    /// Simple nodes yield a single pair with `None`; Widal variants use the compound
    /// `group.key` selector.
    pub fn leaves(&self) -> Vec<(Option<String>, &TestLeaf)> {
        match self {
            CatalogNode::Simple(leaf) => vec![(None, leaf)],
            CatalogNode::IgPair { igm, igg, .. } => [(IGM, igm), (IGG, igg)]
                .into_iter()
                .filter_map(|(key, leaf)| leaf.as_ref().map(|l| (Some(key.to_string()), l)))
                .collect(),
            CatalogNode::WidalPanel {
                salmonella_typhi,
                salmonella_paratyphi,
                ..
            } => [
                (SALMONELLA_TYPHI, salmonella_typhi),
                (SALMONELLA_PARATYPHI, salmonella_paratyphi),
            ]
            .into_iter()
            .flat_map(|(group, leaves)| {
                leaves
                    .iter()
                    .map(move |(key, leaf)| (Some(format!("{group}.{key}")), leaf))
            })
            .collect(),
            CatalogNode::BrucellaPanel { variants } => variants
                .iter()
                .map(|(key, leaf)| (Some(key.to_string()), leaf))
                .collect(),
        }
    }

    /// The leaf addressed by `variant`, if the node has one.
    pub fn leaf(&self, variant: Option<&str>) -> Option<&TestLeaf> {
        match (self, variant) {
            (CatalogNode::Simple(leaf), None) => Some(leaf),
            (CatalogNode::IgPair { igm, .. }, Some(IGM)) => igm.as_ref(),
            (CatalogNode::IgPair { igg, .. }, Some(IGG)) => igg.as_ref(),
            (
                CatalogNode::WidalPanel {
                    salmonella_typhi,
                    salmonella_paratyphi,
                    ..
                },
                Some(variant),
            ) => match variant.split_once('.')? {
                (SALMONELLA_TYPHI, key) => salmonella_typhi.get(key),
                (SALMONELLA_PARATYPHI, key) => salmonella_paratyphi.get(key),
                _ => None,
            },
            (CatalogNode::BrucellaPanel { variants }, Some(key)) => variants.get(key),
            _ => None,
        }
    }

    fn leaf_mut(&mut self, variant: Option<&str>) -> Option<&mut TestLeaf> {
        match (self, variant) {
            (CatalogNode::Simple(leaf), None) => Some(leaf),
            (CatalogNode::IgPair { igm, .. }, Some(IGM)) => igm.as_mut(),
            (CatalogNode::IgPair { igg, .. }, Some(IGG)) => igg.as_mut(),
            (
                CatalogNode::WidalPanel {
                    salmonella_typhi,
                    salmonella_paratyphi,
                    ..
                },
                Some(variant),
            ) => match variant.split_once('.')? {
                (SALMONELLA_TYPHI, key) => salmonella_typhi.get_mut(key),
                (SALMONELLA_PARATYPHI, key) => salmonella_paratyphi.get_mut(key),
                _ => None,
            },
            (CatalogNode::BrucellaPanel { variants }, Some(key)) => variants.get_mut(key),
            _ => None,
        }
    }
}

/// Tests of one sub-category, keyed by test key (`asoTiter`, `havAb`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubCategory {
    pub tests: KeyedList<CatalogNode>,
}

/// Sub-categories of one category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category {
    pub sub_categories: KeyedList<Arc<SubCategory>>,
}

/// The full selectable test catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: KeyedList<Category>,
}

impl Catalog {
    pub fn new(categories: KeyedList<Category>) -> Self {
        Self { categories }
    }

    /// The department's built-in catalog with nothing selected.
    pub fn standard() -> Self {
        standard::standard_catalog()
    }

    /// Parse a catalog definition from YAML.
    ///
    /// This uses `serde_path_to_error` to report the failing field path when the YAML does not
    /// match the catalog schema. Selection state in the file is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Schema`] on a schema mismatch or when a key, name or range
    /// contains a reserved descriptor tag, and [`CatalogError::Empty`] when the file defines no
    /// tests.
    pub fn from_yaml(yaml_text: &str) -> Result<Self, CatalogError> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let mut catalog = match serde_path_to_error::deserialize::<_, Catalog>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(CatalogError::Schema {
                    path,
                    message: err.into_inner().to_string(),
                });
            }
        };

        if catalog.leaf_paths().is_empty() {
            return Err(CatalogError::Empty);
        }
        catalog.check_reserved_tags()?;
        catalog.clear_selection();
        Ok(catalog)
    }

    /// Render as YAML; the inverse of [`from_yaml`](Self::from_yaml).
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn categories(&self) -> &KeyedList<Category> {
        &self.categories
    }

    /// An independent copy for one registration session.
    ///
    /// Equivalent to `clone`; isolation comes from copy-on-write in [`toggle`](Self::toggle).
    pub fn clone_for_session(&self) -> Self {
        self.clone()
    }

    pub fn node(&self, category: &str, sub_category: &str, test: &str) -> Option<&CatalogNode> {
        self.categories
            .get(category)?
            .sub_categories
            .get(sub_category)?
            .tests
            .get(test)
    }

    pub fn leaf(&self, path: &TestPath) -> Option<&TestLeaf> {
        self.node(&path.category, &path.sub_category, &path.test)?
            .leaf(path.variant.as_deref())
    }

    pub fn is_selected(&self, path: &TestPath) -> bool {
        self.leaf(path).is_some_and(|leaf| leaf.selected)
    }

    /// Flip the `selected` flag of the leaf at `path`.
    ///
    /// Returns `false` and leaves the catalog untouched when the path does not address a leaf.
    pub fn toggle(&mut self, path: &TestPath) -> bool {
        if self.leaf(path).is_none() {
            tracing::debug!("ignoring toggle of unknown test path {path}");
            return false;
        }

        let leaf = self
            .categories
            .get_mut(&path.category)
            .and_then(|category| category.sub_categories.get_mut(&path.sub_category))
            .map(Arc::make_mut)
            .and_then(|sub| sub.tests.get_mut(&path.test))
            .and_then(|node| node.leaf_mut(path.variant.as_deref()));

        match leaf {
            Some(leaf) => {
                leaf.selected = !leaf.selected;
                true
            }
            None => false,
        }
    }

    /// Functional form of [`toggle`](Self::toggle): returns a new catalog and leaves `self`
    /// unchanged.
    pub fn with_toggled(&self, path: &TestPath) -> Self {
        let mut next = self.clone();
        next.toggle(path);
        next
    }

    /// Every addressable leaf path, in display order.
    pub fn leaf_paths(&self) -> Vec<TestPath> {
        let mut paths = Vec::new();
        for (category, cat) in self.categories.iter() {
            for (sub_category, sub) in cat.sub_categories.iter() {
                for (test, node) in sub.tests.iter() {
                    for (variant, _) in node.leaves() {
                        paths.push(TestPath {
                            category: category.to_string(),
                            sub_category: sub_category.to_string(),
                            test: test.to_string(),
                            variant,
                        });
                    }
                }
            }
        }
        paths
    }

    pub fn selected_count(&self) -> usize {
        self.categories
            .values()
            .flat_map(|cat| cat.sub_categories.values())
            .flat_map(|sub| sub.tests.values())
            .flat_map(|node| node.leaves())
            .filter(|(_, leaf)| leaf.selected)
            .count()
    }

    /// Every string that ends up inside an encoded descriptor must be free of reserved tags.
    fn check_reserved_tags(&self) -> Result<(), CatalogError> {
        let reject = |path: String, field: &str, value: &str| match find_reserved_tag(value) {
            Some(tag) => Err(CatalogError::Schema {
                path,
                message: format!("{field} must not contain the reserved tag {tag}"),
            }),
            None => Ok(()),
        };

        for (category, cat) in self.categories.iter() {
            reject(category.to_string(), "category key", category)?;
            for (sub_category, sub) in cat.sub_categories.iter() {
                let sub_path = format!("{category}.{sub_category}");
                reject(sub_path.clone(), "sub-category key", sub_category)?;
                for (test, node) in sub.tests.iter() {
                    let test_path = format!("{sub_path}.{test}");
                    if let CatalogNode::IgPair { name, .. } | CatalogNode::WidalPanel { name, .. } =
                        node
                    {
                        reject(test_path.clone(), "name", name)?;
                    }
                    for (variant, leaf) in node.leaves() {
                        let leaf_path = match variant {
                            Some(variant) => format!("{test_path}.{variant}"),
                            None => test_path.clone(),
                        };
                        reject(leaf_path.clone(), "name", &leaf.name)?;
                        reject(leaf_path, "normalRange", &leaf.normal_range)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn clear_selection(&mut self) {
        for path in self.leaf_paths() {
            if self.is_selected(&path) {
                self.toggle(&path);
            }
        }
    }
}

/// Human label for a camelCase catalog key: `"routineTests"` becomes `"Routine Tests"`.
pub fn display_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else {
            if ch.is_ascii_uppercase() {
                label.push(' ');
            }
            label.push(ch);
        }
    }
    label
}
