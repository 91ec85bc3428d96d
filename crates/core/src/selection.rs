//! Flattening of catalog selections into submission records.
//!
//! Output order follows the catalog: category, sub-category and test in declared order, then
//! IgM before IgG, and Widal typhi leaves before paratyphi leaves.

use crate::catalog::{Catalog, CatalogNode, TestLeaf};
use crate::client::{NewAnalysis, PatientId};
use crate::descriptor::Descriptor;

const TYPHI_PREFIX: &str = "Salmonella Typhi";
const PARATYPHI_PREFIX: &str = "Salmonella Paratyphi";

/// Descriptors of every selected leaf, in catalog order.
pub fn selected_descriptors(catalog: &Catalog) -> Vec<Descriptor> {
    let mut out = Vec::new();

    for (category, cat) in catalog.categories().iter() {
        for (sub_category, sub) in cat.sub_categories.iter() {
            for (_, node) in sub.tests.iter() {
                let describe = |name: &str, test_type: String, leaf: &TestLeaf| {
                    Descriptor::new(category, sub_category, name, test_type, &leaf.normal_range)
                };

                match node {
                    CatalogNode::Simple(leaf) => {
                        if leaf.selected {
                            out.push(describe(&leaf.name, String::new(), leaf));
                        }
                    }
                    CatalogNode::IgPair { name, igm, igg } => {
                        for leaf in [igm, igg].into_iter().flatten() {
                            if leaf.selected {
                                out.push(describe(name, leaf.name.clone(), leaf));
                            }
                        }
                    }
                    CatalogNode::WidalPanel {
                        name,
                        salmonella_typhi,
                        salmonella_paratyphi,
                    } => {
                        let groups = [
                            (TYPHI_PREFIX, salmonella_typhi),
                            (PARATYPHI_PREFIX, salmonella_paratyphi),
                        ];
                        for (prefix, leaves) in groups {
                            for leaf in leaves.values().filter(|leaf| leaf.selected) {
                                out.push(describe(name, format!("{prefix} {}", leaf.name), leaf));
                            }
                        }
                    }
                    CatalogNode::BrucellaPanel { variants } => {
                        for leaf in variants.values().filter(|leaf| leaf.selected) {
                            out.push(describe(&leaf.name, String::new(), leaf));
                        }
                    }
                }
            }
        }
    }

    out
}

/// Submission records for every selected leaf, bound to `patient_id`.
///
/// An empty result means nothing was selected; callers treat that as a validation failure.
pub fn flatten(catalog: &Catalog, patient_id: PatientId) -> Vec<NewAnalysis> {
    selected_descriptors(catalog)
        .iter()
        .map(|descriptor| NewAnalysis::pending(descriptor, patient_id))
        .collect()
}
