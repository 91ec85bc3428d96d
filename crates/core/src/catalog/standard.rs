//! Built-in serology/pathology test catalog.

use super::{Catalog, CatalogNode, Category, SubCategory, TestLeaf};
use crate::keyed::KeyedList;
use std::sync::Arc;

const NEGATIVE: &str = "Negative";
const WIDAL_RANGE: &str = "Up to 1:80";

fn simple(name: &str, normal_range: &str) -> CatalogNode {
    CatalogNode::Simple(TestLeaf::new(name, normal_range))
}

fn ig_pair(name: &str) -> CatalogNode {
    CatalogNode::IgPair {
        name: name.to_string(),
        igm: Some(TestLeaf::new(format!("{name} - IgM"), NEGATIVE)),
        igg: Some(TestLeaf::new(format!("{name} - IgG"), NEGATIVE)),
    }
}

fn widal_group(keys: &[(&str, &str)]) -> KeyedList<TestLeaf> {
    keys.iter()
        .map(|(key, name)| (*key, TestLeaf::new(*name, WIDAL_RANGE)))
        .collect()
}

fn sub_category(tests: Vec<(&str, CatalogNode)>) -> Arc<SubCategory> {
    Arc::new(SubCategory {
        tests: tests.into_iter().collect(),
    })
}

fn category(subs: Vec<(&str, Arc<SubCategory>)>) -> Category {
    Category {
        sub_categories: subs.into_iter().collect(),
    }
}

pub(super) fn standard_catalog() -> Catalog {
    let routine_tests = sub_category(vec![
        ("asoTiter", simple("ASO Titer", "Up to 200 IU/ml")),
        ("rf", simple("RF", NEGATIVE)),
        ("vdrl", simple("VDRL", NEGATIVE)),
        ("tpha", simple("TPHA", NEGATIVE)),
        ("toxoplasmaLatex", simple("Toxoplasma (Latex)", NEGATIVE)),
        ("paulBunnelTest", simple("Paul Bunnel Test", NEGATIVE)),
        (
            "brucella",
            CatalogNode::BrucellaPanel {
                variants: KeyedList::new()
                    .with("abortus", TestLeaf::new("Brucella - Abortus", NEGATIVE))
                    .with("melitensis", TestLeaf::new("Brucella - Melitensis", NEGATIVE)),
            },
        ),
        (
            "widalTest",
            CatalogNode::WidalPanel {
                name: "Widal Test".to_string(),
                salmonella_typhi: widal_group(&[("aH", "A-H"), ("aO", "A-O")]),
                salmonella_paratyphi: widal_group(&[
                    ("bH", "B-H"),
                    ("bO", "B-O"),
                    ("cH", "C-H"),
                    ("cO", "C-O"),
                    ("dH", "D-H"),
                    ("dO", "D-O"),
                ]),
            },
        ),
    ]);

    let hepatitis_markers = sub_category(vec![
        ("hbsAg", simple("HBsAg", NEGATIVE)),
        ("antiHBs", simple("Anti HBs", NEGATIVE)),
        ("antiHBc", simple("Anti HBc", NEGATIVE)),
        ("hbeAg", simple("HBeAg", NEGATIVE)),
        ("antiHBe", simple("Anti HBe", NEGATIVE)),
    ]);

    let viral_markers = sub_category(vec![
        ("havAb", ig_pair("HAV Ab")),
        ("toxoplasmaAb", ig_pair("Toxoplasma Ab")),
        ("hcv", simple("HCV", NEGATIVE)),
        ("hiv", simple("HIV", "Non reactive")),
    ]);

    let parasites = sub_category(vec![
        ("bilharzia", simple("Bilharzia", NEGATIVE)),
        ("echinococcus", simple("Echinococcus", NEGATIVE)),
        ("amoeba", simple("Amoeba", NEGATIVE)),
        ("leishmania", simple("Leishmania", NEGATIVE)),
        ("toxoplasma", simple("Toxoplasma", NEGATIVE)),
    ]);

    let autoimmune = sub_category(vec![
        ("ana", simple("ANA", NEGATIVE)),
        ("antiDNA", simple("Anti n DNA", NEGATIVE)),
        ("ama", simple("AMA", NEGATIVE)),
        ("asma", simple("ASMA", NEGATIVE)),
        ("apca", simple("APCA", NEGATIVE)),
        ("ftaAbs", simple("FTA-ABS", NEGATIVE)),
    ]);

    let thyroid_autoantibodies = sub_category(vec![
        ("antiMicrosomal", simple("Anti-microsomal (M)", NEGATIVE)),
        ("antiThyroglobulin", simple("Anti-Thyoglobulin (T)", NEGATIVE)),
    ]);

    Catalog::new(
        KeyedList::new()
            .with(
                "serologyTests",
                category(vec![("routineTests", routine_tests)]),
            )
            .with(
                "elisaTests",
                category(vec![
                    ("hepatitisMarkers", hepatitis_markers),
                    ("viralMarkers", viral_markers),
                ]),
            )
            .with("ihaTests", category(vec![("parasites", parasites)]))
            .with(
                "ifaTests",
                category(vec![
                    ("autoimmune", autoimmune),
                    ("thyroidAutoantibodies", thyroid_autoantibodies),
                ]),
            ),
    )
}
