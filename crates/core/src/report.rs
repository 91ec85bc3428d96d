//! Patient report: grouped view and printable rows.
//!
//! The patient-detail view groups hydrated analyses three levels deep by decoded category,
//! sub-category and test name. Each level independently files blank keys under
//! [`UNCATEGORIZED`]. Groups keep first-seen order, so grouping the same list twice yields
//! identical trees.

use crate::catalog::display_label;
use crate::client::PatientRecord;
use crate::constants::{PENDING_RESULT, UNCATEGORIZED};
use crate::keyed::KeyedList;
use crate::reconcile::{hydrate, DisplayAnalysis};
use serde::Serialize;
use std::fmt::Write as _;

/// Analyses grouped by category → sub-category → test name.
pub type ReportTree = KeyedList<KeyedList<KeyedList<Vec<DisplayAnalysis>>>>;

fn bucket(key: &str) -> &str {
    if key.is_empty() {
        UNCATEGORIZED
    } else {
        key
    }
}

/// Group analyses for structured display.
pub fn group_for_report(analyses: &[DisplayAnalysis]) -> ReportTree {
    let mut tree = ReportTree::new();
    for analysis in analyses {
        let d = &analysis.descriptor;
        tree.entry_or_default(bucket(&d.category))
            .entry_or_default(bucket(&d.sub_category))
            .entry_or_default(bucket(&d.name))
            .push(analysis.clone());
    }
    tree
}

/// One printed line of the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub test: String,
    pub result: String,
    pub normal_range: String,
}

impl From<&DisplayAnalysis> for ReportRow {
    fn from(analysis: &DisplayAnalysis) -> Self {
        Self {
            test: analysis.label(),
            result: analysis
                .result
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| PENDING_RESULT.to_string()),
            normal_range: analysis.descriptor.normal_range.clone(),
        }
    }
}

/// Everything the patient-detail view and its printout show.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientReport {
    pub patient_id: i64,
    pub unique_number: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub created_time: Option<String>,
    pub groups: ReportTree,
    pub rows: Vec<ReportRow>,
}

impl PatientReport {
    pub fn from_record(record: &PatientRecord) -> Self {
        let analyses = hydrate(&record.pathology_analyses);
        Self {
            patient_id: record.id,
            unique_number: record.unique_number,
            name: record.name.clone(),
            age: record.age,
            gender: record.gender.clone(),
            created_time: record.created_time.clone(),
            groups: group_for_report(&analyses),
            rows: analyses.iter().map(ReportRow::from).collect(),
        }
    }

    /// Plain-text rendering for terminals and line printers.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Patient: {} (No. {})", self.name, self.unique_number);
        let _ = writeln!(out, "Age: {} | Gender: {}", self.age, self.gender);
        if let Some(created) = &self.created_time {
            let _ = writeln!(out, "Registered: {created}");
        }

        if self.rows.is_empty() {
            let _ = writeln!(out, "\nNo analyses recorded.");
            return out;
        }

        for (category, subs) in self.groups.iter() {
            let _ = writeln!(out, "\n{}", display_label(category));
            for (sub_category, tests) in subs.iter() {
                let _ = writeln!(out, "  {}", display_label(sub_category));
                for analysis in tests.values().flatten() {
                    let row = ReportRow::from(analysis);
                    let _ = writeln!(
                        out,
                        "    {:<40} {:<16} ({})",
                        row.test, row.result, row.normal_range
                    );
                }
            }
        }
        out
    }
}
