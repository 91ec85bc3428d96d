//! Merging fetched analyses with their decoded descriptors.
//!
//! The results-entry and patient-edit screens work on a flat list of [`DisplayAnalysis`] rows.
//! Editing changes the descriptor fields; saving re-encodes the rows that were changed with
//! [`reconstruct_on_save`] and sends untouched rows back exactly as stored.

use crate::client::{AnalysisId, AnalysisRecord};
use crate::descriptor::{decode, Descriptor};
use crate::LabResult;
use serde::{Deserialize, Serialize};

/// One analysis row with its descriptor decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAnalysis {
    pub id: AnalysisId,
    pub result: Option<String>,
    #[serde(flatten)]
    pub descriptor: Descriptor,
    /// The name exactly as stored by the backend.
    pub encoded_name: String,
}

impl DisplayAnalysis {
    /// A blank row for an analysis added on the edit screen; id `0` until the backend assigns one.
    pub fn blank() -> Self {
        Self {
            id: 0,
            result: None,
            descriptor: Descriptor::default(),
            encoded_name: String::new(),
        }
    }

    pub fn label(&self) -> String {
        self.descriptor.display_name()
    }

    /// Whether the descriptor still matches the stored name.
    ///
    /// Rows without a stored name (new rows) always count as edited.
    pub fn is_unchanged(&self) -> bool {
        !self.encoded_name.is_empty() && decode(&self.encoded_name) == self.descriptor
    }
}

impl From<&AnalysisRecord> for DisplayAnalysis {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            id: record.id,
            result: record.result.clone(),
            descriptor: Descriptor::decode(&record.name),
            encoded_name: record.name.clone(),
        }
    }
}

/// Decode every record; order is preserved and malformed names yield blank descriptors.
pub fn hydrate(analyses: &[AnalysisRecord]) -> Vec<DisplayAnalysis> {
    analyses.iter().map(DisplayAnalysis::from).collect()
}

/// Re-encode a possibly edited row for persistence.
///
/// An unchanged row keeps its stored name byte for byte, even when that name does not decode
/// cleanly. Otherwise blank fields encode as empty segments and an empty type drops the
/// `[TYPE]` segment.
///
/// # Errors
///
/// Returns [`LabError::Validation`](crate::LabError::Validation) if an edited field contains a
/// reserved descriptor tag.
pub fn reconstruct_on_save(edited: &DisplayAnalysis) -> LabResult<String> {
    if edited.is_unchanged() {
        return Ok(edited.encoded_name.clone());
    }
    edited.descriptor.validate_editable()?;
    Ok(edited.descriptor.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabError;

    fn record(id: AnalysisId, name: &str, result: Option<&str>) -> AnalysisRecord {
        AnalysisRecord {
            id,
            name: name.to_string(),
            result: result.map(str::to_string),
            patient_id: Some(1),
        }
    }

    #[test]
    fn hydrate_merges_decoded_fields_with_id_and_result() {
        let rows = hydrate(&[
            record(
                10,
                "[CAT]elisaTests[SUB]viralMarkers[NAME]HAV Ab[TYPE]HAV Ab - IgG[RANGE]Negative",
                Some("Positive"),
            ),
            record(11, "[CAT]ihaTests[SUB]parasites[NAME]Amoeba[RANGE]Negative", None),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 10);
        assert_eq!(rows[0].result.as_deref(), Some("Positive"));
        assert_eq!(rows[0].descriptor.test_type, "HAV Ab - IgG");
        assert_eq!(rows[1].descriptor.name, "Amoeba");
        assert_eq!(rows[1].result, None);
    }

    #[test]
    fn malformed_names_hydrate_to_blank_rows() {
        let rows = hydrate(&[record(3, "legacy analysis", Some("12"))]);
        assert_eq!(rows[0].descriptor, Descriptor::default());
        assert_eq!(rows[0].encoded_name, "legacy analysis");
        assert_eq!(rows[0].label(), "");
    }

    #[test]
    fn reconstruct_applies_edits() {
        let mut row = hydrate(&[record(
            4,
            "[CAT]elisaTests[SUB]viralMarkers[NAME]HCV[RANGE]Negative",
            None,
        )])
        .remove(0);
        row.descriptor.normal_range = "Non reactive".into();
        row.descriptor.test_type = "Rapid".into();

        assert_eq!(
            reconstruct_on_save(&row).unwrap(),
            "[CAT]elisaTests[SUB]viralMarkers[NAME]HCV[TYPE]Rapid[RANGE]Non reactive"
        );
    }

    #[test]
    fn reconstruct_keeps_blank_segments() {
        let mut row = DisplayAnalysis::blank();
        row.descriptor.name = "CRP".into();
        assert_eq!(reconstruct_on_save(&row).unwrap(), "[CAT][SUB][NAME]CRP[RANGE]");
    }

    #[test]
    fn reconstruct_rejects_reserved_tags() {
        let mut row = DisplayAnalysis::blank();
        row.descriptor.name = "CRP[RANGE]".into();
        let err = reconstruct_on_save(&row).expect_err("tag in name");
        assert!(matches!(err, LabError::Validation(msg) if msg.contains("name")));
    }

    #[test]
    fn untouched_rows_keep_their_stored_name() {
        let legacy = hydrate(&[record(5, "legacy Widal O", None)]).remove(0);
        assert!(legacy.is_unchanged());
        assert_eq!(reconstruct_on_save(&legacy).unwrap(), "legacy Widal O");

        let doubled = hydrate(&[record(6, "[CAT]c[SUB]s[NAME]n[RANGE]x[RANGE]y", None)]).remove(0);
        assert_eq!(
            reconstruct_on_save(&doubled).unwrap(),
            "[CAT]c[SUB]s[NAME]n[RANGE]x[RANGE]y"
        );
    }

    #[test]
    fn editing_a_legacy_row_reencodes_it() {
        let mut row = hydrate(&[record(5, "legacy Widal O", None)]).remove(0);
        row.descriptor.name = "Widal O".into();
        assert!(!row.is_unchanged());
        assert_eq!(reconstruct_on_save(&row).unwrap(), "[CAT][SUB][NAME]Widal O[RANGE]");
    }

    #[test]
    fn blank_row_counts_as_edited() {
        assert!(!DisplayAnalysis::blank().is_unchanged());
        assert_eq!(
            reconstruct_on_save(&DisplayAnalysis::blank()).unwrap(),
            "[CAT][SUB][NAME][RANGE]"
        );
    }

    #[test]
    fn serialises_descriptor_fields_inline() {
        let row = hydrate(&[record(
            8,
            "[CAT]c[SUB]s[NAME]RF[RANGE]Negative",
            None,
        )])
        .remove(0);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], 8);
        assert_eq!(json["name"], "RF");
        assert_eq!(json["encodedName"], "[CAT]c[SUB]s[NAME]RF[RANGE]Negative");
    }
}
