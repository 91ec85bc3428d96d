//! Identifiers carried by the printed barcode.
//!
//! Registration prints a barcode for `<origin>/test-results/<patient id>`; the scanner view reads
//! it back, or accepts the id typed by hand.

use crate::client::PatientId;
use crate::constants::RESULTS_PATH_PREFIX;
use crate::{LabError, LabResult};

/// `/test-results/<id>`
pub fn results_path(patient_id: PatientId) -> String {
    format!("{RESULTS_PATH_PREFIX}{patient_id}")
}

/// Absolute results-entry URL; `origin` is expected without a trailing slash.
pub fn results_url(origin: &str, patient_id: PatientId) -> String {
    format!("{}{}", origin.trim_end_matches('/'), results_path(patient_id))
}

/// Extract a patient id from scanner or keyboard input.
///
/// Accepts a bare positive integer, or any text containing `/test-results/<id>` (a full URL as
/// encoded in the barcode, with or without query string).
///
/// # Errors
///
/// Returns [`LabError::Validation`] for blank input or input that does not carry a positive id.
pub fn parse_scanned_id(input: &str) -> LabResult<PatientId> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LabError::Validation("Please enter a patient ID".into()));
    }

    let candidate = match input.rfind(RESULTS_PATH_PREFIX) {
        Some(at) => {
            let rest = &input[at + RESULTS_PATH_PREFIX.len()..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        }
        None => input,
    };

    match candidate.parse::<PatientId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            tracing::debug!("rejected scanned input '{input}'");
            Err(LabError::Validation("Invalid patient ID".into()))
        }
    }
}
