//! Multi-step operations against the lab backend.
//!
//! Each workflow validates its input before the first network call, then drives a [`LabApi`](crate::client::LabApi).
//! Batches of independent requests are sent concurrently and report one
//! [`SubmissionOutcome`] per request; nothing is rolled back when only some of them fail.

pub mod edit;
pub mod registration;
pub mod results;

#[cfg(test)]
pub(crate) mod fake;

pub use edit::PatientEdit;
pub use registration::{Demographics, RegistrationReceipt, RegistrationSession};
pub use results::{ResultInput, ResultsEntry};

use crate::LabResult;
use serde::Serialize;

/// What happened to one request of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    /// Test label as shown to the user.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub(crate) fn from_result(label: String, result: LabResult<()>) -> Self {
        match result {
            Ok(()) => Self { label, error: None },
            Err(e) => {
                tracing::warn!("failed to submit {label}: {e}");
                Self {
                    label,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes that failed, in submission order.
pub fn failures(outcomes: &[SubmissionOutcome]) -> Vec<&SubmissionOutcome> {
    outcomes.iter().filter(|o| !o.is_ok()).collect()
}
