//! Editing a registered patient and the descriptors of their analyses.

use crate::client::{AnalysisUpdate, LabApi, PatientId, PatientRecord, PatientUpdate};
use crate::reconcile::{hydrate, reconstruct_on_save, DisplayAnalysis};
use crate::{LabError, LabResult};
use serde::{Deserialize, Serialize};
use serolab_types::{Gender, NonEmptyText};

/// Editable copy of a patient record.
///
/// Demographics are kept as entered and validated in [`to_update`](Self::to_update), so a
/// half-edited form can be held without losing input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEdit {
    pub patient_id: PatientId,
    pub unique_number: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub analyses: Vec<DisplayAnalysis>,
}

impl PatientEdit {
    pub fn from_record(record: &PatientRecord) -> Self {
        Self {
            patient_id: record.id,
            unique_number: record.unique_number,
            name: record.name.clone(),
            age: record.age,
            gender: record.gender.clone(),
            analyses: hydrate(&record.pathology_analyses),
        }
    }

    /// Append a blank analysis and return its index.
    pub fn add_blank(&mut self) -> usize {
        self.analyses.push(DisplayAnalysis::blank());
        self.analyses.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<DisplayAnalysis> {
        (index < self.analyses.len()).then(|| self.analyses.remove(index))
    }

    pub fn analysis_mut(&mut self, index: usize) -> Option<&mut DisplayAnalysis> {
        self.analyses.get_mut(index)
    }

    /// Build the `PUT /Patient/{id}` body.
    ///
    /// Only rows whose descriptor was edited are validated and re-encoded; the rest are sent
    /// with their stored names.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] for an empty name, an unknown gender code, or an
    /// analysis field containing a reserved descriptor tag.
    pub fn to_update(&self) -> LabResult<PatientUpdate> {
        let name = NonEmptyText::new(&self.name)
            .map_err(|_| LabError::Validation("name is required".into()))?;
        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(|e| LabError::Validation(e.to_string()))?;

        let pathology_analyses = self
            .analyses
            .iter()
            .enumerate()
            .map(|(row, analysis)| {
                let name = reconstruct_on_save(analysis).map_err(|e| match e {
                    LabError::Validation(msg) => {
                        LabError::Validation(format!("analysis {}: {msg}", row + 1))
                    }
                    other => other,
                })?;
                Ok(AnalysisUpdate {
                    id: analysis.id,
                    name,
                    result: analysis.result.clone().unwrap_or_default(),
                })
            })
            .collect::<LabResult<Vec<_>>>()?;

        Ok(PatientUpdate {
            unique_number: self.unique_number,
            name: name.to_string(),
            age: self.age,
            gender,
            pathology_analyses,
        })
    }

    /// Validate and send the edited record.
    pub async fn save<A: LabApi>(&self, api: &A) -> LabResult<()> {
        let update = self.to_update()?;
        api.update_patient(self.patient_id, &update).await?;
        tracing::info!(
            "updated patient {} with {} analyses",
            self.patient_id,
            update.pathology_analyses.len()
        );
        Ok(())
    }
}
