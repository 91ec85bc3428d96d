//! Results entry for one scanned patient.

use super::SubmissionOutcome;
use crate::client::{AnalysisId, LabApi, PatientId, PatientRecord};
use crate::reconcile::{hydrate, DisplayAnalysis};
use crate::{LabError, LabResult};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

/// A result typed for one analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInput {
    pub analysis_id: AnalysisId,
    pub result: String,
}

/// The flat results-entry table of one patient.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsEntry {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub analyses: Vec<DisplayAnalysis>,
}

impl ResultsEntry {
    pub fn from_record(record: &PatientRecord) -> Self {
        Self {
            patient_id: record.id,
            patient_name: record.name.clone(),
            analyses: hydrate(&record.pathology_analyses),
        }
    }

    /// Fetch the patient and decode its analyses.
    pub async fn load<A: LabApi>(api: &A, patient_id: PatientId) -> LabResult<Self> {
        let record = api.get_patient(patient_id).await?;
        Ok(Self::from_record(&record))
    }

    /// Send every non-blank entered result, one request per analysis, concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] before any request when no result was entered or an id
    /// does not belong to this patient.
    pub async fn save<A: LabApi>(
        &self,
        api: &A,
        entered: &[ResultInput],
    ) -> LabResult<Vec<SubmissionOutcome>> {
        let mut pending = Vec::new();
        for input in entered {
            let result = input.result.trim();
            if result.is_empty() {
                continue;
            }
            let analysis = self
                .analyses
                .iter()
                .find(|a| a.id == input.analysis_id)
                .ok_or_else(|| {
                    LabError::Validation(format!(
                        "analysis {} does not belong to patient {}",
                        input.analysis_id, self.patient_id
                    ))
                })?;
            pending.push((analysis, result));
        }

        if pending.is_empty() {
            return Err(LabError::Validation("no results entered".into()));
        }

        let updates = pending.into_iter().map(|(analysis, result)| async move {
            let outcome = api.update_analysis_result(analysis.id, result).await;
            SubmissionOutcome::from_result(analysis.label(), outcome)
        });
        Ok(join_all(updates).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AnalysisRecord;
    use crate::workflows::fake::FakeLabApi;

    fn patient() -> PatientRecord {
        let analysis = |id, name: &str| AnalysisRecord {
            id,
            name: name.to_string(),
            result: None,
            patient_id: Some(7),
        };
        PatientRecord {
            id: 7,
            unique_number: 4400,
            name: "Yusuf Adel".into(),
            age: 52,
            gender: "M".into(),
            created_time: None,
            pathology_analyses: vec![
                analysis(31, "[CAT]serologyTests[SUB]routineTests[NAME]RF[RANGE]Negative"),
                analysis(32, "[CAT]serologyTests[SUB]routineTests[NAME]VDRL[RANGE]Negative"),
                analysis(33, "[CAT]ifaTests[SUB]autoimmune[NAME]ANA[RANGE]Negative"),
            ],
        }
    }

    fn input(analysis_id: AnalysisId, result: &str) -> ResultInput {
        ResultInput {
            analysis_id,
            result: result.to_string(),
        }
    }

    #[tokio::test]
    async fn load_hydrates_a_flat_list() {
        let api = FakeLabApi::with_patient(patient());
        let entry = ResultsEntry::load(&api, 7).await.expect("patient exists");
        assert_eq!(entry.patient_name, "Yusuf Adel");
        assert_eq!(
            entry.analyses.iter().map(|a| a.label()).collect::<Vec<_>>(),
            vec!["RF", "VDRL", "ANA"]
        );
    }

    #[tokio::test]
    async fn load_surfaces_backend_errors() {
        let api = FakeLabApi::default();
        let err = ResultsEntry::load(&api, 99).await.expect_err("missing");
        assert!(matches!(err, LabError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn save_skips_blank_results() {
        let api = FakeLabApi::with_patient(patient());
        let entry = ResultsEntry::from_record(&patient());

        let outcomes = entry
            .save(&api, &[input(31, " Positive "), input(32, "  ")])
            .await
            .expect("one result entered");

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_ok());
        assert_eq!(api.state().result_updates, vec![(31, "Positive".to_string())]);
    }

    #[tokio::test]
    async fn save_reports_each_failure() {
        let api = FakeLabApi::with_patient(patient());
        api.state().fail_result_for = Some(33);
        let entry = ResultsEntry::from_record(&patient());

        let outcomes = entry
            .save(&api, &[input(31, "1:40"), input(33, "Positive")])
            .await
            .expect("validated");

        let failed = crate::workflows::failures(&outcomes);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].label, "ANA");
        assert_eq!(api.state().result_updates.len(), 1);
    }

    #[tokio::test]
    async fn save_validates_before_sending() {
        let api = FakeLabApi::with_patient(patient());
        let entry = ResultsEntry::from_record(&patient());

        let err = entry.save(&api, &[input(32, "")]).await.expect_err("blank");
        assert!(matches!(err, LabError::Validation(msg) if msg == "no results entered"));

        let err = entry
            .save(&api, &[input(31, "x"), input(500, "y")])
            .await
            .expect_err("foreign id");
        assert!(matches!(err, LabError::Validation(msg) if msg.contains("500")));
        assert_eq!(api.state().calls, 0);
    }
}
