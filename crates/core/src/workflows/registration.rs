//! Patient registration: demographics, test selection and batch submission.

use super::SubmissionOutcome;
use crate::catalog::{Catalog, TestPath};
use crate::client::{LabApi, NewAnalysis, NewPatient, PatientId};
use crate::scan::results_url;
use crate::selection::selected_descriptors;
use crate::{LabError, LabResult};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use serolab_types::{Gender, NonEmptyText, TextError};

/// Validated registration form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Demographics {
    pub health_care_no: i64,
    pub name: NonEmptyText,
    pub age: u32,
    pub sex: Gender,
}

impl Demographics {
    /// Validate the raw form fields.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] naming the first empty or malformed field.
    pub fn parse(health_care_no: &str, name: &str, age: &str, sex: &str) -> LabResult<Self> {
        let health_care_no = required("health care number", health_care_no)?;
        let health_care_no = health_care_no
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                LabError::Validation("health care number must be a positive number".into())
            })?;

        let name = NonEmptyText::new(name)
            .map_err(|_| LabError::Validation("name is required".into()))?;

        let age = required("age", age)?
            .parse::<u32>()
            .map_err(|_| LabError::Validation("age must be a whole number".into()))?;

        let sex = sex.parse::<Gender>().map_err(|e| match e {
            TextError::Empty => LabError::Validation("sex is required".into()),
            other => LabError::Validation(other.to_string()),
        })?;

        Ok(Self {
            health_care_no,
            name,
            age,
            sex,
        })
    }

    pub fn to_new_patient(&self, registered_at: DateTime<Utc>) -> NewPatient {
        NewPatient {
            unique_number: self.health_care_no,
            name: self.name.to_string(),
            age: self.age,
            gender: self.sex,
            date_time: registered_at,
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> LabResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LabError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Result of a registration: the new patient and one outcome per submitted analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub patient_id: PatientId,
    /// Payload of the printed barcode.
    pub results_url: String,
    pub outcomes: Vec<SubmissionOutcome>,
}

impl RegistrationReceipt {
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(SubmissionOutcome::is_ok)
    }
}

/// One registration form: a private copy of the catalog plus the user's selection.
#[derive(Clone, Debug)]
pub struct RegistrationSession {
    catalog: Catalog,
}

impl RegistrationSession {
    /// Start a session from the shared template; the template itself is never modified.
    pub fn new(template: &Catalog) -> Self {
        Self {
            catalog: template.clone_for_session(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Flip one test; unknown paths are ignored and return `false`.
    pub fn toggle(&mut self, path: &TestPath) -> bool {
        self.catalog.toggle(path)
    }

    pub fn selected_count(&self) -> usize {
        self.catalog.selected_count()
    }

    /// Create the patient, then submit every selected analysis.
    ///
    /// Analyses are sent concurrently once the patient id is known. A failed analysis does not
    /// abort the others; its error is reported in the receipt.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] before any request when nothing is selected, the
    /// backend error when patient creation fails, and [`LabError::UnexpectedResponse`] when the
    /// backend does not return the new patient's id.
    pub async fn submit<A: LabApi>(
        &self,
        api: &A,
        demographics: &Demographics,
        results_origin: &str,
    ) -> LabResult<RegistrationReceipt> {
        let descriptors = selected_descriptors(&self.catalog);
        if descriptors.is_empty() {
            return Err(LabError::Validation("no tests selected".into()));
        }

        let created = api
            .create_patient(&demographics.to_new_patient(Utc::now()))
            .await?;
        let patient_id = created.id.ok_or_else(|| {
            LabError::UnexpectedResponse("patient created without an id".into())
        })?;
        tracing::info!(
            "registered patient {patient_id}; submitting {} analyses",
            descriptors.len()
        );

        let submissions = descriptors.iter().map(|descriptor| async move {
            let record = NewAnalysis::pending(descriptor, patient_id);
            let result = api.create_analysis(&record).await;
            SubmissionOutcome::from_result(descriptor.display_name(), result)
        });
        let outcomes = join_all(submissions).await;

        Ok(RegistrationReceipt {
            patient_id,
            results_url: results_url(results_origin, patient_id),
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use crate::workflows::fake::FakeLabApi;

    fn demographics() -> Demographics {
        Demographics::parse("123456", " Huda Karim ", "31", "f").expect("valid form")
    }

    fn path(s: &str) -> TestPath {
        s.parse().expect("valid path")
    }

    #[test]
    fn parse_trims_and_converts_fields() {
        let d = demographics();
        assert_eq!(d.health_care_no, 123456);
        assert_eq!(d.name.as_str(), "Huda Karim");
        assert_eq!(d.age, 31);
        assert_eq!(d.sex, Gender::Female);
    }

    #[test]
    fn parse_rejects_missing_or_malformed_fields() {
        let cases = [
            (("", "A", "1", "M"), "health care number is required"),
            (("12a", "A", "1", "M"), "positive number"),
            (("12", "  ", "1", "M"), "name is required"),
            (("12", "A", "", "M"), "age is required"),
            (("12", "A", "old", "M"), "whole number"),
            (("12", "A", "1", ""), "sex is required"),
            (("12", "A", "1", "X"), "'X'"),
        ];
        for ((no, name, age, sex), expected) in cases {
            let err = Demographics::parse(no, name, age, sex).expect_err(expected);
            assert!(
                matches!(&err, LabError::Validation(msg) if msg.contains(expected)),
                "{err} should mention {expected}"
            );
        }
    }

    #[test]
    fn sessions_never_touch_the_template() {
        let template = Catalog::standard();
        let mut a = RegistrationSession::new(&template);
        let b = RegistrationSession::new(&template);

        assert!(a.toggle(&path("elisaTests/hepatitisMarkers/hbsAg")));
        assert_eq!(a.selected_count(), 1);
        assert_eq!(b.selected_count(), 0);
        assert_eq!(template.selected_count(), 0);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_before_any_request() {
        let api = FakeLabApi::default();
        let session = RegistrationSession::new(&Catalog::standard());

        let err = session
            .submit(&api, &demographics(), "http://front")
            .await
            .expect_err("nothing selected");
        assert!(matches!(err, LabError::Validation(msg) if msg == "no tests selected"));
        assert_eq!(api.state().calls, 0);
    }

    #[tokio::test]
    async fn submit_creates_patient_then_all_analyses() {
        let api = FakeLabApi::default();
        let mut session = RegistrationSession::new(&Catalog::standard());
        session.toggle(&path("elisaTests/viralMarkers/havAb/igm"));
        session.toggle(&path("serologyTests/routineTests/widalTest/salmonellaTyphi.aH"));

        let receipt = session
            .submit(&api, &demographics(), "http://front/")
            .await
            .expect("registration succeeds");

        assert_eq!(receipt.patient_id, 100);
        assert_eq!(receipt.results_url, "http://front/test-results/100");
        assert!(receipt.is_complete());
        assert_eq!(receipt.outcomes.len(), 2);

        let state = api.state();
        assert_eq!(state.created_patients[0].unique_number, 123456);
        assert_eq!(state.created_patients[0].gender, Gender::Female);

        let mut names: Vec<Descriptor> = state
            .created_analyses
            .iter()
            .inspect(|a| assert_eq!(a.patient_id, 100))
            .map(|a| Descriptor::decode(&a.name))
            .collect();
        names.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(names[0].test_type, "HAV Ab - IgM");
        assert_eq!(names[1].test_type, "Salmonella Typhi A-H");
    }

    #[tokio::test]
    async fn partial_failures_are_reported_per_analysis() {
        let api = FakeLabApi::default();
        api.state().fail_analysis_containing = Some("[NAME]HCV".into());

        let mut session = RegistrationSession::new(&Catalog::standard());
        session.toggle(&path("elisaTests/viralMarkers/hcv"));
        session.toggle(&path("elisaTests/viralMarkers/hiv"));

        let receipt = session
            .submit(&api, &demographics(), "http://front")
            .await
            .expect("patient is still registered");

        assert!(!receipt.is_complete());
        let failed = crate::workflows::failures(&receipt.outcomes);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].label, "HCV");
        assert_eq!(api.state().created_analyses.len(), 1);
    }

    #[tokio::test]
    async fn missing_patient_id_stops_before_analyses() {
        let api = FakeLabApi::default();
        api.state().omit_patient_id = true;

        let mut session = RegistrationSession::new(&Catalog::standard());
        session.toggle(&path("ihaTests/parasites/amoeba"));

        let err = session
            .submit(&api, &demographics(), "http://front")
            .await
            .expect_err("no id");
        assert!(matches!(err, LabError::UnexpectedResponse(_)));
        assert!(api.state().created_analyses.is_empty());
    }
}
