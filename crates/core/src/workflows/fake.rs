//! In-memory [`LabApi`] used by the workflow tests.

use crate::client::{
    AnalysisId, AnalysisRecord, CreatedPatient, Credentials, LabApi, LoginResponse, NewAnalysis,
    NewPatient, PatientId, PatientRecord, PatientUpdate,
};
use crate::{LabError, LabResult};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub(crate) struct FakeState {
    pub patients: Vec<PatientRecord>,
    pub created_patients: Vec<NewPatient>,
    pub created_analyses: Vec<NewAnalysis>,
    pub result_updates: Vec<(AnalysisId, String)>,
    pub patient_updates: Vec<(PatientId, PatientUpdate)>,
    /// Analyses whose encoded name contains this text are rejected with a 500.
    pub fail_analysis_containing: Option<String>,
    /// Result updates for this id are rejected with a 500.
    pub fail_result_for: Option<AnalysisId>,
    /// When set, `create_patient` answers without an id.
    pub omit_patient_id: bool,
    pub calls: usize,
}

#[derive(Default)]
pub(crate) struct FakeLabApi {
    state: Mutex<FakeState>,
}

impl FakeLabApi {
    pub fn with_patient(record: PatientRecord) -> Self {
        let api = Self::default();
        api.state().patients.push(record);
        api
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock")
    }

    fn server_error(message: &str) -> LabError {
        LabError::Api {
            status: 500,
            message: message.to_string(),
        }
    }
}

impl LabApi for FakeLabApi {
    async fn create_patient(&self, patient: &NewPatient) -> LabResult<CreatedPatient> {
        let mut state = self.state();
        state.calls += 1;
        state.created_patients.push(patient.clone());
        if state.omit_patient_id {
            return Ok(CreatedPatient { id: None });
        }
        let id = 100 + state.patients.len() as PatientId;
        state.patients.push(PatientRecord {
            id,
            unique_number: patient.unique_number,
            name: patient.name.clone(),
            age: patient.age,
            gender: patient.gender.code().to_string(),
            created_time: None,
            pathology_analyses: Vec::new(),
        });
        Ok(CreatedPatient { id: Some(id) })
    }

    async fn list_patients(&self) -> LabResult<Vec<PatientRecord>> {
        let mut state = self.state();
        state.calls += 1;
        Ok(state.patients.clone())
    }

    async fn get_patient(&self, id: PatientId) -> LabResult<PatientRecord> {
        let mut state = self.state();
        state.calls += 1;
        state
            .patients
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(LabError::Api {
                status: 404,
                message: "Failed to fetch patient data: Not Found".into(),
            })
    }

    async fn update_patient(&self, id: PatientId, update: &PatientUpdate) -> LabResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.patient_updates.push((id, update.clone()));
        Ok(())
    }

    async fn delete_patient(&self, id: PatientId) -> LabResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.patients.retain(|p| p.id != id);
        Ok(())
    }

    async fn create_analysis(&self, analysis: &NewAnalysis) -> LabResult<()> {
        let mut state = self.state();
        state.calls += 1;
        if let Some(needle) = &state.fail_analysis_containing {
            if analysis.name.contains(needle.as_str()) {
                return Err(Self::server_error("Failed to save analysis"));
            }
        }
        let next_id = state.created_analyses.len() as AnalysisId + 1;
        if let Some(patient) = state
            .patients
            .iter_mut()
            .find(|p| p.id == analysis.patient_id)
        {
            patient.pathology_analyses.push(AnalysisRecord {
                id: next_id,
                name: analysis.name.clone(),
                result: None,
                patient_id: Some(analysis.patient_id),
            });
        }
        state.created_analyses.push(analysis.clone());
        Ok(())
    }

    async fn update_analysis_result(&self, id: AnalysisId, result: &str) -> LabResult<()> {
        let mut state = self.state();
        state.calls += 1;
        if state.fail_result_for == Some(id) {
            return Err(Self::server_error("Failed to update analysis results"));
        }
        state.result_updates.push((id, result.to_string()));
        Ok(())
    }

    async fn register_admin(&self, _credentials: &Credentials) -> LabResult<()> {
        self.state().calls += 1;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> LabResult<LoginResponse> {
        self.state().calls += 1;
        if credentials.password == "secret" {
            Ok(LoginResponse {
                token: "token".into(),
                role: Some("Admin".into()),
            })
        } else {
            Err(LabError::Unauthorized("Invalid credentials".into()))
        }
    }
}
