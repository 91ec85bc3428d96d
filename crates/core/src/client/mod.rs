//! Client side of the lab backend REST API.
//!
//! [`LabApi`] is the seam between the workflows and the network: [`HttpLabApi`] talks to the real
//! backend, tests substitute in-memory fakes.

mod http;
mod wire;

pub use http::HttpLabApi;
pub use wire::{
    AnalysisId, AnalysisRecord, AnalysisUpdate, CreatedPatient, Credentials, LoginResponse,
    NewAnalysis, NewPatient, PatientId, PatientRecord, PatientUpdate, ResultUpdate,
};

use crate::LabResult;
use std::future::Future;

/// Operations the front-end performs against the lab backend.
///
/// Every method except [`login`](LabApi::login) is an authenticated call.
pub trait LabApi: Send + Sync {
    /// `POST /Patient`
    fn create_patient(
        &self,
        patient: &NewPatient,
    ) -> impl Future<Output = LabResult<CreatedPatient>> + Send;

    /// `GET /Patient`
    fn list_patients(&self) -> impl Future<Output = LabResult<Vec<PatientRecord>>> + Send;

    /// `GET /Patient/{id}`
    fn get_patient(&self, id: PatientId)
        -> impl Future<Output = LabResult<PatientRecord>> + Send;

    /// `PUT /Patient/{id}`
    fn update_patient(
        &self,
        id: PatientId,
        update: &PatientUpdate,
    ) -> impl Future<Output = LabResult<()>> + Send;

    /// `DELETE /Patient/{id}`
    fn delete_patient(&self, id: PatientId) -> impl Future<Output = LabResult<()>> + Send;

    /// `POST /Pathology_Analyses_`
    fn create_analysis(&self, analysis: &NewAnalysis)
        -> impl Future<Output = LabResult<()>> + Send;

    /// `PUT /Pathology_Analyses_/{id}`
    fn update_analysis_result(
        &self,
        id: AnalysisId,
        result: &str,
    ) -> impl Future<Output = LabResult<()>> + Send;

    /// `POST /Account`
    fn register_admin(&self, credentials: &Credentials)
        -> impl Future<Output = LabResult<()>> + Send;

    /// `POST /Account/Login`
    fn login(&self, credentials: &Credentials)
        -> impl Future<Output = LabResult<LoginResponse>> + Send;
}
