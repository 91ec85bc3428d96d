//! Request and response bodies of the lab backend REST API.
//!
//! The backend answers with PascalCase keys (`UniqNumber`, `AnalysisName`, ...) and accepts
//! camelCase request bodies; the serde attributes below pin both conventions.

use crate::descriptor::Descriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serolab_types::Gender;

/// Backend-assigned patient identifier.
pub type PatientId = i64;

/// Backend-assigned analysis identifier. `0` marks an analysis not yet persisted.
pub type AnalysisId = i64;

/// `POST /Patient` body.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub unique_number: i64,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub date_time: DateTime<Utc>,
}

/// `POST /Patient` response; only the generated id is used.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CreatedPatient {
    #[serde(rename = "ID", alias = "Id", alias = "id", default)]
    pub id: Option<PatientId>,
}

/// `POST /Pathology_Analyses_` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnalysis {
    /// Encoded descriptor.
    pub name: String,
    #[serde(rename = "patientID")]
    pub patient_id: PatientId,
    pub result: Option<String>,
}

impl NewAnalysis {
    /// A record awaiting its result.
    pub fn pending(descriptor: &Descriptor, patient_id: PatientId) -> Self {
        Self {
            name: descriptor.encode(),
            patient_id,
            result: None,
        }
    }
}

/// One analysis as returned inside a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "Id", alias = "ID", alias = "id")]
    pub id: AnalysisId,
    #[serde(rename = "AnalysisName", alias = "name", default)]
    pub name: String,
    #[serde(rename = "Result", alias = "result", default)]
    pub result: Option<String>,
    #[serde(
        rename = "PatientId",
        alias = "patientID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_id: Option<PatientId>,
}

/// A patient as returned by `GET /Patient` and `GET /Patient/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "ID", alias = "Id", alias = "id")]
    pub id: PatientId,
    #[serde(rename = "UniqNumber", alias = "uniqueNumber", default)]
    pub unique_number: i64,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(rename = "Age", alias = "age", default)]
    pub age: u32,
    /// Kept as text: historical records are not guaranteed to carry a valid code.
    #[serde(rename = "Gender", alias = "gender", default)]
    pub gender: String,
    #[serde(
        rename = "CreatedTime",
        alias = "dateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<String>,
    #[serde(rename = "PathologyAnalyses", alias = "pathologyAnalyses", default)]
    pub pathology_analyses: Vec<AnalysisRecord>,
}

/// One analysis inside a `PUT /Patient/{id}` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisUpdate {
    pub id: AnalysisId,
    pub name: String,
    pub result: String,
}

/// `PUT /Patient/{id}` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    pub unique_number: i64,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub pathology_analyses: Vec<AnalysisUpdate>,
}

/// `PUT /Pathology_Analyses_/{id}` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultUpdate<'a> {
    pub result: &'a str,
}

/// `POST /Account` and `POST /Account/Login` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// `POST /Account/Login` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "Token")]
    pub token: String,
    #[serde(alias = "Role", default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_record_reads_backend_casing() {
        let json = r#"{
            "ID": 12,
            "UniqNumber": 99001,
            "Name": "Amal Haddad",
            "Age": 34,
            "Gender": "F",
            "CreatedTime": "2024-05-01T09:30:00Z",
            "PathologyAnalyses": [
                {"Id": 5, "AnalysisName": "[CAT]c[SUB]s[NAME]HCV[RANGE]Negative", "Result": null, "PatientId": 12}
            ]
        }"#;
        let record: PatientRecord = serde_json::from_str(json).expect("backend shape");
        assert_eq!(record.id, 12);
        assert_eq!(record.unique_number, 99001);
        assert_eq!(record.pathology_analyses.len(), 1);
        assert_eq!(record.pathology_analyses[0].id, 5);
        assert_eq!(record.pathology_analyses[0].result, None);
    }

    #[test]
    fn patient_record_tolerates_missing_analyses() {
        let record: PatientRecord = serde_json::from_str(r#"{"Id": 3, "Name": "X"}"#).unwrap();
        assert!(record.pathology_analyses.is_empty());
        assert_eq!(record.gender, "");
    }

    #[test]
    fn new_analysis_uses_backend_field_names() {
        let d = Descriptor::new("c", "s", "HCV", "", "Negative");
        let json = serde_json::to_value(NewAnalysis::pending(&d, 9)).unwrap();
        assert_eq!(json["patientID"], 9);
        assert_eq!(json["name"], "[CAT]c[SUB]s[NAME]HCV[RANGE]Negative");
        assert!(json["result"].is_null());
    }

    #[test]
    fn new_patient_serialises_camel_case() {
        let body = NewPatient {
            unique_number: 1001,
            name: "Omar".into(),
            age: 40,
            gender: Gender::Male,
            date_time: DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["uniqueNumber"], 1001);
        assert_eq!(json["gender"], "M");
        assert_eq!(json["dateTime"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn created_patient_accepts_id_variants() {
        let a: CreatedPatient = serde_json::from_str(r#"{"ID": 4}"#).unwrap();
        let b: CreatedPatient = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        let none: CreatedPatient = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(a.id, Some(4));
        assert_eq!(b.id, Some(4));
        assert_eq!(none.id, None);
    }
}
