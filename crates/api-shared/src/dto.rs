//! Gateway request and response bodies.
//!
//! Bodies are camelCase JSON. Responses are built from core types through the `From` impls at
//! the bottom of this module so handlers stay thin.

use serde::{Deserialize, Serialize};
use serolab_core::catalog::{Catalog, CatalogNode};
use serolab_core::client::PatientRecord;
use serolab_core::{
    display_label, Descriptor, DisplayAnalysis, PatientReport, RegistrationReceipt, ReportRow,
    ResultsEntry, SubmissionOutcome, TestPath,
};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body of every failed request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRes {
    pub error: String,
    /// Status returned by the lab backend, when the failure came from it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    /// Whether the caller must log in again.
    pub requires_login: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CredentialsReq {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub token: String,
    pub role: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: i64,
    pub unique_number: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub created_time: Option<String>,
    pub analysis_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientSummary>,
}

/// Registration form. Fields arrive as typed by the user and are validated by the gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReq {
    pub health_care_no: String,
    pub name: String,
    pub age: String,
    pub sex: String,
    /// Selected tests as `category/subCategory/test[/variant]` paths.
    pub tests: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeDto {
    pub label: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRes {
    pub patient_id: i64,
    /// Barcode payload.
    pub results_url: String,
    pub complete: bool,
    pub outcomes: Vec<OutcomeDto>,
}

/// One analysis with its decoded descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub test_type: String,
    #[serde(default)]
    pub normal_range: String,
    #[serde(default)]
    pub result: Option<String>,
    /// Name as stored by the backend; echo it back so untouched rows are saved unchanged.
    #[serde(default)]
    pub encoded_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsRes {
    pub patient_id: i64,
    pub patient_name: String,
    pub analyses: Vec<AnalysisDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultDto {
    pub analysis_id: i64,
    pub result: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaveResultsReq {
    pub results: Vec<ResultDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultsRes {
    pub complete: bool,
    pub outcomes: Vec<OutcomeDto>,
}

/// Full replacement of a patient's demographics and analyses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientReq {
    pub unique_number: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub analyses: Vec<AnalysisDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRowDto {
    pub test: String,
    pub result: String,
    pub normal_range: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportTestDto {
    pub name: String,
    pub rows: Vec<ReportRowDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportSubCategoryDto {
    pub key: String,
    pub label: String,
    pub tests: Vec<ReportTestDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportCategoryDto {
    pub key: String,
    pub label: String,
    pub sub_categories: Vec<ReportSubCategoryDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportRes {
    pub patient: PatientSummary,
    pub groups: Vec<ReportCategoryDto>,
    pub rows: Vec<ReportRowDto>,
    /// Plain-text rendering for printing.
    pub text: String,
}

/// Query string of `GET /patients`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    /// Unique-number or name fragment; absent or blank lists everyone.
    #[serde(default)]
    pub search: Option<String>,
}

/// Query string of `GET /scan`; a missing code is treated as blank input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanQuery {
    #[serde(default)]
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanRes {
    pub patient_id: i64,
    pub results_path: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogLeafDto {
    /// Path to send back in [`RegistrationReq::tests`].
    pub path: String,
    pub name: String,
    pub normal_range: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogTestDto {
    pub key: String,
    pub kind: String,
    pub leaves: Vec<CatalogLeafDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogSubCategoryDto {
    pub key: String,
    pub label: String,
    pub tests: Vec<CatalogTestDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCategoryDto {
    pub key: String,
    pub label: String,
    pub sub_categories: Vec<CatalogSubCategoryDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogRes {
    pub categories: Vec<CatalogCategoryDto>,
}

impl From<&PatientRecord> for PatientSummary {
    fn from(record: &PatientRecord) -> Self {
        Self {
            id: record.id,
            unique_number: record.unique_number,
            name: record.name.clone(),
            age: record.age,
            gender: record.gender.clone(),
            created_time: record.created_time.clone(),
            analysis_count: record.pathology_analyses.len(),
        }
    }
}

impl From<&SubmissionOutcome> for OutcomeDto {
    fn from(outcome: &SubmissionOutcome) -> Self {
        Self {
            label: outcome.label.clone(),
            ok: outcome.is_ok(),
            error: outcome.error.clone(),
        }
    }
}

impl From<&RegistrationReceipt> for RegistrationRes {
    fn from(receipt: &RegistrationReceipt) -> Self {
        Self {
            patient_id: receipt.patient_id,
            results_url: receipt.results_url.clone(),
            complete: receipt.is_complete(),
            outcomes: receipt.outcomes.iter().map(OutcomeDto::from).collect(),
        }
    }
}

impl From<&[SubmissionOutcome]> for SaveResultsRes {
    fn from(outcomes: &[SubmissionOutcome]) -> Self {
        Self {
            complete: outcomes.iter().all(SubmissionOutcome::is_ok),
            outcomes: outcomes.iter().map(OutcomeDto::from).collect(),
        }
    }
}

impl From<&DisplayAnalysis> for AnalysisDto {
    fn from(analysis: &DisplayAnalysis) -> Self {
        let d = &analysis.descriptor;
        Self {
            id: analysis.id,
            category: d.category.clone(),
            sub_category: d.sub_category.clone(),
            name: d.name.clone(),
            test_type: d.test_type.clone(),
            normal_range: d.normal_range.clone(),
            result: analysis.result.clone(),
            encoded_name: analysis.encoded_name.clone(),
        }
    }
}

impl From<AnalysisDto> for DisplayAnalysis {
    fn from(dto: AnalysisDto) -> Self {
        let descriptor = Descriptor::new(
            dto.category,
            dto.sub_category,
            dto.name,
            dto.test_type,
            dto.normal_range,
        );
        Self {
            id: dto.id,
            result: dto.result,
            descriptor,
            encoded_name: dto.encoded_name,
        }
    }
}

impl From<&ResultsEntry> for ResultsRes {
    fn from(entry: &ResultsEntry) -> Self {
        Self {
            patient_id: entry.patient_id,
            patient_name: entry.patient_name.clone(),
            analyses: entry.analyses.iter().map(AnalysisDto::from).collect(),
        }
    }
}

impl From<&ReportRow> for ReportRowDto {
    fn from(row: &ReportRow) -> Self {
        Self {
            test: row.test.clone(),
            result: row.result.clone(),
            normal_range: row.normal_range.clone(),
        }
    }
}

impl From<&PatientReport> for ReportRes {
    fn from(report: &PatientReport) -> Self {
        let groups = report
            .groups
            .iter()
            .map(|(category, subs)| ReportCategoryDto {
                key: category.to_string(),
                label: display_label(category),
                sub_categories: subs
                    .iter()
                    .map(|(sub_category, tests)| ReportSubCategoryDto {
                        key: sub_category.to_string(),
                        label: display_label(sub_category),
                        tests: tests
                            .iter()
                            .map(|(name, analyses)| ReportTestDto {
                                name: name.to_string(),
                                rows: analyses
                                    .iter()
                                    .map(|a| ReportRowDto::from(&ReportRow::from(a)))
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            patient: PatientSummary {
                id: report.patient_id,
                unique_number: report.unique_number,
                name: report.name.clone(),
                age: report.age,
                gender: report.gender.clone(),
                created_time: report.created_time.clone(),
                analysis_count: report.rows.len(),
            },
            groups,
            rows: report.rows.iter().map(ReportRowDto::from).collect(),
            text: report.render_text(),
        }
    }
}

fn node_kind(node: &CatalogNode) -> &'static str {
    match node {
        CatalogNode::Simple(_) => "simple",
        CatalogNode::IgPair { .. } => "igPair",
        CatalogNode::WidalPanel { .. } => "widalPanel",
        CatalogNode::BrucellaPanel { .. } => "brucellaPanel",
    }
}

impl From<&Catalog> for CatalogRes {
    fn from(catalog: &Catalog) -> Self {
        let categories = catalog
            .categories()
            .iter()
            .map(|(category, cat)| CatalogCategoryDto {
                key: category.to_string(),
                label: display_label(category),
                sub_categories: cat
                    .sub_categories
                    .iter()
                    .map(|(sub_category, sub)| CatalogSubCategoryDto {
                        key: sub_category.to_string(),
                        label: display_label(sub_category),
                        tests: sub
                            .tests
                            .iter()
                            .map(|(test, node)| CatalogTestDto {
                                key: test.to_string(),
                                kind: node_kind(node).to_string(),
                                leaves: node
                                    .leaves()
                                    .into_iter()
                                    .map(|(variant, leaf)| CatalogLeafDto {
                                        path: TestPath::new(
                                            category,
                                            sub_category,
                                            test,
                                            variant.as_deref(),
                                        )
                                        .to_string(),
                                        name: leaf.name.clone(),
                                        normal_range: leaf.normal_range.clone(),
                                    })
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_leaf_path() {
        let catalog = Catalog::standard();
        let res = CatalogRes::from(&catalog);
        let paths: Vec<String> = res
            .categories
            .iter()
            .flat_map(|c| &c.sub_categories)
            .flat_map(|s| &s.tests)
            .flat_map(|t| &t.leaves)
            .map(|l| l.path.clone())
            .collect();

        let expected: Vec<String> = catalog.leaf_paths().iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, expected);
        assert_eq!(res.categories[0].label, "Serology Tests");
    }

    #[test]
    fn analysis_dto_uses_type_key_and_reencodes() {
        let dto: AnalysisDto = serde_json::from_value(serde_json::json!({
            "id": 0,
            "name": "CRP",
            "type": "Quantitative",
            "normalRange": "< 6 mg/L"
        }))
        .expect("partial body");
        let analysis = DisplayAnalysis::from(dto);
        assert_eq!(analysis.encoded_name, "");
        assert_eq!(
            serolab_core::reconstruct_on_save(&analysis).unwrap(),
            "[CAT][SUB][NAME]CRP[TYPE]Quantitative[RANGE]< 6 mg/L"
        );
        assert_eq!(
            serde_json::to_value(AnalysisDto::from(&analysis)).unwrap()["type"],
            "Quantitative"
        );
    }

    #[test]
    fn error_body_omits_absent_upstream_status() {
        let body = ErrorRes {
            error: "invalid input: no tests selected".into(),
            upstream_status: None,
            requires_login: false,
        };
        let json = serde_json::to_value(body).unwrap();
        assert!(json.get("upstreamStatus").is_none());
        assert_eq!(json["requiresLogin"], false);
    }
}
