//! # API REST
//!
//! JSON gateway over the serolab workflows.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Forwarding the caller's bearer token to the lab backend
//! - Mapping core errors to HTTP statuses
//!
//! The gateway keeps no per-user state: each request carries its token and, for registration,
//! the full list of selected tests.

#![warn(rust_2018_idioms)]

use api_shared::{
    bearer_token, CatalogRes, CredentialsReq, ErrorRes, HealthRes, HealthService,
    ListPatientsRes, LoginRes, PatientSearchQuery, PatientSummary, RegistrationReq,
    RegistrationRes, ReportRes, ResultsRes, SaveResultsReq, SaveResultsRes, ScanQuery, ScanRes,
    UpdatePatientReq,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serolab_core::client::Credentials;
use serolab_core::{
    filter_patients, parse_scanned_id, results_path, Catalog, CoreConfig, Demographics,
    DisplayAnalysis, HttpLabApi, LabApi, LabError, LabResult, PatientEdit, PatientId,
    PatientReport, RegistrationSession, ResultInput, ResultsEntry, TestPath,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Holds the resolved configuration, the shared catalog template and an unauthenticated backend
/// client from which per-request clients are derived.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    catalog: Arc<Catalog>,
    api: HttpLabApi,
}

impl AppState {
    /// Build the state from configuration, loading the catalog template once.
    pub fn new(cfg: CoreConfig) -> LabResult<Self> {
        let catalog = cfg.load_catalog()?;
        let api = HttpLabApi::new(&cfg)?;
        Ok(Self {
            cfg: Arc::new(cfg),
            catalog: Arc::new(catalog),
            api,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        catalog,
        login,
        create_account,
        list_patients,
        register,
        get_results,
        save_results,
        update_patient,
        delete_patient,
        report,
        scan,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        CatalogRes,
        api_shared::CatalogCategoryDto,
        api_shared::CatalogSubCategoryDto,
        api_shared::CatalogTestDto,
        api_shared::CatalogLeafDto,
        CredentialsReq,
        LoginRes,
        PatientSummary,
        ListPatientsRes,
        RegistrationReq,
        RegistrationRes,
        api_shared::OutcomeDto,
        api_shared::AnalysisDto,
        ResultsRes,
        api_shared::ResultDto,
        SaveResultsReq,
        SaveResultsRes,
        UpdatePatientReq,
        ReportRes,
        api_shared::ReportCategoryDto,
        api_shared::ReportSubCategoryDto,
        api_shared::ReportTestDto,
        api_shared::ReportRowDto,
        ScanRes,
    ))
)]
pub struct ApiDoc;

/// Build the gateway router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(catalog))
        .route("/login", post(login))
        .route("/accounts", post(create_account))
        .route("/patients", get(list_patients))
        .route("/registrations", post(register))
        .route("/patients/:id", put(update_patient).delete(delete_patient))
        .route("/patients/:id/results", get(get_results).put(save_results))
        .route("/patients/:id/report", get(report))
        .route("/scan", get(scan))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type HandlerError = (StatusCode, Json<ErrorRes>);

/// HTTP status for a core error.
///
/// Backend failures become gateway errors; the backend's own status is reported in the body.
pub fn status_for(err: &LabError) -> StatusCode {
    match err {
        LabError::Validation(_) => StatusCode::BAD_REQUEST,
        LabError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        LabError::Network(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        LabError::Api { .. } | LabError::Network(_) | LabError::UnexpectedResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(context: &str, err: LabError) -> HandlerError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{context} error: {:?}", err);
    } else {
        tracing::debug!("{context} rejected: {err}");
    }
    let upstream_status = match &err {
        LabError::Api { status, .. } => Some(*status),
        _ => None,
    };
    (
        status,
        Json(ErrorRes {
            error: err.to_string(),
            upstream_status,
            requires_login: err.requires_login(),
        }),
    )
}

/// Backend client authenticated with the caller's bearer token.
fn api_for(state: &AppState, headers: &HeaderMap) -> Result<HttpLabApi, HandlerError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    match bearer_token(header) {
        Ok(token) => Ok(state.api.with_token(token)),
        Err(e) => Err(fail("Authorization", LabError::Unauthorized(e.to_string()))),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks; never contacts the backend.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/catalog",
    responses(
        (status = 200, description = "Selectable tests with their paths", body = CatalogRes)
    )
)]
/// The test catalog offered on the registration form.
#[axum::debug_handler]
async fn catalog(State(state): State<AppState>) -> Json<CatalogRes> {
    Json(CatalogRes::from(state.catalog.as_ref()))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsReq,
    responses(
        (status = 200, description = "Backend token", body = LoginRes),
        (status = 401, description = "Invalid credentials", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Log in against the backend and return its token.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsReq>,
) -> Result<Json<LoginRes>, HandlerError> {
    let credentials = Credentials {
        email: req.email,
        password: req.password,
    };
    match state.api.login(&credentials).await {
        Ok(res) => Ok(Json(LoginRes {
            token: res.token,
            role: res.role,
        })),
        Err(e) => Err(fail("Login", e)),
    }
}

#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CredentialsReq,
    responses(
        (status = 201, description = "Admin account registered"),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Register an additional admin account.
#[axum::debug_handler]
async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CredentialsReq>,
) -> Result<StatusCode, HandlerError> {
    let api = api_for(&state, &headers)?;
    let credentials = Credentials {
        email: req.email,
        password: req.password,
    };
    api.register_admin(&credentials)
        .await
        .map_err(|e| fail("Register admin", e))?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/patients",
    params(
        ("search" = Option<String>, Query, description = "Unique-number or case-insensitive name fragment")
    ),
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// List registered patients, optionally narrowed by `search`.
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<ListPatientsRes>, HandlerError> {
    let api = api_for(&state, &headers)?;
    match api.list_patients().await {
        Ok(records) => Ok(Json(ListPatientsRes {
            patients: filter_patients(&records, query.search.as_deref().unwrap_or_default())
                .into_iter()
                .map(PatientSummary::from)
                .collect(),
        })),
        Err(e) => Err(fail("List patients", e)),
    }
}

#[utoipa::path(
    post,
    path = "/registrations",
    request_body = RegistrationReq,
    responses(
        (status = 201, description = "Patient registered; per-test outcomes", body = RegistrationRes),
        (status = 400, description = "Invalid form or no tests selected", body = ErrorRes),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Register a patient with the selected tests
///
/// The form and test paths are validated before any backend call. Analyses are submitted once
/// the patient exists; failures of individual analyses are reported in `outcomes` and do not
/// fail the request.
#[axum::debug_handler]
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegistrationReq>,
) -> Result<(StatusCode, Json<RegistrationRes>), HandlerError> {
    let api = api_for(&state, &headers)?;
    let demographics = Demographics::parse(&req.health_care_no, &req.name, &req.age, &req.sex)
        .map_err(|e| fail("Registration", e))?;

    let mut session = RegistrationSession::new(&state.catalog);
    for raw in &req.tests {
        let path = raw
            .parse::<TestPath>()
            .map_err(|e| fail("Registration", LabError::Validation(e.to_string())))?;
        if session.catalog().is_selected(&path) {
            continue;
        }
        if !session.toggle(&path) {
            return Err(fail(
                "Registration",
                LabError::Validation(format!("unknown test '{raw}'")),
            ));
        }
    }

    let receipt = session
        .submit(&api, &demographics, state.cfg.results_origin())
        .await
        .map_err(|e| fail("Registration", e))?;
    Ok((StatusCode::CREATED, Json(RegistrationRes::from(&receipt))))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/results",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Analyses for results entry", body = ResultsRes),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Load the flat results-entry table of a patient.
#[axum::debug_handler]
async fn get_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<PatientId>,
) -> Result<Json<ResultsRes>, HandlerError> {
    let api = api_for(&state, &headers)?;
    match ResultsEntry::load(&api, id).await {
        Ok(entry) => Ok(Json(ResultsRes::from(&entry))),
        Err(e) => Err(fail("Load results", e)),
    }
}

#[utoipa::path(
    put,
    path = "/patients/{id}/results",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = SaveResultsReq,
    responses(
        (status = 200, description = "Per-analysis outcomes", body = SaveResultsRes),
        (status = 400, description = "No results or unknown analysis", body = ErrorRes),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Save entered results; blank results are skipped.
#[axum::debug_handler]
async fn save_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<PatientId>,
    Json(req): Json<SaveResultsReq>,
) -> Result<Json<SaveResultsRes>, HandlerError> {
    let api = api_for(&state, &headers)?;
    let entry = ResultsEntry::load(&api, id)
        .await
        .map_err(|e| fail("Save results", e))?;

    let entered: Vec<ResultInput> = req
        .results
        .into_iter()
        .map(|r| ResultInput {
            analysis_id: r.analysis_id,
            result: r.result,
        })
        .collect();

    let outcomes = entry
        .save(&api, &entered)
        .await
        .map_err(|e| fail("Save results", e))?;
    Ok(Json(SaveResultsRes::from(outcomes.as_slice())))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = UpdatePatientReq,
    responses(
        (status = 204, description = "Patient updated"),
        (status = 400, description = "Invalid demographics or reserved tag in a field", body = ErrorRes),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Replace a patient's demographics and analysis descriptors.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<PatientId>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<StatusCode, HandlerError> {
    let api = api_for(&state, &headers)?;
    let edit = PatientEdit {
        patient_id: id,
        unique_number: req.unique_number,
        name: req.name,
        age: req.age,
        gender: req.gender,
        analyses: req.analyses.into_iter().map(DisplayAnalysis::from).collect(),
    };
    edit.save(&api)
        .await
        .map_err(|e| fail("Update patient", e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Delete a patient and their analyses.
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<PatientId>,
) -> Result<StatusCode, HandlerError> {
    let api = api_for(&state, &headers)?;
    match api.delete_patient(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(fail("Delete patient", e)),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{id}/report",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Grouped report with printable text", body = ReportRes),
        (status = 401, description = "Missing or expired token", body = ErrorRes),
        (status = 502, description = "Backend error", body = ErrorRes)
    )
)]
/// Patient details with analyses grouped by category, sub-category and test.
#[axum::debug_handler]
async fn report(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<PatientId>,
) -> Result<Json<ReportRes>, HandlerError> {
    let api = api_for(&state, &headers)?;
    match api.get_patient(id).await {
        Ok(record) => Ok(Json(ReportRes::from(&PatientReport::from_record(&record)))),
        Err(e) => Err(fail("Patient report", e)),
    }
}

#[utoipa::path(
    get,
    path = "/scan",
    params(("code" = String, Query, description = "Scanned barcode text or typed patient id")),
    responses(
        (status = 200, description = "Patient id carried by the code", body = ScanRes),
        (status = 400, description = "Empty or invalid code", body = ErrorRes)
    )
)]
/// Resolve scanner or keyboard input to a patient id.
#[axum::debug_handler]
async fn scan(
    State(_state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanRes>, HandlerError> {
    match parse_scanned_id(&query.code) {
        Ok(patient_id) => Ok(Json(ScanRes {
            patient_id,
            results_path: results_path(patient_id),
        })),
        Err(e) => Err(fail("Scan", e)),
    }
}
