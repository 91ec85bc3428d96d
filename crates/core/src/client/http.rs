use super::{
    AnalysisId, CreatedPatient, Credentials, LabApi, LoginResponse, NewAnalysis, NewPatient,
    PatientId, PatientRecord, PatientUpdate, ResultUpdate,
};
use crate::config::CoreConfig;
use crate::token::is_token_expired;
use crate::{LabError, LabResult};
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// [`LabApi`] over HTTP.
///
/// Cloning is cheap (the underlying connection pool is shared), so the gateway derives one
/// client per request with [`with_token`](Self::with_token).
#[derive(Clone, Debug)]
pub struct HttpLabApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpLabApi {
    /// Build a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Network`] if the TLS backend cannot be initialised.
    pub fn new(cfg: &CoreConfig) -> LabResult<Self> {
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .user_agent(concat!("serolab/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.api_base_url().to_string(),
            token: None,
        })
    }

    /// A copy of this client that authenticates with `token`.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, refusing locally when it is absent or expired.
    fn authorised(&self, request: RequestBuilder) -> LabResult<RequestBuilder> {
        match self.token.as_deref() {
            Some(token) if !is_token_expired(Some(token), Utc::now()) => {
                Ok(request.bearer_auth(token))
            }
            Some(_) => Err(LabError::Unauthorized("session token has expired".into())),
            None => Err(LabError::Unauthorized("not logged in".into())),
        }
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> LabResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("{context} failed with {status}: {body}");

        if status == StatusCode::UNAUTHORIZED {
            return Err(LabError::Unauthorized(format!("{context}: backend rejected token")));
        }
        Err(LabError::Api {
            status: status.as_u16(),
            message: format!(
                "{context}: {}",
                status.canonical_reason().unwrap_or("request failed")
            ),
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> LabResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(LabError::Deserialization)
    }
}

impl LabApi for HttpLabApi {
    async fn create_patient(&self, patient: &NewPatient) -> LabResult<CreatedPatient> {
        let url = self.url("/Patient");
        debug!("POST {url}");
        let request = self.authorised(self.client.post(&url).json(patient))?;
        let response = self.send(request, "Failed to save patient").await?;
        Self::json(response).await
    }

    async fn list_patients(&self) -> LabResult<Vec<PatientRecord>> {
        let url = self.url("/Patient");
        debug!("GET {url}");
        let request = self.authorised(self.client.get(&url))?;
        let response = self.send(request, "Failed to fetch patients").await?;
        Self::json(response).await
    }

    async fn get_patient(&self, id: PatientId) -> LabResult<PatientRecord> {
        let url = self.url(&format!("/Patient/{id}"));
        debug!("GET {url}");
        let request = self.authorised(self.client.get(&url))?;
        let response = self.send(request, "Failed to fetch patient data").await?;
        Self::json(response).await
    }

    async fn update_patient(&self, id: PatientId, update: &PatientUpdate) -> LabResult<()> {
        let url = self.url(&format!("/Patient/{id}"));
        debug!("PUT {url}");
        let request = self.authorised(self.client.put(&url).json(update))?;
        self.send(request, "Failed to update patient").await?;
        Ok(())
    }

    async fn delete_patient(&self, id: PatientId) -> LabResult<()> {
        let url = self.url(&format!("/Patient/{id}"));
        debug!("DELETE {url}");
        let request = self.authorised(self.client.delete(&url))?;
        self.send(request, "Failed to delete patient").await?;
        Ok(())
    }

    async fn create_analysis(&self, analysis: &NewAnalysis) -> LabResult<()> {
        let url = self.url("/Pathology_Analyses_");
        debug!("POST {url} ({})", analysis.name);
        let request = self.authorised(self.client.post(&url).json(analysis))?;
        self.send(request, "Failed to save analysis").await?;
        Ok(())
    }

    async fn update_analysis_result(&self, id: AnalysisId, result: &str) -> LabResult<()> {
        let url = self.url(&format!("/Pathology_Analyses_/{id}"));
        debug!("PUT {url}");
        let request =
            self.authorised(self.client.put(&url).json(&ResultUpdate { result }))?;
        self.send(request, "Failed to update analysis results").await?;
        Ok(())
    }

    async fn register_admin(&self, credentials: &Credentials) -> LabResult<()> {
        let url = self.url("/Account");
        debug!("POST {url}");
        let request = self.authorised(self.client.post(&url).json(credentials))?;
        self.send(request, "Failed to register admin").await?;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> LabResult<LoginResponse> {
        let url = self.url("/Account/Login");
        debug!("POST {url}");
        let response = self
            .send(self.client.post(&url).json(credentials), "Invalid credentials")
            .await?;
        Self::json(response).await
    }
}
