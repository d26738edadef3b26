use std::time::Duration;

use docqa_logging::{docqa_debug, docqa_warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::types::QueryRequest;
use crate::{ApiError, FailureKind, HealthResponse, IngestResponse, QueryResponse, UploadFile};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit; answers can take a while to generate.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// The three backend endpoints the client consumes.
#[async_trait::async_trait]
pub trait DocQaApi: Send + Sync {
    async fn ingest(&self, files: &[UploadFile]) -> Result<IngestResponse, ApiError>;

    async fn health(&self) -> Result<HealthResponse, ApiError>;

    async fn query(&self, query: &str) -> Result<QueryResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    base_url: reqwest::Url,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base_url = reqwest::Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        reqwest::Url::parse(&raw).map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl DocQaApi for ReqwestApi {
    async fn ingest(&self, files: &[UploadFile]) -> Result<IngestResponse, ApiError> {
        let mut form = Form::new();
        for file in files {
            let bytes = tokio::fs::read(&file.path).await.map_err(|err| {
                ApiError::new(
                    FailureKind::Io,
                    format!("{}: {}", file.path.display(), err),
                )
            })?;
            docqa_debug!("Attaching {} ({} bytes)", file.name, bytes.len());
            form = form.part("files", Part::bytes(bytes).file_name(file.name.clone()));
        }

        let response = self
            .client
            .post(self.endpoint("/ingest")?)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/health")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn query(&self, query: &str) -> Result<QueryResponse, ApiError> {
        let body = serde_json::to_vec(&QueryRequest { query })
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint("/query")?)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        docqa_warn!("{} answered {}", response.url(), status);
        return Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
