use reqwest::{header, Method, StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{SavedJobRecord, SavedJobsResponse};

const SAVED_JOBS_PATH: &str = "/api/user/saved-jobs";
// Logo probes run inside the browser loop; a slow host must not stall it
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not signed in (session missing or expired)")]
    Unauthorized,
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// The saved-jobs collaborator API as seen by the view.
#[allow(async_fn_in_trait)]
pub trait SavedJobsApi {
    async fn list_saved_jobs(&self) -> Result<Vec<SavedJobRecord>, ApiError>;
    async fn unsave_job(&self, job_id: &str) -> Result<(), ApiError>;
    async fn update_notes(&self, record_id: &str, notes: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct NotesPatch<'a> {
    notes: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    session_cookie: String,
    session_token: String,
}

impl HttpApi {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let session_token = cfg.session_token().ok_or_else(|| {
            anyhow::anyhow!(
                "Not signed in. Sign in on {} and put the '{}' cookie value in the config \
                 (api.session_token) or export {}",
                cfg.api.base_url,
                cfg.api.session_cookie,
                crate::config::SESSION_TOKEN_ENV
            )
        })?;

        let base_url = Url::parse(cfg.api.base_url.trim_end_matches('/'))
            .map_err(|e| anyhow::anyhow!("Invalid api.base_url '{}': {}", cfg.api.base_url, e))?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url,
            session_cookie: cfg.api.session_cookie.clone(),
            session_token: session_token.to_string(),
        })
    }

    fn collection_url(&self) -> Result<Url, ApiError> {
        self.base_url
            .join(SAVED_JOBS_PATH)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    fn unsave_url(&self, job_id: &str) -> Result<Url, ApiError> {
        let mut url = self.collection_url()?;
        url.query_pairs_mut().append_pair("jobId", job_id);
        Ok(url)
    }

    fn record_url(&self, record_id: &str) -> Result<Url, ApiError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .push(record_id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(
                header::COOKIE,
                format!("{}={}", self.session_cookie, self.session_token),
            )
            .header(header::ACCEPT, "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "saved-jobs api response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "saved-jobs api error");
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }

    /// HEAD-checks an image URL. Any failure counts as a broken image.
    pub async fn probe_image(&self, url: &str) -> bool {
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url, error = %e, "logo probe failed");
                false
            }
        }
    }
}

impl SavedJobsApi for HttpApi {
    async fn list_saved_jobs(&self) -> Result<Vec<SavedJobRecord>, ApiError> {
        let url = self.collection_url()?;
        let response = self.send(self.request(Method::GET, url)).await?;
        let body = response.text().await?;
        let parsed: SavedJobsResponse = serde_json::from_str(&body)?;
        Ok(parsed.saved_jobs)
    }

    async fn unsave_job(&self, job_id: &str) -> Result<(), ApiError> {
        let url = self.unsave_url(job_id)?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn update_notes(&self, record_id: &str, notes: &str) -> Result<(), ApiError> {
        let url = self.record_url(record_id)?;
        self.send(self.request(Method::PATCH, url).json(&NotesPatch { notes }))
            .await?;
        Ok(())
    }
}
