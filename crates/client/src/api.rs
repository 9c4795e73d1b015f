//! Typed client for the backend REST surface, reached through the gateway's
//! proxy prefix.
//!
//! One operation per backend capability. Every call attaches
//! `Authorization: Bearer <token>` when the token store holds one (never an
//! empty header), and non-success responses are normalized by extracting the
//! `detail` field from the JSON body, falling back to a generic
//! `Error <status>` message.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowbase_core::auth::{AuthRequest, AuthResponse};
use flowbase_core::envelope::ErrorEnvelope;
use flowbase_core::job::{Job, JobList, JobStatus, RetryAccepted};

use crate::token::{TokenStore, TokenStoreError};

/// Errors from the job API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend (or the gateway, at 502) returned a non-2xx status.
    /// `message` is the extracted `detail`, or `Error <status>`.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Normalized human-readable message.
        message: String,
    },

    /// Persisting a downloaded file to disk failed.
    #[error("Failed to save download: {0}")]
    Download(#[from] std::io::Error),

    /// The token store could not be updated.
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

/// Optional filters for [`JobApiClient::list_jobs`].
///
/// Omitted filters are not sent as query parameters at all -- absence is not
/// an empty string.
#[derive(Debug, Clone, Default)]
pub struct ListJobsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub status: Option<JobStatus>,
}

impl ListJobsQuery {
    /// The query pairs that are actually present.
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

/// HTTP client for the job backend, addressed via the gateway proxy prefix
/// (e.g. `http://localhost:3000/api/proxy`).
pub struct JobApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl JobApiClient {
    /// Create a new client.
    ///
    /// * `base_url` - the externally reachable proxy prefix, with or without
    ///   a trailing slash.
    /// * `tokens` - the credential capability consulted on every call.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful for
    /// connection pooling across components).
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    // ---- auth ----

    /// Create an account. Returns the token envelope; does not store it.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = AuthRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .authorize(self.http.post(self.url("/auth/register")))
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Log in with email and password. Returns the token envelope; does not
    /// store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = AuthRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .authorize(self.http.post(self.url("/auth/login")))
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Register and persist the returned token in the store.
    pub async fn register_and_store(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let auth = self.register(email, password).await?;
        self.tokens.set(&auth.access_token).await?;
        Ok(auth)
    }

    /// Log in and persist the returned token in the store.
    pub async fn login_and_store(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let auth = self.login(email, password).await?;
        self.tokens.set(&auth.access_token).await?;
        Ok(auth)
    }

    /// Drop the persisted token. Purely local; the backend keeps no session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.tokens.clear().await?;
        Ok(())
    }

    // ---- jobs ----

    /// List the user's jobs, newest first.
    pub async fn list_jobs(&self, query: &ListJobsQuery) -> Result<JobList, ApiError> {
        let mut request = self.authorize(self.http.get(self.url("/jobs")));
        let pairs = query.pairs();
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
        Self::parse_response(request.send().await?).await
    }

    /// Fetch one job snapshot.
    pub async fn get_job(&self, id: &str) -> Result<Job, ApiError> {
        let response = self
            .authorize(self.http.get(self.url(&format!("/jobs/{id}"))))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Upload a spreadsheet for conversion.
    ///
    /// The body is multipart with a single `file` field. The backend
    /// enforces the `.xlsx`/`.csv` extension and the 10 MB cap; violations
    /// come back as normalized [`ApiError::Api`] values. Returns the newly
    /// created job in its initial state.
    pub async fn upload(&self, filename: &str, contents: Vec<u8>) -> Result<Job, ApiError> {
        let part = reqwest::multipart::Part::bytes(contents).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.http.post(self.url("/jobs")))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// First rows of the converted CSV, as arbitrary JSON. Only available
    /// once the job is `done`.
    pub async fn preview(&self, id: &str) -> Result<serde_json::Value, ApiError> {
        let response = self
            .authorize(self.http.get(self.url(&format!("/jobs/{id}/preview"))))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Processing metrics report, as arbitrary JSON. Only available once the
    /// job is `done`.
    pub async fn report(&self, id: &str) -> Result<serde_json::Value, ApiError> {
        let response = self
            .authorize(self.http.get(self.url(&format!("/jobs/{id}/report"))))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Download the converted CSV and save it under `dir`.
    ///
    /// The file is named `filename` when given, else the deterministic
    /// default `ghl_import_<id>.csv`. The body is written through a
    /// temporary file in `dir` and renamed into place, so a failed transfer
    /// never leaves a partial artifact behind. Returns the final path.
    pub async fn download(
        &self,
        id: &str,
        dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, ApiError> {
        let response = self
            .authorize(self.http.get(self.url(&format!("/jobs/{id}/download"))))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;

        let name = filename
            .map(str::to_string)
            .unwrap_or_else(|| format!("ghl_import_{id}.csv"));
        let staging = dir.join(format!(".{name}.part"));
        let dest = dir.join(&name);

        if let Err(err) = tokio::fs::write(&staging, &body).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err.into());
        }
        if let Err(err) = tokio::fs::rename(&staging, &dest).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err.into());
        }

        tracing::debug!(job_id = id, path = %dest.display(), "Download saved");
        Ok(dest)
    }

    /// Re-queue a `failed` job.
    ///
    /// Accepted with 202. This does **not** resume status polling -- the
    /// caller restarts observation explicitly if desired.
    pub async fn retry(&self, id: &str) -> Result<RetryAccepted, ApiError> {
        let response = self
            .authorize(self.http.post(self.url(&format!("/jobs/{id}/retry"))))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach `Authorization: Bearer <token>` iff a token is stored.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Ensure the response has a success status. On failure, extract the
    /// `detail` field from the JSON body, falling back to `Error <status>`
    /// when the body is not JSON or carries no `detail`.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.detail,
            Err(_) => format!("Error {}", status.as_u16()),
        };

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
