//! HTTP client for the `/api/workouts` resource.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::error::SyncError;
use super::remote::WorkoutRemote;
use crate::document::{self, WorkoutsDocumentRef};
use crate::models::Workout;

/// Timeout for a single request to the server.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the reachability probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Reads and writes a user's workouts through the server's HTTP API.
///
/// The session token is sent as a bearer token; the server accepts it in
/// place of the browser's session cookie.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    server_url: String,
    session_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(
        server_url: impl Into<String>,
        session_token: Option<String>,
    ) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Ok(Self {
            server_url: server_url.into(),
            session_token,
            client,
        })
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Builds an absolute URL for `path` on the configured server.
    pub fn build_url(&self, path: &str) -> String {
        build_url(&self.server_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl WorkoutRemote for HttpRemote {
    async fn fetch(&self) -> Result<Vec<Workout>, SyncError> {
        if self.session_token.is_none() {
            return Err(SyncError::Unauthenticated);
        }

        let response = self
            .authorize(self.client.get(self.build_url("/api/workouts")))
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        let response = check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        Ok(document::decode_envelope_lenient(&body))
    }

    async fn push(&self, workouts: &[Workout]) -> Result<(), SyncError> {
        if self.session_token.is_none() {
            return Err(SyncError::Unauthenticated);
        }

        let response = self
            .authorize(self.client.post(self.build_url("/api/workouts")))
            .json(&WorkoutsDocumentRef { workouts })
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}

/// Converts an error status into a [`SyncError`], passing successes through.
pub async fn check_status(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(SyncError::Unauthenticated);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    Err(SyncError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Joins a server URL and a path, defaulting to `http://` when no scheme is
/// given.
pub fn build_url(server_url: &str, path: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let base = if base.starts_with("http://") || base.starts_with("https://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Returns true if the server answers its health check.
pub async fn check_server(server_url: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(HEALTH_TIMEOUT).build() {
        Ok(c) => c,
        Err(_) => return false,
    };

    match client.get(build_url(server_url, "/health")).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
