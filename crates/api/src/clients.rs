//! HTTP-backed implementations of the external collaborator ports.
//!
//! Both clients use a bounded request timeout; the workflow layer
//! additionally applies its own timeout and fail-closed fallback, so a
//! slow or dead collaborator can only ever degrade eligibility, never
//! hang a request.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use squadhq_core::external::{ExternalError, ReputationSource, VouchSource};
use squadhq_core::types::DbId;

/// Request timeout for collaborator lookups.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(3);

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .build()
        .expect("HTTP client construction cannot fail with static configuration")
}

fn to_external_error(error: reqwest::Error) -> ExternalError {
    if error.is_timeout() {
        ExternalError::Timeout
    } else {
        ExternalError::Unavailable(error.to_string())
    }
}

// ---------------------------------------------------------------------------
// Reputation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: Option<i64>,
}

/// Reputation scores fetched from `GET {base}/users/{id}/score`.
pub struct HttpReputationSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReputationSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReputationSource for HttpReputationSource {
    async fn score(&self, user_id: DbId) -> Result<Option<i64>, ExternalError> {
        let url = format!("{}/users/{user_id}/score", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(to_external_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Unknown user: simply unscored.
            return Ok(None);
        }
        let response = response.error_for_status().map_err(to_external_error)?;
        let body: ScoreResponse = response.json().await.map_err(to_external_error)?;
        Ok(body.score)
    }
}

// ---------------------------------------------------------------------------
// Mutual vouch
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VouchResponse {
    mutual: bool,
}

/// Mutual-vouch lookups against `GET {base}/vouches/{a}/{b}`.
pub struct HttpVouchSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVouchSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VouchSource for HttpVouchSource {
    async fn has_mutual_vouch(&self, user_a: DbId, user_b: DbId) -> Result<bool, ExternalError> {
        let url = format!("{}/vouches/{user_a}/{user_b}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(to_external_error)?
            .error_for_status()
            .map_err(to_external_error)?;
        let body: VouchResponse = response.json().await.map_err(to_external_error)?;
        Ok(body.mutual)
    }
}
