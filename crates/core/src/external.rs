//! Ports for the external collaborators the workflows depend on.
//!
//! Implementations are injected at construction time (HTTP-backed in the
//! API binary, fixed stubs in tests). Callers own the fail-closed
//! fallback: a failed or timed-out score lookup degrades to "no score",
//! a failed vouch lookup degrades to "no vouch".

use async_trait::async_trait;

use crate::types::DbId;

/// Failure of an external lookup.
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    #[error("lookup timed out")]
    Timeout,

    #[error("{0}")]
    Unavailable(String),
}

/// Source of external reputation scores.
///
/// Scores are eventually stale by contract; they are never assumed to be
/// transactionally consistent with the store's own writes.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Return the user's score, or `None` if they have none.
    async fn score(&self, user_id: DbId) -> Result<Option<i64>, ExternalError>;
}

/// Source of mutual-vouch relationships between two users.
#[async_trait]
pub trait VouchSource: Send + Sync {
    async fn has_mutual_vouch(&self, user_a: DbId, user_b: DbId) -> Result<bool, ExternalError>;
}

/// Reputation source for deployments without a score provider: every
/// user reads as unscored.
pub struct NullReputationSource;

#[async_trait]
impl ReputationSource for NullReputationSource {
    async fn score(&self, _user_id: DbId) -> Result<Option<i64>, ExternalError> {
        Ok(None)
    }
}

/// Vouch source for deployments without a vouch provider: no pair is
/// ever vouched, so vouch-gated positions stay closed to strangers.
pub struct NullVouchSource;

#[async_trait]
impl VouchSource for NullVouchSource {
    async fn has_mutual_vouch(
        &self,
        _user_a: DbId,
        _user_b: DbId,
    ) -> Result<bool, ExternalError> {
        Ok(false)
    }
}
