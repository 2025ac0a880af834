//! Bounded external lookups with fail-closed fallbacks.
//!
//! A reputation or vouch collaborator that errors or times out must
//! never hang or crash a workflow; the lookup degrades to the value
//! that denies the candidate the benefit of the doubt.

use std::time::Duration;

use squadhq_core::external::{ReputationSource, VouchSource};
use squadhq_core::types::DbId;

const EXTERNAL_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Fetch a user's reputation score; failures read as "no score".
pub(crate) async fn reputation_score(source: &dyn ReputationSource, user_id: DbId) -> Option<i64> {
    match tokio::time::timeout(EXTERNAL_LOOKUP_TIMEOUT, source.score(user_id)).await {
        Ok(Ok(score)) => score,
        Ok(Err(e)) => {
            tracing::warn!(user_id, error = %e, "Reputation lookup failed; treating user as unscored");
            None
        }
        Err(_) => {
            tracing::warn!(user_id, "Reputation lookup timed out; treating user as unscored");
            None
        }
    }
}

/// Check a mutual vouch between two users; failures read as "no vouch".
pub(crate) async fn mutual_vouch(source: &dyn VouchSource, user_a: DbId, user_b: DbId) -> bool {
    match tokio::time::timeout(EXTERNAL_LOOKUP_TIMEOUT, source.has_mutual_vouch(user_a, user_b))
        .await
    {
        Ok(Ok(vouched)) => vouched,
        Ok(Err(e)) => {
            tracing::warn!(user_a, user_b, error = %e, "Vouch lookup failed; treating as not vouched");
            false
        }
        Err(_) => {
            tracing::warn!(user_a, user_b, "Vouch lookup timed out; treating as not vouched");
            false
        }
    }
}
