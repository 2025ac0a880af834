use crate::types::DbId;

/// Domain error taxonomy shared by every workflow operation.
///
/// The KIND is the contract: the API layer maps each variant to an HTTP
/// status with an explicit table, never by inspecting message text.
/// Messages exist purely for the human on the other end and always name
/// the invariant that blocked the mutation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Caller is not the captain/inviter/applicant/owner required for
    /// the requested mutation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Entity is in a terminal or otherwise incompatible state for the
    /// requested transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Squad size or open-position-slot limits would be violated.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Candidate fails a score, vouch, or uniqueness requirement.
    #[error(transparent)]
    Ineligible(#[from] EligibilityFailure),

    /// The entity's time window has lapsed.
    #[error("Expired: {0}")]
    Expired(String),

    /// A reputation or vouch collaborator was unreachable or timed out.
    #[error("External dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The specific reason a candidate is ineligible, for user-facing
/// messaging. Ordered from most to least specific when several apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityFailure {
    #[error("you are already a member of this squad")]
    AlreadyMember,

    #[error("you already have an application for this position")]
    DuplicateApplication,

    #[error("score {actual} is below the required minimum of {required}")]
    ScoreBelowTier { required: i64, actual: i64 },

    #[error("this position requires a mutual vouch that could not be confirmed")]
    VouchNotConfirmed,
}
