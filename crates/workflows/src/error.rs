use squadhq_core::error::{CoreError, EligibilityFailure};

/// Error type returned by every workflow operation.
///
/// Domain failures carry their [`CoreError`] kind; storage failures pass
/// through for the API layer to classify. Nothing here ever panics
/// through to the caller.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<EligibilityFailure> for WorkflowError {
    fn from(failure: EligibilityFailure) -> Self {
        Self::Core(CoreError::Ineligible(failure))
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Core(CoreError::Validation(errors.to_string()))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Whether a storage error is a unique-constraint violation, i.e. the
/// constraint backstop caught a race our own check missed.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
