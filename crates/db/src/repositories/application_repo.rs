//! Repository for the `applications` table.

use sqlx::SqliteExecutor;
use squadhq_core::types::{DbId, Timestamp};

use crate::models::position::Application;
use crate::models::status::ApplicationStatus;

const COLUMNS: &str = "id, position_id, applicant_id, message, status_id, \
                       expires_at, responded_at, created_at";

/// Provides CRUD operations for position applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert a new PENDING application, returning the created row.
    ///
    /// The `uq_applications_active` partial index rejects a second
    /// pending/approved application for the same (position, applicant)
    /// even under a race.
    pub async fn insert(
        ex: impl SqliteExecutor<'_>,
        position_id: DbId,
        applicant_id: DbId,
        message: Option<&str>,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications (position_id, applicant_id, message, status_id, \
                                       expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(position_id)
            .bind(applicant_id)
            .bind(message)
            .bind(ApplicationStatus::Pending.id())
            .bind(expires_at)
            .bind(now)
            .fetch_one(ex)
            .await
    }

    /// Find an application by ID.
    pub async fn find_by_id(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = ?");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// Find the applicant's PENDING or APPROVED application for a
    /// position, optionally excluding one row (the application currently
    /// being approved must not count against itself).
    pub async fn find_active_for_applicant(
        ex: impl SqliteExecutor<'_>,
        position_id: DbId,
        applicant_id: DbId,
        exclude: Option<DbId>,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications
             WHERE position_id = ? AND applicant_id = ?
               AND status_id IN (?, ?)
               AND id != COALESCE(?, -1)"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(position_id)
            .bind(applicant_id)
            .bind(ApplicationStatus::Pending.id())
            .bind(ApplicationStatus::Approved.id())
            .bind(exclude)
            .fetch_optional(ex)
            .await
    }

    /// List all applications for a position, newest first.
    pub async fn list_for_position(
        ex: impl SqliteExecutor<'_>,
        position_id: DbId,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications WHERE position_id = ? ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(position_id)
            .fetch_all(ex)
            .await
    }

    /// List a user's applications, newest first.
    pub async fn list_for_applicant(
        ex: impl SqliteExecutor<'_>,
        applicant_id: DbId,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications WHERE applicant_id = ? ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(applicant_id)
            .fetch_all(ex)
            .await
    }

    /// Guarded status transition: only applies while the stored status is
    /// still `from`. Returns `None` if the application was missing or
    /// already moved on.
    pub async fn set_status(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        responded_at: Option<Timestamp>,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET status_id = ?, responded_at = ?
             WHERE id = ? AND status_id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(to.id())
            .bind(responded_at)
            .bind(id)
            .bind(from.id())
            .fetch_optional(ex)
            .await
    }

    /// Reject every PENDING application for a position except one
    /// (the application that just won it). Returns the rejected rows.
    pub async fn reject_other_pending(
        ex: impl SqliteExecutor<'_>,
        position_id: DbId,
        winner_id: DbId,
        responded_at: Timestamp,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET status_id = ?, responded_at = ?
             WHERE position_id = ? AND status_id = ? AND id != ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(ApplicationStatus::Rejected.id())
            .bind(responded_at)
            .bind(position_id)
            .bind(ApplicationStatus::Pending.id())
            .bind(winner_id)
            .fetch_all(ex)
            .await
    }

    /// Reject every PENDING application for a position (the position is
    /// being deleted or force-closed). Returns the rejected rows.
    pub async fn reject_pending_for_position(
        ex: impl SqliteExecutor<'_>,
        position_id: DbId,
        responded_at: Timestamp,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET status_id = ?, responded_at = ?
             WHERE position_id = ? AND status_id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(ApplicationStatus::Rejected.id())
            .bind(responded_at)
            .bind(position_id)
            .bind(ApplicationStatus::Pending.id())
            .fetch_all(ex)
            .await
    }

    /// Sweep: flip every PENDING application past its expiry to EXPIRED
    /// and return the affected rows.
    pub async fn expire_pending(
        ex: impl SqliteExecutor<'_>,
        now: Timestamp,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET status_id = ?, responded_at = ?
             WHERE status_id = ? AND expires_at <= ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(ApplicationStatus::Expired.id())
            .bind(now)
            .bind(ApplicationStatus::Pending.id())
            .bind(now)
            .fetch_all(ex)
            .await
    }
}
