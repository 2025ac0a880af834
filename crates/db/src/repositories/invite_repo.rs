//! Repository for the `squad_invites` table.

use sqlx::SqliteExecutor;
use squadhq_core::types::{DbId, Timestamp};

use crate::models::invite::SquadInvite;
use crate::models::status::{InviteStatus, StatusId};

const COLUMNS: &str = "id, squad_id, inviter_id, invitee_id, role_id, status_id, \
                       message, expires_at, responded_at, created_at";

/// Provides CRUD operations for squad invites.
pub struct InviteRepo;

impl InviteRepo {
    /// Insert a new PENDING invite, returning the created row.
    ///
    /// The `uq_squad_invites_pending` partial index rejects a second
    /// pending invite for the same (squad, invitee) even under a race.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        inviter_id: DbId,
        invitee_id: DbId,
        role_id: StatusId,
        message: Option<&str>,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<SquadInvite, sqlx::Error> {
        let query = format!(
            "INSERT INTO squad_invites (squad_id, inviter_id, invitee_id, role_id, \
                                        status_id, message, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(squad_id)
            .bind(inviter_id)
            .bind(invitee_id)
            .bind(role_id)
            .bind(InviteStatus::Pending.id())
            .bind(message)
            .bind(expires_at)
            .bind(now)
            .fetch_one(ex)
            .await
    }

    /// Find an invite by ID.
    pub async fn find_by_id(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
    ) -> Result<Option<SquadInvite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM squad_invites WHERE id = ?");
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// Find the PENDING invite for (squad, invitee), if any.
    pub async fn find_pending(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        invitee_id: DbId,
    ) -> Result<Option<SquadInvite>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM squad_invites
             WHERE squad_id = ? AND invitee_id = ? AND status_id = ?"
        );
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(squad_id)
            .bind(invitee_id)
            .bind(InviteStatus::Pending.id())
            .fetch_optional(ex)
            .await
    }

    /// List all invites sent by a squad, newest first.
    pub async fn list_for_squad(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
    ) -> Result<Vec<SquadInvite>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM squad_invites WHERE squad_id = ? ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(squad_id)
            .fetch_all(ex)
            .await
    }

    /// List all invites addressed to a user, newest first.
    pub async fn list_for_invitee(
        ex: impl SqliteExecutor<'_>,
        invitee_id: DbId,
    ) -> Result<Vec<SquadInvite>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM squad_invites WHERE invitee_id = ? ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(invitee_id)
            .fetch_all(ex)
            .await
    }

    /// Guarded status transition: only applies while the stored status is
    /// still `from`. Returns `None` if the invite was missing or already
    /// moved on, so a raced double-response loses cleanly.
    pub async fn set_status(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
        from: InviteStatus,
        to: InviteStatus,
        responded_at: Option<Timestamp>,
    ) -> Result<Option<SquadInvite>, sqlx::Error> {
        let query = format!(
            "UPDATE squad_invites SET status_id = ?, responded_at = ?
             WHERE id = ? AND status_id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(to.id())
            .bind(responded_at)
            .bind(id)
            .bind(from.id())
            .fetch_optional(ex)
            .await
    }

    /// Sweep: flip every PENDING invite past its expiry to EXPIRED and
    /// return the affected rows.
    pub async fn expire_pending(
        ex: impl SqliteExecutor<'_>,
        now: Timestamp,
    ) -> Result<Vec<SquadInvite>, sqlx::Error> {
        let query = format!(
            "UPDATE squad_invites SET status_id = ?, responded_at = ?
             WHERE status_id = ? AND expires_at <= ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SquadInvite>(&query)
            .bind(InviteStatus::Expired.id())
            .bind(now)
            .bind(InviteStatus::Pending.id())
            .bind(now)
            .fetch_all(ex)
            .await
    }
}
