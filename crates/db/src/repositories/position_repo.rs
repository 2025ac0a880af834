//! Repository for the `open_positions` table.

use sqlx::types::Json;
use sqlx::SqliteExecutor;
use squadhq_core::types::{DbId, Timestamp};

use crate::models::position::OpenPosition;
use crate::models::status::StatusId;

const COLUMNS: &str = "id, squad_id, role_id, description, min_score_tier_id, \
                       requires_mutual_vouch, benefits, is_open, expires_at, created_at";

/// Provides CRUD operations for open positions.
pub struct PositionRepo;

impl PositionRepo {
    /// Insert a new open position, returning the created row.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        role_id: StatusId,
        description: Option<&str>,
        min_score_tier_id: StatusId,
        requires_mutual_vouch: bool,
        benefits: Vec<String>,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<OpenPosition, sqlx::Error> {
        let query = format!(
            "INSERT INTO open_positions (squad_id, role_id, description, min_score_tier_id, \
                                         requires_mutual_vouch, benefits, is_open, \
                                         expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OpenPosition>(&query)
            .bind(squad_id)
            .bind(role_id)
            .bind(description)
            .bind(min_score_tier_id)
            .bind(requires_mutual_vouch)
            .bind(Json(benefits))
            .bind(expires_at)
            .bind(now)
            .fetch_one(ex)
            .await
    }

    /// Find a position by ID.
    pub async fn find_by_id(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
    ) -> Result<Option<OpenPosition>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM open_positions WHERE id = ?");
        sqlx::query_as::<_, OpenPosition>(&query)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// List the open, non-expired positions of a squad.
    pub async fn list_open_for_squad(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<OpenPosition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM open_positions
             WHERE squad_id = ? AND is_open = 1 AND expires_at > ?
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, OpenPosition>(&query)
            .bind(squad_id)
            .bind(now)
            .fetch_all(ex)
            .await
    }

    /// Count the open, non-expired positions of a squad. This is the
    /// figure bounded by the squad's free slots.
    pub async fn count_open_for_squad(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        now: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM open_positions
             WHERE squad_id = ? AND is_open = 1 AND expires_at > ?",
        )
        .bind(squad_id)
        .bind(now)
        .fetch_one(ex)
        .await?;
        Ok(row.0)
    }

    /// Close a single position. Returns `true` if it was still open.
    pub async fn close(ex: impl SqliteExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE open_positions SET is_open = 0 WHERE id = ? AND is_open = 1")
            .bind(id)
            .execute(ex)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close every open position of a squad and return the closed rows.
    pub async fn close_all_for_squad(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
    ) -> Result<Vec<OpenPosition>, sqlx::Error> {
        let query = format!(
            "UPDATE open_positions SET is_open = 0
             WHERE squad_id = ? AND is_open = 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OpenPosition>(&query)
            .bind(squad_id)
            .fetch_all(ex)
            .await
    }

    /// Delete a position. Its applications cascade. Returns `true` if a
    /// row was deleted.
    pub async fn delete(ex: impl SqliteExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM open_positions WHERE id = ?")
            .bind(id)
            .execute(ex)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sweep: close every stored-open position past its expiry and
    /// return the affected rows.
    pub async fn close_expired(
        ex: impl SqliteExecutor<'_>,
        now: Timestamp,
    ) -> Result<Vec<OpenPosition>, sqlx::Error> {
        let query = format!(
            "UPDATE open_positions SET is_open = 0
             WHERE is_open = 1 AND expires_at <= ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OpenPosition>(&query)
            .bind(now)
            .fetch_all(ex)
            .await
    }
}
