//! Repository for the `squads` table.

use sqlx::SqliteExecutor;
use squadhq_core::types::{DbId, Timestamp};

use crate::models::squad::{Squad, UpdateSquad};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, avatar_url, min_size, max_size, \
                       is_fixed_size, is_active, creator_id, captain_id, created_at, updated_at";

/// Provides CRUD operations for squads.
pub struct SquadRepo;

impl SquadRepo {
    /// Insert a new squad, returning the created row.
    ///
    /// The creator starts as captain and the squad starts inactive; the
    /// caller inserts the first membership row in the same transaction.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        ex: impl SqliteExecutor<'_>,
        name: &str,
        description: Option<&str>,
        avatar_url: Option<&str>,
        min_size: i64,
        max_size: i64,
        is_fixed_size: bool,
        creator_id: DbId,
        now: Timestamp,
    ) -> Result<Squad, sqlx::Error> {
        let query = format!(
            "INSERT INTO squads (name, description, avatar_url, min_size, max_size, \
                                 is_fixed_size, is_active, creator_id, captain_id, \
                                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Squad>(&query)
            .bind(name)
            .bind(description)
            .bind(avatar_url)
            .bind(min_size)
            .bind(max_size)
            .bind(is_fixed_size)
            .bind(creator_id)
            .bind(creator_id)
            .bind(now)
            .bind(now)
            .fetch_one(ex)
            .await
    }

    /// Find a squad by ID.
    pub async fn find_by_id(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Squad>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM squads WHERE id = ?");
        sqlx::query_as::<_, Squad>(&query)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// List squads a user belongs to, most recently joined first.
    pub async fn list_for_member(
        ex: impl SqliteExecutor<'_>,
        user_id: DbId,
    ) -> Result<Vec<Squad>, sqlx::Error> {
        let query = format!(
            "SELECT s.{} FROM squads s
             JOIN squad_members m ON m.squad_id = s.id
             WHERE m.user_id = ?
             ORDER BY m.joined_at DESC",
            COLUMNS.replace(", ", ", s.")
        );
        sqlx::query_as::<_, Squad>(&query)
            .bind(user_id)
            .fetch_all(ex)
            .await
    }

    /// Count squads a user has created (for the creation quota).
    pub async fn count_created_by(
        ex: impl SqliteExecutor<'_>,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM squads WHERE creator_id = ?")
            .bind(user_id)
            .fetch_one(ex)
            .await?;
        Ok(row.0)
    }

    /// Update a squad. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
        input: &UpdateSquad,
        now: Timestamp,
    ) -> Result<Option<Squad>, sqlx::Error> {
        let query = format!(
            "UPDATE squads SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                avatar_url = COALESCE(?, avatar_url),
                max_size = COALESCE(?, max_size),
                is_fixed_size = COALESCE(?, is_fixed_size),
                updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Squad>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.avatar_url)
            .bind(input.max_size)
            .bind(input.is_fixed_size)
            .bind(now)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// Reassign the captaincy. Membership rows are untouched.
    pub async fn set_captain(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
        new_captain_id: DbId,
        now: Timestamp,
    ) -> Result<Option<Squad>, sqlx::Error> {
        let query = format!(
            "UPDATE squads SET captain_id = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Squad>(&query)
            .bind(new_captain_id)
            .bind(now)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// Recompute `is_active` from the current member count.
    ///
    /// Must run inside the same transaction as the membership change so a
    /// concurrent reader never observes a stale flag.
    pub async fn refresh_active(
        ex: impl SqliteExecutor<'_>,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Squad>, sqlx::Error> {
        let query = format!(
            "UPDATE squads SET
                is_active = ((SELECT COUNT(*) FROM squad_members
                              WHERE squad_id = squads.id) >= min_size),
                updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Squad>(&query)
            .bind(now)
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// Delete a squad. Members, invites, positions, and applications
    /// cascade via foreign keys. Returns `true` if a row was deleted.
    pub async fn delete(ex: impl SqliteExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM squads WHERE id = ?")
            .bind(id)
            .execute(ex)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
