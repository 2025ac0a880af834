//! Repository for the `squad_members` table.

use sqlx::SqliteExecutor;
use squadhq_core::types::{DbId, Timestamp};

use crate::models::squad::SquadMember;
use crate::models::status::StatusId;

const COLUMNS: &str = "id, squad_id, user_id, role_id, joined_at";

/// Provides CRUD operations for squad memberships.
pub struct MemberRepo;

impl MemberRepo {
    /// Insert a membership row, returning it.
    ///
    /// The `uq_squad_members_squad_user` constraint rejects a duplicate
    /// membership even if the caller's own check raced.
    pub async fn insert(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        user_id: DbId,
        role_id: StatusId,
        now: Timestamp,
    ) -> Result<SquadMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO squad_members (squad_id, user_id, role_id, joined_at)
             VALUES (?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SquadMember>(&query)
            .bind(squad_id)
            .bind(user_id)
            .bind(role_id)
            .bind(now)
            .fetch_one(ex)
            .await
    }

    /// Find a member by (squad, user).
    pub async fn find(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        user_id: DbId,
    ) -> Result<Option<SquadMember>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM squad_members WHERE squad_id = ? AND user_id = ?");
        sqlx::query_as::<_, SquadMember>(&query)
            .bind(squad_id)
            .bind(user_id)
            .fetch_optional(ex)
            .await
    }

    /// Whether a user currently belongs to a squad.
    pub async fn is_member(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM squad_members WHERE squad_id = ? AND user_id = ?)",
        )
        .bind(squad_id)
        .bind(user_id)
        .fetch_one(ex)
        .await?;
        Ok(row.0 != 0)
    }

    /// List members of a squad in join order.
    pub async fn list_for_squad(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
    ) -> Result<Vec<SquadMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM squad_members WHERE squad_id = ? ORDER BY joined_at ASC, id ASC"
        );
        sqlx::query_as::<_, SquadMember>(&query)
            .bind(squad_id)
            .fetch_all(ex)
            .await
    }

    /// Count members of a squad.
    pub async fn count_for_squad(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM squad_members WHERE squad_id = ?")
            .bind(squad_id)
            .fetch_one(ex)
            .await?;
        Ok(row.0)
    }

    /// Change a member's role. Returns the updated row, or `None` if the
    /// user is not a member of that squad.
    pub async fn update_role(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        user_id: DbId,
        role_id: StatusId,
    ) -> Result<Option<SquadMember>, sqlx::Error> {
        let query = format!(
            "UPDATE squad_members SET role_id = ?
             WHERE squad_id = ? AND user_id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SquadMember>(&query)
            .bind(role_id)
            .bind(squad_id)
            .bind(user_id)
            .fetch_optional(ex)
            .await
    }

    /// Remove a member. Returns `true` if a row was deleted.
    pub async fn remove(
        ex: impl SqliteExecutor<'_>,
        squad_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM squad_members WHERE squad_id = ? AND user_id = ?")
            .bind(squad_id)
            .bind(user_id)
            .execute(ex)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
