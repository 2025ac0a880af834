//! Repository for the `notifications` table.

use sqlx::SqliteExecutor;
use squadhq_core::types::{DbId, Timestamp};

use crate::models::notification::{NewNotification, Notification};

const COLUMNS: &str = "id, user_id, kind, title, body, is_read, squad_id, position_id, \
                       application_id, created_at, read_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification, returning the created row.
    pub async fn insert(
        ex: impl SqliteExecutor<'_>,
        input: &NewNotification,
        now: Timestamp,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, kind, title, body, is_read, squad_id, \
                                        position_id, application_id, created_at)
             VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.kind.as_str())
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.squad_id)
            .bind(input.position_id)
            .bind(input.application_id)
            .bind(now)
            .fetch_one(ex)
            .await
    }

    /// List notifications for a user.
    ///
    /// When `unread_only` is `true`, only notifications with
    /// `is_read = false` are returned.
    pub async fn list_for_user(
        ex: impl SqliteExecutor<'_>,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only { "AND is_read = 0" } else { "" };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = ? {filter}
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(ex)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification was found for the given user
    /// and updated, `false` otherwise.
    pub async fn mark_read(
        ex: impl SqliteExecutor<'_>,
        notification_id: DbId,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ?
             WHERE id = ? AND user_id = ? AND is_read = 0",
        )
        .bind(now)
        .bind(notification_id)
        .bind(user_id)
        .execute(ex)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(
        ex: impl SqliteExecutor<'_>,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ?
             WHERE user_id = ? AND is_read = 0",
        )
        .bind(now)
        .bind(user_id)
        .execute(ex)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(
        ex: impl SqliteExecutor<'_>,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(ex)
        .await?;
        Ok(row.0)
    }
}
