use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use quill_types::Notification;

use crate::db::DbPool;

pub struct NotificationRepository {
    pool: DbPool,
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, notification: &Notification) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO notifications (id, recipient_id, actor_id, verb, target_kind, target_id, created_at, is_read)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
            (
                notification.id.to_string(),
                notification.recipient_id.to_string(),
                notification.actor_id.to_string(),
                &notification.verb,
                &notification.target_kind,
                notification.target_id.to_string(),
                notification.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create notification")?;
        Ok(())
    }

    /// Notifications addressed to a user, newest first
    pub fn list_for_recipient(&self, recipient_id: &Uuid) -> Result<Vec<Notification>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT n.id, n.recipient_id, n.actor_id, u.username, n.verb, n.target_kind,
                    n.target_id, n.created_at, n.is_read
             FROM notifications n
             JOIN users u ON n.actor_id = u.id
             WHERE n.recipient_id = ?
             ORDER BY n.created_at DESC",
        )?;

        let notifications = stmt
            .query_map([recipient_id.to_string()], Self::row_to_notification)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notifications)
    }

    pub fn mark_all_read(&self, recipient_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
                [recipient_id.to_string()],
            )
            .context("Failed to mark notifications read")?;
        Ok(rows)
    }

    pub fn count_for_recipient(&self, recipient_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?",
            [recipient_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
        Ok(Notification {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            recipient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            actor_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
            actor_username: row.get(3)?,
            verb: row.get(4)?,
            target_kind: row.get(5)?,
            target_id: Uuid::parse_str(&row.get::<_, String>(6)?).unwrap(),
            created_at: row.get::<_, String>(7)?.parse::<DateTime<Utc>>().unwrap(),
            is_read: row.get(8)?,
        })
    }
}
