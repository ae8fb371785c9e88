use anyhow::{Context, Result};
use uuid::Uuid;

use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn exists(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?",
            (user_id.to_string(), post_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn like(&self, user_id: &Uuid, post_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)",
            (
                user_id.to_string(),
                post_id.to_string(),
                chrono::Utc::now().to_rfc3339(),
            ),
        )
        .context("Failed to record like")?;
        Ok(())
    }

    pub fn unlike(&self, user_id: &Uuid, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM likes WHERE user_id = ? AND post_id = ?",
                (user_id.to_string(), post_id.to_string()),
            )
            .context("Failed to remove like")?;
        Ok(rows)
    }

    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
