use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use quill_types::Comment;

use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, comment: &Comment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (id, post_id, author_id, content, parent_comment_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.content,
                comment.parent_comment_id.map(|id| id.to_string()),
                comment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    pub fn get_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.parent_comment_id,
                    c.created_at,
                    (SELECT COUNT(*) FROM comments WHERE parent_comment_id = c.id) as reply_count
             FROM comments c
             JOIN users u ON c.author_id = u.id
             WHERE c.id = ?",
        )?;

        let comment = stmt
            .query_row([comment_id.to_string()], Self::row_to_comment)
            .optional()?;

        Ok(comment)
    }

    /// Fetch the full comment tree for a post, parents before children
    pub fn get_thread(&self, post_id: &Uuid) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;

        // Recursive CTE walks the tree from the top-level comments down
        let mut stmt = conn.prepare(
            "WITH RECURSIVE comment_tree AS (
                SELECT c.id, c.post_id, c.author_id, c.content, c.parent_comment_id,
                       c.created_at, 0 as depth
                FROM comments c
                WHERE c.post_id = ? AND c.parent_comment_id IS NULL

                UNION ALL

                SELECT c.id, c.post_id, c.author_id, c.content, c.parent_comment_id,
                       c.created_at, ct.depth + 1
                FROM comments c
                INNER JOIN comment_tree ct ON c.parent_comment_id = ct.id
            )
            SELECT ct.id, ct.post_id, ct.author_id, u.username, ct.content,
                   ct.parent_comment_id, ct.created_at,
                   (SELECT COUNT(*) FROM comments WHERE parent_comment_id = ct.id) as reply_count
            FROM comment_tree ct
            JOIN users u ON ct.author_id = u.id
            ORDER BY ct.depth ASC, ct.created_at ASC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], Self::row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    pub fn update_content(&self, comment_id: &Uuid, content: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE comments SET content = ? WHERE id = ?",
                (content, comment_id.to_string()),
            )
            .context("Failed to update comment")?;
        Ok(rows)
    }

    pub fn delete(&self, comment_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM comments WHERE id = ?",
                [comment_id.to_string()],
            )
            .context("Failed to delete comment")?;
        Ok(rows)
    }

    fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
        let parent_id_str: Option<String> = row.get(5)?;
        Ok(Comment {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            author_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
            author_username: row.get(3)?,
            content: row.get(4)?,
            parent_comment_id: parent_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
            reply_count: row.get(7)?,
        })
    }
}
