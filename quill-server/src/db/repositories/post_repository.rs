use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::OptionalExtension;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use quill_types::{Post, PostOrdering};

use crate::db::DbPool;

const POST_COLUMNS: &str = "p.id, p.author_id, u.username, p.title, p.content, p.published_date,
            (SELECT COUNT(*) FROM likes WHERE post_id = p.id) as like_count,
            (SELECT COUNT(*) FROM comments WHERE post_id = p.id) as comment_count";

/// Declared filter fields for post listings
#[derive(Debug, Default)]
pub struct PostFilter {
    /// Substring search over title, content, and author username
    pub search: Option<String>,
    pub tag: Option<String>,
    pub username: Option<String>,
    pub ordering: PostOrdering,
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, author_id, title, content, published_date)
             VALUES (?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.author_id.to_string(),
                &post.title,
                &post.content,
                post.published_date.to_rfc3339(),
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let query = format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             JOIN users u ON p.author_id = u.id
             WHERE p.id = ?"
        );
        let mut stmt = conn.prepare(&query)?;

        let post = stmt
            .query_row([post_id.to_string()], Self::row_to_post)
            .optional()?;

        Ok(post)
    }

    /// List posts with search, filters, ordering, and a LIMIT/OFFSET page.
    /// Returns the page of posts plus the total row count before paging.
    pub fn list(&self, filter: &PostFilter, limit: u32, offset: u64) -> Result<(Vec<Post>, i64)> {
        let conn = self.pool.get()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Value> = Vec::new();

        if let Some(search) = &filter.search {
            clauses.push(
                "(p.title LIKE '%' || ? || '%' OR p.content LIKE '%' || ? || '%'
                  OR u.username LIKE '%' || ? || '%')",
            );
            params_vec.push(search.clone().into());
            params_vec.push(search.clone().into());
            params_vec.push(search.clone().into());
        }
        if let Some(tag) = &filter.tag {
            clauses.push(
                "p.id IN (SELECT pt.post_id FROM post_tags pt
                          JOIN tags t ON pt.tag_id = t.id
                          WHERE LOWER(t.name) = LOWER(?))",
            );
            params_vec.push(tag.clone().into());
        }
        if let Some(username) = &filter.username {
            clauses.push("LOWER(u.username) = LOWER(?)");
            params_vec.push(username.clone().into());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let count_query = format!(
            "SELECT COUNT(*)
             FROM posts p
             JOIN users u ON p.author_id = u.id
             {where_clause}"
        );
        let total: i64 = conn.query_row(
            &count_query,
            rusqlite::params_from_iter(params_vec.clone()),
            |row| row.get(0),
        )?;

        let order_clause = Self::order_clause(filter.ordering);
        let query = format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             JOIN users u ON p.author_id = u.id
             {where_clause}
             {order_clause}
             LIMIT ? OFFSET ?"
        );
        params_vec.push(i64::from(limit).into());
        // Offset fits i64: page_size is clamped well below u32::MAX
        params_vec.push(Value::from(offset as i64));

        let mut stmt = conn.prepare(&query)?;
        let posts = stmt
            .query_map(rusqlite::params_from_iter(params_vec), Self::row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((posts, total))
    }

    /// Posts authored by users the given user follows, newest first
    pub fn list_feed(&self, follower_id: &Uuid, limit: u32, offset: u64) -> Result<(Vec<Post>, i64)> {
        let conn = self.pool.get()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts p
             WHERE p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?)",
            [follower_id.to_string()],
            |row| row.get(0),
        )?;

        let query = format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             JOIN users u ON p.author_id = u.id
             WHERE p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?)
             ORDER BY p.published_date DESC
             LIMIT ? OFFSET ?"
        );
        let mut stmt = conn.prepare(&query)?;

        let posts = stmt
            .query_map(
                (follower_id.to_string(), limit, offset as i64),
                Self::row_to_post,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((posts, total))
    }

    pub fn update_content(&self, post_id: &Uuid, title: &str, content: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts SET title = ?, content = ? WHERE id = ?",
                (title, content, post_id.to_string()),
            )
            .context("Failed to update post")?;
        Ok(rows)
    }

    pub fn delete(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(rows)
    }

    fn order_clause(ordering: PostOrdering) -> &'static str {
        match ordering {
            PostOrdering::PublishedDateDesc => "ORDER BY p.published_date DESC",
            PostOrdering::PublishedDate => "ORDER BY p.published_date ASC",
            PostOrdering::Title => "ORDER BY p.title ASC",
            PostOrdering::TitleDesc => "ORDER BY p.title DESC",
        }
    }

    fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            author_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            author_username: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            published_date: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
            tags: Vec::new(), // Will be populated separately
            like_count: row.get(6)?,
            comment_count: row.get(7)?,
        })
    }
}
