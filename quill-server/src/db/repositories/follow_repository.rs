use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use quill_types::User;

use crate::db::DbPool;

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn is_following(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
            (follower_id.to_string(), following_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn follow(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO follows (follower_id, following_id, created_at)
             VALUES (?, ?, ?)",
            (
                follower_id.to_string(),
                following_id.to_string(),
                Utc::now().to_rfc3339(),
            ),
        )
        .context("Failed to create follow")?;
        Ok(())
    }

    pub fn unfollow(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ? AND following_id = ?",
                (follower_id.to_string(), following_id.to_string()),
            )
            .context("Failed to remove follow")?;
        Ok(rows)
    }

    /// Users the given user follows, most recent first
    pub fn get_following(&self, user_id: &Uuid) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.email, u.bio, u.join_date
             FROM follows f
             JOIN users u ON f.following_id = u.id
             WHERE f.follower_id = ?
             ORDER BY f.created_at DESC",
        )?;

        let users = stmt
            .query_map([user_id.to_string()], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Users following the given user, most recent first
    pub fn get_followers(&self, user_id: &Uuid) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.email, u.bio, u.join_date
             FROM follows f
             JOIN users u ON f.follower_id = u.id
             WHERE f.following_id = ?
             ORDER BY f.created_at DESC",
        )?;

        let users = stmt
            .query_map([user_id.to_string()], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            username: row.get(1)?,
            email: row.get(2)?,
            bio: row.get(3)?,
            join_date: row.get::<_, String>(4)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> FollowRepository {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        FollowRepository::new(db.pool.clone())
    }

    #[test]
    fn test_follow_and_unfollow() {
        let repo = setup();
        let bob = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap();
        let charlie = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap();

        assert!(!repo.is_following(&bob, &charlie).unwrap());
        repo.follow(&bob, &charlie).expect("follow failed");
        assert!(repo.is_following(&bob, &charlie).unwrap());

        assert_eq!(repo.unfollow(&bob, &charlie).unwrap(), 1);
        assert!(!repo.is_following(&bob, &charlie).unwrap());
        assert_eq!(repo.unfollow(&bob, &charlie).unwrap(), 0);
    }

    #[test]
    fn test_following_and_followers_lists() {
        let repo = setup();
        // seeded: alice follows bob
        let alice = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();
        let bob = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap();

        let following = repo.get_following(&alice).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "bob");

        let followers = repo.get_followers(&bob).unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].username, "alice");
    }
}
