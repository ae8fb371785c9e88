use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use quill_types::User;

use crate::db::DbPool;

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user with a pre-hashed password
    pub fn create(&self, user: &User, password_hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, bio, join_date)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                user.id.to_string(),
                &user.username,
                &user.email,
                password_hash,
                &user.bio,
                user.join_date.to_rfc3339(),
            ),
        )
        .context("Failed to create user")?;
        Ok(())
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, bio, join_date FROM users WHERE id = ?",
        )?;

        let user = stmt
            .query_row([user_id.to_string()], Self::row_to_user)
            .optional()?;

        Ok(user)
    }

    /// Get user by username
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, bio, join_date FROM users WHERE username = ?",
        )?;

        let user = stmt.query_row([username], Self::row_to_user).optional()?;

        Ok(user)
    }

    /// Get the stored password hash for a username
    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        let conn = self.pool.get()?;
        let hash = conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?",
                [username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Check whether a username is already taken
    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
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

    fn setup() -> UserRepository {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        UserRepository::new(db.pool.clone())
    }

    #[test]
    fn test_get_by_username() {
        let repo = setup();
        let user = repo
            .get_by_username("alice")
            .expect("query failed")
            .expect("alice not found");
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn test_username_exists() {
        let repo = setup();
        assert!(repo.username_exists("bob").unwrap());
        assert!(!repo.username_exists("nobody").unwrap());
    }

    #[test]
    fn test_create_and_fetch() {
        let repo = setup();
        let user = User {
            id: Uuid::new_v4(),
            username: "dora".to_string(),
            email: "dora@example.com".to_string(),
            bio: None,
            join_date: Utc::now(),
        };
        repo.create(&user, "hash").expect("create failed");

        let fetched = repo
            .get_by_id(&user.id)
            .expect("query failed")
            .expect("user not found");
        assert_eq!(fetched.username, "dora");
        assert_eq!(
            repo.get_password_hash("dora").unwrap().as_deref(),
            Some("hash")
        );
    }
}
