use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Database-backed session manager for persistent authentication
///
/// Sessions are UUID v4 tokens stored server-side with a 30-day expiry.
/// Expired sessions are removed lazily on validation and in bulk by the
/// periodic cleanup task.
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new session for a user and return its token
    pub fn create_session(&self, user_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(30);

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                user_id.to_string(),
                created_at.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the associated user ID
    pub fn validate_session(&self, token: &str) -> Result<Uuid> {
        let conn = self.db.connection()?;

        let (user_id_str, expires_at_str): (String, String) = conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("Session not found")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .context("Failed to parse expiry time")?
            .with_timezone(&Utc);

        if Utc::now() > expires_at {
            self.delete_session(token)?;
            anyhow::bail!("Session has expired");
        }

        let user_id = Uuid::parse_str(&user_id_str).context("Failed to parse user ID")?;

        Ok(user_id)
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Remove all sessions past their expiry time
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const TEST_USER: &str = "550e8400-e29b-41d4-a716-446655440001";

    fn setup() -> SessionManager {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        SessionManager::new(db)
    }

    #[test]
    fn test_create_and_validate_session() {
        let manager = setup();
        let user_id = Uuid::parse_str(TEST_USER).unwrap();

        let token = manager
            .create_session(user_id)
            .expect("Failed to create session");
        assert!(Uuid::parse_str(&token).is_ok(), "Token should be a valid UUID");

        let validated = manager
            .validate_session(&token)
            .expect("Failed to validate session");
        assert_eq!(user_id, validated);
    }

    #[test]
    fn test_validate_invalid_session() {
        let manager = setup();
        assert!(manager.validate_session("invalid-token").is_err());
    }

    #[test]
    fn test_delete_session() {
        let manager = setup();
        let user_id = Uuid::parse_str(TEST_USER).unwrap();

        let token = manager
            .create_session(user_id)
            .expect("Failed to create session");
        manager.delete_session(&token).expect("Failed to delete session");

        assert!(
            manager.validate_session(&token).is_err(),
            "Session should be invalid after deletion"
        );
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        let manager = SessionManager::new(db.clone());
        let user_id = Uuid::parse_str(TEST_USER).unwrap();

        let token = manager
            .create_session(user_id)
            .expect("Failed to create session");

        // Manually expire the session
        let conn = db.connection().expect("Failed to get connection");
        let expired_time = (Utc::now() - Duration::days(1)).to_rfc3339();
        conn.execute(
            "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
            rusqlite::params![expired_time, token],
        )
        .expect("Failed to expire session");
        drop(conn);

        let cleaned = manager.cleanup_expired_sessions().expect("Failed to cleanup");
        assert_eq!(cleaned, 1);
        assert!(manager.validate_session(&token).is_err());
    }

    #[test]
    fn test_session_token_uniqueness() {
        let manager = setup();
        let user_id = Uuid::parse_str(TEST_USER).unwrap();

        let token1 = manager.create_session(user_id).expect("Failed to create session");
        let token2 = manager.create_session(user_id).expect("Failed to create session");

        assert_ne!(token1, token2);
    }
}
