use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use quill_types::Author;

use crate::db::DbPool;

pub struct AuthorRepository {
    pool: DbPool,
}

impl AuthorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, author: &Author) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO authors (id, name) VALUES (?, ?)",
            (author.id.to_string(), &author.name),
        )
        .context("Failed to create author")?;
        Ok(())
    }

    pub fn get_by_id(&self, author_id: &Uuid) -> Result<Option<Author>> {
        let conn = self.pool.get()?;
        let author = conn
            .query_row(
                "SELECT id, name FROM authors WHERE id = ?",
                [author_id.to_string()],
                |row| {
                    Ok(Author {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(author)
    }

    pub fn list_all(&self) -> Result<Vec<Author>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name FROM authors ORDER BY name")?;

        let authors = stmt
            .query_map([], |row| {
                Ok(Author {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(authors)
    }

    pub fn update_name(&self, author_id: &Uuid, name: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE authors SET name = ? WHERE id = ?",
                (name, author_id.to_string()),
            )
            .context("Failed to update author")?;
        Ok(rows)
    }

    /// Delete an author; their books go with them via the declared cascade
    pub fn delete(&self, author_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM authors WHERE id = ?", [author_id.to_string()])
            .context("Failed to delete author")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_author_crud() {
        let db = Database::in_memory().expect("Failed to create test database");
        let repo = AuthorRepository::new(db.pool.clone());

        let author = Author {
            id: Uuid::new_v4(),
            name: "Bessie Head".to_string(),
        };
        repo.create(&author).expect("create failed");

        let fetched = repo
            .get_by_id(&author.id)
            .expect("query failed")
            .expect("author not found");
        assert_eq!(fetched.name, "Bessie Head");

        repo.update_name(&author.id, "B. Head").expect("update failed");
        assert_eq!(
            repo.get_by_id(&author.id).unwrap().unwrap().name,
            "B. Head"
        );

        assert_eq!(repo.delete(&author.id).unwrap(), 1);
        assert!(repo.get_by_id(&author.id).unwrap().is_none());
    }
}
