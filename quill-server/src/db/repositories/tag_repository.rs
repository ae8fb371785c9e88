use anyhow::{Context, Result};
use uuid::Uuid;

use crate::db::DbPool;

pub struct TagRepository {
    pool: DbPool,
}

impl TagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store tags for a post (creates tag entries if needed)
    pub fn store_tags(&self, post_id: &Uuid, tags: &[String]) -> Result<()> {
        let conn = self.pool.get()?;

        for tag in tags {
            let name = tag.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }

            // Create tag if it doesn't exist
            let tag_id = Uuid::new_v4();
            conn.execute(
                "INSERT OR IGNORE INTO tags (id, name) VALUES (?, ?)",
                (tag_id.to_string(), &name),
            )
            .context("Failed to create tag")?;

            // Get the tag ID (either just created or existing)
            let existing_id: String =
                conn.query_row("SELECT id FROM tags WHERE name = ?", [&name], |row| {
                    row.get(0)
                })?;

            // Link post to tag
            conn.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)",
                (post_id.to_string(), existing_id),
            )
            .context("Failed to link post to tag")?;
        }

        Ok(())
    }

    /// Replace a post's tag set
    pub fn replace_tags(&self, post_id: &Uuid, tags: &[String]) -> Result<()> {
        {
            let conn = self.pool.get()?;
            conn.execute(
                "DELETE FROM post_tags WHERE post_id = ?",
                [post_id.to_string()],
            )
            .context("Failed to clear post tags")?;
        }
        self.store_tags(post_id, tags)
    }

    /// Get tags for a post
    pub fn get_by_post(&self, post_id: &Uuid) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN post_tags pt ON t.id = pt.tag_id
             WHERE pt.post_id = ?
             ORDER BY t.name",
        )?;

        let tags = stmt
            .query_map([post_id.to_string()], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use proptest::prelude::*;

    #[test]
    fn test_store_and_replace_tags() {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        let repo = TagRepository::new(db.pool.clone());
        let post_id = Uuid::parse_str("650e8400-e29b-41d4-a716-446655440003").unwrap();

        repo.store_tags(&post_id, &["Rust".to_string(), "notes".to_string()])
            .expect("store failed");
        assert_eq!(repo.get_by_post(&post_id).unwrap(), vec!["notes", "rust"]);

        repo.replace_tags(&post_id, &["meta".to_string()])
            .expect("replace failed");
        assert_eq!(repo.get_by_post(&post_id).unwrap(), vec!["meta"]);
    }

    // Stored tags are always normalized regardless of client input
    proptest! {
        #[test]
        fn prop_stored_tags_are_normalized(
            tags in proptest::collection::vec("[a-zA-Z ]{0,12}", 0..5),
        ) {
            let db = Database::in_memory().expect("Failed to create test database");
            db.seed_test_data().expect("Failed to seed test data");
            let repo = TagRepository::new(db.pool.clone());
            let post_id = Uuid::parse_str("650e8400-e29b-41d4-a716-446655440004").unwrap();

            repo.store_tags(&post_id, &tags).expect("store failed");

            for name in repo.get_by_post(&post_id).expect("query failed") {
                prop_assert_eq!(name.clone(), name.trim().to_lowercase());
                prop_assert!(!name.is_empty());
            }
        }
    }
}
