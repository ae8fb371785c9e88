use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use quill_types::{Profile, UpdateProfileRequest};

use crate::db::DbPool;

pub struct ProfileRepository {
    pool: DbPool,
}

impl ProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create an empty profile row for a new user
    pub fn create_empty(&self, user_id: &Uuid, bio: Option<&str>) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO profiles (user_id, bio) VALUES (?, ?)",
            (user_id.to_string(), bio),
        )
        .context("Failed to create profile")?;
        Ok(())
    }

    pub fn get_by_user(&self, user_id: &Uuid) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, bio, picture, website, location, birth_date
             FROM profiles WHERE user_id = ?",
        )?;

        let profile = stmt
            .query_row([user_id.to_string()], |row| {
                let birth_date: Option<String> = row.get(5)?;
                Ok(Profile {
                    user_id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    bio: row.get(1)?,
                    picture: row.get(2)?,
                    website: row.get(3)?,
                    location: row.get(4)?,
                    birth_date: birth_date
                        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                })
            })
            .optional()?;

        Ok(profile)
    }

    /// Apply a partial update; absent fields keep their current value
    pub fn update(&self, user_id: &Uuid, update: &UpdateProfileRequest) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE profiles SET
                bio = COALESCE(?, bio),
                picture = COALESCE(?, picture),
                website = COALESCE(?, website),
                location = COALESCE(?, location),
                birth_date = COALESCE(?, birth_date)
             WHERE user_id = ?",
            (
                &update.bio,
                &update.picture,
                &update.website,
                &update.location,
                update.birth_date.map(|d| d.to_string()),
                user_id.to_string(),
            ),
        )
        .context("Failed to update profile")?;
        Ok(())
    }
}
