use config::{Config, ConfigError, File};
use quill_types::RepeatPolicy;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Social {
    /// What to do when a follow or like already exists: "reject" or "ignore"
    pub repeat_interaction: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub social: Social,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        // Check in current directory
        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in quill-server directory (for development)
        let dev_path = PathBuf::from("quill-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        // 2. Override with environment variables (highest priority)
        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "quill.db")?
            .set_default("social.repeat_interaction", "reject")?;

        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(policy) = std::env::var("REPEAT_INTERACTION") {
            builder = builder.set_override("social.repeat_interaction", policy)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    /// Parsed repeat-interaction policy, falling back to reject on bad input
    pub fn repeat_policy(&self) -> RepeatPolicy {
        RepeatPolicy::parse(&self.social.repeat_interaction).unwrap_or_default()
    }
}
