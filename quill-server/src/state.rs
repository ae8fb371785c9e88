use crate::db::Database;
use crate::session::SessionManager;
use quill_types::RepeatPolicy;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub repeat_policy: RepeatPolicy,
}

impl AppState {
    pub fn new(db: Database, repeat_policy: RepeatPolicy) -> Self {
        let session_manager = SessionManager::new(db.clone());
        Self {
            db,
            session_manager,
            repeat_policy,
        }
    }

    /// Get authenticated user ID from session token
    pub fn get_authenticated_user_id_from_token(&self, token: &str) -> Option<uuid::Uuid> {
        self.session_manager.validate_session(token).ok()
    }
}
