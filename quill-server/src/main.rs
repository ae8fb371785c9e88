mod api;
mod config;
mod db;
mod password;
mod session;
mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use state::AppState;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = db::Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    // Always seed test data for development
    db.seed_test_data().expect("Failed to seed test data");
    tracing::info!("Test data seeded successfully");

    tracing::info!("Database initialized successfully");

    // Create application state
    let state = AppState::new(db, settings.repeat_policy());

    // Run initial session cleanup on startup
    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) => {
            if count > 0 {
                tracing::info!("Cleaned up {} expired sessions on startup", count);
            }
        }
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions on startup: {}", e);
        }
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {}", e);
                }
            }
        }
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Account and session routes
        .route("/accounts/register", post(api::auth::register))
        .route("/accounts/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/validate", get(api::auth::validate_session))
        // Catalog routes
        .route("/authors", get(api::authors::get_authors))
        .route("/authors", post(api::authors::create_author))
        .route("/authors/:id", get(api::authors::get_author))
        .route("/authors/:id", put(api::authors::update_author))
        .route("/authors/:id", delete(api::authors::delete_author))
        .route("/books", get(api::books::get_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        // Blog routes
        .route("/posts", get(api::posts::get_posts))
        .route("/posts", post(api::posts::create_post))
        .route("/posts/:id", get(api::posts::get_post))
        .route("/posts/:id", put(api::posts::update_post))
        .route("/posts/:id", delete(api::posts::delete_post))
        .route("/posts/:id/comments", get(api::comments::get_comments))
        .route("/posts/:id/comments", post(api::comments::create_comment))
        .route("/comments/:id", get(api::comments::get_comment))
        .route("/comments/:id", put(api::comments::update_comment))
        .route("/comments/:id", delete(api::comments::delete_comment))
        // Profile routes
        .route("/users/:id/profile", get(api::profile::get_user_profile))
        .route("/profile", get(api::profile::get_own_profile))
        .route("/profile", put(api::profile::update_own_profile))
        // Social routes
        .route("/follow/:user_id", post(api::social::follow_user))
        .route("/unfollow/:user_id", post(api::social::unfollow_user))
        .route("/social/following", get(api::social::get_following))
        .route("/social/followers", get(api::social::get_followers))
        .route("/posts/:id/like", post(api::posts::like_post))
        .route("/posts/:id/unlike", post(api::posts::unlike_post))
        .route("/feed", get(api::posts::get_feed))
        .route("/notifications", get(api::notifications::get_notifications))
        .route(
            "/notifications/read",
            post(api::notifications::mark_notifications_read),
        )
        .with_state(state)
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}

async fn health_check() -> &'static str {
    "OK"
}
