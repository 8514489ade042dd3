// Profile Lens - AI-assisted analysis of social profiles, posts and dating conversations

pub mod config;
pub mod db;
pub mod jwt;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
