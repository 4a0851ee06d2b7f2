use axum::{Router, routing::get};

pub mod admin;
pub mod entities;
pub mod system;

/// Routes that require an authenticated principal.
pub fn protected() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/api/entities", entities::router())
        .nest("/api/admin", admin::router())
}
