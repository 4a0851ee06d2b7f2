use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use onboardly_auth::{Hs256JwtValidator, JwtValidator};

use crate::middleware::{AuthState, auth_middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Assemble the HTTP application.
///
/// `/health` is open; everything else sits behind bearer-token auth.
pub fn build_app(jwt_secret: String, services: Arc<AppServices>) -> Router {
    let jwt: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth = AuthState { jwt };

    let protected = routes::protected()
        .layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
        .layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
