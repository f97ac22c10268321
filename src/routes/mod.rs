pub mod attempts;
pub mod auth;
pub mod classes;
pub mod game;
pub mod health;
pub mod progress;
pub mod quizzes;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::middleware::{rate_limit, request_id};
use crate::state::AppState;

/// Maximum request body size: 2 MiB. Uploaded source documents count
/// against this too.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        // Trailing slash: each of these routers has a collection route at
        // "/", and nesting at "/name/" registers it as "/api/name/", which
        // is the path clients use. Axum 0.7 matches trailing slashes
        // exactly, so nesting at "/name" would leave "/api/name/" a 404.
        .nest("/classes/", classes::router())
        .nest("/quizzes/", quizzes::router())
        .nest("/attempts/", attempts::router())
        .nest("/progress", progress::router())
        .nest("/game", game::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
