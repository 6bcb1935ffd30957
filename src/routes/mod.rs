pub mod admin;
pub mod assessments;
pub mod auth;
pub mod health;
pub mod plans;
pub mod profiles;
pub mod tags;
pub mod training_plans;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::middleware::{rate_limit, request_id};
use crate::state::AppState;

/// Maximum request body size: 2 MiB.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/assessments", assessments::router())
        .nest("/profiles", profiles::router())
        .nest("/plans", plans::router())
        .nest("/training-plans", training_plans::router())
        .nest("/tags", tags::router())
        .nest("/admin", admin::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    // 前端 SPA 静态资源，未命中的路径回落到 index.html
    let spa_fallback =
        ServeDir::new("static").not_found_service(ServeFile::new("static/index.html"));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .fallback_service(spa_fallback)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
