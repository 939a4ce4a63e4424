//! 路由配置模块

use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use contrib_shared::observability::middleware as obs_middleware;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{handlers, middleware::internal_token_auth, state::AppState};

/// 内部接口路由，需要内部令牌
fn internal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/internal/repositories/import",
            post(handlers::internal::import_repositories),
        )
        .route(
            "/internal/repositories/{id}/sync",
            post(handlers::internal::sync_repository),
        )
        .route(
            "/internal/repositories/{id}/awards",
            post(handlers::internal::award_for_repository),
        )
        .route(
            "/internal/repositories/{id}/users/{user_id}/awards",
            post(handlers::internal::award_for_user),
        )
        .route(
            "/internal/repositories/{id}/users/{user_id}/progress",
            get(handlers::internal::badge_progress),
        )
        .route(
            "/internal/awards/{id}/acknowledge",
            post(handlers::internal::acknowledge_award),
        )
        .route_layer(middleware::from_fn_with_state(state, internal_token_auth))
}

/// 构建完整路由
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/webhook", post(handlers::webhook::receive))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .merge(internal_routes(state.clone()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
