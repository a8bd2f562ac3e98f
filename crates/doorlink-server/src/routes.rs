use crate::handlers::{access, doors, health, users};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the HTTP API.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/access/request", post(access::request_access))
        .route("/access/logs", get(access::recent_logs))
        .route("/access/unauthorized", get(access::recent_unauthorized))
        .route("/doors/open/manual", post(access::open_manual))
        .route("/doors/status/realtime", get(doors::realtime_status))
        .route("/doors/{door_id}/status", get(doors::door_status))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", put(users::update_user).delete(users::delete_user));

    Router::new()
        .route("/health", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
