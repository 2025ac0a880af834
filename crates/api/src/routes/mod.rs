//! Route composition.

use axum::Router;

use crate::state::AppState;

pub mod application;
pub mod health;
pub mod invite;
pub mod me;
pub mod notification;
pub mod position;
pub mod squad;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/squads", squad::router())
        .nest("/invites", invite::router())
        .nest("/positions", position::router())
        .nest("/applications", application::router())
        .nest("/notifications", notification::router())
        .nest("/me", me::router())
}
