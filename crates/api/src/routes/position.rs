//! Route definitions for the `/positions` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::position;
use crate::state::AppState;

/// Routes mounted at `/positions`.
///
/// ```text
/// GET    /{id}               -> get_position
/// DELETE /{id}               -> delete_position (captain)
/// POST   /{id}/applications  -> apply_to_position
/// GET    /{id}/applications  -> list_applications (captain)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(position::get_position).delete(position::delete_position),
        )
        .route(
            "/{id}/applications",
            get(position::list_applications).post(position::apply_to_position),
        )
}
