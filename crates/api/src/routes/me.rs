//! Route definitions for the caller-scoped `/me` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::{application, invite, squad};
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET /squads        -> squads the caller belongs to
/// GET /squad-quota   -> the caller's squad-creation quota
/// GET /invites       -> the caller's incoming invites
/// GET /applications  -> the caller's applications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/squads", get(squad::my_squads))
        .route("/squad-quota", get(squad::my_squad_quota))
        .route("/invites", get(invite::my_invites))
        .route("/applications", get(application::my_applications))
}
