//! Route definitions for the `/squads` resource.

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::handlers::{invite, position, squad};
use crate::state::AppState;

/// Routes mounted at `/squads`.
///
/// ```text
/// POST   /                             -> create_squad
/// GET    /{id}                         -> get_squad
/// PATCH  /{id}                         -> update_squad
/// DELETE /{id}                         -> dismantle_squad
/// POST   /{id}/leave                   -> leave_squad
/// POST   /{id}/captain                 -> transfer_captaincy
/// PATCH  /{id}/members/{user_id}/role  -> change_member_role
/// DELETE /{id}/members/{user_id}       -> remove_member
///
/// POST   /{id}/invites                 -> create_invite
/// GET    /{id}/invites                 -> list squad invites (captain)
/// POST   /{id}/positions               -> create_position
/// GET    /{id}/positions               -> list open positions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(squad::create_squad))
        .route(
            "/{id}",
            get(squad::get_squad)
                .patch(squad::update_squad)
                .delete(squad::dismantle_squad),
        )
        .route("/{id}/leave", post(squad::leave_squad))
        .route("/{id}/captain", post(squad::transfer_captaincy))
        .route(
            "/{id}/members/{user_id}/role",
            patch(squad::change_member_role),
        )
        .route("/{id}/members/{user_id}", delete(squad::remove_member))
        // Recruitment sub-resources
        .route(
            "/{id}/invites",
            post(invite::create_invite).get(invite::list_for_squad),
        )
        .route(
            "/{id}/positions",
            post(position::create_position).get(position::list_open_for_squad),
        )
}
