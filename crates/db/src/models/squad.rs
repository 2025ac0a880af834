//! Squad and squad-member entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use squadhq_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::status::StatusId;

/// A row from the `squads` table.
///
/// `is_active` is derived (member count >= `min_size`) and recomputed in
/// the same transaction as every membership change, so readers never see
/// it stale. `captain_id` always names a current member; `creator_id`
/// never changes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Squad {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub min_size: i64,
    pub max_size: i64,
    pub is_fixed_size: bool,
    pub is_active: bool,
    pub creator_id: DbId,
    pub captain_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `squad_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SquadMember {
    pub id: DbId,
    pub squad_id: DbId,
    pub user_id: DbId,
    pub role_id: StatusId,
    pub joined_at: Timestamp,
}

/// A squad with its member list, for display payloads.
#[derive(Debug, Clone, Serialize)]
pub struct SquadWithMembers {
    #[serde(flatten)]
    pub squad: Squad,
    pub members: Vec<SquadMember>,
}

/// DTO for creating a new squad.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSquad {
    #[validate(length(min = 3, max = 40))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    /// Clamped into the system-wide size bounds; defaults to the maximum.
    pub max_size: Option<i64>,
    pub is_fixed_size: Option<bool>,
    /// Role the creator takes in the new squad.
    pub creator_role_id: StatusId,
}

/// DTO for updating a squad. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSquad {
    #[validate(length(min = 3, max = 40))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub max_size: Option<i64>,
    pub is_fixed_size: Option<bool>,
}
