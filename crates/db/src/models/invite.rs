//! Squad invite entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use squadhq_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::status::{InviteStatus, StatusId};

/// A row from the `squad_invites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SquadInvite {
    pub id: DbId,
    pub squad_id: DbId,
    pub inviter_id: DbId,
    pub invitee_id: DbId,
    pub role_id: StatusId,
    pub status_id: StatusId,
    pub message: Option<String>,
    pub expires_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl SquadInvite {
    /// An invite lapses at exactly `expires_at`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// The stored status as an enum. `None` only if the row predates the
    /// current schema, which the lookup-table FK rules out.
    pub fn status(&self) -> Option<InviteStatus> {
        InviteStatus::from_id(self.status_id)
    }

    /// Status as observed at `now`: a stored PENDING past its expiry
    /// reads as EXPIRED without the row being touched.
    pub fn effective_status(&self, now: Timestamp) -> Option<InviteStatus> {
        self.status().map(|status| {
            if status == InviteStatus::Pending && self.is_expired(now) {
                InviteStatus::Expired
            } else {
                status
            }
        })
    }
}

/// DTO for creating an invite.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvite {
    pub invitee_id: DbId,
    pub role_id: StatusId,
    #[validate(length(max = 500))]
    pub message: Option<String>,
}
