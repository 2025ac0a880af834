//! Open position and application entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use squadhq_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::status::{ApplicationStatus, StatusId};

/// A row from the `open_positions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpenPosition {
    pub id: DbId,
    pub squad_id: DbId,
    pub role_id: StatusId,
    pub description: Option<String>,
    pub min_score_tier_id: StatusId,
    pub requires_mutual_vouch: bool,
    /// Perk tags shown to applicants, e.g. "coaching", "prize-split".
    pub benefits: Json<Vec<String>>,
    pub is_open: bool,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl OpenPosition {
    /// A position lapses at exactly `expires_at`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Open as observed at `now`: a stored-open position past its expiry
    /// reads as closed without the row being touched.
    pub fn is_effectively_open(&self, now: Timestamp) -> bool {
        self.is_open && !self.is_expired(now)
    }
}

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub position_id: DbId,
    pub applicant_id: DbId,
    pub message: Option<String>,
    pub status_id: StatusId,
    pub expires_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Application {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn status(&self) -> Option<ApplicationStatus> {
        ApplicationStatus::from_id(self.status_id)
    }

    /// Status as observed at `now`: a stored PENDING past its expiry
    /// reads as EXPIRED. Only the sweep persists that transition.
    pub fn effective_status(&self, now: Timestamp) -> Option<ApplicationStatus> {
        self.status().map(|status| {
            if status == ApplicationStatus::Pending && self.is_expired(now) {
                ApplicationStatus::Expired
            } else {
                status
            }
        })
    }
}

/// DTO for publishing a new open position.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePosition {
    pub role_id: StatusId,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Defaults to the no-minimum tier.
    pub min_score_tier_id: Option<StatusId>,
    /// Defaults to false.
    pub requires_mutual_vouch: Option<bool>,
    pub benefits: Option<Vec<String>>,
}

/// DTO for applying to a position.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplyToPosition {
    #[validate(length(max = 1000))]
    pub message: Option<String>,
}
