//! Shared fixtures for the workflow integration tests: stub
//! collaborators, service construction, and row backdating helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use squadhq_core::external::{ExternalError, ReputationSource, VouchSource};
use squadhq_core::tiers::ScoreTier;
use squadhq_core::types::DbId;
use squadhq_db::models::invite::CreateInvite;
use squadhq_db::models::position::{ApplyToPosition, CreatePosition};
use squadhq_db::models::squad::{CreateSquad, SquadWithMembers};
use squadhq_db::models::status::SquadRole;
use squadhq_db::repositories::{MemberRepo, SquadRepo};
use squadhq_db::DbPool;
use squadhq_events::{EventBus, Notifier};
use squadhq_workflows::{InviteService, PositionService, SquadService};

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Reputation source with a fixed score table; everyone else is unscored.
pub struct FixedScores(pub HashMap<DbId, i64>);

#[async_trait]
impl ReputationSource for FixedScores {
    async fn score(&self, user_id: DbId) -> Result<Option<i64>, ExternalError> {
        Ok(self.0.get(&user_id).copied())
    }
}

/// Vouch source answering the same for every pair.
pub struct FixedVouch(pub bool);

#[async_trait]
impl VouchSource for FixedVouch {
    async fn has_mutual_vouch(&self, _a: DbId, _b: DbId) -> Result<bool, ExternalError> {
        Ok(self.0)
    }
}

/// A reputation source that is always down, for fallback tests.
pub struct BrokenReputation;

#[async_trait]
impl ReputationSource for BrokenReputation {
    async fn score(&self, _user_id: DbId) -> Result<Option<i64>, ExternalError> {
        Err(ExternalError::Unavailable("reputation service down".into()))
    }
}

// ---------------------------------------------------------------------------
// Service construction
// ---------------------------------------------------------------------------

pub struct Services {
    pub squads: SquadService,
    pub invites: InviteService,
    pub positions: PositionService,
}

/// Build all three services over the test pool with stubbed
/// collaborators.
pub fn services(pool: &DbPool, scores: &[(DbId, i64)], vouched: bool) -> Services {
    services_with(
        pool,
        Arc::new(FixedScores(scores.iter().copied().collect())),
        vouched,
    )
}

/// Like [`services`], but with an arbitrary reputation source.
pub fn services_with(
    pool: &DbPool,
    reputation: Arc<dyn ReputationSource>,
    vouched: bool,
) -> Services {
    let bus = Arc::new(EventBus::default());
    let notifier = Arc::new(Notifier::new(pool.clone(), bus));
    let vouch: Arc<dyn VouchSource> = Arc::new(FixedVouch(vouched));

    Services {
        squads: SquadService::new(pool.clone(), Arc::clone(&reputation), Arc::clone(&notifier)),
        invites: InviteService::new(pool.clone(), Arc::clone(&notifier)),
        positions: PositionService::new(pool.clone(), reputation, vouch, notifier),
    }
}

// ---------------------------------------------------------------------------
// Entity fixtures
// ---------------------------------------------------------------------------

pub fn squad_input(max_size: i64) -> CreateSquad {
    CreateSquad {
        name: "Night Shift".into(),
        description: None,
        avatar_url: None,
        max_size: Some(max_size),
        is_fixed_size: None,
        creator_role_id: SquadRole::Trader.id(),
    }
}

/// Create a squad through the workflow and return it with its members.
pub async fn create_squad(services: &Services, creator: DbId, max_size: i64) -> SquadWithMembers {
    services
        .squads
        .create_squad(creator, squad_input(max_size))
        .await
        .expect("squad should be created")
}

pub fn invite_input(invitee: DbId, role: SquadRole) -> CreateInvite {
    CreateInvite {
        invitee_id: invitee,
        role_id: role.id(),
        message: None,
    }
}

pub fn position_input(role: SquadRole, tier: Option<ScoreTier>, vouch: bool) -> CreatePosition {
    CreatePosition {
        role_id: role.id(),
        description: None,
        min_score_tier_id: tier.map(ScoreTier::id),
        requires_mutual_vouch: Some(vouch),
        benefits: None,
    }
}

pub fn application_input() -> ApplyToPosition {
    ApplyToPosition { message: None }
}

/// Setup shortcut: insert a member directly and refresh the active flag,
/// bypassing the invite workflow.
pub async fn add_member_directly(pool: &DbPool, squad_id: DbId, user_id: DbId, role: SquadRole) {
    let now = Utc::now();
    MemberRepo::insert(pool, squad_id, user_id, role.id(), now)
        .await
        .expect("member should insert");
    SquadRepo::refresh_active(pool, squad_id, now)
        .await
        .expect("refresh should run");
}

// ---------------------------------------------------------------------------
// Backdating helpers (for expiry tests)
// ---------------------------------------------------------------------------

pub async fn backdate_invite(pool: &DbPool, invite_id: DbId) {
    sqlx::query("UPDATE squad_invites SET expires_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(invite_id)
        .execute(pool)
        .await
        .expect("backdate should apply");
}

pub async fn backdate_application(pool: &DbPool, application_id: DbId) {
    sqlx::query("UPDATE applications SET expires_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(application_id)
        .execute(pool)
        .await
        .expect("backdate should apply");
}

pub async fn backdate_position(pool: &DbPool, position_id: DbId) {
    sqlx::query("UPDATE open_positions SET expires_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(position_id)
        .execute(pool)
        .await
        .expect("backdate should apply");
}
