//! Squad lifecycle: creation, size changes, roles, captaincy, removal,
//! dismantling, and the derived active flag.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqliteConnection;
use validator::Validate;

use squadhq_core::error::CoreError;
use squadhq_core::external::ReputationSource;
use squadhq_core::limits::{clamp_max_size, MAX_SQUAD_SIZE, MIN_SQUAD_SIZE};
use squadhq_core::quota::{self, SquadQuota};
use squadhq_core::types::{DbId, Timestamp};
use squadhq_db::models::notification::{NewNotification, NotificationKind};
use squadhq_db::models::squad::{CreateSquad, Squad, SquadMember, SquadWithMembers, UpdateSquad};
use squadhq_db::models::status::{SquadRole, StatusId};
use squadhq_db::repositories::{MemberRepo, SquadRepo};
use squadhq_db::DbPool;
use squadhq_events::Notifier;

use crate::error::{WorkflowError, WorkflowResult};
use crate::lookup;

/// Owns all Squad and SquadMember mutation.
///
/// The invite and application workflows delegate member addition here
/// (via [`add_member_tx`]) so the capacity check, the duplicate check,
/// and the `is_active` recomputation always travel together.
pub struct SquadService {
    pool: DbPool,
    reputation: Arc<dyn ReputationSource>,
    notifier: Arc<Notifier>,
}

impl SquadService {
    pub fn new(pool: DbPool, reputation: Arc<dyn ReputationSource>, notifier: Arc<Notifier>) -> Self {
        Self {
            pool,
            reputation,
            notifier,
        }
    }

    /// Create a squad with its creator as captain and first member.
    ///
    /// The requested maximum size is clamped into the system bounds and
    /// the creator's squad quota is enforced. The squad starts inactive:
    /// one member is always below the minimum size.
    pub async fn create_squad(
        &self,
        creator_id: DbId,
        input: CreateSquad,
    ) -> WorkflowResult<SquadWithMembers> {
        input.validate()?;
        let role = resolve_role(input.creator_role_id)?;

        let quota = self.squad_quota(creator_id).await?;
        if !quota.can_create {
            return Err(CoreError::CapacityExceeded(format!(
                "squad creation quota reached ({} of {})",
                quota.current_count, quota.max_allowed
            ))
            .into());
        }

        let max_size = clamp_max_size(input.max_size.unwrap_or(MAX_SQUAD_SIZE));
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = SquadRepo::insert(
            &mut *tx,
            &input.name,
            input.description.as_deref(),
            input.avatar_url.as_deref(),
            MIN_SQUAD_SIZE,
            max_size,
            input.is_fixed_size.unwrap_or(false),
            creator_id,
            now,
        )
        .await?;
        let member = MemberRepo::insert(&mut *tx, squad.id, creator_id, role.id(), now).await?;
        tx.commit().await?;

        tracing::info!(squad_id = squad.id, creator_id, "Squad created");

        Ok(SquadWithMembers {
            squad,
            members: vec![member],
        })
    }

    /// Fetch a squad with its member list.
    pub async fn get_squad(&self, squad_id: DbId) -> WorkflowResult<SquadWithMembers> {
        let squad = SquadRepo::find_by_id(&self.pool, squad_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: squad_id,
            })?;
        let members = MemberRepo::list_for_squad(&self.pool, squad_id).await?;
        Ok(SquadWithMembers { squad, members })
    }

    /// List the squads a user belongs to.
    pub async fn squads_for_user(&self, user_id: DbId) -> WorkflowResult<Vec<Squad>> {
        Ok(SquadRepo::list_for_member(&self.pool, user_id).await?)
    }

    /// Update squad metadata. Captain only.
    ///
    /// Lowering `max_size` below the current member count is refused;
    /// the requested size is clamped into the system bounds first.
    pub async fn update_squad(
        &self,
        squad_id: DbId,
        caller_id: DbId,
        mut patch: UpdateSquad,
    ) -> WorkflowResult<Squad> {
        patch.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;
        require_captain(&squad, caller_id, "only the squad captain can update the squad")?;

        if let Some(requested) = patch.max_size {
            let clamped = clamp_max_size(requested);
            let member_count = MemberRepo::count_for_squad(&mut *tx, squad_id).await?;
            if clamped < member_count {
                return Err(CoreError::CapacityExceeded(format!(
                    "cannot lower max size to {clamped}: the squad already has {member_count} members"
                ))
                .into());
            }
            patch.max_size = Some(clamped);
        }

        let updated = SquadRepo::update(&mut *tx, squad_id, &patch, now)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: squad_id,
            })?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Change a member's role. Captain only.
    pub async fn change_member_role(
        &self,
        squad_id: DbId,
        caller_id: DbId,
        member_user_id: DbId,
        new_role_id: StatusId,
    ) -> WorkflowResult<SquadMember> {
        let role = resolve_role(new_role_id)?;

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;
        require_captain(&squad, caller_id, "only the squad captain can change member roles")?;

        let member = MemberRepo::update_role(&mut *tx, squad_id, member_user_id, role.id())
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad member",
                id: member_user_id,
            })?;
        tx.commit().await?;

        Ok(member)
    }

    /// Remove a member from the squad. Captain only; the captain cannot
    /// remove themselves (captaincy must be transferred first).
    pub async fn remove_member(
        &self,
        squad_id: DbId,
        caller_id: DbId,
        member_user_id: DbId,
    ) -> WorkflowResult<Squad> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;
        require_captain(&squad, caller_id, "only the squad captain can remove members")?;

        if member_user_id == squad.captain_id {
            return Err(CoreError::InvalidState(
                "the captain cannot be removed; transfer captaincy first".into(),
            )
            .into());
        }

        if !MemberRepo::remove(&mut *tx, squad_id, member_user_id).await? {
            return Err(CoreError::NotFound {
                entity: "Squad member",
                id: member_user_id,
            }
            .into());
        }
        let squad = refresh_active(&mut tx, squad_id, now).await?;
        tx.commit().await?;

        tracing::info!(squad_id, member_user_id, "Member removed");
        self.notifier
            .notify(
                NewNotification::new(
                    member_user_id,
                    NotificationKind::MemberRemoved,
                    "Removed from squad",
                    format!("You were removed from {}", squad.name),
                )
                .with_squad(squad.id),
            )
            .await;

        Ok(squad)
    }

    /// Leave a squad. The captain must transfer captaincy first.
    pub async fn leave_squad(&self, squad_id: DbId, user_id: DbId) -> WorkflowResult<Squad> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;

        if user_id == squad.captain_id {
            return Err(CoreError::InvalidState(
                "the captain must transfer captaincy before leaving".into(),
            )
            .into());
        }

        if !MemberRepo::remove(&mut *tx, squad_id, user_id).await? {
            return Err(CoreError::NotFound {
                entity: "Squad member",
                id: user_id,
            }
            .into());
        }
        let squad = refresh_active(&mut tx, squad_id, now).await?;
        tx.commit().await?;

        tracing::info!(squad_id, user_id, "Member left squad");
        Ok(squad)
    }

    /// Hand the captaincy to another current member. Membership rows are
    /// untouched.
    pub async fn transfer_captaincy(
        &self,
        squad_id: DbId,
        caller_id: DbId,
        new_captain_id: DbId,
    ) -> WorkflowResult<Squad> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;
        require_captain(&squad, caller_id, "only the current captain can transfer captaincy")?;

        if new_captain_id == caller_id {
            return Err(
                CoreError::InvalidState("you are already the captain of this squad".into()).into(),
            );
        }
        if !MemberRepo::is_member(&mut *tx, squad_id, new_captain_id).await? {
            return Err(CoreError::InvalidState(
                "the new captain must already be a member of the squad".into(),
            )
            .into());
        }

        let squad = SquadRepo::set_captain(&mut *tx, squad_id, new_captain_id, now)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: squad_id,
            })?;
        tx.commit().await?;

        tracing::info!(squad_id, from = caller_id, to = new_captain_id, "Captaincy transferred");
        self.notifier
            .notify(
                NewNotification::new(
                    new_captain_id,
                    NotificationKind::CaptaincyTransferred,
                    "You are now captain",
                    format!("You are now the captain of {}", squad.name),
                )
                .with_squad(squad.id),
            )
            .await;

        Ok(squad)
    }

    /// Delete a squad and everything attached to it. Allowed for the
    /// creator or the current captain.
    pub async fn dismantle_squad(&self, squad_id: DbId, caller_id: DbId) -> WorkflowResult<()> {
        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;

        if caller_id != squad.creator_id && caller_id != squad.captain_id {
            return Err(CoreError::Forbidden(
                "only the creator or the current captain can dismantle the squad".into(),
            )
            .into());
        }

        let members = MemberRepo::list_for_squad(&mut *tx, squad_id).await?;
        SquadRepo::delete(&mut *tx, squad_id).await?;
        tx.commit().await?;

        tracing::info!(squad_id, caller_id, "Squad dismantled");
        for member in members.iter().filter(|m| m.user_id != caller_id) {
            self.notifier
                .notify(NewNotification::new(
                    member.user_id,
                    NotificationKind::SquadDismantled,
                    "Squad dismantled",
                    format!("{} was dismantled", squad.name),
                ))
                .await;
        }

        Ok(())
    }

    /// The caller's squad-creation quota: how many squads they have
    /// created against how many their reputation score allows.
    pub async fn squad_quota(&self, user_id: DbId) -> WorkflowResult<SquadQuota> {
        let score = lookup::reputation_score(self.reputation.as_ref(), user_id).await;
        let current_count = SquadRepo::count_created_by(&self.pool, user_id).await?;
        Ok(quota::squad_quota(score, current_count))
    }
}

// ---------------------------------------------------------------------------
// Shared helpers (also used by the invite and position workflows)
// ---------------------------------------------------------------------------

/// Capacity- and duplicate-checked member insertion, with the active
/// flag recomputed, inside the caller's transaction.
///
/// Returns the new member and the refreshed squad row.
pub(crate) async fn add_member_tx(
    conn: &mut SqliteConnection,
    squad: &Squad,
    user_id: DbId,
    role_id: StatusId,
    now: Timestamp,
) -> WorkflowResult<(SquadMember, Squad)> {
    let member_count = MemberRepo::count_for_squad(&mut *conn, squad.id).await?;
    if member_count >= squad.max_size {
        return Err(CoreError::CapacityExceeded(format!(
            "squad is already at its maximum size of {}",
            squad.max_size
        ))
        .into());
    }
    if MemberRepo::is_member(&mut *conn, squad.id, user_id).await? {
        return Err(
            CoreError::InvalidState("user is already a member of this squad".into()).into(),
        );
    }

    let member = MemberRepo::insert(&mut *conn, squad.id, user_id, role_id, now).await?;
    let squad = SquadRepo::refresh_active(&mut *conn, squad.id, now)
        .await?
        .ok_or_else(|| CoreError::Internal("squad disappeared during member addition".into()))?;

    Ok((member, squad))
}

pub(crate) async fn require_squad(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    squad_id: DbId,
) -> WorkflowResult<Squad> {
    SquadRepo::find_by_id(&mut **tx, squad_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Squad",
            id: squad_id,
        })
        .map_err(WorkflowError::from)
}

pub(crate) fn require_captain(squad: &Squad, caller_id: DbId, reason: &str) -> WorkflowResult<()> {
    if squad.captain_id != caller_id {
        return Err(CoreError::Forbidden(reason.into()).into());
    }
    Ok(())
}

pub(crate) fn resolve_role(role_id: StatusId) -> WorkflowResult<SquadRole> {
    SquadRole::from_id(role_id)
        .ok_or_else(|| CoreError::Validation(format!("unknown squad role id {role_id}")).into())
}

async fn refresh_active(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    squad_id: DbId,
    now: Timestamp,
) -> WorkflowResult<Squad> {
    SquadRepo::refresh_active(&mut **tx, squad_id, now)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Squad",
            id: squad_id,
        })
        .map_err(WorkflowError::from)
}
