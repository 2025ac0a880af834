//! Captain-issued direct invites.
//!
//! State machine per invite: PENDING -> ACCEPTED | DECLINED | CANCELLED
//! (or EXPIRED once the window lapses). Terminal states are final; every
//! transition is guarded in SQL so a raced double-response loses
//! cleanly. Invites do NOT reserve a capacity slot: only the membership
//! insertion at acceptance consumes one, and it is capacity-checked in
//! the same transaction.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use validator::Validate;

use squadhq_core::error::CoreError;
use squadhq_core::limits::INVITE_TTL_DAYS;
use squadhq_core::types::DbId;
use squadhq_db::models::invite::{CreateInvite, SquadInvite};
use squadhq_db::models::notification::{NewNotification, NotificationKind};
use squadhq_db::models::squad::{Squad, SquadMember};
use squadhq_db::models::status::InviteStatus;
use squadhq_db::repositories::{InviteRepo, MemberRepo, SquadRepo};
use squadhq_db::DbPool;
use squadhq_events::Notifier;

use crate::error::WorkflowResult;
use crate::positions::close_excess_positions;
use crate::squads::{add_member_tx, require_captain, require_squad, resolve_role};

/// Payload returned by a successful invite acceptance.
#[derive(Debug, Serialize)]
pub struct InviteAcceptance {
    pub invite: SquadInvite,
    pub member: SquadMember,
    pub squad: Squad,
}

/// Owns all SquadInvite mutation; member addition on acceptance is
/// delegated to the squad lifecycle helpers.
pub struct InviteService {
    pool: DbPool,
    notifier: Arc<Notifier>,
}

impl InviteService {
    pub fn new(pool: DbPool, notifier: Arc<Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Send an invite. Captain only; refused when the squad is full,
    /// the invitee already belongs, or a pending invite already exists.
    pub async fn create_invite(
        &self,
        squad_id: DbId,
        inviter_id: DbId,
        input: CreateInvite,
    ) -> WorkflowResult<SquadInvite> {
        input.validate()?;
        let role = resolve_role(input.role_id)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;
        require_captain(&squad, inviter_id, "only the squad captain can send invites")?;

        let member_count = MemberRepo::count_for_squad(&mut *tx, squad_id).await?;
        if member_count >= squad.max_size {
            return Err(CoreError::CapacityExceeded(format!(
                "squad is already at its maximum size of {}",
                squad.max_size
            ))
            .into());
        }
        if MemberRepo::is_member(&mut *tx, squad_id, input.invitee_id).await? {
            return Err(
                CoreError::InvalidState("user is already a member of this squad".into()).into(),
            );
        }

        if let Some(existing) = InviteRepo::find_pending(&mut *tx, squad_id, input.invitee_id).await? {
            if existing.is_expired(now) {
                // Persist the lapse so the pending-uniqueness index
                // admits the fresh invite.
                InviteRepo::set_status(
                    &mut *tx,
                    existing.id,
                    InviteStatus::Pending,
                    InviteStatus::Expired,
                    Some(now),
                )
                .await?;
            } else {
                return Err(CoreError::InvalidState(
                    "a pending invite already exists for this user".into(),
                )
                .into());
            }
        }

        let invite = InviteRepo::insert(
            &mut *tx,
            squad_id,
            inviter_id,
            input.invitee_id,
            role.id(),
            input.message.as_deref(),
            now + Duration::days(INVITE_TTL_DAYS),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(invite_id = invite.id, squad_id, invitee_id = invite.invitee_id, "Invite sent");
        self.notifier
            .notify(
                NewNotification::new(
                    invite.invitee_id,
                    NotificationKind::InviteReceived,
                    "Squad invite",
                    format!("You have been invited to join {}", squad.name),
                )
                .with_squad(squad.id),
            )
            .await;

        Ok(invite)
    }

    /// Accept an invite: mark it accepted, add the membership with the
    /// proposed role, and recompute the active flag, in one transaction.
    /// A full squad fails the whole acceptance and the invite stays
    /// pending.
    pub async fn accept_invite(
        &self,
        invite_id: DbId,
        caller_id: DbId,
    ) -> WorkflowResult<InviteAcceptance> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let invite = require_invite(&mut tx, invite_id).await?;
        if invite.invitee_id != caller_id {
            return Err(CoreError::Forbidden(
                "only the invited user can respond to this invite".into(),
            )
            .into());
        }
        require_pending(&invite)?;

        if invite.is_expired(now) {
            // Lazy expiry: persist the lapse, then report it.
            InviteRepo::set_status(
                &mut *tx,
                invite.id,
                InviteStatus::Pending,
                InviteStatus::Expired,
                Some(now),
            )
            .await?;
            tx.commit().await?;
            return Err(CoreError::Expired(format!(
                "this invite expired on {}",
                invite.expires_at
            ))
            .into());
        }

        let squad = require_squad(&mut tx, invite.squad_id).await?;
        let invite = InviteRepo::set_status(
            &mut *tx,
            invite.id,
            InviteStatus::Pending,
            InviteStatus::Accepted,
            Some(now),
        )
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("this invite has already been responded to".into())
        })?;
        let (member, squad) = add_member_tx(&mut tx, &squad, caller_id, invite.role_id, now).await?;
        tx.commit().await?;

        tracing::info!(invite_id, squad_id = squad.id, user_id = caller_id, "Invite accepted");

        // The new member may have taken the last slot.
        close_excess_positions(&self.pool, &self.notifier, squad.id).await?;

        self.notifier
            .notify(
                NewNotification::new(
                    invite.inviter_id,
                    NotificationKind::InviteAccepted,
                    "Invite accepted",
                    format!("Your invite to {} was accepted", squad.name),
                )
                .with_squad(squad.id),
            )
            .await;

        Ok(InviteAcceptance {
            invite,
            member,
            squad,
        })
    }

    /// Decline an invite. Invitee only.
    pub async fn decline_invite(
        &self,
        invite_id: DbId,
        caller_id: DbId,
    ) -> WorkflowResult<SquadInvite> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let invite = require_invite(&mut tx, invite_id).await?;
        if invite.invitee_id != caller_id {
            return Err(CoreError::Forbidden(
                "only the invited user can respond to this invite".into(),
            )
            .into());
        }
        require_pending(&invite)?;

        if invite.is_expired(now) {
            InviteRepo::set_status(
                &mut *tx,
                invite.id,
                InviteStatus::Pending,
                InviteStatus::Expired,
                Some(now),
            )
            .await?;
            tx.commit().await?;
            return Err(CoreError::Expired(format!(
                "this invite expired on {}",
                invite.expires_at
            ))
            .into());
        }

        let squad = require_squad(&mut tx, invite.squad_id).await?;
        let invite = InviteRepo::set_status(
            &mut *tx,
            invite.id,
            InviteStatus::Pending,
            InviteStatus::Declined,
            Some(now),
        )
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("this invite has already been responded to".into())
        })?;
        tx.commit().await?;

        self.notifier
            .notify(
                NewNotification::new(
                    invite.inviter_id,
                    NotificationKind::InviteDeclined,
                    "Invite declined",
                    format!("Your invite to {} was declined", squad.name),
                )
                .with_squad(squad.id),
            )
            .await;

        Ok(invite)
    }

    /// Cancel an invite. Allowed for the original inviter or the
    /// CURRENT captain -- captaincy may have changed since it was sent.
    pub async fn cancel_invite(
        &self,
        invite_id: DbId,
        caller_id: DbId,
    ) -> WorkflowResult<SquadInvite> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let invite = require_invite(&mut tx, invite_id).await?;
        let squad = require_squad(&mut tx, invite.squad_id).await?;
        if caller_id != invite.inviter_id && caller_id != squad.captain_id {
            return Err(CoreError::Forbidden(
                "only the inviter or the current captain can cancel an invite".into(),
            )
            .into());
        }
        require_pending(&invite)?;

        if invite.is_expired(now) {
            InviteRepo::set_status(
                &mut *tx,
                invite.id,
                InviteStatus::Pending,
                InviteStatus::Expired,
                Some(now),
            )
            .await?;
            tx.commit().await?;
            return Err(CoreError::Expired(format!(
                "this invite expired on {}",
                invite.expires_at
            ))
            .into());
        }

        let invite = InviteRepo::set_status(
            &mut *tx,
            invite.id,
            InviteStatus::Pending,
            InviteStatus::Cancelled,
            Some(now),
        )
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("this invite has already been responded to".into())
        })?;
        tx.commit().await?;

        Ok(invite)
    }

    /// List a user's incoming invites, newest first.
    pub async fn invites_for_user(&self, user_id: DbId) -> WorkflowResult<Vec<SquadInvite>> {
        Ok(InviteRepo::list_for_invitee(&self.pool, user_id).await?)
    }

    /// List a squad's invites. Captain only.
    pub async fn invites_for_squad(
        &self,
        squad_id: DbId,
        caller_id: DbId,
    ) -> WorkflowResult<Vec<SquadInvite>> {
        let squad = SquadRepo::find_by_id(&self.pool, squad_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: squad_id,
            })?;
        require_captain(&squad, caller_id, "only the squad captain can list squad invites")?;
        Ok(InviteRepo::list_for_squad(&self.pool, squad_id).await?)
    }
}

async fn require_invite(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    invite_id: DbId,
) -> WorkflowResult<SquadInvite> {
    InviteRepo::find_by_id(&mut **tx, invite_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Invite",
            id: invite_id,
        })
        .map_err(Into::into)
}

/// Refuse to transition an invite that already reached a terminal state,
/// naming the state it is in.
fn require_pending(invite: &SquadInvite) -> WorkflowResult<()> {
    match invite.status() {
        Some(InviteStatus::Pending) => Ok(()),
        Some(status) => Err(CoreError::InvalidState(format!(
            "this invite has already been {}",
            status.name()
        ))
        .into()),
        None => Err(CoreError::Internal(format!(
            "invite {} has unknown status id {}",
            invite.id, invite.status_id
        ))
        .into()),
    }
}
