//! Open positions and applications.
//!
//! Application state machine: PENDING -> APPROVED | REJECTED |
//! WITHDRAWN | EXPIRED, all terminal. Approving one pending application
//! closes the position and rejects every competing pending application
//! in the same transaction. Eligibility is evaluated when an
//! application is submitted AND re-validated at approval time, with the
//! store-backed facts re-read inside the mutating transaction.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use validator::Validate;

use squadhq_core::eligibility::{self, CandidateSnapshot, PositionRequirements};
use squadhq_core::error::{CoreError, EligibilityFailure};
use squadhq_core::external::{ReputationSource, VouchSource};
use squadhq_core::limits::{free_slots, APPLICATION_TTL_DAYS, POSITION_TTL_DAYS};
use squadhq_core::tiers::ScoreTier;
use squadhq_core::types::{DbId, Timestamp};
use squadhq_db::models::notification::{NewNotification, NotificationKind};
use squadhq_db::models::position::{
    Application, ApplyToPosition, CreatePosition, OpenPosition,
};
use squadhq_db::models::squad::{Squad, SquadMember};
use squadhq_db::models::status::{ApplicationStatus, SquadRole};
use squadhq_db::repositories::{ApplicationRepo, InviteRepo, MemberRepo, PositionRepo, SquadRepo};
use squadhq_db::DbPool;
use squadhq_events::Notifier;

use crate::error::{is_unique_violation, WorkflowResult};
use crate::lookup;
use crate::squads::{add_member_tx, require_captain, require_squad, resolve_role};

/// Payload returned by a successful application approval.
#[derive(Debug, Serialize)]
pub struct ApprovalOutcome {
    pub application: Application,
    pub member: SquadMember,
    pub squad: Squad,
    pub position: OpenPosition,
    /// Competing applications that were auto-rejected.
    pub rejected: Vec<Application>,
}

/// Counts from one expiry sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExpirationSweep {
    pub positions_closed: usize,
    pub applications_expired: usize,
    pub invites_expired: usize,
}

/// Owns all OpenPosition and Application mutation; member addition on
/// approval is delegated to the squad lifecycle helpers.
pub struct PositionService {
    pool: DbPool,
    reputation: Arc<dyn ReputationSource>,
    vouch: Arc<dyn VouchSource>,
    notifier: Arc<Notifier>,
}

impl PositionService {
    pub fn new(
        pool: DbPool,
        reputation: Arc<dyn ReputationSource>,
        vouch: Arc<dyn VouchSource>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            pool,
            reputation,
            vouch,
            notifier,
        }
    }

    /// Publish an open position. Captain only.
    ///
    /// The number of open, non-expired positions is bounded by the
    /// squad's free slots: committed members are the only thing that
    /// consumes a slot, pending invites are not counted.
    pub async fn create_position(
        &self,
        squad_id: DbId,
        captain_id: DbId,
        input: CreatePosition,
    ) -> WorkflowResult<OpenPosition> {
        input.validate()?;
        let role = resolve_role(input.role_id)?;
        let tier = match input.min_score_tier_id {
            Some(id) => ScoreTier::from_id(id)
                .ok_or_else(|| CoreError::Validation(format!("unknown score tier id {id}")))?,
            None => ScoreTier::Open,
        };
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let squad = require_squad(&mut tx, squad_id).await?;
        require_captain(&squad, captain_id, "only the squad captain can publish positions")?;

        let member_count = MemberRepo::count_for_squad(&mut *tx, squad_id).await?;
        let free = free_slots(squad.max_size, member_count);
        let open = PositionRepo::count_open_for_squad(&mut *tx, squad_id, now).await?;
        if open >= free {
            return Err(CoreError::CapacityExceeded(format!(
                "no free slot for another open position ({open} open, {free} slots free)"
            ))
            .into());
        }

        let position = PositionRepo::insert(
            &mut *tx,
            squad_id,
            role.id(),
            input.description.as_deref(),
            tier.id(),
            input.requires_mutual_vouch.unwrap_or(false),
            input.benefits.unwrap_or_default(),
            now + Duration::days(POSITION_TTL_DAYS),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(position_id = position.id, squad_id, "Position published");
        Ok(position)
    }

    /// Fetch a position by id.
    pub async fn get_position(&self, position_id: DbId) -> WorkflowResult<OpenPosition> {
        PositionRepo::find_by_id(&self.pool, position_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Position",
                id: position_id,
            })
            .map_err(Into::into)
    }

    /// List a squad's open, non-expired positions.
    pub async fn open_positions_for_squad(
        &self,
        squad_id: DbId,
    ) -> WorkflowResult<Vec<OpenPosition>> {
        Ok(PositionRepo::list_open_for_squad(&self.pool, squad_id, Utc::now()).await?)
    }

    /// Delete a position. Captain only. Every pending application is
    /// rejected in the same transaction; the applicants are notified
    /// once it commits.
    pub async fn delete_position(
        &self,
        position_id: DbId,
        captain_id: DbId,
    ) -> WorkflowResult<()> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let position = require_position_tx(&mut tx, position_id).await?;
        let squad = require_squad(&mut tx, position.squad_id).await?;
        require_captain(&squad, captain_id, "only the squad captain can delete a position")?;

        let rejected =
            ApplicationRepo::reject_pending_for_position(&mut *tx, position_id, now).await?;
        PositionRepo::delete(&mut *tx, position_id).await?;
        tx.commit().await?;

        tracing::info!(position_id, squad_id = squad.id, rejected = rejected.len(), "Position deleted");
        self.notify_position_closed(&squad, &position, &rejected).await;

        Ok(())
    }

    /// Apply to a position.
    ///
    /// Eligibility is evaluated first so the caller gets the most
    /// specific refusal; only then is the position's open/expired state
    /// checked. The insert is re-guarded inside the transaction and the
    /// partial unique index backstops the duplicate check.
    pub async fn apply_to_position(
        &self,
        position_id: DbId,
        applicant_id: DbId,
        input: ApplyToPosition,
    ) -> WorkflowResult<Application> {
        input.validate()?;
        let now = Utc::now();

        let position = self.get_position(position_id).await?;
        let squad = SquadRepo::find_by_id(&self.pool, position.squad_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: position.squad_id,
            })?;

        let requirements = position_requirements(&position)?;
        let snapshot = self
            .candidate_snapshot(&squad, &position, applicant_id, None)
            .await?;
        eligibility::evaluate(&requirements, &snapshot).check()?;

        // Eligible, but the window may still be shut.
        require_open(&position, now)?;

        let mut tx = self.pool.begin().await?;
        let position = require_position_tx(&mut tx, position_id).await?;
        require_open(&position, now)?;
        let application = match ApplicationRepo::insert(
            &mut *tx,
            position_id,
            applicant_id,
            input.message.as_deref(),
            now + Duration::days(APPLICATION_TTL_DAYS),
            now,
        )
        .await
        {
            Ok(application) => application,
            Err(e) if is_unique_violation(&e) => {
                return Err(EligibilityFailure::DuplicateApplication.into());
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        tracing::info!(application_id = application.id, position_id, applicant_id, "Application submitted");
        self.notifier
            .notify(
                NewNotification::new(
                    squad.captain_id,
                    NotificationKind::ApplicationReceived,
                    "New application",
                    format!("A candidate applied to your {} position", role_name(&position)),
                )
                .with_squad(squad.id)
                .with_position(position.id)
                .with_application(application.id),
            )
            .await;

        Ok(application)
    }

    /// Approve a pending application. Captain only.
    ///
    /// Eligibility and capacity are re-validated inside the mutating
    /// transaction (store-backed facts re-read; score and vouch
    /// re-fetched just before it), and approval fails closed if the
    /// candidate no longer qualifies. On success, in one transaction:
    /// the application is approved, the membership is inserted with the
    /// position's role, the active flag is recomputed, the position is
    /// closed, and every competing pending application is rejected.
    pub async fn approve_application(
        &self,
        application_id: DbId,
        captain_id: DbId,
    ) -> WorkflowResult<ApprovalOutcome> {
        let now = Utc::now();

        let application = self.require_application(application_id).await?;
        let position = self.get_position(application.position_id).await?;
        let squad = SquadRepo::find_by_id(&self.pool, position.squad_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: position.squad_id,
            })?;
        require_captain(&squad, captain_id, "only the squad captain can approve applications")?;
        require_application_pending(&application, now)?;
        require_open(&position, now)?;

        // External facts cannot be fetched inside the transaction; grab
        // them as late as possible.
        let requirements = position_requirements(&position)?;
        let score = lookup::reputation_score(self.reputation.as_ref(), application.applicant_id).await;
        let vouched = if requirements.requires_mutual_vouch {
            lookup::mutual_vouch(
                self.vouch.as_ref(),
                application.applicant_id,
                squad.captain_id,
            )
            .await
        } else {
            false
        };

        let mut tx = self.pool.begin().await?;
        let mut position = require_position_tx(&mut tx, application.position_id).await?;
        require_open(&position, now)?;
        let squad = require_squad(&mut tx, position.squad_id).await?;

        // Re-read the store-backed facts inside the transaction.
        let is_member =
            MemberRepo::is_member(&mut *tx, squad.id, application.applicant_id).await?;
        let has_other_application = ApplicationRepo::find_active_for_applicant(
            &mut *tx,
            position.id,
            application.applicant_id,
            Some(application.id),
        )
        .await?
        .is_some();
        let snapshot = CandidateSnapshot {
            is_member,
            has_active_application: has_other_application,
            score,
            has_mutual_vouch: vouched,
        };
        eligibility::evaluate(&requirements, &snapshot).check()?;

        let application = ApplicationRepo::set_status(
            &mut *tx,
            application_id,
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            Some(now),
        )
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("this application has already been responded to".into())
        })?;
        let (member, squad) =
            add_member_tx(&mut tx, &squad, application.applicant_id, position.role_id, now).await?;
        PositionRepo::close(&mut *tx, position.id).await?;
        let rejected =
            ApplicationRepo::reject_other_pending(&mut *tx, position.id, application.id, now)
                .await?;
        tx.commit().await?;
        position.is_open = false;

        tracing::info!(
            application_id,
            position_id = position.id,
            squad_id = squad.id,
            applicant_id = application.applicant_id,
            auto_rejected = rejected.len(),
            "Application approved"
        );

        self.notifier
            .notify(
                NewNotification::new(
                    application.applicant_id,
                    NotificationKind::ApplicationApproved,
                    "Application approved",
                    format!("You have joined {} as {}", squad.name, role_name(&position)),
                )
                .with_squad(squad.id)
                .with_position(position.id)
                .with_application(application.id),
            )
            .await;
        for loser in &rejected {
            self.notifier
                .notify(
                    NewNotification::new(
                        loser.applicant_id,
                        NotificationKind::ApplicationRejected,
                        "Application rejected",
                        format!("The {} position at {} was filled", role_name(&position), squad.name),
                    )
                    .with_squad(squad.id)
                    .with_position(position.id)
                    .with_application(loser.id),
                )
                .await;
        }

        Ok(ApprovalOutcome {
            application,
            member,
            squad,
            position,
            rejected,
        })
    }

    /// Reject a pending application. Captain only.
    pub async fn reject_application(
        &self,
        application_id: DbId,
        captain_id: DbId,
    ) -> WorkflowResult<Application> {
        let now = Utc::now();

        let application = self.require_application(application_id).await?;
        let position = self.get_position(application.position_id).await?;
        let squad = SquadRepo::find_by_id(&self.pool, position.squad_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: position.squad_id,
            })?;
        require_captain(&squad, captain_id, "only the squad captain can reject applications")?;
        require_application_pending(&application, now)?;

        let application = ApplicationRepo::set_status(
            &self.pool,
            application_id,
            ApplicationStatus::Pending,
            ApplicationStatus::Rejected,
            Some(now),
        )
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("this application has already been responded to".into())
        })?;

        self.notifier
            .notify(
                NewNotification::new(
                    application.applicant_id,
                    NotificationKind::ApplicationRejected,
                    "Application rejected",
                    format!("Your application to {} was rejected", squad.name),
                )
                .with_squad(squad.id)
                .with_position(position.id)
                .with_application(application.id),
            )
            .await;

        Ok(application)
    }

    /// Withdraw a pending application. Applicant only.
    pub async fn withdraw_application(
        &self,
        application_id: DbId,
        caller_id: DbId,
    ) -> WorkflowResult<Application> {
        let now = Utc::now();

        let application = self.require_application(application_id).await?;
        if application.applicant_id != caller_id {
            return Err(CoreError::Forbidden(
                "only the applicant can withdraw an application".into(),
            )
            .into());
        }
        require_application_pending(&application, now)?;

        ApplicationRepo::set_status(
            &self.pool,
            application_id,
            ApplicationStatus::Pending,
            ApplicationStatus::Withdrawn,
            Some(now),
        )
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("this application has already been responded to".into()).into()
        })
    }

    /// List a position's applications. Captain only.
    pub async fn applications_for_position(
        &self,
        position_id: DbId,
        caller_id: DbId,
    ) -> WorkflowResult<Vec<Application>> {
        let position = self.get_position(position_id).await?;
        let squad = SquadRepo::find_by_id(&self.pool, position.squad_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Squad",
                id: position.squad_id,
            })?;
        require_captain(&squad, caller_id, "only the squad captain can list applications")?;
        Ok(ApplicationRepo::list_for_position(&self.pool, position_id).await?)
    }

    /// List a user's own applications, newest first.
    pub async fn applications_for_user(&self, user_id: DbId) -> WorkflowResult<Vec<Application>> {
        Ok(ApplicationRepo::list_for_applicant(&self.pool, user_id).await?)
    }

    /// Close every open position of a squad whose free slots have
    /// dropped to zero (e.g. after an invite acceptance filled the last
    /// slot through the side door).
    pub async fn close_excess_positions(&self, squad_id: DbId) -> WorkflowResult<usize> {
        let rejected = close_excess_positions(&self.pool, &self.notifier, squad_id).await?;
        Ok(rejected.len())
    }

    /// Periodic sweep: close expired open positions, expire pending
    /// applications and invites past their window, and notify the
    /// affected applicants. This is the only writer of EXPIRED state;
    /// read paths compute effective status without mutating.
    pub async fn process_expirations(&self) -> WorkflowResult<ExpirationSweep> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let closed_positions = PositionRepo::close_expired(&mut *tx, now).await?;
        let expired_applications = ApplicationRepo::expire_pending(&mut *tx, now).await?;
        let expired_invites = InviteRepo::expire_pending(&mut *tx, now).await?;
        tx.commit().await?;

        for application in &expired_applications {
            self.notifier
                .notify(
                    NewNotification::new(
                        application.applicant_id,
                        NotificationKind::ApplicationExpired,
                        "Application expired",
                        "Your application expired without a response".to_string(),
                    )
                    .with_position(application.position_id)
                    .with_application(application.id),
                )
                .await;
        }

        let sweep = ExpirationSweep {
            positions_closed: closed_positions.len(),
            applications_expired: expired_applications.len(),
            invites_expired: expired_invites.len(),
        };
        if sweep.positions_closed > 0 || sweep.applications_expired > 0 || sweep.invites_expired > 0
        {
            tracing::info!(
                positions_closed = sweep.positions_closed,
                applications_expired = sweep.applications_expired,
                invites_expired = sweep.invites_expired,
                "Expiry sweep applied"
            );
        }
        Ok(sweep)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Gather the candidate facts for an eligibility evaluation:
    /// membership and duplicate-application state from the store, score
    /// and vouch state from the external collaborators (bounded,
    /// fail-closed).
    async fn candidate_snapshot(
        &self,
        squad: &Squad,
        position: &OpenPosition,
        applicant_id: DbId,
        exclude_application: Option<DbId>,
    ) -> WorkflowResult<CandidateSnapshot> {
        let is_member = MemberRepo::is_member(&self.pool, squad.id, applicant_id).await?;
        let has_active_application = ApplicationRepo::find_active_for_applicant(
            &self.pool,
            position.id,
            applicant_id,
            exclude_application,
        )
        .await?
        .is_some();
        let score = lookup::reputation_score(self.reputation.as_ref(), applicant_id).await;
        let has_mutual_vouch = if position.requires_mutual_vouch {
            lookup::mutual_vouch(self.vouch.as_ref(), applicant_id, squad.captain_id).await
        } else {
            false
        };

        Ok(CandidateSnapshot {
            is_member,
            has_active_application,
            score,
            has_mutual_vouch,
        })
    }

    async fn require_application(&self, application_id: DbId) -> WorkflowResult<Application> {
        ApplicationRepo::find_by_id(&self.pool, application_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Application",
                id: application_id,
            })
            .map_err(Into::into)
    }

    async fn notify_position_closed(
        &self,
        squad: &Squad,
        position: &OpenPosition,
        rejected: &[Application],
    ) {
        for application in rejected {
            self.notifier
                .notify(
                    NewNotification::new(
                        application.applicant_id,
                        NotificationKind::PositionClosed,
                        "Position closed",
                        format!(
                            "The {} position at {} was closed",
                            role_name(position),
                            squad.name
                        ),
                    )
                    .with_squad(squad.id)
                    .with_application(application.id),
                )
                .await;
        }
    }
}

/// Close all open positions of a squad when its free slots hit zero,
/// rejecting their pending applications and notifying the applicants.
/// Shared with the invite workflow.
pub(crate) async fn close_excess_positions(
    pool: &DbPool,
    notifier: &Notifier,
    squad_id: DbId,
) -> WorkflowResult<Vec<Application>> {
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    let squad = require_squad(&mut tx, squad_id).await?;
    let member_count = MemberRepo::count_for_squad(&mut *tx, squad_id).await?;
    if free_slots(squad.max_size, member_count) > 0 {
        return Ok(Vec::new());
    }

    let closed = PositionRepo::close_all_for_squad(&mut *tx, squad_id).await?;
    let mut rejected = Vec::new();
    for position in &closed {
        rejected
            .extend(ApplicationRepo::reject_pending_for_position(&mut *tx, position.id, now).await?);
    }
    tx.commit().await?;

    if !closed.is_empty() {
        tracing::info!(squad_id, closed = closed.len(), "Closed open positions on full squad");
    }
    for application in &rejected {
        notifier
            .notify(
                NewNotification::new(
                    application.applicant_id,
                    NotificationKind::PositionClosed,
                    "Position closed",
                    format!("The position you applied to at {} closed: the squad is full", squad.name),
                )
                .with_squad(squad.id)
                .with_application(application.id),
            )
            .await;
    }

    Ok(rejected)
}

fn position_requirements(position: &OpenPosition) -> WorkflowResult<PositionRequirements> {
    let tier = ScoreTier::from_id(position.min_score_tier_id).ok_or_else(|| {
        CoreError::Internal(format!(
            "position {} has unknown score tier id {}",
            position.id, position.min_score_tier_id
        ))
    })?;
    Ok(PositionRequirements {
        min_score: tier.minimum_score(),
        requires_mutual_vouch: position.requires_mutual_vouch,
    })
}

/// Refuse to act on a position that is closed or past its window.
fn require_open(position: &OpenPosition, now: Timestamp) -> WorkflowResult<()> {
    if position.is_effectively_open(now) {
        return Ok(());
    }
    if position.is_expired(now) {
        Err(CoreError::Expired(format!("this position expired on {}", position.expires_at)).into())
    } else {
        Err(CoreError::InvalidState("this position is closed".into()).into())
    }
}

/// Refuse to transition an application that already reached a terminal
/// state or lapsed, naming the state it is in.
fn require_application_pending(application: &Application, now: Timestamp) -> WorkflowResult<()> {
    match application.status() {
        Some(ApplicationStatus::Pending) => {
            if application.is_expired(now) {
                Err(CoreError::Expired(format!(
                    "this application expired on {}",
                    application.expires_at
                ))
                .into())
            } else {
                Ok(())
            }
        }
        Some(status) => Err(CoreError::InvalidState(format!(
            "this application has already been {}",
            status.name()
        ))
        .into()),
        None => Err(CoreError::Internal(format!(
            "application {} has unknown status id {}",
            application.id, application.status_id
        ))
        .into()),
    }
}

fn role_name(position: &OpenPosition) -> &'static str {
    SquadRole::from_id(position.role_id)
        .map(SquadRole::name)
        .unwrap_or("unknown")
}

async fn require_position_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    position_id: DbId,
) -> WorkflowResult<OpenPosition> {
    PositionRepo::find_by_id(&mut **tx, position_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Position",
            id: position_id,
        })
        .map_err(Into::into)
}
