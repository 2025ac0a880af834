//! Position and application workflow: eligibility gating, the
//! application state machine, approval side effects, and the free-slot
//! bound on position creation.

mod support;

use std::sync::Arc;

use assert_matches::assert_matches;
use sqlx::SqlitePool;
use squadhq_core::error::{CoreError, EligibilityFailure};
use squadhq_core::tiers::ScoreTier;
use squadhq_db::models::status::{ApplicationStatus, SquadRole};
use squadhq_db::repositories::{ApplicationRepo, NotificationRepo, PositionRepo};
use squadhq_workflows::WorkflowError;

use support::{
    add_member_directly, application_input, backdate_position, create_squad, invite_input,
    position_input, services, services_with, BrokenReputation,
};

/// The full happy path: a captain-only squad publishes a trader
/// position, a scored candidate applies and is approved, and every
/// derived fact lands: membership with the position's role, the active
/// flag, and the closed position.
#[sqlx::test(migrations = "../../db/migrations")]
async fn approval_adds_member_activates_squad_and_closes_position(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let squad_id = created.squad.id;

    let position = svc
        .positions
        .create_position(squad_id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();

    let application = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();
    assert_eq!(application.status_id, ApplicationStatus::Pending.id());

    // The captain was told about the new application.
    let inbox = NotificationRepo::list_for_user(&pool, 1, false, 50, 0)
        .await
        .unwrap();
    assert!(inbox.iter().any(|n| n.kind == "application.received"));

    let outcome = svc
        .positions
        .approve_application(application.id, 1)
        .await
        .expect("approval should succeed");

    assert_eq!(outcome.application.status_id, ApplicationStatus::Approved.id());
    assert_eq!(outcome.member.user_id, 2);
    assert_eq!(outcome.member.role_id, SquadRole::Trader.id());
    assert!(outcome.squad.is_active, "two members reach min size");
    assert!(outcome.rejected.is_empty());

    let position = PositionRepo::find_by_id(&pool, position.id).await.unwrap().unwrap();
    assert!(!position.is_open, "a filled position closes");

    let inbox = NotificationRepo::list_for_user(&pool, 2, false, 50, 0)
        .await
        .unwrap();
    assert!(inbox.iter().any(|n| n.kind == "application.approved"));
}

/// Two candidates court the same position; approving one rejects the
/// other automatically.
#[sqlx::test(migrations = "../../db/migrations")]
async fn approving_one_application_rejects_the_competitors(pool: SqlitePool) {
    let svc = services(&pool, &[(3, 1450), (4, 1500)], false);
    let created = create_squad(&svc, 1, 5).await;
    let squad_id = created.squad.id;
    add_member_directly(&pool, squad_id, 2, SquadRole::Analyst).await;

    let position = svc
        .positions
        .create_position(squad_id, 1, position_input(SquadRole::Scout, None, false))
        .await
        .unwrap();

    let third = svc
        .positions
        .apply_to_position(position.id, 3, application_input())
        .await
        .unwrap();
    let fourth = svc
        .positions
        .apply_to_position(position.id, 4, application_input())
        .await
        .unwrap();

    let outcome = svc.positions.approve_application(third.id, 1).await.unwrap();
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].id, fourth.id);

    let fourth = ApplicationRepo::find_by_id(&pool, fourth.id).await.unwrap().unwrap();
    assert_eq!(fourth.status_id, ApplicationStatus::Rejected.id());

    // No pending applications survive the approval.
    let remaining = ApplicationRepo::list_for_position(&pool, position.id)
        .await
        .unwrap();
    assert!(remaining
        .iter()
        .all(|a| a.status_id != ApplicationStatus::Pending.id()));

    let inbox = NotificationRepo::list_for_user(&pool, 4, false, 50, 0)
        .await
        .unwrap();
    assert!(inbox.iter().any(|n| n.kind == "application.rejected"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn members_cannot_apply_to_their_own_squad(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Scout, None, false))
        .await
        .unwrap();

    let err = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect_err("a member cannot apply");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(EligibilityFailure::AlreadyMember))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn score_threshold_is_inclusive(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1500), (3, 1499)], false);
    let created = create_squad(&svc, 1, 5).await;

    let position = svc
        .positions
        .create_position(
            created.squad.id,
            1,
            position_input(SquadRole::Trader, Some(ScoreTier::Tier1500), false),
        )
        .await
        .unwrap();

    // Exactly at the threshold passes.
    svc.positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect("score equal to the minimum should pass");

    // One point below fails with the precise shortfall.
    let err = svc
        .positions
        .apply_to_position(position.id, 3, application_input())
        .await
        .expect_err("one point below the minimum should fail");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(EligibilityFailure::ScoreBelowTier {
            required: 1500,
            actual: 1499,
        }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_score_reads_as_zero(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;

    let position = svc
        .positions
        .create_position(
            created.squad.id,
            1,
            position_input(SquadRole::Trader, Some(ScoreTier::Tier1400), false),
        )
        .await
        .unwrap();

    let err = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect_err("an unscored candidate cannot meet a tier");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(EligibilityFailure::ScoreBelowTier {
            required: 1400,
            actual: 0,
        }))
    );
}

/// A dead reputation service degrades to "unscored", never to a crash.
#[sqlx::test(migrations = "../../db/migrations")]
async fn broken_reputation_source_fails_closed(pool: SqlitePool) {
    let svc = services_with(&pool, Arc::new(BrokenReputation), false);
    let created = create_squad(&svc, 1, 5).await;

    let position = svc
        .positions
        .create_position(
            created.squad.id,
            1,
            position_input(SquadRole::Trader, Some(ScoreTier::Tier1400), false),
        )
        .await
        .unwrap();

    let err = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect_err("an unreachable score source denies the tier");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(EligibilityFailure::ScoreBelowTier { .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn vouch_gate_follows_the_vouch_source(pool: SqlitePool) {
    // No vouch on file.
    let svc = services(&pool, &[(2, 1600)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(
            created.squad.id,
            1,
            position_input(SquadRole::Analyst, None, true),
        )
        .await
        .unwrap();

    let err = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect_err("unvouched candidate should be refused");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(EligibilityFailure::VouchNotConfirmed))
    );

    // With the vouch confirmed, the same candidate passes.
    let vouched = services(&pool, &[(2, 1600)], true);
    vouched
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect("vouched candidate should pass");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_application_is_refused(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();

    svc.positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();

    let err = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .expect_err("second application should be refused");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(
            EligibilityFailure::DuplicateApplication
        ))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn eligible_candidates_still_cannot_apply_to_a_shut_window(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450), (3, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();

    // Filled position: closed.
    let application = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();
    svc.positions.approve_application(application.id, 1).await.unwrap();

    let err = svc
        .positions
        .apply_to_position(position.id, 3, application_input())
        .await
        .expect_err("closed position refuses applications");
    assert_matches!(err, WorkflowError::Core(CoreError::InvalidState(_)));

    // Lapsed position: expired.
    let lapsed = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Scout, None, false))
        .await
        .unwrap();
    backdate_position(&pool, lapsed.id).await;

    let err = svc
        .positions
        .apply_to_position(lapsed.id, 3, application_input())
        .await
        .expect_err("lapsed position refuses applications");
    assert_matches!(err, WorkflowError::Core(CoreError::Expired(_)));
}

/// Free-slot bound: a squad with one free slot carries at most one open
/// position, and pending invites do not reserve slots.
#[sqlx::test(migrations = "../../db/migrations")]
async fn position_creation_is_bounded_by_free_slots(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 2).await;
    let squad_id = created.squad.id;

    // An outstanding invite does not consume the slot.
    svc.invites
        .create_invite(squad_id, 1, invite_input(5, SquadRole::Scout))
        .await
        .unwrap();

    svc.positions
        .create_position(squad_id, 1, position_input(SquadRole::Analyst, None, false))
        .await
        .expect("one free slot admits one open position");

    let err = svc
        .positions
        .create_position(squad_id, 1, position_input(SquadRole::Scout, None, false))
        .await
        .expect_err("a second open position exceeds the free slots");
    assert_matches!(err, WorkflowError::Core(CoreError::CapacityExceeded(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn full_squads_cannot_publish_positions(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 2).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let err = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Scout, None, false))
        .await
        .expect_err("zero free slots admits no position");
    assert_matches!(err, WorkflowError::Core(CoreError::CapacityExceeded(_)));
}

/// Eligibility must hold at approval time, not just at application
/// time: a candidate who joined the squad in the meantime is refused.
#[sqlx::test(migrations = "../../db/migrations")]
async fn approval_rechecks_eligibility(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();

    let application = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();

    // The candidate joins through an invite before the captain decides.
    let invite = svc
        .invites
        .create_invite(created.squad.id, 1, invite_input(2, SquadRole::Scout))
        .await
        .unwrap();
    svc.invites.accept_invite(invite.id, 2).await.unwrap();

    let err = svc
        .positions
        .approve_application(application.id, 1)
        .await
        .expect_err("approval must fail closed on regressed eligibility");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::Ineligible(EligibilityFailure::AlreadyMember))
    );

    let stored = ApplicationRepo::find_by_id(&pool, application.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.status_id,
        ApplicationStatus::Pending.id(),
        "failed approval leaves the application untouched"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn approval_respects_capacity(pool: SqlitePool) {
    let svc = services(&pool, &[(3, 1450)], false);
    let created = create_squad(&svc, 1, 2).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();
    let application = svc
        .positions
        .apply_to_position(position.id, 3, application_input())
        .await
        .unwrap();

    // The last slot fills while the application sits.
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let err = svc
        .positions
        .approve_application(application.id, 1)
        .await
        .expect_err("no slot left for the applicant");
    assert_matches!(err, WorkflowError::Core(CoreError::CapacityExceeded(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn approve_and_reject_are_captain_only(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();
    let application = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();

    let err = svc
        .positions
        .approve_application(application.id, 2)
        .await
        .expect_err("the applicant cannot approve themselves");
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));

    let err = svc
        .positions
        .reject_application(application.id, 2)
        .await
        .expect_err("the applicant cannot reject either");
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn withdrawal_is_applicant_only_and_terminal(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();
    let application = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();

    let err = svc
        .positions
        .withdraw_application(application.id, 1)
        .await
        .expect_err("the captain cannot withdraw for the applicant");
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));

    let withdrawn = svc
        .positions
        .withdraw_application(application.id, 2)
        .await
        .expect("the applicant can withdraw");
    assert_eq!(withdrawn.status_id, ApplicationStatus::Withdrawn.id());

    let err = svc
        .positions
        .approve_application(application.id, 1)
        .await
        .expect_err("a withdrawn application cannot be approved");
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::InvalidState(msg)) if msg.contains("withdrawn")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_position_rejects_and_notifies_applicants(pool: SqlitePool) {
    let svc = services(&pool, &[(2, 1450), (3, 1450)], false);
    let created = create_squad(&svc, 1, 5).await;
    let position = svc
        .positions
        .create_position(created.squad.id, 1, position_input(SquadRole::Trader, None, false))
        .await
        .unwrap();
    let first = svc
        .positions
        .apply_to_position(position.id, 2, application_input())
        .await
        .unwrap();
    let second = svc
        .positions
        .apply_to_position(position.id, 3, application_input())
        .await
        .unwrap();

    svc.positions
        .delete_position(position.id, 1)
        .await
        .expect("captain can delete the position");

    assert!(PositionRepo::find_by_id(&pool, position.id)
        .await
        .unwrap()
        .is_none());

    // Applications cascade with the position, but their holders were
    // notified of the closure first.
    for (user, application) in [(2, &first), (3, &second)] {
        assert!(ApplicationRepo::find_by_id(&pool, application.id)
            .await
            .unwrap()
            .is_none());
        let inbox = NotificationRepo::list_for_user(&pool, user, false, 50, 0)
            .await
            .unwrap();
        assert!(inbox.iter().any(|n| n.kind == "position.closed"));
    }
}
