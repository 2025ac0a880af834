//! Squad lifecycle: creation, quota, size changes, roles, captaincy,
//! removal, leaving, and dismantling.

mod support;

use assert_matches::assert_matches;
use sqlx::SqlitePool;
use squadhq_core::error::CoreError;
use squadhq_db::models::squad::UpdateSquad;
use squadhq_db::models::status::SquadRole;
use squadhq_workflows::WorkflowError;

use support::{add_member_directly, create_squad, services, squad_input};

#[sqlx::test(migrations = "../../db/migrations")]
async fn creation_clamps_size_and_starts_inactive(pool: SqlitePool) {
    let svc = services(&pool, &[], false);

    let created = svc
        .squads
        .create_squad(1, squad_input(99))
        .await
        .expect("squad should be created");

    assert_eq!(created.squad.max_size, 7, "max size clamps to the system bound");
    assert_eq!(created.squad.min_size, 2);
    assert_eq!(created.squad.creator_id, 1);
    assert_eq!(created.squad.captain_id, 1);
    assert!(!created.squad.is_active, "one member is below min size");
    assert_eq!(created.members.len(), 1);
    assert_eq!(created.members[0].role_id, SquadRole::Trader.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unscored_creator_gets_base_quota_of_one(pool: SqlitePool) {
    let svc = services(&pool, &[], false);

    create_squad(&svc, 1, 5).await;

    let err = svc
        .squads
        .create_squad(1, squad_input(5))
        .await
        .expect_err("second squad should exceed the base quota");
    assert_matches!(err, WorkflowError::Core(CoreError::CapacityExceeded(_)));

    let quota = svc.squads.squad_quota(1).await.unwrap();
    assert!(!quota.can_create);
    assert_eq!(quota.current_count, 1);
    assert_eq!(quota.max_allowed, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scored_creator_gets_a_higher_quota(pool: SqlitePool) {
    let svc = services(&pool, &[(1, 1500)], false);

    create_squad(&svc, 1, 5).await;
    create_squad(&svc, 1, 5).await;

    let err = svc
        .squads
        .create_squad(1, squad_input(5))
        .await
        .expect_err("third squad should exceed the 1500-score quota of two");
    assert_matches!(err, WorkflowError::Core(CoreError::CapacityExceeded(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_is_captain_only(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;

    let patch = UpdateSquad {
        name: Some("Renamed".into()),
        description: None,
        avatar_url: None,
        max_size: None,
        is_fixed_size: None,
    };
    let err = svc
        .squads
        .update_squad(created.squad.id, 2, patch.clone())
        .await
        .expect_err("non-captain update should fail");
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));

    let updated = svc
        .squads
        .update_squad(created.squad.id, 1, patch)
        .await
        .expect("captain update should succeed");
    assert_eq!(updated.name, "Renamed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn max_size_cannot_drop_below_member_count(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;
    add_member_directly(&pool, created.squad.id, 3, SquadRole::Scout).await;

    let patch = UpdateSquad {
        name: None,
        description: None,
        avatar_url: None,
        max_size: Some(2),
        is_fixed_size: None,
    };
    let err = svc
        .squads
        .update_squad(created.squad.id, 1, patch)
        .await
        .expect_err("shrinking below the member count should fail");
    assert_matches!(err, WorkflowError::Core(CoreError::CapacityExceeded(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_member_role_guards(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let err = svc
        .squads
        .change_member_role(created.squad.id, 2, 2, SquadRole::Scout.id())
        .await
        .expect_err("non-captain role change should fail");
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));

    let err = svc
        .squads
        .change_member_role(created.squad.id, 1, 9, SquadRole::Scout.id())
        .await
        .expect_err("unknown member should not be found");
    assert_matches!(err, WorkflowError::Core(CoreError::NotFound { .. }));

    let member = svc
        .squads
        .change_member_role(created.squad.id, 1, 2, SquadRole::Scout.id())
        .await
        .expect("captain role change should succeed");
    assert_eq!(member.role_id, SquadRole::Scout.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn captain_cannot_remove_themselves(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;

    let err = svc
        .squads
        .remove_member(created.squad.id, 1, 1)
        .await
        .expect_err("self-removal must be refused");
    assert_matches!(err, WorkflowError::Core(CoreError::InvalidState(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn removal_recomputes_the_active_flag(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let before = svc.squads.get_squad(created.squad.id).await.unwrap();
    assert!(before.squad.is_active);

    let after = svc
        .squads
        .remove_member(created.squad.id, 1, 2)
        .await
        .expect("removal should succeed");
    assert!(!after.is_active, "dropping below min size deactivates");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn captain_cannot_leave_without_transferring(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let err = svc
        .squads
        .leave_squad(created.squad.id, 1)
        .await
        .expect_err("captain leave must be refused");
    assert_matches!(err, WorkflowError::Core(CoreError::InvalidState(_)));

    // A regular member can leave freely.
    svc.squads
        .leave_squad(created.squad.id, 2)
        .await
        .expect("member leave should succeed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn captaincy_transfers_only_to_members(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let err = svc
        .squads
        .transfer_captaincy(created.squad.id, 1, 9)
        .await
        .expect_err("transfer to a stranger must fail");
    assert_matches!(err, WorkflowError::Core(CoreError::InvalidState(_)));

    let squad = svc
        .squads
        .transfer_captaincy(created.squad.id, 1, 2)
        .await
        .expect("transfer to a member should succeed");
    assert_eq!(squad.captain_id, 2);

    // Membership rows are untouched; the old captain can now leave.
    let detail = svc.squads.get_squad(created.squad.id).await.unwrap();
    assert_eq!(detail.members.len(), 2);
    svc.squads
        .leave_squad(created.squad.id, 1)
        .await
        .expect("old captain can leave after transfer");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dismantle_is_creator_or_captain_only(pool: SqlitePool) {
    let svc = services(&pool, &[], false);
    let created = create_squad(&svc, 1, 5).await;
    add_member_directly(&pool, created.squad.id, 2, SquadRole::Analyst).await;

    let err = svc
        .squads
        .dismantle_squad(created.squad.id, 2)
        .await
        .expect_err("a regular member cannot dismantle");
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));

    // A captain who is not the creator may dismantle.
    svc.squads
        .transfer_captaincy(created.squad.id, 1, 2)
        .await
        .unwrap();
    svc.squads
        .dismantle_squad(created.squad.id, 2)
        .await
        .expect("the captain can dismantle");

    let err = svc
        .squads
        .get_squad(created.squad.id)
        .await
        .expect_err("dismantled squad should be gone");
    assert_matches!(err, WorkflowError::Core(CoreError::NotFound { .. }));
}
