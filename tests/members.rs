//! Membership-management tests: role changes, owner immutability, removal
//! rules, manager resolution (incl. the sole-member bootstrap), and the
//! diff-based accessible-project replacement.

mod common;
use common::*;

use taskdeck::db::queries;
use taskdeck::error::AppError;
use taskdeck::memberships;
use taskdeck::models::WorkspaceRole;

#[test]
fn resolve_membership_defaults_to_first_workspace() {
    let db = test_db();
    let conn = db.conn();

    let user = create_test_user(&conn, "user");
    let first = create_test_workspace(&conn, "First", &user);
    let other_owner = create_test_user(&conn, "other");
    let second = create_test_workspace(&conn, "Second", &other_owner);
    add_member(&conn, &second, &user, WorkspaceRole::Participant);

    let resolved = memberships::resolve_membership(&conn, &user.id, None).unwrap();
    assert_eq!(resolved.workspace_id, first.id);

    let explicit = memberships::resolve_membership(&conn, &user.id, Some(&second.id)).unwrap();
    assert_eq!(explicit.workspace_id, second.id);

    let stranger = create_test_user(&conn, "stranger");
    let err = memberships::resolve_membership(&conn, &stranger.id, None).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = memberships::resolve_membership(&conn, &stranger.id, Some(&first.id)).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[test]
fn manager_predicate_covers_roles_flags_and_bootstrap() {
    let db = test_db();
    let conn = db.conn();

    let solo = create_test_user(&conn, "solo");
    let workspace = queries::create_workspace(
        &conn,
        &taskdeck::models::CreateWorkspace {
            name: "Bootstrap".into(),
            description: None,
        },
    )
    .unwrap();
    // sole member with a non-manager role and no flags still manages
    let membership = queries::insert_membership(
        &conn,
        &solo.id,
        &workspace.id,
        WorkspaceRole::Participant,
        false,
        false,
    )
    .unwrap();
    assert!(memberships::can_manage_members(&conn, &membership, &MANAGER_ROLES).unwrap());

    // once a second member exists the bootstrap no longer applies
    let second = create_test_user(&conn, "second");
    let second_membership = add_member(&conn, &workspace, &second, WorkspaceRole::Participant);
    assert!(!memberships::can_manage_members(&conn, &membership, &MANAGER_ROLES).unwrap());
    assert!(!memberships::can_manage_members(&conn, &second_membership, &MANAGER_ROLES).unwrap());

    // the can_invite_users flag grants management independent of role
    queries::update_membership_flags(&conn, &second_membership.id, None, Some(true)).unwrap();
    let refreshed = queries::get_membership(&conn, &second.id, &workspace.id)
        .unwrap()
        .unwrap();
    assert!(memberships::can_manage_members(&conn, &refreshed, &MANAGER_ROLES).unwrap());
}

#[test]
fn role_updates_respect_owner_immutability() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let member = create_test_user(&conn, "member");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &member, WorkspaceRole::Reader);

    let updated =
        memberships::update_member_role(&conn, &workspace.id, &member.id, WorkspaceRole::Commenter)
            .unwrap();
    assert_eq!(updated.role, WorkspaceRole::Commenter);

    // demoting the owner is an illegal transition
    let err =
        memberships::update_member_role(&conn, &workspace.id, &owner.id, WorkspaceRole::Reader)
            .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // so is minting a second owner
    let err =
        memberships::update_member_role(&conn, &workspace.id, &member.id, WorkspaceRole::Owner)
            .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // unknown target
    let err =
        memberships::update_member_role(&conn, &workspace.id, "ghost", WorkspaceRole::Reader)
            .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn removal_rules() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let member = create_test_user(&conn, "member");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &member, WorkspaceRole::Participant);

    let owner_membership = queries::get_membership(&conn, &owner.id, &workspace.id)
        .unwrap()
        .unwrap();
    let member_membership = queries::get_membership(&conn, &member.id, &workspace.id)
        .unwrap()
        .unwrap();

    // self-removal is a conflict even for the owner
    let err = memberships::remove_member(&conn, &owner_membership, &owner.id, &MANAGER_ROLES)
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // removing the owner is a conflict regardless of the actor's standing
    let err = memberships::remove_member(&conn, &member_membership, &owner.id, &MANAGER_ROLES)
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // a non-manager cannot remove anyone else
    let third = create_test_user(&conn, "third");
    add_member(&conn, &workspace, &third, WorkspaceRole::Participant);
    let err = memberships::remove_member(&conn, &member_membership, &third.id, &MANAGER_ROLES)
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // the owner removes a member
    memberships::remove_member(&conn, &owner_membership, &member.id, &MANAGER_ROLES).unwrap();
    assert!(queries::get_membership(&conn, &member.id, &workspace.id).unwrap().is_none());
}

#[test]
fn replace_project_accesses_diffs_the_set() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let member = create_test_user(&conn, "member");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &member, WorkspaceRole::Participant);
    let p1 = create_test_project(&conn, &workspace, "p1");
    let p2 = create_test_project(&conn, &workspace, "p2");
    let p3 = create_test_project(&conn, &workspace, "p3");

    // start with p1 (edit rights survive a no-op diff) and p2
    queries::upsert_project_access(&conn, &member.id, &p1.id, true, true).unwrap();
    queries::upsert_project_access(&conn, &member.id, &p2.id, true, false).unwrap();

    memberships::replace_project_accesses(
        &conn,
        &workspace.id,
        &member.id,
        &[p1.id.clone(), p3.id.clone()],
    )
    .unwrap();

    // p1 kept untouched, p2 revoked, p3 added view-only
    let a1 = queries::get_project_access(&conn, &member.id, &p1.id).unwrap().unwrap();
    assert!(a1.can_view && a1.can_edit);
    assert!(queries::get_project_access(&conn, &member.id, &p2.id).unwrap().is_none());
    let a3 = queries::get_project_access(&conn, &member.id, &p3.id).unwrap().unwrap();
    assert!(a3.can_view && !a3.can_edit);
}

#[test]
fn replace_project_accesses_ignores_foreign_projects_and_owner_targets() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let member = create_test_user(&conn, "member");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &member, WorkspaceRole::Participant);

    let other_owner = create_test_user(&conn, "other");
    let other_workspace = create_test_workspace(&conn, "Other", &other_owner);
    let foreign = create_test_project(&conn, &other_workspace, "foreign");

    memberships::replace_project_accesses(&conn, &workspace.id, &member.id, &[foreign.id.clone()])
        .unwrap();
    assert!(queries::get_project_access(&conn, &member.id, &foreign.id).unwrap().is_none());

    // owner targets are a no-op; owners bypass the overlay
    let own_project = create_test_project(&conn, &workspace, "mine");
    memberships::replace_project_accesses(
        &conn,
        &workspace.id,
        &owner.id,
        &[own_project.id.clone()],
    )
    .unwrap();
    assert!(queries::get_project_access(&conn, &owner.id, &own_project.id).unwrap().is_none());
}

#[test]
fn duplicate_membership_insert_is_rejected_by_schema() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let workspace = create_test_workspace(&conn, "W", &owner);

    let result = queries::insert_membership(
        &conn,
        &owner.id,
        &workspace.id,
        WorkspaceRole::Participant,
        false,
        false,
    );
    assert!(result.is_err(), "UNIQUE(user_id, workspace_id) must hold");
    assert_eq!(queries::count_members(&conn, &workspace.id).unwrap(), 1);
}
