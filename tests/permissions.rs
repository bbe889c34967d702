//! Permission Evaluator tests: owner bypass, overlay-delegated view for
//! non-owners, the non-monotonic role allow-lists, and fail-closed behavior
//! on missing rows.

mod common;
use common::*;

use taskdeck::hierarchy;
use taskdeck::memberships;
use taskdeck::models::{ResourceKind, WorkspaceRole};
use taskdeck::permissions;

#[test]
fn owner_views_and_edits_every_project_without_grants() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let workspace = create_test_workspace(&conn, "W", &owner);
    let project = create_test_project(&conn, &workspace, "proj");

    assert!(permissions::can_view_project(&conn, &owner.id, &project.id).unwrap());
    assert!(permissions::can_edit_project(&conn, &owner.id, &project.id).unwrap());
    assert!(permissions::can_create_board(&conn, &owner.id, &project.id).unwrap());
}

#[test]
fn participant_without_grant_sees_nothing() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let participant = create_test_user(&conn, "part");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &participant, WorkspaceRole::Participant);
    let project = create_test_project(&conn, &workspace, "proj");
    let (_, column, task) = create_task_tree(&conn, &project, &owner);

    // role alone grants no visibility; view is delegated to the overlay
    assert!(!permissions::can_view_project(&conn, &participant.id, &project.id).unwrap());
    assert!(!permissions::can_create_task(&conn, &participant.id, &column.id).unwrap());
    assert!(!permissions::can_edit_task(&conn, &participant.id, &task.id).unwrap());
    assert!(!permissions::can_comment_task(&conn, &participant.id, &task.id).unwrap());
}

#[test]
fn granted_participant_can_work_but_not_edit_project() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let participant = create_test_user(&conn, "part");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &participant, WorkspaceRole::Participant);
    let project = create_test_project(&conn, &workspace, "proj1");
    grant_view(&conn, &participant, &project);
    let (_, column, task) = create_task_tree(&conn, &project, &owner);

    assert!(permissions::can_view_project(&conn, &participant.id, &project.id).unwrap());
    assert!(!permissions::can_edit_project(&conn, &participant.id, &project.id).unwrap());
    assert!(permissions::can_create_task(&conn, &participant.id, &column.id).unwrap());
    assert!(permissions::can_edit_task(&conn, &participant.id, &task.id).unwrap());
    assert!(permissions::can_delete_task(&conn, &participant.id, &task.id).unwrap());
    assert!(permissions::can_comment_task(&conn, &participant.id, &task.id).unwrap());
    // structure changes stay owner-only
    assert!(!permissions::can_create_board(&conn, &participant.id, &project.id).unwrap());
}

#[test]
fn commenter_comments_but_does_not_author() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let commenter = create_test_user(&conn, "comm");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &commenter, WorkspaceRole::Commenter);
    let project = create_test_project(&conn, &workspace, "proj");
    grant_view(&conn, &commenter, &project);
    let (_, column, task) = create_task_tree(&conn, &project, &owner);

    assert!(permissions::can_view_project(&conn, &commenter.id, &project.id).unwrap());
    assert!(permissions::can_comment_task(&conn, &commenter.id, &task.id).unwrap());
    assert!(!permissions::can_create_task(&conn, &commenter.id, &column.id).unwrap());
    assert!(!permissions::can_edit_task(&conn, &commenter.id, &task.id).unwrap());
}

#[test]
fn reader_gets_nothing_anywhere() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let reader = create_test_user(&conn, "reader");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &reader, WorkspaceRole::Reader);
    let p1 = create_test_project(&conn, &workspace, "p1");
    let p2 = create_test_project(&conn, &workspace, "p2");
    let (_, column, task) = create_task_tree(&conn, &p1, &owner);

    for project in [&p1, &p2] {
        assert!(!permissions::can_view_project(&conn, &reader.id, &project.id).unwrap());
    }
    assert!(!permissions::can_create_task(&conn, &reader.id, &column.id).unwrap());
    assert!(!permissions::can_comment_task(&conn, &reader.id, &task.id).unwrap());
}

#[test]
fn reader_with_view_grant_still_cannot_write() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let reader = create_test_user(&conn, "reader");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &reader, WorkspaceRole::Reader);
    let project = create_test_project(&conn, &workspace, "proj");
    grant_view(&conn, &reader, &project);
    let (_, column, task) = create_task_tree(&conn, &project, &owner);

    assert!(permissions::can_view_project(&conn, &reader.id, &project.id).unwrap());
    assert!(!permissions::can_create_task(&conn, &reader.id, &column.id).unwrap());
    assert!(!permissions::can_edit_task(&conn, &reader.id, &task.id).unwrap());
    assert!(!permissions::can_comment_task(&conn, &reader.id, &task.id).unwrap());
}

#[test]
fn admin_is_a_manage_alias_not_a_capability_tier() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let admin = create_test_user(&conn, "admin");
    let workspace = create_test_workspace(&conn, "W", &owner);
    let membership = add_member(&conn, &workspace, &admin, WorkspaceRole::Admin);
    let project = create_test_project(&conn, &workspace, "proj");

    assert!(memberships::can_manage_members(&conn, &membership, &MANAGER_ROLES).unwrap());
    // no implicit visibility or authoring rights
    assert!(!permissions::can_view_project(&conn, &admin.id, &project.id).unwrap());
    assert!(!permissions::can_edit_project(&conn, &admin.id, &project.id).unwrap());
}

#[test]
fn evaluator_fails_closed_on_missing_rows() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let outsider = create_test_user(&conn, "out");
    let workspace = create_test_workspace(&conn, "W", &owner);
    let project = create_test_project(&conn, &workspace, "proj");

    // unknown project / unknown column / unknown task
    assert!(!permissions::can_view_project(&conn, &owner.id, "nope").unwrap());
    assert!(!permissions::can_create_task(&conn, &owner.id, "nope").unwrap());
    assert!(!permissions::can_edit_task(&conn, &owner.id, "nope").unwrap());
    // no membership at all
    assert!(!permissions::can_view_project(&conn, &outsider.id, &project.id).unwrap());
    assert!(!permissions::can_create_project(&conn, &outsider.id, &workspace.id).unwrap());
}

#[test]
fn membership_does_not_leak_across_workspaces() {
    let db = test_db();
    let conn = db.conn();

    let owner1 = create_test_user(&conn, "owner1");
    let owner2 = create_test_user(&conn, "owner2");
    let w1 = create_test_workspace(&conn, "W1", &owner1);
    let _w2 = create_test_workspace(&conn, "W2", &owner2);
    let project_in_w1 = create_test_project(&conn, &w1, "proj");

    assert!(!permissions::can_view_project(&conn, &owner2.id, &project_in_w1.id).unwrap());
    assert!(!permissions::can_edit_project(&conn, &owner2.id, &project_in_w1.id).unwrap());
}

#[test]
fn ancestry_resolves_through_every_level() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let workspace = create_test_workspace(&conn, "W", &owner);
    let project = create_test_project(&conn, &workspace, "proj");
    let (board, column, task) = create_task_tree(&conn, &project, &owner);

    for (kind, id) in [
        (ResourceKind::Project, project.id.as_str()),
        (ResourceKind::Board, board.id.as_str()),
        (ResourceKind::Column, column.id.as_str()),
        (ResourceKind::Task, task.id.as_str()),
    ] {
        let found = hierarchy::resolve_project(&conn, kind, id).unwrap().unwrap();
        assert_eq!(found.project_id, project.id);
        assert_eq!(found.workspace_id, workspace.id);
    }

    assert!(
        hierarchy::resolve_project(&conn, ResourceKind::Task, "missing")
            .unwrap()
            .is_none()
    );
}

#[test]
fn accessible_projects_follow_role_and_grants() {
    let db = test_db();
    let conn = db.conn();

    let owner = create_test_user(&conn, "owner");
    let participant = create_test_user(&conn, "part");
    let workspace = create_test_workspace(&conn, "W", &owner);
    add_member(&conn, &workspace, &participant, WorkspaceRole::Participant);
    let p1 = create_test_project(&conn, &workspace, "p1");
    let _p2 = create_test_project(&conn, &workspace, "p2");
    grant_view(&conn, &participant, &p1);

    let for_owner = permissions::accessible_projects(&conn, &owner.id, &workspace.id).unwrap();
    assert_eq!(for_owner.len(), 2);

    let for_participant =
        permissions::accessible_projects(&conn, &participant.id, &workspace.id).unwrap();
    assert_eq!(for_participant.len(), 1);
    assert_eq!(for_participant[0].id, p1.id);

    let stranger = create_test_user(&conn, "stranger");
    let for_stranger =
        permissions::accessible_projects(&conn, &stranger.id, &workspace.id).unwrap();
    assert!(for_stranger.is_empty());
}
