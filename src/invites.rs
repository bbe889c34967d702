//! Invite Lifecycle Manager.
//!
//! An invite is a capability token scoped to one workspace. Creating an
//! invite deactivates every prior active invite for that workspace, so at
//! most one is live at a time (closed by a partial unique index as well).
//! Acceptance is idempotent and race-safe: the unique (user, workspace)
//! membership constraint resolves concurrent accepts to exactly one new row,
//! and `used_count` moves only when a row was actually created.

use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::memberships;
use crate::models::{AcceptOutcome, Invite, InviteWithContext, WorkspaceRole};
use crate::util::generate_token;

const INVITE_TOKEN_BYTES: usize = 16;
const TOKEN_RETRY_LIMIT: usize = 8;

/// Role granted when a user joins through an invite or a direct add.
pub const DEFAULT_JOIN_ROLE: WorkspaceRole = WorkspaceRole::Participant;

/// Create a new invite for a workspace, superseding any active one.
/// Callers must have verified `can_manage_members` for the creator.
pub fn create_invite(
    conn: &mut Connection,
    workspace_id: &str,
    creator_id: &str,
) -> Result<Invite> {
    if queries::get_workspace_by_id(conn, workspace_id)?.is_none() {
        return Err(AppError::NotFound("Workspace not found".into()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    queries::deactivate_invites_for_workspace(&tx, workspace_id)?;

    // Token collisions are vanishingly rare but retried locally; the UNIQUE
    // constraint on token is the backstop.
    let mut token = generate_token(INVITE_TOKEN_BYTES);
    let mut retries = 0;
    while queries::invite_token_exists(&tx, &token)? {
        retries += 1;
        if retries > TOKEN_RETRY_LIMIT {
            return Err(AppError::Internal(
                "could not generate a unique invite token".into(),
            ));
        }
        token = generate_token(INVITE_TOKEN_BYTES);
    }

    let invite = queries::insert_invite(&tx, workspace_id, &token, creator_id)?;
    tx.commit()?;

    tracing::info!(workspace_id, "created workspace invite");
    Ok(invite)
}

/// Look up an invite with workspace/creator context.
pub fn get_invite(conn: &Connection, token: &str) -> Result<InviteWithContext> {
    queries::find_invite_with_context_by_token(conn, token)?.ok_or(AppError::InvalidToken)
}

pub fn active_invite_for_workspace(
    conn: &Connection,
    workspace_id: &str,
) -> Result<Option<InviteWithContext>> {
    queries::active_invite_for_workspace(conn, workspace_id)
}

/// Accept an invite. Unknown tokens are `InvalidToken`, superseded or
/// revoked ones `InactiveToken`. An existing member gets `AlreadyMember`
/// without touching the usage counter; otherwise the membership insert and
/// the counter increment commit as one unit.
pub fn accept_invite(conn: &mut Connection, token: &str, user_id: &str) -> Result<AcceptOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let invite = queries::find_invite_by_token(&tx, token)?.ok_or(AppError::InvalidToken)?;
    if !invite.is_active {
        return Err(AppError::InactiveToken);
    }

    let inserted =
        queries::insert_membership_if_absent(&tx, user_id, &invite.workspace_id, DEFAULT_JOIN_ROLE)?;

    let outcome = match inserted {
        Some(_) => {
            queries::increment_invite_usage(&tx, token)?;
            AcceptOutcome::Joined {
                workspace_id: invite.workspace_id,
            }
        }
        None => AcceptOutcome::AlreadyMember {
            workspace_id: invite.workspace_id,
        },
    };
    tx.commit()?;

    if let AcceptOutcome::Joined { workspace_id } = &outcome {
        tracing::info!(user_id, workspace_id = %workspace_id, "user joined workspace via invite");
    }
    Ok(outcome)
}

/// Deactivate an invite. Allowed for managers of the invite's workspace and
/// for the invite's own creator. Deactivating an already-inactive invite is
/// a no-op success.
pub fn deactivate_invite(
    conn: &Connection,
    token: &str,
    actor_user_id: &str,
    manager_roles: &[WorkspaceRole],
) -> Result<()> {
    let invite = queries::find_invite_by_token(conn, token)?.ok_or(AppError::InvalidToken)?;

    let is_creator = invite.created_by_id == actor_user_id;
    let is_manager = match memberships::get_membership(conn, actor_user_id, &invite.workspace_id)? {
        Some(membership) => memberships::can_manage_members(conn, &membership, manager_roles)?,
        None => false,
    };
    if !is_manager && !is_creator {
        return Err(AppError::Forbidden(
            "Not allowed to deactivate this invite".into(),
        ));
    }

    queries::deactivate_invite(conn, token)?;
    tracing::info!(workspace_id = %invite.workspace_id, "deactivated workspace invite");
    Ok(())
}

/// Add a user to a workspace without a token. Caller must have verified
/// `can_manage_members`; the same already-member idempotence applies.
pub fn add_member_direct(
    conn: &mut Connection,
    workspace_id: &str,
    user_id: &str,
) -> Result<AcceptOutcome> {
    if queries::get_workspace_by_id(conn, workspace_id)?.is_none() {
        return Err(AppError::NotFound("Workspace not found".into()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let inserted =
        queries::insert_membership_if_absent(&tx, user_id, workspace_id, DEFAULT_JOIN_ROLE)?;
    tx.commit()?;

    Ok(match inserted {
        Some(_) => AcceptOutcome::Joined {
            workspace_id: workspace_id.to_string(),
        },
        None => AcceptOutcome::AlreadyMember {
            workspace_id: workspace_id.to_string(),
        },
    })
}
