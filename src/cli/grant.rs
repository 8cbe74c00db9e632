use std::path::Path;

use crate::membership::{
    grant_group_collection, grant_group_document, grant_user_collection, grant_user_document,
    revoke_group_collection, revoke_group_document, revoke_user_collection, revoke_user_document,
};
use crate::policy::{Action, Policy, Target};
use crate::store::{SqliteStore, Store};
use crate::types::Permission;

use super::{ActorContext, GrantTarget, init_store};

/// Checks that the actor may manage memberships on the target and that the
/// grantee belongs to the actor's team.
fn authorize(store: &SqliteStore, ctx: &ActorContext, target: &GrantTarget) -> anyhow::Result<()> {
    let policy = Policy::standard();
    let actor = ctx.actor();

    if let Some(document_id) = target.document.as_deref() {
        let document = store
            .get_document(document_id)?
            .ok_or_else(|| anyhow::anyhow!("Document not found: {document_id}"))?;
        let collection = match document.collection_id.as_deref() {
            Some(collection_id) => store.get_collection(collection_id)?,
            None => None,
        };
        policy.authorize(
            &actor,
            Action::ManageUsers,
            &Target::Document {
                document: &document,
                collection: collection.as_ref(),
            },
        )?;
    } else if let Some(collection_id) = target.collection.as_deref() {
        let collection = store
            .get_collection(collection_id)?
            .ok_or_else(|| anyhow::anyhow!("Collection not found: {collection_id}"))?;
        policy.authorize(&actor, Action::ManageUsers, &Target::Collection(&collection))?;
    }

    let grantee_team = if let Some(user_id) = target.user.as_deref() {
        store
            .get_user(user_id)?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?
            .team_id
    } else if let Some(group_id) = target.group.as_deref() {
        store
            .get_group(group_id)?
            .ok_or_else(|| anyhow::anyhow!("Group not found: {group_id}"))?
            .team_id
    } else {
        anyhow::bail!("Either --user or --group is required");
    };
    if grantee_team != ctx.team.id {
        anyhow::bail!("Grantee belongs to another team");
    }
    Ok(())
}

pub fn run_grant(data_dir: &Path, target: GrantTarget, permission: String) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &target.actor)?;
    let permission: Permission = permission.parse()?;

    authorize(&store, &ctx, &target)?;

    let actor_id = ctx.user.id.as_str();
    let membership_id = store.transaction(|tx| {
        let id = match (
            target.user.as_deref(),
            target.group.as_deref(),
            target.document.as_deref(),
            target.collection.as_deref(),
        ) {
            (Some(user), _, Some(document), _) => {
                grant_user_document(tx, user, document, permission, actor_id)?.id
            }
            (Some(user), _, None, Some(collection)) => {
                grant_user_collection(tx, user, collection, permission, actor_id)?.id
            }
            (None, Some(group), Some(document), _) => {
                grant_group_document(tx, group, document, permission, actor_id)?.id
            }
            (None, Some(group), None, Some(collection)) => {
                grant_group_collection(tx, group, collection, permission, actor_id)?.id
            }
            _ => {
                return Err(crate::error::Error::validation(
                    "a grantee and a document or collection are required",
                ));
            }
        };
        Ok(id)
    })?;

    println!("Granted {permission}: {membership_id}");
    Ok(())
}

pub fn run_revoke(data_dir: &Path, target: GrantTarget) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &target.actor)?;

    authorize(&store, &ctx, &target)?;

    let removed = store.transaction(|tx| {
        match (
            target.user.as_deref(),
            target.group.as_deref(),
            target.document.as_deref(),
            target.collection.as_deref(),
        ) {
            (Some(user), _, Some(document), _) => revoke_user_document(tx, user, document),
            (Some(user), _, None, Some(collection)) => revoke_user_collection(tx, user, collection),
            (None, Some(group), Some(document), _) => revoke_group_document(tx, group, document),
            (None, Some(group), None, Some(collection)) => {
                revoke_group_collection(tx, group, collection)
            }
            _ => Err(crate::error::Error::validation(
                "a grantee and a document or collection are required",
            )),
        }
    })?;

    if removed {
        println!("Revoked membership");
    } else {
        println!("No membership to revoke");
    }
    Ok(())
}
