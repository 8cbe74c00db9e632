use super::Action;
use super::engine::{Actor, Policy, Predicate, Rule};
use super::helpers::{admin_required, and, is_team_model, or};
use crate::error::Result;
use crate::membership::effective_collection_permission;
use crate::types::{Collection, Permission};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            &[
                Action::Read,
                Action::ReadDocument,
                Action::Star,
                Action::Unstar,
                Action::Subscribe,
                Action::Unsubscribe,
            ],
            Predicate::Collection(read),
        ),
        Rule::new(&[Action::Export, Action::Download], Predicate::Collection(export)),
        Rule::new(&[Action::Share], Predicate::Collection(share)),
        Rule::new(
            &[Action::UpdateDocument, Action::DeleteDocument],
            Predicate::Collection(update_document),
        ),
        Rule::new(&[Action::CreateDocument], Predicate::Collection(create_document)),
        Rule::new(&[Action::Update], Predicate::Collection(update)),
        Rule::new(
            &[Action::Archive, Action::ManageUsers],
            Predicate::Collection(manage),
        ),
        Rule::new(&[Action::Unarchive], Predicate::Collection(unarchive)),
        Rule::new(&[Action::Delete], Predicate::Collection(delete)),
    ]
}

fn permission(actor: &Actor<'_>, collection: &Collection) -> Option<Permission> {
    effective_collection_permission(actor.user, collection, actor.grants)
}

/// Private collections need a membership even for admins; elsewhere admins
/// see everything and everyone else needs some effective permission.
fn read(_: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    if !is_team_model(actor, &collection.team_id) {
        return Ok(false);
    }
    if collection.is_private() || actor.user.is_guest() {
        return Ok(actor.grants.collection_permission(&collection.id).is_some());
    }
    Ok(actor.user.is_admin() || permission(actor, collection).is_some())
}

fn export(policy: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    and([
        read(policy, actor, collection),
        Ok(!actor.user.is_viewer() && !actor.user.is_guest()),
        Ok(collection.archived_at.is_none()),
    ])
}

fn share(_: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    if !is_team_model(actor, &collection.team_id) || actor.user.is_guest() {
        return Ok(false);
    }
    if !actor.team.sharing || !collection.sharing {
        return Ok(false);
    }
    if !collection.is_private() && actor.user.is_admin() {
        return Ok(true);
    }
    Ok(permission(actor, collection).is_some_and(|p| p.has(Permission::ReadWrite)))
}

/// Admins bypass the default on non-private collections only.
fn update_document(_: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    if !is_team_model(actor, &collection.team_id) {
        return Ok(false);
    }
    if !collection.is_private() && actor.user.is_admin() {
        return Ok(true);
    }
    Ok(permission(actor, collection).is_some_and(|p| p.has(Permission::ReadWrite)))
}

fn create_document(policy: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    and([
        Ok(collection.archived_at.is_none()),
        update_document(policy, actor, collection),
    ])
}

/// Team admins may update any collection of their team, private or not.
fn update(_: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    if !is_team_model(actor, &collection.team_id) {
        return Ok(false);
    }
    if actor.user.is_admin() {
        return Ok(true);
    }
    Ok(permission(actor, collection).is_some_and(|p| p.has(Permission::ReadWrite)))
}

fn manage(_: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    and([
        Ok(is_team_model(actor, &collection.team_id)),
        or([
            Ok(actor.user.is_admin()),
            Ok(actor
                .grants
                .includes_collection_membership(&collection.id, Permission::Admin)),
        ]),
    ])
}

fn unarchive(policy: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    and([
        Ok(collection.archived_at.is_some()),
        manage(policy, actor, collection),
    ])
}

fn delete(policy: &Policy, actor: &Actor<'_>, collection: &Collection) -> Result<bool> {
    if manage(policy, actor, collection)? {
        return Ok(true);
    }
    admin_required(actor, &collection.team_id)
}
