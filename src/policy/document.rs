use super::Action;
use super::engine::{Actor, Policy, Predicate, Rule, Target};
use super::helpers::{and, is_team_admin, is_team_model, or};
use crate::error::Result;
use crate::membership::effective_document_permission;
use crate::types::{Collection, Document, Permission};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(&[Action::Read], Predicate::Document(read)),
        Rule::new(&[Action::Download], Predicate::Document(download)),
        Rule::new(
            &[Action::Star, Action::Unstar, Action::Subscribe, Action::Unsubscribe],
            Predicate::Document(star),
        ),
        Rule::new(&[Action::Comment], Predicate::Document(comment)),
        Rule::new(&[Action::Share], Predicate::Document(share)),
        Rule::new(&[Action::Update], Predicate::Document(update)),
        Rule::new(&[Action::Publish], Predicate::Document(publish)),
        Rule::new(&[Action::Unpublish], Predicate::Document(unpublish)),
        Rule::new(&[Action::ManageUsers], Predicate::Document(manage_users)),
        Rule::new(&[Action::Duplicate], Predicate::Document(duplicate)),
        Rule::new(&[Action::Move], Predicate::Document(move_document)),
        Rule::new(
            &[Action::CreateChildDocument],
            Predicate::Document(create_child_document),
        ),
        Rule::new(&[Action::Pin, Action::Unpin], Predicate::Document(pin)),
        Rule::new(&[Action::PinToHome], Predicate::Document(pin_to_home)),
        Rule::new(&[Action::Archive], Predicate::Document(archive)),
        Rule::new(&[Action::Unarchive], Predicate::Document(unarchive)),
        Rule::new(&[Action::Delete], Predicate::Document(delete)),
        Rule::new(&[Action::Restore], Predicate::Document(restore)),
        Rule::new(&[Action::PermanentDelete], Predicate::Document(permanent_delete)),
    ]
}

fn is_active(document: &Document) -> bool {
    !document.is_archived() && !document.is_deleted()
}

fn is_own_draft(actor: &Actor<'_>, document: &Document) -> bool {
    document.is_draft() && document.created_by_id == actor.user.id
}

/// Asks the collection rules, treating a missing or mismatched collection
/// as a denial.
fn collection_can(
    policy: &Policy,
    actor: &Actor<'_>,
    action: Action,
    document: &Document,
    collection: Option<&Collection>,
) -> bool {
    collection
        .filter(|c| document.collection_id.as_deref() == Some(c.id.as_str()))
        .is_some_and(|c| policy.can(actor, action, &Target::Collection(c)))
}

fn document_can(
    policy: &Policy,
    actor: &Actor<'_>,
    action: Action,
    document: &Document,
    collection: Option<&Collection>,
) -> bool {
    policy.can(
        actor,
        action,
        &Target::Document {
            document,
            collection,
        },
    )
}

/// What the document's own memberships grant. Collection access is asked of
/// the collection rules separately.
fn has_membership(actor: &Actor<'_>, document: &Document, required: Permission) -> bool {
    effective_document_permission(actor.user, document, None, actor.grants)
        .is_some_and(|p| p.has(required))
}

fn read(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_team_model(actor, &document.team_id)),
        or([
            Ok(has_membership(actor, document, Permission::Read)),
            Ok(is_own_draft(actor, document)),
            Ok(collection_can(policy, actor, Action::ReadDocument, document, collection)),
        ]),
    ])
}

fn download(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        read(policy, actor, document, collection),
        Ok(!actor.user.is_guest()),
    ])
}

fn star(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_deleted() && !document.template),
        read(policy, actor, document, collection),
    ])
}

fn comment(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_active(document) && !document.template),
        read(policy, actor, document, collection),
    ])
}

fn share(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_active(document) && !document.template),
        read(policy, actor, document, collection),
        or([
            Ok(document.collection_id.is_none() && actor.team.sharing),
            Ok(collection_can(policy, actor, Action::Share, document, collection)),
        ]),
    ])
}

fn update(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_active(document)),
        read(policy, actor, document, collection),
        or([
            Ok(has_membership(actor, document, Permission::ReadWrite)),
            Ok(is_own_draft(actor, document)),
            Ok(collection_can(policy, actor, Action::UpdateDocument, document, collection)),
        ]),
    ])
}

fn publish(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(document.is_draft() && !document.template),
        update(policy, actor, document, collection),
        Ok(document.collection_id.is_none()
            || collection_can(policy, actor, Action::CreateDocument, document, collection)),
    ])
}

fn unpublish(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_draft() && !document.template),
        update(policy, actor, document, collection),
        Ok(collection_can(policy, actor, Action::UpdateDocument, document, collection)),
    ])
}

fn manage_users(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.template),
        update(policy, actor, document, collection),
        or([
            Ok(is_team_admin(actor, &document.team_id)),
            Ok(has_membership(actor, document, Permission::Admin)),
            Ok(is_own_draft(actor, document)),
            Ok(collection_can(policy, actor, Action::ManageUsers, document, collection)),
        ]),
    ])
}

fn duplicate(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_deleted()),
        Ok(!actor.user.is_viewer() && !actor.user.is_guest()),
        read(policy, actor, document, collection),
        or([
            Ok(has_membership(actor, document, Permission::ReadWrite)),
            Ok(is_own_draft(actor, document)),
            Ok(collection_can(policy, actor, Action::CreateDocument, document, collection)),
        ]),
    ])
}

fn move_document(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_active(document)),
        Ok(!actor.user.is_viewer() && !actor.user.is_guest()),
        or([
            Ok(has_membership(actor, document, Permission::Admin)),
            Ok(is_own_draft(actor, document)),
            Ok(collection_can(policy, actor, Action::UpdateDocument, document, collection)),
        ]),
    ])
}

fn create_child_document(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_draft() && !document.template),
        update(policy, actor, document, collection),
    ])
}

fn pin(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_draft() && !document.template),
        update(policy, actor, document, collection),
        Ok(collection_can(policy, actor, Action::Update, document, collection)),
    ])
}

fn pin_to_home(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_draft() && !document.template),
        Ok(is_team_admin(actor, &document.team_id)),
        update(policy, actor, document, collection),
    ])
}

fn archive(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(!document.is_draft() && !document.template),
        update(policy, actor, document, collection),
        Ok(collection_can(policy, actor, Action::UpdateDocument, document, collection)),
    ])
}

fn unarchive(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(document.is_archived() && !document.is_deleted() && !document.template),
        read(policy, actor, document, collection),
        or([
            Ok(has_membership(actor, document, Permission::ReadWrite)),
            Ok(collection_can(policy, actor, Action::UpdateDocument, document, collection)),
        ]),
    ])
}

fn delete(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_team_model(actor, &document.team_id)),
        Ok(!document.is_deleted()),
        Ok(!actor.user.is_guest()),
        or([
            Ok(document_can(policy, actor, Action::Unarchive, document, collection)),
            Ok(document_can(policy, actor, Action::Update, document, collection)),
            Ok(is_own_draft(actor, document) && document.collection_id.is_none()),
        ]),
    ])
}

/// Deleted documents are not readable, so restore checks memberships and the
/// collection directly.
fn restore(
    policy: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    collection: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_team_model(actor, &document.team_id)),
        Ok(document.is_deleted()),
        or([
            Ok(has_membership(actor, document, Permission::ReadWrite)),
            Ok(is_own_draft(actor, document)),
            Ok(collection_can(policy, actor, Action::UpdateDocument, document, collection)),
            Ok(document.collection_id.is_none() && document.created_by_id == actor.user.id),
        ]),
    ])
}

fn permanent_delete(
    _: &Policy,
    actor: &Actor<'_>,
    document: &Document,
    _: Option<&Collection>,
) -> Result<bool> {
    and([
        Ok(is_team_model(actor, &document.team_id)),
        Ok(document.is_deleted()),
        or([
            Ok(is_team_admin(actor, &document.team_id)),
            Ok(is_own_draft(actor, document)),
        ]),
    ])
}
