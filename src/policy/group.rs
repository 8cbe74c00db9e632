use super::Action;
use super::engine::{Actor, Policy, Predicate, Rule};
use super::helpers::{admin_required, is_team_admin, is_team_model};
use crate::error::Result;
use crate::types::Group;

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(&[Action::Read], Predicate::Group(read)),
        Rule::new(&[Action::Update, Action::ManageUsers], Predicate::Group(update)),
        Rule::new(&[Action::Delete], Predicate::Group(delete)),
    ]
}

/// Guests only see groups they belong to.
fn read(_: &Policy, actor: &Actor<'_>, group: &Group) -> Result<bool> {
    Ok(is_team_model(actor, &group.team_id)
        && (!actor.user.is_guest() || actor.grants.in_group(&group.id)))
}

fn update(_: &Policy, actor: &Actor<'_>, group: &Group) -> Result<bool> {
    Ok(is_team_admin(actor, &group.team_id))
}

fn delete(_: &Policy, actor: &Actor<'_>, group: &Group) -> Result<bool> {
    admin_required(actor, &group.team_id)
}
