use super::Action;
use super::engine::{Actor, Policy, Predicate, Rule};
use super::helpers::{admin_required, and, is_team_admin, is_team_member, is_team_model, or};
use crate::error::Result;
use crate::types::Team;

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(&[Action::Read], Predicate::Team(read)),
        Rule::new(&[Action::Share], Predicate::Team(share)),
        Rule::new(
            &[Action::CreateDocument, Action::CreateTemplate],
            Predicate::Team(create_document),
        ),
        Rule::new(&[Action::CreateCollection], Predicate::Team(create_collection)),
        Rule::new(&[Action::CreateGroup, Action::Update], Predicate::Team(manage)),
        Rule::new(&[Action::InviteUser], Predicate::Team(invite_user)),
        Rule::new(&[Action::Delete], Predicate::Team(delete)),
    ]
}

fn read(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    Ok(is_team_model(actor, &team.id))
}

fn share(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    Ok(is_team_model(actor, &team.id) && team.sharing)
}

fn create_document(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    Ok(is_team_member(actor, &team.id))
}

fn create_collection(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    and([
        Ok(is_team_member(actor, &team.id)),
        or([Ok(actor.user.is_admin()), Ok(team.member_collection_create)]),
    ])
}

fn manage(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    Ok(is_team_admin(actor, &team.id))
}

fn invite_user(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    Ok(is_team_member(actor, &team.id))
}

fn delete(_: &Policy, actor: &Actor<'_>, team: &Team) -> Result<bool> {
    admin_required(actor, &team.id)
}
