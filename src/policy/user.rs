use super::Action;
use super::engine::{Actor, Policy, Predicate, Rule};
use super::helpers::{and, is_team_admin, is_team_model, or};
use crate::error::Result;
use crate::types::User;

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(&[Action::Read], Predicate::User(read)),
        Rule::new(&[Action::Update, Action::Delete], Predicate::User(update)),
        Rule::new(&[Action::Promote], Predicate::User(promote)),
        Rule::new(&[Action::Demote], Predicate::User(demote)),
        Rule::new(&[Action::Suspend], Predicate::User(suspend)),
        Rule::new(&[Action::Activate], Predicate::User(activate)),
    ]
}

fn read(_: &Policy, actor: &Actor<'_>, user: &User) -> Result<bool> {
    Ok(is_team_model(actor, &user.team_id))
}

fn update(_: &Policy, actor: &Actor<'_>, user: &User) -> Result<bool> {
    and([
        Ok(is_team_model(actor, &user.team_id)),
        or([
            Ok(actor.user.id == user.id),
            Ok(is_team_admin(actor, &user.team_id)),
        ]),
    ])
}

fn promote(_: &Policy, actor: &Actor<'_>, user: &User) -> Result<bool> {
    Ok(is_team_admin(actor, &user.team_id) && !user.is_admin() && !user.is_suspended())
}

fn demote(_: &Policy, actor: &Actor<'_>, user: &User) -> Result<bool> {
    Ok(is_team_admin(actor, &user.team_id) && actor.user.id != user.id && !user.is_suspended())
}

fn suspend(_: &Policy, actor: &Actor<'_>, user: &User) -> Result<bool> {
    Ok(is_team_admin(actor, &user.team_id) && actor.user.id != user.id && !user.is_suspended())
}

fn activate(_: &Policy, actor: &Actor<'_>, user: &User) -> Result<bool> {
    Ok(is_team_admin(actor, &user.team_id) && user.is_suspended())
}
