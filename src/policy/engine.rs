use std::collections::{BTreeMap, HashMap};

use super::action::{Action, ActorKind, TargetKind};
use super::{collection, document, group, team, user};
use crate::error::{Error, Result};
use crate::membership::Grants;
use crate::types::{Collection, Document, Group, Team, User};

/// The user a decision is made for, with their team and memberships.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user: &'a User,
    pub team: &'a Team,
    pub grants: &'a Grants,
}

impl<'a> Actor<'a> {
    #[must_use]
    pub fn new(user: &'a User, team: &'a Team, grants: &'a Grants) -> Self {
        Self { user, team, grants }
    }

    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        ActorKind::User
    }
}

/// The object a decision is about.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Team(&'a Team),
    Collection(&'a Collection),
    /// A document, with its collection when it has one.
    Document {
        document: &'a Document,
        collection: Option<&'a Collection>,
    },
    Group(&'a Group),
    User(&'a User),
}

impl Target<'_> {
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Target::Team(_) => TargetKind::Team,
            Target::Collection(_) => TargetKind::Collection,
            Target::Document { .. } => TargetKind::Document,
            Target::Group(_) => TargetKind::Group,
            Target::User(_) => TargetKind::User,
        }
    }
}

pub type TeamPredicate = fn(&Policy, &Actor<'_>, &Team) -> Result<bool>;
pub type CollectionPredicate = fn(&Policy, &Actor<'_>, &Collection) -> Result<bool>;
pub type DocumentPredicate =
    fn(&Policy, &Actor<'_>, &Document, Option<&Collection>) -> Result<bool>;
pub type GroupPredicate = fn(&Policy, &Actor<'_>, &Group) -> Result<bool>;
pub type UserPredicate = fn(&Policy, &Actor<'_>, &User) -> Result<bool>;

/// A predicate typed by the target it inspects. Predicates receive the
/// policy so they can delegate to other rules.
#[derive(Clone, Copy)]
pub enum Predicate {
    Team(TeamPredicate),
    Collection(CollectionPredicate),
    Document(DocumentPredicate),
    Group(GroupPredicate),
    User(UserPredicate),
}

impl Predicate {
    #[must_use]
    pub const fn target_kind(&self) -> TargetKind {
        match self {
            Predicate::Team(_) => TargetKind::Team,
            Predicate::Collection(_) => TargetKind::Collection,
            Predicate::Document(_) => TargetKind::Document,
            Predicate::Group(_) => TargetKind::Group,
            Predicate::User(_) => TargetKind::User,
        }
    }
}

pub struct Rule {
    pub actor: ActorKind,
    pub actions: &'static [Action],
    pub predicate: Predicate,
}

impl Rule {
    #[must_use]
    pub const fn new(actions: &'static [Action], predicate: Predicate) -> Self {
        Self {
            actor: ActorKind::User,
            actions,
            predicate,
        }
    }

    #[must_use]
    pub const fn target_kind(&self) -> TargetKind {
        self.predicate.target_kind()
    }

    fn evaluate(&self, policy: &Policy, actor: &Actor<'_>, target: &Target<'_>) -> Result<bool> {
        match (self.predicate, *target) {
            (Predicate::Team(f), Target::Team(team)) => f(policy, actor, team),
            (Predicate::Collection(f), Target::Collection(collection)) => {
                f(policy, actor, collection)
            }
            (
                Predicate::Document(f),
                Target::Document {
                    document,
                    collection,
                },
            ) => f(policy, actor, document, collection),
            (Predicate::Group(f), Target::Group(group)) => f(policy, actor, group),
            (Predicate::User(f), Target::User(user)) => f(policy, actor, user),
            _ => Err(Error::InvariantViolation(format!(
                "{} rule evaluated against a {} target",
                self.target_kind(),
                target.kind()
            ))),
        }
    }
}

type RuleKey = (ActorKind, Action, TargetKind);

/// A static table of authorization rules.
///
/// Lookups go to the first rule registered for an
/// `(actor kind, action, target kind)` triple; later rules for the same
/// triple never run. Build it once with [`Policy::standard`] and share it
/// by reference.
pub struct Policy {
    rules: Vec<Rule>,
    index: HashMap<RuleKey, usize>,
}

impl Policy {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut index = HashMap::new();
        for (position, rule) in rules.iter().enumerate() {
            for action in rule.actions {
                index
                    .entry((rule.actor, *action, rule.target_kind()))
                    .or_insert(position);
            }
        }
        Self { rules, index }
    }

    /// The rules for teams, collections, documents, groups and users.
    #[must_use]
    pub fn standard() -> Self {
        let mut rules = Vec::new();
        rules.extend(team::rules());
        rules.extend(collection::rules());
        rules.extend(document::rules());
        rules.extend(group::rules());
        rules.extend(user::rules());
        Self::new(rules)
    }

    fn rule_for(&self, actor: ActorKind, action: Action, target: TargetKind) -> Option<&Rule> {
        self.index
            .get(&(actor, action, target))
            .map(|&position| &self.rules[position])
    }

    /// Fails with `Forbidden` unless the first matching rule allows the
    /// action. Errors raised by the predicate are returned as-is.
    pub fn authorize(&self, actor: &Actor<'_>, action: Action, target: &Target<'_>) -> Result<()> {
        if actor.user.is_suspended() {
            return Err(Error::forbidden("account is suspended"));
        }

        let Some(rule) = self.rule_for(actor.kind(), action, target.kind()) else {
            return Err(Error::forbidden(format!(
                "no rule allows {action} on a {}",
                target.kind()
            )));
        };

        if rule.evaluate(self, actor, target)? {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "{action} on this {} is not allowed",
                target.kind()
            )))
        }
    }

    #[must_use]
    pub fn can(&self, actor: &Actor<'_>, action: Action, target: &Target<'_>) -> bool {
        self.authorize(actor, action, target).is_ok()
    }

    #[must_use]
    pub fn cannot(&self, actor: &Actor<'_>, action: Action, target: &Target<'_>) -> bool {
        !self.can(actor, action, target)
    }

    /// Every action with a rule for this kind of target, mapped to whether
    /// the actor may perform it.
    #[must_use]
    pub fn serialize(&self, actor: &Actor<'_>, target: &Target<'_>) -> BTreeMap<Action, bool> {
        Action::ALL
            .into_iter()
            .filter(|action| self.rule_for(actor.kind(), *action, target.kind()).is_some())
            .map(|action| (action, self.can(actor, action, target)))
            .collect()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;
    use chrono::Utc;

    fn team() -> Team {
        Team {
            id: "team-1".to_string(),
            name: "Acme".to_string(),
            sharing: true,
            member_collection_create: true,
            created_at: Utc::now(),
        }
    }

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: "user-1".to_string(),
            team_id: "team-1".to_string(),
            name: "Ada".to_string(),
            email: None,
            role,
            suspended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn allow_all(_: &Policy, _: &Actor<'_>, _: &Team) -> Result<bool> {
        Ok(true)
    }

    fn deny_all(_: &Policy, _: &Actor<'_>, _: &Team) -> Result<bool> {
        Ok(false)
    }

    fn require_admin(_: &Policy, _: &Actor<'_>, _: &Team) -> Result<bool> {
        Err(Error::AdminRequired)
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let policy = Policy::new(vec![
            Rule::new(&[Action::Read], Predicate::Team(deny_all)),
            Rule::new(&[Action::Read, Action::Update], Predicate::Team(allow_all)),
        ]);
        let (team, user, grants) = (team(), user(UserRole::Member), Grants::default());
        let actor = Actor::new(&user, &team, &grants);

        assert!(policy.cannot(&actor, Action::Read, &Target::Team(&team)));
        assert!(policy.can(&actor, Action::Update, &Target::Team(&team)));
    }

    #[test]
    fn test_missing_rule_denies() {
        let policy = Policy::new(Vec::new());
        let (team, user, grants) = (team(), user(UserRole::Admin), Grants::default());
        let actor = Actor::new(&user, &team, &grants);

        let result = policy.authorize(&actor, Action::Read, &Target::Team(&team));
        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert!(policy.serialize(&actor, &Target::Team(&team)).is_empty());
    }

    #[test]
    fn test_predicate_error_propagates_but_can_is_false() {
        let policy = Policy::new(vec![Rule::new(
            &[Action::Delete],
            Predicate::Team(require_admin),
        )]);
        let (team, user, grants) = (team(), user(UserRole::Member), Grants::default());
        let actor = Actor::new(&user, &team, &grants);

        let result = policy.authorize(&actor, Action::Delete, &Target::Team(&team));
        assert!(matches!(result, Err(Error::AdminRequired)));
        assert!(!policy.can(&actor, Action::Delete, &Target::Team(&team)));
        assert_eq!(
            policy.serialize(&actor, &Target::Team(&team)).get(&Action::Delete),
            Some(&false)
        );
    }

    #[test]
    fn test_suspended_actor_is_denied() {
        let policy = Policy::new(vec![Rule::new(&[Action::Read], Predicate::Team(allow_all))]);
        let team = team();
        let mut user = user(UserRole::Admin);
        user.suspended_at = Some(Utc::now());
        let grants = Grants::default();
        let actor = Actor::new(&user, &team, &grants);

        assert!(policy.cannot(&actor, Action::Read, &Target::Team(&team)));
    }

    #[test]
    fn test_rules_only_match_their_target_kind() {
        let policy = Policy::new(vec![Rule::new(&[Action::Read], Predicate::Team(allow_all))]);
        let (team, user, grants) = (team(), user(UserRole::Member), Grants::default());
        let actor = Actor::new(&user, &team, &grants);

        assert!(policy.cannot(&actor, Action::Read, &Target::User(&user)));
    }
}
