//! Authorization rules.
//!
//! Every decision goes through a [`Policy`]: a table of rules keyed by
//! actor kind, action and target kind. Rule modules below contribute the
//! rules for one target kind each; predicates may call back into the
//! policy to delegate (a document `update` asks its collection about
//! `updateDocument`).

mod action;
mod collection;
mod document;
mod engine;
mod group;
pub mod helpers;
mod team;
mod user;

pub use action::{Action, ActorKind, TargetKind};
pub use engine::{
    Actor, CollectionPredicate, DocumentPredicate, GroupPredicate, Policy, Predicate, Rule,
    Target, TeamPredicate, UserPredicate,
};
