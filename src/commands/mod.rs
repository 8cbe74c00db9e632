//! Transactional document commands.
//!
//! Each command runs inside a caller-provided [`Transaction`] and assumes the
//! caller already authorized the action through the policy engine. Commands
//! keep every touched collection tree consistent with its document rows,
//! recompute sourced memberships after structural changes and append one
//! event row describing what happened.

mod creator;
mod duplicator;
mod lifecycle;
mod mover;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Transaction;
use crate::types::{Collection, Document, Event, NavigationNode, User};

pub use creator::{CreateDocument, document_creator};
pub use duplicator::{DuplicateDocument, document_duplicator, strip_comment_marks};
pub use lifecycle::{
    document_archiver, document_deleter, document_publisher, document_restorer,
    document_unarchiver,
};
pub use mover::{MoveDocument, MoveOutcome, document_mover};

/// Who is running a command, and from where.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub user: &'a User,
    pub ip: Option<&'a str>,
    pub max_title_length: usize,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(user: &'a User) -> Self {
        Self {
            user,
            ip: None,
            max_title_length: crate::config::DEFAULT_MAX_TITLE_LENGTH,
        }
    }

    #[must_use]
    pub fn with_max_title_length(mut self, max_title_length: usize) -> Self {
        self.max_title_length = max_title_length;
        self
    }
}

/// Appends an audit event for `document`.
fn record_event(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    name: &str,
    document: &Document,
    data: Value,
) -> Result<()> {
    let event = Event {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        team_id: document.team_id.clone(),
        actor_id: ctx.user.id.clone(),
        collection_id: document.collection_id.clone(),
        document_id: Some(document.id.clone()),
        ip: ctx.ip.map(str::to_string),
        data,
        created_at: Utc::now(),
    };
    tx.insert_event(&event)
}

/// Loads a collection for modification, refusing collections of other teams.
fn lock_team_collection(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    collection_id: &str,
) -> Result<Collection> {
    let collection = tx.lock_collection(collection_id)?;
    if collection.team_id != ctx.user.team_id {
        return Err(Error::forbidden("collection belongs to another team"));
    }
    Ok(collection)
}

/// Re-reads a document inside the transaction so commands never act on a
/// stale copy.
fn reload(tx: &Transaction<'_>, document: &Document) -> Result<Document> {
    tx.document(&document.id)?.ok_or(Error::NotFound("document"))
}

/// Inserts a node under `parent_id`, falling back to a root insert when the
/// parent is missing from the tree. Returns the parent the node ended up
/// under.
fn insert_into_tree(
    collection: &mut Collection,
    node: NavigationNode,
    parent_id: Option<&str>,
    index: Option<usize>,
) -> Result<Option<String>> {
    match parent_id {
        Some(parent_id) if !collection.document_structure.contains(parent_id) => {
            tracing::warn!(
                collection_id = %collection.id,
                document_id = %node.id,
                parent_document_id = %parent_id,
                "parent missing from structure, inserting at root"
            );
            collection.document_structure.insert(node, None, index)?;
            Ok(None)
        }
        _ => {
            collection.document_structure.insert(node, parent_id, index)?;
            Ok(parent_id.map(str::to_string))
        }
    }
}
