//! Publish, archive, delete and their inverses.
//!
//! Archiving and deleting take the whole subtree out of the collection tree;
//! unarchiving and restoring rebuild it from the document rows that were
//! archived or deleted together with the root.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::json;

use super::{Context, insert_into_tree, lock_team_collection, record_event, reload};
use crate::error::{Error, Result};
use crate::membership::recalculate_for_documents;
use crate::store::Transaction;
use crate::types::{Collection, Document, NavigationNode};

/// Publishes a draft into `collection_id` (or the collection it already
/// names) at `index` under its parent.
pub fn document_publisher(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
    collection_id: Option<&str>,
    index: Option<usize>,
) -> Result<Document> {
    let mut document = reload(tx, document)?;
    if !document.is_draft() {
        return Err(Error::validation("document is already published"));
    }

    let now = Utc::now();
    if document.template {
        document.published_at = Some(now);
        document.updated_at = now;
        tx.update_document(&document)?;
        record_event(tx, ctx, "documents.publish", &document, json!({"template": true}))?;
        return Ok(document);
    }

    let collection_id = collection_id
        .map(str::to_string)
        .or_else(|| document.collection_id.clone())
        .ok_or_else(|| Error::validation("publishing requires a collection"))?;
    let mut collection = lock_team_collection(tx, ctx, &collection_id)?;

    if document.collection_id.as_deref() != Some(collection_id.as_str()) {
        document.parent_document_id = None;
        document.collection_id = Some(collection_id);
    }
    if let Some(parent_id) = document.parent_document_id.as_deref() {
        let parent = tx.document(parent_id)?.ok_or(Error::NotFound("document"))?;
        if !parent.is_tree_member() {
            return Err(Error::validation("parent document must be published first"));
        }
    }

    document.published_at = Some(now);
    document.last_modified_by_id = ctx.user.id.clone();
    document.updated_at = now;

    if !document.is_archived() {
        document.parent_document_id = insert_into_tree(
            &mut collection,
            document.to_navigation_node(),
            document.parent_document_id.as_deref(),
            index,
        )?;
    }
    tx.update_document(&document)?;
    tx.save_structure(&collection)?;

    let mut recalculate = vec![document.id.clone()];
    recalculate.extend(document.parent_document_id.clone());
    recalculate_for_documents(tx, &recalculate)?;

    record_event(
        tx,
        ctx,
        "documents.publish",
        &document,
        json!({"collectionId": document.collection_id}),
    )?;
    tracing::info!(document_id = %document.id, "published document");
    Ok(document)
}

/// Archives a document and the subtree below it in its collection tree.
/// Returns the ids of every archived document.
pub fn document_archiver(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
) -> Result<Vec<String>> {
    let document = reload(tx, document)?;
    if document.is_archived() {
        return Err(Error::validation("document is already archived"));
    }

    let mut ids = vec![document.id.clone()];
    let collection = match document.collection_id.as_deref() {
        Some(collection_id) if document.is_tree_member() => {
            let mut collection = lock_team_collection(tx, ctx, collection_id)?;
            let (node, _) = collection.document_structure.remove_document(&document);
            collect_node_ids(&node.children, &mut ids);
            Some(collection)
        }
        _ => None,
    };

    let now = Utc::now();
    tx.set_documents_archived_at(&ids, Some(&now))?;
    if let Some(collection) = &collection {
        tx.save_structure(collection)?;
    }
    recalculate_for_documents(tx, &ids)?;

    record_event(
        tx,
        ctx,
        "documents.archive",
        &document,
        json!({"documentIds": ids}),
    )?;
    tracing::info!(document_id = %document.id, count = ids.len(), "archived document");
    Ok(ids)
}

/// Brings an archived document back, together with the descendants archived
/// at the same moment.
pub fn document_unarchiver(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
) -> Result<Document> {
    let document = reload(tx, document)?;
    let Some(archived_at) = document.archived_at else {
        return Err(Error::validation("document is not archived"));
    };

    let collection = document
        .collection_id
        .as_deref()
        .map(|id| lock_team_collection(tx, ctx, id))
        .transpose()?;

    let restored = subtree(tx, &document, false, |d| d.archived_at == Some(archived_at))?;
    let ids: Vec<String> = restored.iter().map(|d| d.id.clone()).collect();
    tx.set_documents_archived_at(&ids, None)?;

    let document = reattach(tx, ctx, document, collection, &ids)?;
    record_event(
        tx,
        ctx,
        "documents.unarchive",
        &document,
        json!({"documentIds": ids}),
    )?;
    tracing::info!(document_id = %document.id, count = ids.len(), "unarchived document");
    Ok(document)
}

/// Soft-deletes a document and every live descendant row. Returns the ids
/// of the deleted documents.
pub fn document_deleter(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
) -> Result<Vec<String>> {
    let document = reload(tx, document)?;
    let ids: Vec<String> = subtree(tx, &document, false, |_| true)?
        .into_iter()
        .map(|d| d.id)
        .collect();

    // Documents of a deleted collection have no tree left to update.
    let live_collection = match document.collection_id.as_deref() {
        Some(collection_id) => tx.collection(collection_id)?.map(|c| c.id),
        None => None,
    };
    let collection = match live_collection.as_deref() {
        Some(collection_id) => {
            let mut collection = lock_team_collection(tx, ctx, collection_id)?;
            if document.is_tree_member() {
                collection.document_structure.remove_document(&document);
            } else {
                collection.document_structure.remove(&document.id);
            }
            Some(collection)
        }
        None => None,
    };

    let now = Utc::now();
    tx.set_documents_deleted_at(&ids, Some(&now))?;
    if let Some(collection) = &collection {
        tx.save_structure(collection)?;
    }

    let mut recalculate = ids.clone();
    recalculate.extend(document.parent_document_id.clone());
    recalculate_for_documents(tx, &recalculate)?;

    record_event(
        tx,
        ctx,
        "documents.delete",
        &document,
        json!({"documentIds": ids}),
    )?;
    tracing::info!(document_id = %document.id, count = ids.len(), "deleted document");
    Ok(ids)
}

/// Restores a soft-deleted document and the descendants deleted with it.
/// The collection must still exist.
pub fn document_restorer(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
) -> Result<Document> {
    let document = tx
        .document_with_deleted(&document.id)?
        .ok_or(Error::NotFound("document"))?;
    let Some(deleted_at) = document.deleted_at else {
        return Err(Error::validation("document is not deleted"));
    };

    let collection = document
        .collection_id
        .as_deref()
        .map(|id| lock_team_collection(tx, ctx, id))
        .transpose()?;

    let restored = subtree(tx, &document, true, |d| d.deleted_at == Some(deleted_at))?;
    let ids: Vec<String> = restored.iter().map(|d| d.id.clone()).collect();
    tx.set_documents_deleted_at(&ids, None)?;

    let document = reattach(tx, ctx, document, collection, &ids)?;
    record_event(
        tx,
        ctx,
        "documents.restore",
        &document,
        json!({"documentIds": ids}),
    )?;
    tracing::info!(document_id = %document.id, count = ids.len(), "restored document");
    Ok(document)
}

/// Re-inserts a freshly restored subtree into its collection tree, under the
/// original parent when that parent is still in the tree.
fn reattach(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: Document,
    collection: Option<Collection>,
    ids: &[String],
) -> Result<Document> {
    let mut document = tx.document(&document.id)?.ok_or(Error::NotFound("document"))?;

    if let Some(mut collection) = collection {
        if document.is_tree_member() {
            let members: HashSet<&str> = ids.iter().map(String::as_str).collect();
            let node = tree_node(tx, &document, &members)?;

            let parent_id = match document.parent_document_id.as_deref() {
                Some(parent_id) if collection.document_structure.contains(parent_id) => {
                    Some(parent_id.to_string())
                }
                _ => None,
            };
            collection.document_structure.insert(node, parent_id.as_deref(), None)?;

            if parent_id != document.parent_document_id {
                document.parent_document_id = parent_id;
                document.last_modified_by_id = ctx.user.id.clone();
                document.updated_at = Utc::now();
                tx.update_document(&document)?;
            }
        }
        tx.save_structure(&collection)?;
    }

    let mut recalculate = ids.to_vec();
    recalculate.extend(document.parent_document_id.clone());
    recalculate_for_documents(tx, &recalculate)?;
    Ok(document)
}

/// The document and its descendants matching `select`, pre-order. A
/// descendant that does not match hides its own subtree.
fn subtree(
    tx: &Transaction<'_>,
    root: &Document,
    with_deleted: bool,
    select: impl Fn(&Document) -> bool,
) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    let mut stack = vec![root.clone()];

    while let Some(document) = stack.pop() {
        let children = if with_deleted {
            tx.child_documents_with_deleted(&document.id)?
        } else {
            tx.child_documents(&document.id)?
        };
        stack.extend(children.into_iter().rev().filter(|child| select(child)));
        documents.push(document);
    }
    Ok(documents)
}

/// Builds the navigation node of a restored document from current rows,
/// keeping only tree members that were restored together.
fn tree_node(
    tx: &Transaction<'_>,
    document: &Document,
    members: &HashSet<&str>,
) -> Result<NavigationNode> {
    let mut node = document.to_navigation_node();
    for child in tx.child_documents(&document.id)? {
        if members.contains(child.id.as_str()) && child.is_tree_member() {
            node.children.push(tree_node(tx, &child, members)?);
        }
    }
    Ok(node)
}

fn collect_node_ids(nodes: &[NavigationNode], ids: &mut Vec<String>) {
    for node in nodes {
        ids.push(node.id.clone());
        collect_node_ids(&node.children, ids);
    }
}
