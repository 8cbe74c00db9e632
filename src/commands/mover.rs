use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use super::{Context, insert_into_tree, lock_team_collection, record_event, reload};
use crate::error::{Error, Result};
use crate::membership::recalculate_for_documents;
use crate::store::Transaction;
use crate::types::{Collection, Document};

#[derive(Debug, Clone, Default)]
pub struct MoveDocument {
    /// Target collection; `None` detaches the document to drafts.
    pub collection_id: Option<String>,
    pub parent_document_id: Option<String>,
    pub index: Option<usize>,
}

/// Everything a move touched, for callers resynchronizing clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub collections: Vec<Collection>,
    pub documents: Vec<Document>,
    pub collection_changed: bool,
}

/// Moves a document, with its subtree, to a new collection, parent or
/// position.
///
/// Collections are locked source first, then target. The moved node keeps
/// its children; when the collection changes every descendant is retagged,
/// and pins on the source collection are dropped. Detaching to drafts
/// unpublishes the document and repoints its children to its new parent.
pub fn document_mover(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
    params: MoveDocument,
) -> Result<MoveOutcome> {
    let mut document = reload(tx, document)?;
    let source_id = document.collection_id.clone();
    let target_id = params.collection_id.clone();
    let collection_changed = source_id != target_id;

    if document.template {
        return move_template(tx, ctx, document, params, collection_changed);
    }

    let mut source = source_id
        .as_deref()
        .map(|id| lock_team_collection(tx, ctx, id))
        .transpose()?;
    let mut target = match target_id.as_deref() {
        Some(id) if collection_changed => Some(lock_team_collection(tx, ctx, id)?),
        _ => None,
    };

    if target_id.is_none() && params.parent_document_id.is_some() {
        return Err(Error::validation(
            "documents detached to drafts cannot have a parent",
        ));
    }
    if let Some(parent_id) = params.parent_document_id.as_deref() {
        check_parent(tx, ctx, &document, source.as_ref(), parent_id, target_id.as_deref())?;
    }

    let was_in_tree = document.is_tree_member();
    let former_parent_id = document.parent_document_id.clone();
    let mut index = params.index;

    let removed = match source.as_mut().filter(|_| was_in_tree) {
        Some(source) => {
            let tree_parent_id = source.document_structure.find_parent_id(&document.id);
            let (node, from_index) = source.document_structure.remove_document(&document);

            if !collection_changed && tree_parent_id == params.parent_document_id {
                if let (Some(from), Some(to)) = (from_index, index) {
                    if from < to {
                        index = Some(to - 1);
                    }
                }
            }
            Some((node, from_index, tree_parent_id))
        }
        None => None,
    };

    document.collection_id = target_id.clone();
    document.parent_document_id = params.parent_document_id.clone();
    document.last_modified_by_id = ctx.user.id.clone();
    document.updated_at = Utc::now();
    if target_id.is_none() {
        document.published_at = None;
    }

    let mut affected = vec![document.id.clone()];
    let mut descendant_ids = Vec::new();
    // Parent the detached document's children end up under.
    let mut promoted_parent_id = document.parent_document_id.clone();

    if let Some((node, from_index, tree_parent_id)) = removed {
        if document.is_tree_member() {
            let destination = if collection_changed {
                target.as_mut()
            } else {
                source.as_mut()
            };
            if let Some(destination) = destination {
                document.parent_document_id = insert_into_tree(
                    destination,
                    node,
                    document.parent_document_id.as_deref(),
                    index,
                )?;
                descendant_ids = destination
                    .document_structure
                    .collect_descendant_ids(&document.id);
            }
        } else if let Some(source) = source.as_mut() {
            // Detached: the children move up to the document's new parent,
            // taking its former slot when that was at the root.
            let slot = from_index.filter(|_| tree_parent_id.is_none());
            let children: Vec<String> = node.children.iter().map(|c| c.id.clone()).collect();
            for (offset, child) in node.children.into_iter().enumerate() {
                promoted_parent_id = insert_into_tree(
                    source,
                    child,
                    document.parent_document_id.as_deref(),
                    slot.map(|i| i + offset),
                )?;
            }
            affected.extend(children);
        }
    }

    tx.update_document(&document)?;

    if collection_changed {
        match target_id.as_deref() {
            Some(target_id) => {
                tx.set_documents_collection(&descendant_ids, Some(target_id))?;
                affected.extend(descendant_ids.iter().cloned());
            }
            None => {
                let child_ids: Vec<String> = tx
                    .child_documents(&document.id)?
                    .into_iter()
                    .map(|d| d.id)
                    .collect();
                tx.set_documents_parent(&child_ids, promoted_parent_id.as_deref())?;
                for id in child_ids {
                    if !affected.contains(&id) {
                        affected.push(id);
                    }
                }
            }
        }
        if let Some(source_id) = source_id.as_deref() {
            let pins = tx.delete_collection_pins(&document.id, source_id)?;
            if pins > 0 {
                tracing::debug!(
                    document_id = %document.id,
                    pins,
                    "removed pins from source collection"
                );
            }
        }
    }

    let mut collections = Vec::new();
    for collection in [source, target].into_iter().flatten() {
        tx.save_structure(&collection)?;
        collections.push(collection);
    }

    let mut recalculate = vec![document.id.clone()];
    recalculate.extend(document.parent_document_id.clone());
    if target_id.is_none() {
        recalculate.extend(former_parent_id.clone());
    }
    recalculate_for_documents(tx, &recalculate)?;

    let mut documents = Vec::with_capacity(affected.len());
    for id in &affected {
        if let Some(document) = tx.document(id)? {
            documents.push(document);
        }
    }

    record_event(
        tx,
        ctx,
        "documents.move",
        &document,
        json!({
            "collectionIds": collections.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "documentIds": affected,
            "parentDocumentId": document.parent_document_id,
        }),
    )?;

    tracing::info!(
        document_id = %document.id,
        from = ?source_id,
        to = ?target_id,
        collection_changed,
        documents = documents.len(),
        "moved document"
    );

    Ok(MoveOutcome {
        collections,
        documents,
        collection_changed,
    })
}

/// Templates are not tree members: only their collection is retagged.
fn move_template(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    mut document: Document,
    params: MoveDocument,
    collection_changed: bool,
) -> Result<MoveOutcome> {
    if !collection_changed {
        return Ok(MoveOutcome {
            collections: Vec::new(),
            documents: vec![document],
            collection_changed: false,
        });
    }
    if params.parent_document_id.is_some() {
        return Err(Error::validation("templates cannot have a parent document"));
    }

    let mut collections = Vec::new();
    if let Some(target_id) = params.collection_id.as_deref() {
        let target = tx
            .collection(target_id)?
            .ok_or(Error::NotFound("collection"))?;
        if target.team_id != ctx.user.team_id {
            return Err(Error::forbidden("collection belongs to another team"));
        }
        collections.push(target);
    }

    document.collection_id = params.collection_id;
    document.parent_document_id = None;
    document.last_modified_by_id = ctx.user.id.clone();
    document.updated_at = Utc::now();
    tx.update_document(&document)?;

    record_event(
        tx,
        ctx,
        "documents.move",
        &document,
        json!({
            "collectionIds": collections.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "documentIds": [document.id.as_str()],
            "template": true,
        }),
    )?;

    Ok(MoveOutcome {
        collections,
        documents: vec![document],
        collection_changed: true,
    })
}

fn check_parent(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
    source: Option<&Collection>,
    parent_id: &str,
    target_id: Option<&str>,
) -> Result<()> {
    if parent_id == document.id {
        return Err(Error::validation("a document cannot be its own parent"));
    }

    let parent = tx.document(parent_id)?.ok_or(Error::NotFound("document"))?;
    if parent.team_id != ctx.user.team_id {
        return Err(Error::forbidden("parent document belongs to another team"));
    }
    if parent.collection_id.as_deref() != target_id {
        return Err(Error::validation(
            "parent document belongs to another collection",
        ));
    }
    if document.is_tree_member() && !parent.is_tree_member() {
        return Err(Error::validation(
            "cannot move a published document under an unpublished, archived or template parent",
        ));
    }

    let in_tree_subtree = source.is_some_and(|source| {
        source
            .document_structure
            .collect_descendant_ids(&document.id)
            .iter()
            .any(|id| id == parent_id)
    });
    if in_tree_subtree || has_ancestor(tx, &parent, &document.id)? {
        return Err(Error::validation(
            "cannot move a document into its own subtree",
        ));
    }
    Ok(())
}

/// Walks parent pointers up from `document` looking for `ancestor_id`.
fn has_ancestor(tx: &Transaction<'_>, document: &Document, ancestor_id: &str) -> Result<bool> {
    let mut seen = HashSet::new();
    let mut current = document.parent_document_id.clone();

    while let Some(id) = current {
        if id == ancestor_id {
            return Ok(true);
        }
        if !seen.insert(id.clone()) {
            tracing::warn!(document_id = %document.id, "parent pointer cycle detected");
            break;
        }
        current = tx
            .document_with_deleted(&id)?
            .and_then(|d| d.parent_document_id);
    }
    Ok(false)
}
