use serde_json::{Value, json};

use super::creator::{CreateDocument, document_creator};
use super::{Context, record_event, reload};
use crate::error::Result;
use crate::store::Transaction;
use crate::types::Document;

#[derive(Debug, Clone, Default)]
pub struct DuplicateDocument {
    /// Target collection; defaults to the source document's collection.
    pub collection_id: Option<String>,
    pub parent_document_id: Option<String>,
    /// Title of the root duplicate; children keep their titles.
    pub title: Option<String>,
    /// Overrides the published state of every duplicate.
    pub publish: Option<bool>,
    pub recursive: bool,
}

/// Duplicates a document, and with `recursive` its children, returning the
/// new documents in pre-order.
///
/// Children of an archived source are duplicated only when archived
/// themselves; children of a live source only when live. Templates are never
/// duplicated recursively.
pub fn document_duplicator(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    document: &Document,
    params: DuplicateDocument,
) -> Result<Vec<Document>> {
    let source = reload(tx, document)?;

    let collection_id = params
        .collection_id
        .clone()
        .or_else(|| source.collection_id.clone());
    let publish = params.publish.unwrap_or(!source.is_draft());
    let parent_document_id = match params.parent_document_id.clone() {
        Some(parent_id) => Some(parent_id),
        None if collection_id == source.collection_id && !source.template => {
            default_parent(tx, &source, publish)?
        }
        None => None,
    };
    let title = params.title.clone().unwrap_or_else(|| source.title.clone());

    let root = document_creator(
        tx,
        ctx,
        copy_of(&source, title, collection_id.clone(), parent_document_id, publish),
    )?;
    let mut duplicates = vec![root.clone()];

    if params.recursive && !source.template {
        let archived = source.is_archived();
        let mut stack: Vec<(Document, Document)> = ordered_children(tx, &source, archived)?
            .into_iter()
            .rev()
            .map(|child| (child, root.clone()))
            .collect();

        while let Some((child, parent)) = stack.pop() {
            let publish = !parent.is_draft() && params.publish.unwrap_or(!child.is_draft());
            let duplicate = document_creator(
                tx,
                ctx,
                copy_of(
                    &child,
                    child.title.clone(),
                    collection_id.clone(),
                    Some(parent.id.clone()),
                    publish,
                ),
            )?;

            for grandchild in ordered_children(tx, &child, archived)?.into_iter().rev() {
                stack.push((grandchild, duplicate.clone()));
            }
            duplicates.push(duplicate);
        }
    }

    record_event(
        tx,
        ctx,
        "documents.duplicate",
        &root,
        json!({
            "sourceId": source.id,
            "documentIds": duplicates.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            "recursive": params.recursive,
        }),
    )?;

    tracing::info!(
        source_id = %source.id,
        document_id = %root.id,
        count = duplicates.len(),
        "duplicated document"
    );
    Ok(duplicates)
}

/// The source's own parent, unless a published copy could not sit under it.
fn default_parent(
    tx: &Transaction<'_>,
    source: &Document,
    publish: bool,
) -> Result<Option<String>> {
    let Some(parent_id) = source.parent_document_id.as_deref() else {
        return Ok(None);
    };
    match tx.document(parent_id)? {
        Some(parent) if !publish || parent.is_tree_member() => Ok(Some(parent.id)),
        _ => Ok(None),
    }
}

fn copy_of(
    source: &Document,
    title: String,
    collection_id: Option<String>,
    parent_document_id: Option<String>,
    publish: bool,
) -> CreateDocument {
    CreateDocument {
        title,
        text: source.text.clone(),
        content: source.content.as_ref().map(strip_comment_marks),
        icon: source.icon.clone(),
        color: source.color.clone(),
        collection_id,
        parent_document_id,
        template: source.template,
        publish,
        index: None,
    }
}

/// Children of `parent` matching the archived state of the duplication
/// root, in tree order. Children missing from the tree follow, oldest first.
fn ordered_children(
    tx: &Transaction<'_>,
    parent: &Document,
    archived: bool,
) -> Result<Vec<Document>> {
    let mut children: Vec<Document> = tx
        .child_documents(&parent.id)?
        .into_iter()
        .filter(|child| child.is_archived() == archived)
        .collect();

    let order: Vec<String> = match parent.collection_id.as_deref() {
        Some(collection_id) => tx
            .collection(collection_id)?
            .and_then(|c| {
                c.document_structure
                    .find(&parent.id)
                    .map(|node| node.children.iter().map(|n| n.id.clone()).collect())
            })
            .unwrap_or_default(),
        None => Vec::new(),
    };

    children.sort_by_key(|child| {
        order
            .iter()
            .position(|id| *id == child.id)
            .unwrap_or(usize::MAX)
    });
    Ok(children)
}

/// Removes inline comment marks from a rich content tree.
#[must_use]
pub fn strip_comment_marks(content: &Value) -> Value {
    match content {
        Value::Object(map) => {
            let mut stripped = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                if key == "marks" {
                    if let Value::Array(marks) = value {
                        let kept: Vec<Value> = marks
                            .iter()
                            .filter(|mark| {
                                mark.get("type").and_then(Value::as_str) != Some("comment")
                            })
                            .map(strip_comment_marks)
                            .collect();
                        if !kept.is_empty() {
                            stripped.insert(key.clone(), Value::Array(kept));
                        }
                        continue;
                    }
                }
                stripped.insert(key.clone(), strip_comment_marks(value));
            }
            Value::Object(stripped)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_comment_marks).collect()),
        other => other.clone(),
    }
}
