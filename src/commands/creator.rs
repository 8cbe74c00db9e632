use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Context, insert_into_tree, lock_team_collection, record_event};
use crate::error::{Error, Result};
use crate::membership::recalculate_for_documents;
use crate::store::Transaction;
use crate::types::Document;
use crate::types::url::{generate_url_id, normalize_title};

#[derive(Debug, Clone, Default)]
pub struct CreateDocument {
    pub title: String,
    pub text: String,
    pub content: Option<Value>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub collection_id: Option<String>,
    pub parent_document_id: Option<String>,
    pub template: bool,
    pub publish: bool,
    /// Position among the parent's children when published.
    pub index: Option<usize>,
}

/// Creates a document row and, when it is published, its node in the
/// collection tree.
pub fn document_creator(
    tx: &Transaction<'_>,
    ctx: &Context<'_>,
    params: CreateDocument,
) -> Result<Document> {
    let title = normalize_title(&params.title, ctx.max_title_length)?;

    if params.publish && params.collection_id.is_none() {
        return Err(Error::validation("publishing requires a collection"));
    }
    if params.template && params.parent_document_id.is_some() {
        return Err(Error::validation("templates cannot have a parent document"));
    }

    let in_tree = params.publish && !params.template;

    let collection = match params.collection_id.as_deref() {
        Some(collection_id) if in_tree => Some(lock_team_collection(tx, ctx, collection_id)?),
        Some(collection_id) => {
            let collection = tx
                .collection(collection_id)?
                .ok_or(Error::NotFound("collection"))?;
            if collection.team_id != ctx.user.team_id {
                return Err(Error::forbidden("collection belongs to another team"));
            }
            Some(collection)
        }
        None => None,
    };

    if let Some(parent_id) = params.parent_document_id.as_deref() {
        let parent = tx.document(parent_id)?.ok_or(Error::NotFound("document"))?;
        if parent.team_id != ctx.user.team_id {
            return Err(Error::forbidden("parent document belongs to another team"));
        }
        if parent.collection_id != params.collection_id {
            return Err(Error::validation(
                "parent document belongs to another collection",
            ));
        }
        if in_tree && !parent.is_tree_member() {
            return Err(Error::validation(
                "cannot publish under an unpublished, archived or template parent",
            ));
        }
    }

    let now = Utc::now();
    let mut document = Document {
        id: Uuid::new_v4().to_string(),
        url_id: generate_url_id(),
        team_id: ctx.user.team_id.clone(),
        collection_id: params.collection_id,
        parent_document_id: params.parent_document_id,
        title,
        text: params.text,
        content: params.content,
        icon: params.icon,
        color: params.color,
        template: params.template,
        created_by_id: ctx.user.id.clone(),
        last_modified_by_id: ctx.user.id.clone(),
        published_at: params.publish.then_some(now),
        archived_at: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    if let Some(mut collection) = collection.filter(|_| in_tree) {
        document.parent_document_id = insert_into_tree(
            &mut collection,
            document.to_navigation_node(),
            document.parent_document_id.as_deref(),
            params.index,
        )?;
        tx.insert_document(&document)?;
        tx.save_structure(&collection)?;

        if let Some(parent_id) = document.parent_document_id.clone() {
            recalculate_for_documents(tx, &[parent_id])?;
        }
    } else {
        tx.insert_document(&document)?;
    }

    record_event(
        tx,
        ctx,
        "documents.create",
        &document,
        json!({
            "title": document.title,
            "template": document.template,
            "published": !document.is_draft(),
        }),
    )?;

    tracing::info!(
        document_id = %document.id,
        collection_id = ?document.collection_id,
        published = !document.is_draft(),
        "created document"
    );
    Ok(document)
}
