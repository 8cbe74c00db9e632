use std::path::Path;

use crate::commands::{
    self, CreateDocument, DuplicateDocument, MoveDocument, document_archiver, document_creator,
    document_deleter, document_duplicator, document_mover, document_publisher, document_restorer,
    document_unarchiver,
};
use crate::config::Config;
use crate::policy::{Action, Policy, Target};
use crate::store::{SqliteStore, Store};
use crate::types::{Collection, Document};

use super::{ActorContext, init_store};

fn command_context<'a>(ctx: &'a ActorContext, config: &Config) -> commands::Context<'a> {
    commands::Context::new(&ctx.user).with_max_title_length(config.max_title_length)
}

fn load_collection(store: &SqliteStore, id: &str) -> anyhow::Result<Collection> {
    store
        .get_collection(id)?
        .ok_or_else(|| anyhow::anyhow!("Collection not found: {id}"))
}

/// Loads a document with the collection it belongs to, if any.
fn load_document(
    store: &SqliteStore,
    id: &str,
    include_deleted: bool,
) -> anyhow::Result<(Document, Option<Collection>)> {
    let document = if include_deleted {
        store.get_document_with_deleted(id)?
    } else {
        store.get_document(id)?
    }
    .ok_or_else(|| anyhow::anyhow!("Document not found: {id}"))?;

    let collection = match document.collection_id.as_deref() {
        Some(collection_id) => store.get_collection(collection_id)?,
        None => None,
    };
    Ok((document, collection))
}

fn document_target<'a>(document: &'a Document, collection: Option<&'a Collection>) -> Target<'a> {
    Target::Document {
        document,
        collection,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_document_create(
    data_dir: &Path,
    actor_id: String,
    title: String,
    text: String,
    collection_id: Option<String>,
    parent_id: Option<String>,
    publish: bool,
    template: bool,
    index: Option<usize>,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;
    let policy = Policy::standard();
    let actor = ctx.actor();

    if template {
        policy.authorize(&actor, Action::CreateTemplate, &Target::Team(&ctx.team))?;
    }
    if let Some(parent_id) = parent_id.as_deref() {
        let (parent, collection) = load_document(&store, parent_id, false)?;
        policy.authorize(
            &actor,
            Action::CreateChildDocument,
            &document_target(&parent, collection.as_ref()),
        )?;
    } else if let Some(collection_id) = collection_id.as_deref() {
        let collection = load_collection(&store, collection_id)?;
        policy.authorize(&actor, Action::CreateDocument, &Target::Collection(&collection))?;
    } else {
        policy.authorize(&actor, Action::CreateDocument, &Target::Team(&ctx.team))?;
    }

    let command_ctx = command_context(&ctx, &config);
    let document = store.transaction(|tx| {
        document_creator(
            tx,
            &command_ctx,
            CreateDocument {
                title,
                text,
                collection_id,
                parent_document_id: parent_id,
                template,
                publish,
                index,
                ..CreateDocument::default()
            },
        )
    })?;

    let state = if document.is_draft() { "draft" } else { "document" };
    println!("Created {state} \"{}\": {}", document.title, document.id);
    Ok(())
}

pub fn run_document_publish(
    data_dir: &Path,
    actor_id: String,
    document_id: String,
    collection_id: Option<String>,
    index: Option<usize>,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;
    let policy = Policy::standard();
    let actor = ctx.actor();

    let (document, collection) = load_document(&store, &document_id, false)?;
    policy.authorize(
        &actor,
        Action::Publish,
        &document_target(&document, collection.as_ref()),
    )?;
    if let Some(collection_id) = collection_id.as_deref() {
        let target = load_collection(&store, collection_id)?;
        policy.authorize(&actor, Action::CreateDocument, &Target::Collection(&target))?;
    }

    let command_ctx = command_context(&ctx, &config);
    let document = store.transaction(|tx| {
        document_publisher(tx, &command_ctx, &document, collection_id.as_deref(), index)
    })?;

    println!("Published \"{}\"", document.title);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_document_move(
    data_dir: &Path,
    actor_id: String,
    document_id: String,
    collection_id: Option<String>,
    parent_id: Option<String>,
    index: Option<usize>,
    detach: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;
    let policy = Policy::standard();
    let actor = ctx.actor();

    let (document, collection) = load_document(&store, &document_id, false)?;
    policy.authorize(
        &actor,
        Action::Move,
        &document_target(&document, collection.as_ref()),
    )?;

    let collection_id = if detach { None } else { collection_id };
    if let Some(collection_id) = collection_id.as_deref() {
        let target = load_collection(&store, collection_id)?;
        policy.authorize(&actor, Action::UpdateDocument, &Target::Collection(&target))?;
    }
    if let Some(parent_id) = parent_id.as_deref() {
        let (parent, parent_collection) = load_document(&store, parent_id, false)?;
        policy.authorize(
            &actor,
            Action::Update,
            &document_target(&parent, parent_collection.as_ref()),
        )?;
    }

    let command_ctx = command_context(&ctx, &config);
    let outcome = store.transaction(|tx| {
        document_mover(
            tx,
            &command_ctx,
            &document,
            MoveDocument {
                collection_id,
                parent_document_id: parent_id,
                index,
            },
        )
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "Moved \"{}\" ({} documents, {} collections updated)",
            document.title,
            outcome.documents.len(),
            outcome.collections.len()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_document_duplicate(
    data_dir: &Path,
    actor_id: String,
    document_id: String,
    collection_id: Option<String>,
    parent_id: Option<String>,
    title: Option<String>,
    publish: Option<bool>,
    recursive: bool,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;
    let policy = Policy::standard();
    let actor = ctx.actor();

    let (document, collection) = load_document(&store, &document_id, false)?;
    policy.authorize(
        &actor,
        Action::Duplicate,
        &document_target(&document, collection.as_ref()),
    )?;
    if let Some(target_id) = collection_id.as_deref().or(document.collection_id.as_deref()) {
        let target = load_collection(&store, target_id)?;
        policy.authorize(&actor, Action::CreateDocument, &Target::Collection(&target))?;
    }
    if let Some(parent_id) = parent_id.as_deref() {
        let (parent, parent_collection) = load_document(&store, parent_id, false)?;
        policy.authorize(
            &actor,
            Action::Update,
            &document_target(&parent, parent_collection.as_ref()),
        )?;
    }

    let command_ctx = command_context(&ctx, &config);
    let duplicates = store.transaction(|tx| {
        document_duplicator(
            tx,
            &command_ctx,
            &document,
            DuplicateDocument {
                collection_id,
                parent_document_id: parent_id,
                title,
                publish,
                recursive,
            },
        )
    })?;

    for duplicate in &duplicates {
        println!("Created \"{}\": {}", duplicate.title, duplicate.id);
    }
    Ok(())
}

pub fn run_document_archive(
    data_dir: &Path,
    actor_id: String,
    document_id: String,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;

    let (document, collection) = load_document(&store, &document_id, false)?;
    Policy::standard().authorize(
        &ctx.actor(),
        Action::Archive,
        &document_target(&document, collection.as_ref()),
    )?;

    let command_ctx = command_context(&ctx, &config);
    let ids = store.transaction(|tx| document_archiver(tx, &command_ctx, &document))?;

    println!("Archived \"{}\" ({} documents)", document.title, ids.len());
    Ok(())
}

/// Restores a deleted document, or unarchives an archived one.
pub fn run_document_restore(
    data_dir: &Path,
    actor_id: String,
    document_id: String,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;
    let policy = Policy::standard();
    let command_ctx = command_context(&ctx, &config);

    let (document, collection) = load_document(&store, &document_id, true)?;
    let target = document_target(&document, collection.as_ref());

    let restored = if document.is_deleted() {
        policy.authorize(&ctx.actor(), Action::Restore, &target)?;
        store.transaction(|tx| document_restorer(tx, &command_ctx, &document))?
    } else if document.is_archived() {
        policy.authorize(&ctx.actor(), Action::Unarchive, &target)?;
        store.transaction(|tx| document_unarchiver(tx, &command_ctx, &document))?
    } else {
        anyhow::bail!("Document \"{}\" is neither deleted nor archived", document.title);
    };

    println!("Restored \"{}\"", restored.title);
    Ok(())
}

pub fn run_document_delete(
    data_dir: &Path,
    actor_id: String,
    document_id: String,
) -> anyhow::Result<()> {
    let (config, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;

    let (document, collection) = load_document(&store, &document_id, false)?;
    Policy::standard().authorize(
        &ctx.actor(),
        Action::Delete,
        &document_target(&document, collection.as_ref()),
    )?;

    let command_ctx = command_context(&ctx, &config);
    let ids = store.transaction(|tx| document_deleter(tx, &command_ctx, &document))?;

    println!("Deleted \"{}\" ({} documents)", document.title, ids.len());
    Ok(())
}
