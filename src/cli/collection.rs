use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::policy::{Action, Policy, Target};
use crate::store::Store;
use crate::structure::DocumentStructure;
use crate::types::{Collection, CollectionPermission, NavigationNode};

use super::{ActorContext, init_store};

pub fn run_collection_create(
    data_dir: &Path,
    actor_id: String,
    name: String,
    permission: String,
    no_sharing: bool,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;

    Policy::standard().authorize(
        &ctx.actor(),
        Action::CreateCollection,
        &Target::Team(&ctx.team),
    )?;

    let permission = match permission.as_str() {
        "private" => None,
        other => Some(other.parse::<CollectionPermission>()?),
    };

    let now = Utc::now();
    let collection = Collection {
        id: Uuid::new_v4().to_string(),
        team_id: ctx.team.id.clone(),
        name: name.trim().to_string(),
        description: None,
        icon: None,
        color: None,
        permission,
        sharing: !no_sharing,
        document_structure: DocumentStructure::new(),
        created_by_id: Some(ctx.user.id.clone()),
        created_at: now,
        updated_at: now,
        archived_at: None,
        deleted_at: None,
    };
    store.create_collection(&collection)?;

    println!("Created collection \"{}\": {}", collection.name, collection.id);
    Ok(())
}

pub fn run_collection_tree(
    data_dir: &Path,
    actor_id: String,
    collection_id: String,
    json: bool,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;

    let collection = store
        .get_collection(&collection_id)?
        .ok_or_else(|| anyhow::anyhow!("Collection not found: {collection_id}"))?;
    Policy::standard().authorize(&ctx.actor(), Action::Read, &Target::Collection(&collection))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&collection.document_structure)?
        );
        return Ok(());
    }

    println!("{}", collection.name);
    if collection.document_structure.is_empty() {
        println!("  (empty)");
    }
    print_nodes(collection.document_structure.nodes(), 1);
    Ok(())
}

fn print_nodes(nodes: &[NavigationNode], depth: usize) {
    for node in nodes {
        println!("{}- {} ({})", "  ".repeat(depth), node.title, node.id);
        print_nodes(&node.children, depth + 1);
    }
}

pub fn run_collection_verify(
    data_dir: &Path,
    collection_id: String,
    json: bool,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;

    let collection = store
        .get_collection(&collection_id)?
        .ok_or_else(|| anyhow::anyhow!("Collection not found: {collection_id}"))?;

    let mut documents = store.list_collection_documents(&collection.id, false)?;
    for id in collection.document_structure.ids() {
        if !documents.iter().any(|d| d.id == id) {
            if let Some(document) = store.get_document_with_deleted(&id)? {
                documents.push(document);
            }
        }
    }

    let problems = collection
        .document_structure
        .check_consistency(&collection.id, &documents);

    if json {
        println!("{}", serde_json::to_string_pretty(&problems)?);
    } else if problems.is_empty() {
        println!("Collection \"{}\" is consistent", collection.name);
    } else {
        for problem in &problems {
            println!("{problem:?}");
        }
    }

    if !problems.is_empty() {
        anyhow::bail!(
            "Collection \"{}\" has {} inconsistencies",
            collection.name,
            problems.len()
        );
    }
    Ok(())
}
