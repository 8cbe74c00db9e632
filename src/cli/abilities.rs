use std::path::Path;

use crate::policy::{Policy, Target};
use crate::store::Store;

use super::{ActorContext, init_store};

/// Prints every action the actor may take on one target as a JSON object.
/// With no target flag the actor's team is used.
pub fn run_abilities(
    data_dir: &Path,
    actor_id: String,
    document_id: Option<String>,
    collection_id: Option<String>,
    group_id: Option<String>,
    user_id: Option<String>,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;
    let policy = Policy::standard();
    let actor = ctx.actor();

    let abilities = if let Some(id) = document_id {
        let document = store
            .get_document_with_deleted(&id)?
            .ok_or_else(|| anyhow::anyhow!("Document not found: {id}"))?;
        let collection = match document.collection_id.as_deref() {
            Some(collection_id) => store.get_collection(collection_id)?,
            None => None,
        };
        policy.serialize(
            &actor,
            &Target::Document {
                document: &document,
                collection: collection.as_ref(),
            },
        )
    } else if let Some(id) = collection_id {
        let collection = store
            .get_collection(&id)?
            .ok_or_else(|| anyhow::anyhow!("Collection not found: {id}"))?;
        policy.serialize(&actor, &Target::Collection(&collection))
    } else if let Some(id) = group_id {
        let group = store
            .get_group(&id)?
            .ok_or_else(|| anyhow::anyhow!("Group not found: {id}"))?;
        policy.serialize(&actor, &Target::Group(&group))
    } else if let Some(id) = user_id {
        let user = store
            .get_user(&id)?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;
        policy.serialize(&actor, &Target::User(&user))
    } else {
        policy.serialize(&actor, &Target::Team(&ctx.team))
    };

    println!("{}", serde_json::to_string_pretty(&abilities)?);
    Ok(())
}
