use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::store::Store;
use crate::types::Team;

use super::init_store;

pub fn run_team_create(
    data_dir: &Path,
    name: String,
    no_sharing: bool,
    member_collection_create: bool,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;

    let name = name.trim().to_string();
    if name.is_empty() {
        anyhow::bail!("Team name cannot be empty");
    }

    let team = Team {
        id: Uuid::new_v4().to_string(),
        name,
        sharing: !no_sharing,
        member_collection_create,
        created_at: Utc::now(),
    };
    store.create_team(&team)?;

    println!("Created team \"{}\": {}", team.name, team.id);
    Ok(())
}
