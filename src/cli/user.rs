use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::store::Store;
use crate::types::{User, UserRole};

use super::init_store;

pub fn run_user_create(
    data_dir: &Path,
    team_id: String,
    name: String,
    email: Option<String>,
    role: String,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;

    let role: UserRole = role.parse()?;
    let team = store
        .get_team(&team_id)?
        .ok_or_else(|| anyhow::anyhow!("Team not found: {team_id}"))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        team_id: team.id,
        name: name.trim().to_string(),
        email,
        role,
        suspended_at: None,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user)?;

    println!("Created {} \"{}\": {}", user.role, user.name, user.id);
    Ok(())
}
