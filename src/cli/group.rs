use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::policy::{Action, Policy, Target};
use crate::store::Store;
use crate::types::{Group, GroupUser};

use super::{ActorContext, init_store};

pub fn run_group_create(data_dir: &Path, actor_id: String, name: String) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;

    Policy::standard().authorize(&ctx.actor(), Action::CreateGroup, &Target::Team(&ctx.team))?;

    let group = Group {
        id: Uuid::new_v4().to_string(),
        team_id: ctx.team.id.clone(),
        name: name.trim().to_string(),
        created_by_id: Some(ctx.user.id.clone()),
        created_at: Utc::now(),
    };
    store.create_group(&group)?;

    println!("Created group \"{}\": {}", group.name, group.id);
    Ok(())
}

pub fn run_group_add_user(
    data_dir: &Path,
    actor_id: String,
    group_id: String,
    user_id: String,
) -> anyhow::Result<()> {
    let (_, store) = init_store(data_dir)?;
    let ctx = ActorContext::load(&store, &actor_id)?;

    let group = store
        .get_group(&group_id)?
        .ok_or_else(|| anyhow::anyhow!("Group not found: {group_id}"))?;
    Policy::standard().authorize(&ctx.actor(), Action::ManageUsers, &Target::Group(&group))?;

    let user = store
        .get_user(&user_id)?
        .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;
    if user.team_id != group.team_id {
        anyhow::bail!("User {} belongs to another team", user.id);
    }

    store.add_group_user(&GroupUser {
        group_id: group.id.clone(),
        user_id: user.id.clone(),
        created_at: Utc::now(),
    })?;

    println!("Added \"{}\" to group \"{}\"", user.name, group.name);
    Ok(())
}
