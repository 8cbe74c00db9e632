mod abilities;
mod collection;
mod commands;
mod document;
mod grant;
mod group;
mod team;
mod user;

pub use abilities::run_abilities;
pub use collection::{run_collection_create, run_collection_tree, run_collection_verify};
pub use commands::{
    CollectionCommands, DocumentCommands, GrantTarget, GroupCommands, TeamCommands, UserCommands,
};
pub use document::{
    run_document_archive, run_document_create, run_document_delete, run_document_duplicate,
    run_document_move, run_document_publish, run_document_restore,
};
pub use grant::{run_grant, run_revoke};
pub use group::{run_group_add_user, run_group_create};
pub use team::run_team_create;
pub use user::run_user_create;

use std::path::Path;

use crate::config::Config;
use crate::membership::Grants;
use crate::policy::Actor;
use crate::store::{SqliteStore, Store};
use crate::types::{Team, User};

/// Loads the configuration and opens the store, checking the database exists.
pub fn init_store(data_dir: &Path) -> anyhow::Result<(Config, SqliteStore)> {
    let config = Config::load(data_dir)?;
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'folio init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&config)?;
    Ok((config, store))
}

/// Everything the policy engine needs to know about the acting user.
pub struct ActorContext {
    pub user: User,
    pub team: Team,
    pub grants: Grants,
}

impl ActorContext {
    pub fn load(store: &SqliteStore, user_id: &str) -> anyhow::Result<Self> {
        let user = store
            .get_user(user_id)?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;
        let team = store
            .get_team(&user.team_id)?
            .ok_or_else(|| anyhow::anyhow!("Team not found: {}", user.team_id))?;
        let grants = store.load_grants(&user.id)?;
        Ok(Self { user, team, grants })
    }

    #[must_use]
    pub fn actor(&self) -> Actor<'_> {
        Actor::new(&self.user, &self.team, &self.grants)
    }
}
