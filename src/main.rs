use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio::cli::{
    CollectionCommands, DocumentCommands, GrantTarget, GroupCommands, TeamCommands, UserCommands,
};
use folio::config::{CONFIG_FILE, Config};
use folio::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Document trees and permissions for a team knowledge base")]
struct Cli {
    /// Data directory holding folio.toml and the database
    #[arg(long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, configuration and database
    Init,

    /// Manage teams
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Manage collections
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage documents
    Document {
        #[command(subcommand)]
        command: DocumentCommands,
    },

    /// Grant a user or group a membership on a document or collection
    Grant {
        #[command(flatten)]
        target: GrantTarget,

        /// read, read_write or admin
        #[arg(long)]
        permission: String,
    },

    /// Remove a direct membership
    Revoke {
        #[command(flatten)]
        target: GrantTarget,
    },

    /// Show what a user may do with a target
    Abilities {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: Option<String>,

        #[arg(long)]
        collection: Option<String>,

        #[arg(long)]
        group: Option<String>,

        #[arg(long)]
        user: Option<String>,
    },
}

fn run_init(data_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;

    let config = Config::load(data_dir)?;
    if !data_dir.join(CONFIG_FILE).exists() {
        config.save()?;
    }

    let db_path = config.db_path();
    if db_path.exists() {
        bail!("Already initialized. Database exists at: {}", db_path.display());
    }

    let store = SqliteStore::open(&config)?;
    store.initialize()?;

    info!(path = %db_path.display(), "initialized database");
    println!("Initialized folio in {}", data_dir.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_filter = Config::load(&cli.data_dir)
        .map(|config| config.log_filter)
        .unwrap_or_else(|_| folio::config::DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_filter.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let data_dir = cli.data_dir.as_path();

    match cli.command {
        Commands::Init => run_init(data_dir)?,
        Commands::Team { command } => match command {
            TeamCommands::Create {
                name,
                no_sharing,
                member_collection_create,
            } => folio::cli::run_team_create(data_dir, name, no_sharing, member_collection_create)?,
        },
        Commands::User { command } => match command {
            UserCommands::Create {
                team,
                name,
                email,
                role,
            } => folio::cli::run_user_create(data_dir, team, name, email, role)?,
        },
        Commands::Group { command } => match command {
            GroupCommands::Create { actor, name } => {
                folio::cli::run_group_create(data_dir, actor, name)?;
            }
            GroupCommands::AddUser { actor, group, user } => {
                folio::cli::run_group_add_user(data_dir, actor, group, user)?;
            }
        },
        Commands::Collection { command } => match command {
            CollectionCommands::Create {
                actor,
                name,
                permission,
                no_sharing,
            } => folio::cli::run_collection_create(data_dir, actor, name, permission, no_sharing)?,
            CollectionCommands::Tree {
                actor,
                collection,
                json,
            } => folio::cli::run_collection_tree(data_dir, actor, collection, json)?,
            CollectionCommands::Verify { collection, json } => {
                folio::cli::run_collection_verify(data_dir, collection, json)?;
            }
        },
        Commands::Document { command } => match command {
            DocumentCommands::Create {
                actor,
                title,
                text,
                collection,
                parent,
                publish,
                template,
                index,
            } => folio::cli::run_document_create(
                data_dir, actor, title, text, collection, parent, publish, template, index,
            )?,
            DocumentCommands::Publish {
                actor,
                document,
                collection,
                index,
            } => folio::cli::run_document_publish(data_dir, actor, document, collection, index)?,
            DocumentCommands::Move {
                actor,
                document,
                collection,
                parent,
                index,
                detach,
                json,
            } => folio::cli::run_document_move(
                data_dir, actor, document, collection, parent, index, detach, json,
            )?,
            DocumentCommands::Duplicate {
                actor,
                document,
                collection,
                parent,
                title,
                publish,
                draft,
                recursive,
            } => {
                let publish = match (publish, draft) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                folio::cli::run_document_duplicate(
                    data_dir, actor, document, collection, parent, title, publish, recursive,
                )?;
            }
            DocumentCommands::Archive { actor, document } => {
                folio::cli::run_document_archive(data_dir, actor, document)?;
            }
            DocumentCommands::Restore { actor, document } => {
                folio::cli::run_document_restore(data_dir, actor, document)?;
            }
            DocumentCommands::Delete { actor, document } => {
                folio::cli::run_document_delete(data_dir, actor, document)?;
            }
        },
        Commands::Grant { target, permission } => {
            folio::cli::run_grant(data_dir, target, permission)?;
        }
        Commands::Revoke { target } => folio::cli::run_revoke(data_dir, target)?,
        Commands::Abilities {
            actor,
            document,
            collection,
            group,
            user,
        } => folio::cli::run_abilities(data_dir, actor, document, collection, group, user)?,
    }

    Ok(())
}
