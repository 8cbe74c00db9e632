use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum TeamCommands {
    /// Create a team
    Create {
        /// Team name
        #[arg(long)]
        name: String,

        /// Disable public sharing for the team
        #[arg(long)]
        no_sharing: bool,

        /// Let members (not only admins) create collections
        #[arg(long)]
        member_collection_create: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user in a team
    Create {
        /// Team ID
        #[arg(long)]
        team: String,

        /// Display name
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: Option<String>,

        /// Role: admin, member, viewer or guest
        #[arg(long, default_value = "member")]
        role: String,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a group
    Create {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        name: String,
    },

    /// Add a user to a group
    AddUser {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        group: String,

        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    /// Create a collection
    Create {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        name: String,

        /// Default access: none, read, read_write, admin, or private
        #[arg(long, default_value = "read_write")]
        permission: String,

        /// Disable public sharing for the collection
        #[arg(long)]
        no_sharing: bool,
    },

    /// Print a collection's document tree
    Tree {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        collection: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a collection's tree against its documents
    Verify {
        #[arg(long)]
        collection: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum DocumentCommands {
    /// Create a document
    Create {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        text: String,

        #[arg(long)]
        collection: Option<String>,

        /// Parent document ID
        #[arg(long)]
        parent: Option<String>,

        /// Publish into the collection tree right away
        #[arg(long)]
        publish: bool,

        #[arg(long, conflicts_with = "parent")]
        template: bool,

        /// Position among the parent's children
        #[arg(long)]
        index: Option<usize>,
    },

    /// Publish a draft
    Publish {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: String,

        /// Collection to publish into, when the draft has none
        #[arg(long)]
        collection: Option<String>,

        #[arg(long)]
        index: Option<usize>,
    },

    /// Move a document and its subtree
    Move {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: String,

        /// Target collection
        #[arg(long, required_unless_present = "detach")]
        collection: Option<String>,

        /// Target parent document
        #[arg(long, conflicts_with = "detach")]
        parent: Option<String>,

        #[arg(long)]
        index: Option<usize>,

        /// Detach the document to drafts
        #[arg(long, conflicts_with = "collection")]
        detach: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Duplicate a document
    Duplicate {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: String,

        /// Target collection (defaults to the source's)
        #[arg(long)]
        collection: Option<String>,

        #[arg(long)]
        parent: Option<String>,

        /// Title for the top-level copy
        #[arg(long)]
        title: Option<String>,

        /// Publish every copy
        #[arg(long, conflicts_with = "draft")]
        publish: bool,

        /// Leave every copy as a draft
        #[arg(long)]
        draft: bool,

        /// Include child documents
        #[arg(long, short)]
        recursive: bool,
    },

    /// Archive a document and its subtree
    Archive {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: String,
    },

    /// Restore a deleted or archived document
    Restore {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: String,
    },

    /// Delete a document and its subtree
    Delete {
        /// Acting user ID
        #[arg(long = "as")]
        actor: String,

        #[arg(long)]
        document: String,
    },
}

/// What a membership is granted on, and to whom.
#[derive(Args)]
pub struct GrantTarget {
    /// Acting user ID
    #[arg(long = "as")]
    pub actor: String,

    /// User receiving the membership
    #[arg(long, conflicts_with = "group", required_unless_present = "group")]
    pub user: Option<String>,

    /// Group receiving the membership
    #[arg(long)]
    pub group: Option<String>,

    #[arg(long, conflicts_with = "collection", required_unless_present = "collection")]
    pub document: Option<String>,

    #[arg(long)]
    pub collection: Option<String>,
}
