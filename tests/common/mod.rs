#![allow(dead_code)]

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use folio::commands::{Context, CreateDocument, document_creator};
use folio::membership::Grants;
use folio::policy::Actor;
use folio::store::{SqliteStore, Store};
use folio::structure::DocumentStructure;
use folio::types::{Collection, CollectionPermission, Document, Team, User, UserRole};

/// A fresh database with one team and an admin, a member and a viewer.
pub struct Fixture {
    _temp: TempDir,
    pub store: SqliteStore,
    pub team: Team,
    pub admin: User,
    pub member: User,
    pub viewer: User,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let store = SqliteStore::new(temp.path().join("folio.db")).expect("failed to open store");
        store.initialize().expect("failed to initialize store");

        let team = Team {
            id: Uuid::new_v4().to_string(),
            name: "Acme".to_string(),
            sharing: true,
            member_collection_create: true,
            created_at: Utc::now(),
        };
        store.create_team(&team).expect("failed to create team");

        let admin = create_user(&store, &team, "Ada", UserRole::Admin);
        let member = create_user(&store, &team, "Grace", UserRole::Member);
        let viewer = create_user(&store, &team, "Linus", UserRole::Viewer);

        Self {
            _temp: temp,
            store,
            team,
            admin,
            member,
            viewer,
        }
    }

    pub fn user(&self, name: &str, role: UserRole) -> User {
        create_user(&self.store, &self.team, name, role)
    }

    /// Creates a second team with one admin, for cross-team checks.
    pub fn other_team(&self) -> (Team, User) {
        let team = Team {
            id: Uuid::new_v4().to_string(),
            name: "Globex".to_string(),
            sharing: true,
            member_collection_create: true,
            created_at: Utc::now(),
        };
        self.store.create_team(&team).expect("failed to create team");

        let user = create_user(&self.store, &team, "Hank", UserRole::Admin);
        (team, user)
    }

    pub fn collection_for(
        &self,
        team: &Team,
        name: &str,
        permission: Option<CollectionPermission>,
    ) -> Collection {
        let now = Utc::now();
        let collection = Collection {
            id: Uuid::new_v4().to_string(),
            team_id: team.id.clone(),
            name: name.to_string(),
            description: None,
            icon: None,
            color: None,
            permission,
            sharing: true,
            document_structure: DocumentStructure::new(),
            created_by_id: None,
            created_at: now,
            updated_at: now,
            archived_at: None,
            deleted_at: None,
        };
        self.store
            .create_collection(&collection)
            .expect("failed to create collection");
        collection
    }

    pub fn collection(&self, name: &str, permission: Option<CollectionPermission>) -> Collection {
        self.collection_for(&self.team, name, permission)
    }

    pub fn create(&self, user: &User, params: CreateDocument) -> Document {
        self.store
            .transaction(|tx| document_creator(tx, &Context::new(user), params))
            .expect("failed to create document")
    }

    /// Publishes a document at the end of `parent`'s children, or at root.
    pub fn publish(
        &self,
        collection: &Collection,
        parent: Option<&Document>,
        title: &str,
    ) -> Document {
        self.create(
            &self.admin,
            CreateDocument {
                title: title.to_string(),
                text: format!("{title} body"),
                collection_id: Some(collection.id.clone()),
                parent_document_id: parent.map(|p| p.id.clone()),
                publish: true,
                ..CreateDocument::default()
            },
        )
    }

    pub fn draft(&self, user: &User, collection: Option<&Collection>, title: &str) -> Document {
        self.create(
            user,
            CreateDocument {
                title: title.to_string(),
                collection_id: collection.map(|c| c.id.clone()),
                ..CreateDocument::default()
            },
        )
    }

    pub fn reload_collection(&self, id: &str) -> Collection {
        self.store
            .get_collection(id)
            .expect("failed to load collection")
            .expect("collection missing")
    }

    pub fn reload_document(&self, id: &str) -> Document {
        self.store
            .get_document_with_deleted(id)
            .expect("failed to load document")
            .expect("document missing")
    }

    pub fn root_ids(&self, collection_id: &str) -> Vec<String> {
        self.reload_collection(collection_id)
            .document_structure
            .nodes()
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }

    /// Panics when the collection tree disagrees with its document rows.
    pub fn assert_consistent(&self, collection_id: &str) {
        let collection = self.reload_collection(collection_id);
        let mut documents = self
            .store
            .list_collection_documents(collection_id, true)
            .expect("failed to list documents");
        for id in collection.document_structure.ids() {
            if !documents.iter().any(|d| d.id == id) {
                if let Some(document) = self.store.get_document_with_deleted(&id).unwrap() {
                    documents.push(document);
                }
            }
        }
        let problems = collection
            .document_structure
            .check_consistency(collection_id, &documents);
        assert!(problems.is_empty(), "inconsistent collection: {problems:?}");
    }

    pub fn grants(&self, user: &User) -> Grants {
        self.store.load_grants(&user.id).expect("failed to load grants")
    }

    pub fn with_actor<T>(&self, user: &User, f: impl FnOnce(&Actor<'_>) -> T) -> T {
        let grants = self.grants(user);
        let actor = Actor::new(user, &self.team, &grants);
        f(&actor)
    }
}

fn create_user(store: &SqliteStore, team: &Team, name: &str, role: UserRole) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        team_id: team.id.clone(),
        name: name.to_string(),
        email: None,
        role,
        suspended_at: None,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).expect("failed to create user");
    user
}
