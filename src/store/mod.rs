mod membership;
mod queries;
mod schema;
mod sqlite;
mod transaction;

pub use membership::MembershipRecord;
pub use sqlite::SqliteStore;
pub use transaction::Transaction;

use crate::error::Result;
use crate::membership::Grants;
use crate::types::*;

/// Store defines the database interface.
///
/// These methods each run on their own; structural mutations go through
/// [`SqliteStore::transaction`] instead. Calling a `Store` method from inside
/// a transaction closure blocks on the connection lock.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Team operations
    fn create_team(&self, team: &Team) -> Result<()>;
    fn get_team(&self, id: &str) -> Result<Option<Team>>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn update_user(&self, user: &User) -> Result<()>;

    // Group operations
    fn create_group(&self, group: &Group) -> Result<()>;
    fn get_group(&self, id: &str) -> Result<Option<Group>>;
    fn add_group_user(&self, group_user: &GroupUser) -> Result<()>;
    fn remove_group_user(&self, group_id: &str, user_id: &str) -> Result<bool>;
    fn list_user_group_ids(&self, user_id: &str) -> Result<Vec<String>>;

    // Collection operations (soft-deleted collections are never returned)
    fn create_collection(&self, collection: &Collection) -> Result<()>;
    fn get_collection(&self, id: &str) -> Result<Option<Collection>>;
    fn list_collections(&self, team_id: &str) -> Result<Vec<Collection>>;
    fn update_collection(&self, collection: &Collection) -> Result<()>;
    fn delete_collection(&self, id: &str) -> Result<bool>;

    // Document operations
    fn get_document(&self, id: &str) -> Result<Option<Document>>;
    fn get_document_with_deleted(&self, id: &str) -> Result<Option<Document>>;
    fn list_child_documents(&self, parent_id: &str) -> Result<Vec<Document>>;
    fn list_collection_documents(
        &self,
        collection_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<Document>>;

    // Pin operations
    fn create_pin(&self, pin: &Pin) -> Result<()>;
    fn list_document_pins(&self, document_id: &str) -> Result<Vec<Pin>>;

    // Membership operations
    fn list_document_user_memberships(&self, document_id: &str) -> Result<Vec<UserMembership>>;
    fn list_document_group_memberships(&self, document_id: &str)
    -> Result<Vec<GroupMembership>>;
    /// Every membership that applies to a user: their own and those of
    /// each group they belong to.
    fn load_grants(&self, user_id: &str) -> Result<Grants>;

    // Event operations
    fn list_document_events(&self, document_id: &str) -> Result<Vec<Event>>;

    fn close(&self) -> Result<()>;
}
