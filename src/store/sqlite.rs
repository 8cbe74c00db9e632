use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};

use super::membership::list_subject_memberships;
use super::schema::SCHEMA;
use super::{Store, Transaction, membership, queries};
use crate::config::{Config, DEFAULT_BUSY_TIMEOUT_MS};
use crate::error::Result;
use crate::membership::Grants;
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_busy_timeout(db_path, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
    }

    /// Opens the database named by the configuration.
    pub fn open(config: &Config) -> Result<Self> {
        Self::with_busy_timeout(config.db_path(), config.busy_timeout())
    }

    fn with_busy_timeout<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(busy_timeout)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write made
    /// through the [`Transaction`], so a failed command leaves collections
    /// and documents exactly as they were.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn();
        let tx = Transaction::new(conn.transaction_with_behavior(TransactionBehavior::Immediate)?);

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "rolling back transaction");
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Team operations

    fn create_team(&self, team: &Team) -> Result<()> {
        queries::insert_team(&self.conn(), team)
    }

    fn get_team(&self, id: &str) -> Result<Option<Team>> {
        queries::get_team(&self.conn(), id)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        queries::insert_user(&self.conn(), user)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        queries::get_user(&self.conn(), id)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        queries::update_user(&self.conn(), user)
    }

    // Group operations

    fn create_group(&self, group: &Group) -> Result<()> {
        queries::insert_group(&self.conn(), group)
    }

    fn get_group(&self, id: &str) -> Result<Option<Group>> {
        queries::get_group(&self.conn(), id)
    }

    fn add_group_user(&self, group_user: &GroupUser) -> Result<()> {
        queries::insert_group_user(&self.conn(), group_user)
    }

    fn remove_group_user(&self, group_id: &str, user_id: &str) -> Result<bool> {
        queries::delete_group_user(&self.conn(), group_id, user_id)
    }

    fn list_user_group_ids(&self, user_id: &str) -> Result<Vec<String>> {
        queries::list_user_group_ids(&self.conn(), user_id)
    }

    // Collection operations

    fn create_collection(&self, collection: &Collection) -> Result<()> {
        queries::insert_collection(&self.conn(), collection)
    }

    fn get_collection(&self, id: &str) -> Result<Option<Collection>> {
        queries::get_collection(&self.conn(), id)
    }

    fn list_collections(&self, team_id: &str) -> Result<Vec<Collection>> {
        queries::list_collections(&self.conn(), team_id)
    }

    fn update_collection(&self, collection: &Collection) -> Result<()> {
        queries::update_collection(&self.conn(), collection)
    }

    fn delete_collection(&self, id: &str) -> Result<bool> {
        queries::soft_delete_collection(&self.conn(), id)
    }

    // Document operations

    fn get_document(&self, id: &str) -> Result<Option<Document>> {
        queries::get_document(&self.conn(), id, false)
    }

    fn get_document_with_deleted(&self, id: &str) -> Result<Option<Document>> {
        queries::get_document(&self.conn(), id, true)
    }

    fn list_child_documents(&self, parent_id: &str) -> Result<Vec<Document>> {
        queries::list_child_documents(&self.conn(), parent_id, false)
    }

    fn list_collection_documents(
        &self,
        collection_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<Document>> {
        queries::list_collection_documents(&self.conn(), collection_id, include_deleted)
    }

    // Pin operations

    fn create_pin(&self, pin: &Pin) -> Result<()> {
        queries::insert_pin(&self.conn(), pin)
    }

    fn list_document_pins(&self, document_id: &str) -> Result<Vec<Pin>> {
        queries::list_document_pins(&self.conn(), document_id)
    }

    // Membership operations

    fn list_document_user_memberships(&self, document_id: &str) -> Result<Vec<UserMembership>> {
        membership::list_document_memberships(&self.conn(), document_id)
    }

    fn list_document_group_memberships(
        &self,
        document_id: &str,
    ) -> Result<Vec<GroupMembership>> {
        membership::list_document_memberships(&self.conn(), document_id)
    }

    fn load_grants(&self, user_id: &str) -> Result<Grants> {
        let conn = self.conn();
        let group_ids = queries::list_user_group_ids(&conn, user_id)?;

        Ok(Grants {
            user_memberships: list_subject_memberships(&conn, &[user_id.to_string()])?,
            group_memberships: list_subject_memberships(&conn, &group_ids)?,
            group_ids,
        })
    }

    // Event operations

    fn list_document_events(&self, document_id: &str) -> Result<Vec<Event>> {
        queries::list_document_events(&self.conn(), document_id)
    }

    fn close(&self) -> Result<()> {
        // Connection closes when dropped
        Ok(())
    }
}
