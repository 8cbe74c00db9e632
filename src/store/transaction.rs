use std::cell::RefCell;

use chrono::{DateTime, Utc};

use super::membership::{self, MembershipRecord};
use super::queries;
use crate::error::{Error, Result};
use crate::types::*;

/// A write transaction opened with `BEGIN IMMEDIATE`.
///
/// SQLite has no row-level `SELECT ... FOR UPDATE`; an immediate transaction
/// takes the database write lock before the first read, which gives every
/// collection loaded through [`Transaction::lock_collection`] the same
/// guarantee: no other writer can change it until this transaction ends.
/// Collections are still locked explicitly, in a fixed order, so the command
/// code states which rows it reads-to-modify.
pub struct Transaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
    locked: RefCell<Vec<String>>,
}

impl<'conn> Transaction<'conn> {
    pub(super) fn new(tx: rusqlite::Transaction<'conn>) -> Self {
        Self {
            tx,
            locked: RefCell::new(Vec::new()),
        }
    }

    pub(super) fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    pub(super) fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }

    // Collections

    /// Loads a collection for modification and records the lock.
    pub fn lock_collection(&self, id: &str) -> Result<Collection> {
        let collection =
            queries::get_collection(&self.tx, id)?.ok_or(Error::NotFound("collection"))?;

        let mut locked = self.locked.borrow_mut();
        if !locked.iter().any(|locked_id| locked_id == id) {
            tracing::debug!(collection_id = %id, order = locked.len(), "locked collection");
            locked.push(id.to_string());
        }
        Ok(collection)
    }

    /// Ids of the collections locked so far, in acquisition order.
    #[must_use]
    pub fn locked_collections(&self) -> Vec<String> {
        self.locked.borrow().clone()
    }

    /// Persists a collection's tree. The collection must have been locked in
    /// this transaction first.
    pub fn save_structure(&self, collection: &Collection) -> Result<()> {
        if !self.locked.borrow().iter().any(|id| *id == collection.id) {
            return Err(Error::InvariantViolation(format!(
                "collection {} saved without being locked",
                collection.id
            )));
        }
        queries::update_collection_structure(
            &self.tx,
            &collection.id,
            &collection.document_structure,
        )
    }

    /// Reads a collection without locking it.
    pub fn collection(&self, id: &str) -> Result<Option<Collection>> {
        queries::get_collection(&self.tx, id)
    }

    pub fn team(&self, id: &str) -> Result<Option<Team>> {
        queries::get_team(&self.tx, id)
    }

    pub fn user(&self, id: &str) -> Result<Option<User>> {
        queries::get_user(&self.tx, id)
    }

    pub fn group(&self, id: &str) -> Result<Option<Group>> {
        queries::get_group(&self.tx, id)
    }

    // Documents

    pub fn document(&self, id: &str) -> Result<Option<Document>> {
        queries::get_document(&self.tx, id, false)
    }

    pub fn document_with_deleted(&self, id: &str) -> Result<Option<Document>> {
        queries::get_document(&self.tx, id, true)
    }

    pub fn insert_document(&self, document: &Document) -> Result<()> {
        queries::insert_document(&self.tx, document)
    }

    pub fn update_document(&self, document: &Document) -> Result<()> {
        queries::update_document(&self.tx, document)
    }

    pub fn child_documents(&self, parent_id: &str) -> Result<Vec<Document>> {
        queries::list_child_documents(&self.tx, parent_id, false)
    }

    pub fn child_documents_with_deleted(&self, parent_id: &str) -> Result<Vec<Document>> {
        queries::list_child_documents(&self.tx, parent_id, true)
    }

    pub fn collection_documents(
        &self,
        collection_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<Document>> {
        queries::list_collection_documents(&self.tx, collection_id, include_deleted)
    }

    pub fn set_documents_collection(
        &self,
        ids: &[String],
        collection_id: Option<&str>,
    ) -> Result<usize> {
        queries::update_documents_collection(&self.tx, ids, collection_id)
    }

    pub fn set_documents_parent(&self, ids: &[String], parent_id: Option<&str>) -> Result<usize> {
        queries::update_documents_parent(&self.tx, ids, parent_id)
    }

    pub fn set_documents_archived_at(
        &self,
        ids: &[String],
        archived_at: Option<&DateTime<Utc>>,
    ) -> Result<usize> {
        queries::update_documents_archived_at(&self.tx, ids, archived_at)
    }

    pub fn set_documents_deleted_at(
        &self,
        ids: &[String],
        deleted_at: Option<&DateTime<Utc>>,
    ) -> Result<usize> {
        queries::update_documents_deleted_at(&self.tx, ids, deleted_at)
    }

    // Pins

    /// Deletes pins of a document that point at the given collection.
    pub fn delete_collection_pins(&self, document_id: &str, collection_id: &str) -> Result<usize> {
        queries::delete_collection_pins(&self.tx, document_id, collection_id)
    }

    // Events

    pub fn insert_event(&self, event: &Event) -> Result<()> {
        queries::insert_event(&self.tx, event)
    }

    // Memberships

    pub fn insert_membership<M: MembershipRecord>(&self, m: &M) -> Result<()> {
        membership::insert_membership(&self.tx, m)
    }

    pub fn membership<M: MembershipRecord>(&self, id: &str) -> Result<Option<M>> {
        membership::get_membership(&self.tx, id)
    }

    pub fn direct_document_membership<M: MembershipRecord>(
        &self,
        subject_id: &str,
        document_id: &str,
    ) -> Result<Option<M>> {
        membership::find_direct_document_membership(&self.tx, subject_id, document_id)
    }

    pub fn collection_membership<M: MembershipRecord>(
        &self,
        subject_id: &str,
        collection_id: &str,
    ) -> Result<Option<M>> {
        membership::find_collection_membership(&self.tx, subject_id, collection_id)
    }

    pub fn update_membership_permission<M: MembershipRecord>(
        &self,
        id: &str,
        permission: Permission,
    ) -> Result<()> {
        membership::update_membership_permission::<M>(&self.tx, id, permission)
    }

    pub fn delete_membership<M: MembershipRecord>(&self, id: &str) -> Result<bool> {
        membership::delete_membership::<M>(&self.tx, id)
    }

    pub fn delete_sourced_memberships<M: MembershipRecord>(
        &self,
        source_id: &str,
    ) -> Result<usize> {
        membership::delete_sourced_memberships::<M>(&self.tx, source_id)
    }

    pub fn document_memberships<M: MembershipRecord>(&self, document_id: &str) -> Result<Vec<M>> {
        membership::list_document_memberships(&self.tx, document_id)
    }
}
