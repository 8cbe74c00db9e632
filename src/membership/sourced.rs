//! Sourced memberships: copies of a document membership materialized on
//! every descendant of that document.
//!
//! Sourced rows are a derived index. They are never edited; whenever the tree
//! changes shape they are deleted and rebuilt from their root membership and
//! the current collection structure.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{MembershipRecord, Transaction};
use crate::types::{GroupMembership, Permission, UserMembership};

/// Rebuilds the sourced rows of one root membership.
///
/// Returns the number of rows written. A root on a document that is not in a
/// collection tree has no descendants and yields none.
pub fn recompute<M: MembershipRecord>(tx: &Transaction<'_>, root: &M) -> Result<usize> {
    if root.is_sourced() {
        return Err(Error::InvariantViolation(format!(
            "membership {} is sourced and cannot be recomputed as a root",
            root.id()
        )));
    }

    let removed = tx.delete_sourced_memberships::<M>(root.id())?;

    let Some(document_id) = root.document_id() else {
        return Ok(0);
    };
    let Some(document) = tx.document(document_id)? else {
        return Ok(0);
    };

    let descendants = match document.collection_id.as_deref() {
        Some(collection_id) => tx
            .collection(collection_id)?
            .map(|c| c.document_structure.collect_descendant_ids(&document.id))
            .unwrap_or_default(),
        None => Vec::new(),
    };

    for descendant_id in &descendants {
        tx.insert_membership(&root.sourced_for(descendant_id))?;
    }

    tracing::debug!(
        membership_id = %root.id(),
        table = M::TABLE,
        removed,
        created = descendants.len(),
        "recomputed sourced memberships"
    );
    Ok(descendants.len())
}

/// The root memberships whose sourced rows depend on a document's position:
/// memberships granted directly on it, plus the root of every sourced row
/// it carries (its ancestors' grants).
pub fn root_memberships_for_document<M: MembershipRecord>(
    tx: &Transaction<'_>,
    document_id: &str,
) -> Result<Vec<M>> {
    let mut roots = BTreeMap::new();

    for membership in tx.document_memberships::<M>(document_id)? {
        match membership.source_id() {
            None => {
                roots.insert(membership.id().to_string(), membership);
            }
            Some(source_id) => {
                if roots.contains_key(source_id) {
                    continue;
                }
                match tx.membership::<M>(source_id)? {
                    Some(root) => {
                        roots.insert(root.id().to_string(), root);
                    }
                    None => tracing::warn!(
                        membership_id = %membership.id(),
                        source_id,
                        "sourced membership has no root"
                    ),
                }
            }
        }
    }

    Ok(roots.into_values().collect())
}

/// Recomputes, once each, every root membership touching the given
/// documents, for both users and groups.
pub fn recalculate_for_documents(tx: &Transaction<'_>, document_ids: &[String]) -> Result<()> {
    recalculate::<UserMembership>(tx, document_ids)?;
    recalculate::<GroupMembership>(tx, document_ids)
}

fn recalculate<M: MembershipRecord>(tx: &Transaction<'_>, document_ids: &[String]) -> Result<()> {
    let mut roots = BTreeMap::new();
    for document_id in document_ids {
        for root in root_memberships_for_document::<M>(tx, document_id)? {
            roots.entry(root.id().to_string()).or_insert(root);
        }
    }

    for root in roots.values() {
        recompute(tx, root)?;
    }
    Ok(())
}

// Grants

/// Grants a user a permission on a document and everything below it.
/// An existing direct grant is updated in place.
pub fn grant_user_document(
    tx: &Transaction<'_>,
    user_id: &str,
    document_id: &str,
    permission: Permission,
    actor_id: &str,
) -> Result<UserMembership> {
    tx.document(document_id)?.ok_or(Error::NotFound("document"))?;

    let existing = tx.direct_document_membership::<UserMembership>(user_id, document_id)?;
    let membership = upsert(tx, existing, permission, || {
        let now = Utc::now();
        UserMembership {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            collection_id: None,
            document_id: Some(document_id.to_string()),
            permission,
            source_id: None,
            created_by_id: actor_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    })?;

    recompute(tx, &membership)?;
    Ok(membership)
}

pub fn grant_group_document(
    tx: &Transaction<'_>,
    group_id: &str,
    document_id: &str,
    permission: Permission,
    actor_id: &str,
) -> Result<GroupMembership> {
    tx.document(document_id)?.ok_or(Error::NotFound("document"))?;

    let existing = tx.direct_document_membership::<GroupMembership>(group_id, document_id)?;
    let membership = upsert(tx, existing, permission, || {
        let now = Utc::now();
        GroupMembership {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            collection_id: None,
            document_id: Some(document_id.to_string()),
            permission,
            source_id: None,
            created_by_id: actor_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    })?;

    recompute(tx, &membership)?;
    Ok(membership)
}

/// Grants a user a permission on a collection. Collection grants are not
/// sourced onto documents; they apply through the resolver.
pub fn grant_user_collection(
    tx: &Transaction<'_>,
    user_id: &str,
    collection_id: &str,
    permission: Permission,
    actor_id: &str,
) -> Result<UserMembership> {
    tx.collection(collection_id)?
        .ok_or(Error::NotFound("collection"))?;

    let existing = tx.collection_membership::<UserMembership>(user_id, collection_id)?;
    upsert(tx, existing, permission, || {
        let now = Utc::now();
        UserMembership {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            collection_id: Some(collection_id.to_string()),
            document_id: None,
            permission,
            source_id: None,
            created_by_id: actor_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    })
}

pub fn grant_group_collection(
    tx: &Transaction<'_>,
    group_id: &str,
    collection_id: &str,
    permission: Permission,
    actor_id: &str,
) -> Result<GroupMembership> {
    tx.collection(collection_id)?
        .ok_or(Error::NotFound("collection"))?;

    let existing = tx.collection_membership::<GroupMembership>(group_id, collection_id)?;
    upsert(tx, existing, permission, || {
        let now = Utc::now();
        GroupMembership {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            collection_id: Some(collection_id.to_string()),
            document_id: None,
            permission,
            source_id: None,
            created_by_id: actor_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    })
}

/// Removes a user's direct grant on a document; its sourced rows cascade.
pub fn revoke_user_document(
    tx: &Transaction<'_>,
    user_id: &str,
    document_id: &str,
) -> Result<bool> {
    match tx.direct_document_membership::<UserMembership>(user_id, document_id)? {
        Some(membership) => tx.delete_membership::<UserMembership>(&membership.id),
        None => Ok(false),
    }
}

pub fn revoke_group_document(
    tx: &Transaction<'_>,
    group_id: &str,
    document_id: &str,
) -> Result<bool> {
    match tx.direct_document_membership::<GroupMembership>(group_id, document_id)? {
        Some(membership) => tx.delete_membership::<GroupMembership>(&membership.id),
        None => Ok(false),
    }
}

pub fn revoke_user_collection(
    tx: &Transaction<'_>,
    user_id: &str,
    collection_id: &str,
) -> Result<bool> {
    match tx.collection_membership::<UserMembership>(user_id, collection_id)? {
        Some(membership) => tx.delete_membership::<UserMembership>(&membership.id),
        None => Ok(false),
    }
}

pub fn revoke_group_collection(
    tx: &Transaction<'_>,
    group_id: &str,
    collection_id: &str,
) -> Result<bool> {
    match tx.collection_membership::<GroupMembership>(group_id, collection_id)? {
        Some(membership) => tx.delete_membership::<GroupMembership>(&membership.id),
        None => Ok(false),
    }
}

fn upsert<M: MembershipRecord>(
    tx: &Transaction<'_>,
    existing: Option<M>,
    permission: Permission,
    create: impl FnOnce() -> M,
) -> Result<M> {
    match existing {
        Some(existing) => {
            if existing.permission() != permission {
                tx.update_membership_permission::<M>(existing.id(), permission)?;
            }
            tx.membership::<M>(existing.id())?
                .ok_or(Error::NotFound("membership"))
        }
        None => {
            let membership = create();
            tx.insert_membership(&membership)?;
            Ok(membership)
        }
    }
}
