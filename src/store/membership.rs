use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use super::queries::{format_datetime, parse_column, parse_datetime, placeholders};
use crate::error::{Error, Result};
use crate::types::{GroupMembership, Permission, UserMembership};

/// Row shape shared by user and group memberships, so the SQL and the
/// sourced-membership recalculation are written once for both tables.
pub trait MembershipRecord: Sized + Clone {
    const TABLE: &'static str;
    const SUBJECT_COLUMN: &'static str;

    fn id(&self) -> &str;
    fn subject_id(&self) -> &str;
    fn collection_id(&self) -> Option<&str>;
    fn document_id(&self) -> Option<&str>;
    fn permission(&self) -> Permission;
    fn source_id(&self) -> Option<&str>;
    fn created_by_id(&self) -> &str;

    fn is_sourced(&self) -> bool {
        self.source_id().is_some()
    }

    /// A new row on `document_id` derived from this membership.
    fn sourced_for(&self, document_id: &str) -> Self;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

macro_rules! membership_record {
    ($ty:ty, $table:literal, $column:literal, $subject:ident) => {
        impl MembershipRecord for $ty {
            const TABLE: &'static str = $table;
            const SUBJECT_COLUMN: &'static str = $column;

            fn id(&self) -> &str {
                &self.id
            }

            fn subject_id(&self) -> &str {
                &self.$subject
            }

            fn collection_id(&self) -> Option<&str> {
                self.collection_id.as_deref()
            }

            fn document_id(&self) -> Option<&str> {
                self.document_id.as_deref()
            }

            fn permission(&self) -> Permission {
                self.permission
            }

            fn source_id(&self) -> Option<&str> {
                self.source_id.as_deref()
            }

            fn created_by_id(&self) -> &str {
                &self.created_by_id
            }

            fn sourced_for(&self, document_id: &str) -> Self {
                let now = Utc::now();
                Self {
                    id: Uuid::new_v4().to_string(),
                    $subject: self.$subject.clone(),
                    collection_id: None,
                    document_id: Some(document_id.to_string()),
                    permission: self.permission,
                    source_id: Some(self.id.clone()),
                    created_by_id: self.created_by_id.clone(),
                    created_at: now,
                    updated_at: now,
                }
            }

            fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                Ok(Self {
                    id: row.get(0)?,
                    $subject: row.get(1)?,
                    collection_id: row.get(2)?,
                    document_id: row.get(3)?,
                    permission: parse_column(4, &row.get::<_, String>(4)?, Permission::parse)?,
                    source_id: row.get(5)?,
                    created_by_id: row.get(6)?,
                    created_at: parse_datetime(&row.get::<_, String>(7)?),
                    updated_at: parse_datetime(&row.get::<_, String>(8)?),
                })
            }
        }
    };
}

membership_record!(UserMembership, "user_memberships", "user_id", user_id);
membership_record!(GroupMembership, "group_memberships", "group_id", group_id);

fn columns<M: MembershipRecord>() -> String {
    format!(
        "id, {}, collection_id, document_id, permission, source_id, created_by_id, \
         created_at, updated_at",
        M::SUBJECT_COLUMN
    )
}

fn query_memberships<M: MembershipRecord>(
    conn: &Connection,
    filter: &str,
    values: &[&str],
) -> Result<Vec<M>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {filter} ORDER BY created_at, id",
        columns::<M>(),
        M::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), M::from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

pub(super) fn insert_membership<M: MembershipRecord>(conn: &Connection, m: &M) -> Result<()> {
    let now = format_datetime(&Utc::now());
    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            M::TABLE,
            columns::<M>()
        ),
        params![
            m.id(),
            m.subject_id(),
            m.collection_id(),
            m.document_id(),
            m.permission().as_str(),
            m.source_id(),
            m.created_by_id(),
            now,
        ],
    )?;
    Ok(())
}

pub(super) fn get_membership<M: MembershipRecord>(
    conn: &Connection,
    id: &str,
) -> Result<Option<M>> {
    conn.query_row(
        &format!("SELECT {} FROM {} WHERE id = ?1", columns::<M>(), M::TABLE),
        params![id],
        M::from_row,
    )
    .optional()
    .map_err(Error::from)
}

/// The non-sourced membership of a subject on a document, if any.
pub(super) fn find_direct_document_membership<M: MembershipRecord>(
    conn: &Connection,
    subject_id: &str,
    document_id: &str,
) -> Result<Option<M>> {
    let filter = format!(
        "{} = ?1 AND document_id = ?2 AND source_id IS NULL",
        M::SUBJECT_COLUMN
    );
    Ok(query_memberships(conn, &filter, &[subject_id, document_id])?
        .into_iter()
        .next())
}

pub(super) fn find_collection_membership<M: MembershipRecord>(
    conn: &Connection,
    subject_id: &str,
    collection_id: &str,
) -> Result<Option<M>> {
    let filter = format!("{} = ?1 AND collection_id = ?2", M::SUBJECT_COLUMN);
    Ok(query_memberships(conn, &filter, &[subject_id, collection_id])?
        .into_iter()
        .next())
}

pub(super) fn update_membership_permission<M: MembershipRecord>(
    conn: &Connection,
    id: &str,
    permission: Permission,
) -> Result<()> {
    let rows = conn.execute(
        &format!(
            "UPDATE {} SET permission = ?1, updated_at = ?2 WHERE id = ?3",
            M::TABLE
        ),
        params![permission.as_str(), format_datetime(&Utc::now()), id],
    )?;

    if rows == 0 {
        return Err(Error::NotFound("membership"));
    }
    Ok(())
}

/// Deletes a membership; rows sourced from it cascade.
pub(super) fn delete_membership<M: MembershipRecord>(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", M::TABLE), params![id])?;
    Ok(rows > 0)
}

pub(super) fn delete_sourced_memberships<M: MembershipRecord>(
    conn: &Connection,
    source_id: &str,
) -> Result<usize> {
    Ok(conn.execute(
        &format!("DELETE FROM {} WHERE source_id = ?1", M::TABLE),
        params![source_id],
    )?)
}

/// Every membership on a document, direct and sourced.
pub(super) fn list_document_memberships<M: MembershipRecord>(
    conn: &Connection,
    document_id: &str,
) -> Result<Vec<M>> {
    query_memberships(conn, "document_id = ?1", &[document_id])
}

/// Every membership held by any of the given subjects.
pub(super) fn list_subject_memberships<M: MembershipRecord>(
    conn: &Connection,
    subject_ids: &[String],
) -> Result<Vec<M>> {
    if subject_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = format!(
        "{} IN ({})",
        M::SUBJECT_COLUMN,
        placeholders(1, subject_ids.len())
    );
    let values: Vec<&str> = subject_ids.iter().map(String::as_str).collect();
    query_memberships(conn, &filter, &values)
}
