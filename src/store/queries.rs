//! SQL shared by [`SqliteStore`](super::SqliteStore) and
//! [`Transaction`](super::Transaction). Every function takes a plain
//! connection so it runs the same inside or outside a transaction.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::error::{Error, Result};
use crate::structure::DocumentStructure;
use crate::types::*;

pub(super) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

pub(super) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(parse_datetime(&row.get::<_, String>(idx)?))
}

fn opt_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row.get::<_, Option<String>>(idx)?.map(|s| parse_datetime(&s)))
}

pub(super) fn parse_column<T>(
    idx: usize,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid value '{value}'").into(),
        )
    })
}

fn json_column<T: serde::de::DeserializeOwned>(idx: usize, value: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// "?N, ?N+1, ..." for `count` parameters starting at `start`.
pub(super) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// Teams

pub(super) fn insert_team(conn: &Connection, team: &Team) -> Result<()> {
    conn.execute(
        "INSERT INTO teams (id, name, sharing, member_collection_create, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            team.id,
            team.name,
            team.sharing,
            team.member_collection_create,
            format_datetime(&team.created_at),
        ],
    )?;
    Ok(())
}

pub(super) fn get_team(conn: &Connection, id: &str) -> Result<Option<Team>> {
    conn.query_row(
        "SELECT id, name, sharing, member_collection_create, created_at FROM teams WHERE id = ?1",
        params![id],
        |row| {
            Ok(Team {
                id: row.get(0)?,
                name: row.get(1)?,
                sharing: row.get(2)?,
                member_collection_create: row.get(3)?,
                created_at: datetime(row, 4)?,
            })
        },
    )
    .optional()
    .map_err(Error::from)
}

// Users

const USER_COLUMNS: &str =
    "id, team_id, name, email, role, suspended_at, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: parse_column(4, &row.get::<_, String>(4)?, UserRole::parse)?,
        suspended_at: opt_datetime(row, 5)?,
        created_at: datetime(row, 6)?,
        updated_at: datetime(row, 7)?,
    })
}

pub(super) fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, team_id, name, email, role, suspended_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.team_id,
            user.name,
            user.email,
            user.role.as_str(),
            user.suspended_at.as_ref().map(format_datetime),
            format_datetime(&user.created_at),
            format_datetime(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub(super) fn get_user(conn: &Connection, id: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

pub(super) fn update_user(conn: &Connection, user: &User) -> Result<()> {
    let rows = conn.execute(
        "UPDATE users SET name = ?1, email = ?2, role = ?3, suspended_at = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            user.name,
            user.email,
            user.role.as_str(),
            user.suspended_at.as_ref().map(format_datetime),
            format_datetime(&Utc::now()),
            user.id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound("user"));
    }
    Ok(())
}

// Groups

pub(super) fn insert_group(conn: &Connection, group: &Group) -> Result<()> {
    conn.execute(
        "INSERT INTO groups (id, team_id, name, created_by_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            group.id,
            group.team_id,
            group.name,
            group.created_by_id,
            format_datetime(&group.created_at),
        ],
    )?;
    Ok(())
}

pub(super) fn get_group(conn: &Connection, id: &str) -> Result<Option<Group>> {
    conn.query_row(
        "SELECT id, team_id, name, created_by_id, created_at FROM groups WHERE id = ?1",
        params![id],
        |row| {
            Ok(Group {
                id: row.get(0)?,
                team_id: row.get(1)?,
                name: row.get(2)?,
                created_by_id: row.get(3)?,
                created_at: datetime(row, 4)?,
            })
        },
    )
    .optional()
    .map_err(Error::from)
}

pub(super) fn insert_group_user(conn: &Connection, group_user: &GroupUser) -> Result<()> {
    conn.execute(
        "INSERT INTO group_users (group_id, user_id, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (group_id, user_id) DO NOTHING",
        params![
            group_user.group_id,
            group_user.user_id,
            format_datetime(&group_user.created_at),
        ],
    )?;
    Ok(())
}

pub(super) fn delete_group_user(conn: &Connection, group_id: &str, user_id: &str) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM group_users WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )?;
    Ok(rows > 0)
}

pub(super) fn list_user_group_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT group_id FROM group_users WHERE user_id = ?1 ORDER BY group_id")?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

// Collections

const COLLECTION_COLUMNS: &str = "id, team_id, name, description, icon, color, permission, sharing,
     document_structure, created_by_id, created_at, updated_at, archived_at, deleted_at";

fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<Collection> {
    let permission = match row.get::<_, Option<String>>(6)? {
        Some(value) => Some(parse_column(6, &value, CollectionPermission::parse)?),
        None => None,
    };
    let document_structure = match row.get::<_, Option<String>>(8)? {
        Some(value) => json_column::<DocumentStructure>(8, &value)?,
        None => DocumentStructure::new(),
    };

    Ok(Collection {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        color: row.get(5)?,
        permission,
        sharing: row.get(7)?,
        document_structure,
        created_by_id: row.get(9)?,
        created_at: datetime(row, 10)?,
        updated_at: datetime(row, 11)?,
        archived_at: opt_datetime(row, 12)?,
        deleted_at: opt_datetime(row, 13)?,
    })
}

pub(super) fn insert_collection(conn: &Connection, collection: &Collection) -> Result<()> {
    let structure = serde_json::to_string(&collection.document_structure)?;
    conn.execute(
        "INSERT INTO collections (id, team_id, name, description, icon, color, permission, sharing,
             document_structure, created_by_id, created_at, updated_at, archived_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            collection.id,
            collection.team_id,
            collection.name,
            collection.description,
            collection.icon,
            collection.color,
            collection.permission.map(CollectionPermission::as_str),
            collection.sharing,
            structure,
            collection.created_by_id,
            format_datetime(&collection.created_at),
            format_datetime(&collection.updated_at),
            collection.archived_at.as_ref().map(format_datetime),
            collection.deleted_at.as_ref().map(format_datetime),
        ],
    )?;
    Ok(())
}

/// Returns a collection unless it has been soft-deleted.
pub(super) fn get_collection(conn: &Connection, id: &str) -> Result<Option<Collection>> {
    conn.query_row(
        &format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections
             WHERE id = ?1 AND deleted_at IS NULL"
        ),
        params![id],
        collection_from_row,
    )
    .optional()
    .map_err(Error::from)
}

pub(super) fn list_collections(conn: &Connection, team_id: &str) -> Result<Vec<Collection>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLLECTION_COLUMNS} FROM collections
         WHERE team_id = ?1 AND deleted_at IS NULL ORDER BY name, id"
    ))?;
    let rows = stmt.query_map(params![team_id], collection_from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

pub(super) fn update_collection_structure(
    conn: &Connection,
    id: &str,
    structure: &DocumentStructure,
) -> Result<()> {
    let rows = conn.execute(
        "UPDATE collections SET document_structure = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            serde_json::to_string(structure)?,
            format_datetime(&Utc::now()),
            id
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound("collection"));
    }
    Ok(())
}

pub(super) fn update_collection(conn: &Connection, collection: &Collection) -> Result<()> {
    let rows = conn.execute(
        "UPDATE collections SET name = ?1, description = ?2, icon = ?3, color = ?4,
             permission = ?5, sharing = ?6, updated_at = ?7
         WHERE id = ?8 AND deleted_at IS NULL",
        params![
            collection.name,
            collection.description,
            collection.icon,
            collection.color,
            collection.permission.map(CollectionPermission::as_str),
            collection.sharing,
            format_datetime(&Utc::now()),
            collection.id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound("collection"));
    }
    Ok(())
}

pub(super) fn soft_delete_collection(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE collections SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        params![format_datetime(&Utc::now()), id],
    )?;
    Ok(rows > 0)
}

// Documents

const DOCUMENT_COLUMNS: &str = "id, url_id, team_id, collection_id, parent_document_id, title,
     text, content, icon, color, template, created_by_id, last_modified_by_id, published_at,
     archived_at, deleted_at, created_at, updated_at";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let content = match row.get::<_, Option<String>>(7)? {
        Some(value) => Some(json_column(7, &value)?),
        None => None,
    };

    Ok(Document {
        id: row.get(0)?,
        url_id: row.get(1)?,
        team_id: row.get(2)?,
        collection_id: row.get(3)?,
        parent_document_id: row.get(4)?,
        title: row.get(5)?,
        text: row.get(6)?,
        content,
        icon: row.get(8)?,
        color: row.get(9)?,
        template: row.get(10)?,
        created_by_id: row.get(11)?,
        last_modified_by_id: row.get(12)?,
        published_at: opt_datetime(row, 13)?,
        archived_at: opt_datetime(row, 14)?,
        deleted_at: opt_datetime(row, 15)?,
        created_at: datetime(row, 16)?,
        updated_at: datetime(row, 17)?,
    })
}

pub(super) fn insert_document(conn: &Connection, document: &Document) -> Result<()> {
    let content = document
        .content
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO documents (id, url_id, team_id, collection_id, parent_document_id, title,
             text, content, icon, color, template, created_by_id, last_modified_by_id,
             published_at, archived_at, deleted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            document.id,
            document.url_id,
            document.team_id,
            document.collection_id,
            document.parent_document_id,
            document.title,
            document.text,
            content,
            document.icon,
            document.color,
            document.template,
            document.created_by_id,
            document.last_modified_by_id,
            document.published_at.as_ref().map(format_datetime),
            document.archived_at.as_ref().map(format_datetime),
            document.deleted_at.as_ref().map(format_datetime),
            format_datetime(&document.created_at),
            format_datetime(&document.updated_at),
        ],
    )?;
    Ok(())
}

/// Fetches a document. Soft-deleted rows are only returned when
/// `include_deleted` is set.
pub(super) fn get_document(
    conn: &Connection,
    id: &str,
    include_deleted: bool,
) -> Result<Option<Document>> {
    let sql = if include_deleted {
        format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1")
    } else {
        format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1 AND deleted_at IS NULL")
    };
    conn.query_row(&sql, params![id], document_from_row)
        .optional()
        .map_err(Error::from)
}

/// Direct children of a document, oldest first. Soft-deleted children are
/// only returned when `include_deleted` is set.
pub(super) fn list_child_documents(
    conn: &Connection,
    parent_id: &str,
    include_deleted: bool,
) -> Result<Vec<Document>> {
    let filter = if include_deleted {
        ""
    } else {
        " AND deleted_at IS NULL"
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE parent_document_id = ?1{filter} ORDER BY created_at, id"
    ))?;
    let rows = stmt.query_map(params![parent_id], document_from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Every document of a collection, including soft-deleted ones when asked.
pub(super) fn list_collection_documents(
    conn: &Connection,
    collection_id: &str,
    include_deleted: bool,
) -> Result<Vec<Document>> {
    let filter = if include_deleted {
        ""
    } else {
        " AND deleted_at IS NULL"
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE collection_id = ?1{filter} ORDER BY created_at, id"
    ))?;
    let rows = stmt.query_map(params![collection_id], document_from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Writes every mutable column of a document row.
pub(super) fn update_document(conn: &Connection, document: &Document) -> Result<()> {
    let content = document
        .content
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let rows = conn.execute(
        "UPDATE documents SET collection_id = ?1, parent_document_id = ?2, title = ?3, text = ?4,
             content = ?5, icon = ?6, color = ?7, template = ?8, last_modified_by_id = ?9,
             published_at = ?10, archived_at = ?11, deleted_at = ?12, updated_at = ?13
         WHERE id = ?14",
        params![
            document.collection_id,
            document.parent_document_id,
            document.title,
            document.text,
            content,
            document.icon,
            document.color,
            document.template,
            document.last_modified_by_id,
            document.published_at.as_ref().map(format_datetime),
            document.archived_at.as_ref().map(format_datetime),
            document.deleted_at.as_ref().map(format_datetime),
            format_datetime(&document.updated_at),
            document.id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound("document"));
    }
    Ok(())
}

/// Sets one nullable text column on many documents in a single statement.
fn update_documents_column(
    conn: &Connection,
    column: &str,
    ids: &[String],
    value: Option<&str>,
) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "UPDATE documents SET {column} = ?1, updated_at = ?2 WHERE id IN ({})",
        placeholders(3, ids.len())
    );
    let now = format_datetime(&Utc::now());
    let mut values: Vec<Option<&str>> = vec![value, Some(now.as_str())];
    values.extend(ids.iter().map(|id| Some(id.as_str())));

    Ok(conn.execute(&sql, params_from_iter(values))?)
}

pub(super) fn update_documents_collection(
    conn: &Connection,
    ids: &[String],
    collection_id: Option<&str>,
) -> Result<usize> {
    update_documents_column(conn, "collection_id", ids, collection_id)
}

pub(super) fn update_documents_parent(
    conn: &Connection,
    ids: &[String],
    parent_document_id: Option<&str>,
) -> Result<usize> {
    update_documents_column(conn, "parent_document_id", ids, parent_document_id)
}

pub(super) fn update_documents_archived_at(
    conn: &Connection,
    ids: &[String],
    archived_at: Option<&DateTime<Utc>>,
) -> Result<usize> {
    let value = archived_at.map(format_datetime);
    update_documents_column(conn, "archived_at", ids, value.as_deref())
}

pub(super) fn update_documents_deleted_at(
    conn: &Connection,
    ids: &[String],
    deleted_at: Option<&DateTime<Utc>>,
) -> Result<usize> {
    let value = deleted_at.map(format_datetime);
    update_documents_column(conn, "deleted_at", ids, value.as_deref())
}

// Pins

fn pin_from_row(row: &Row<'_>) -> rusqlite::Result<Pin> {
    Ok(Pin {
        id: row.get(0)?,
        team_id: row.get(1)?,
        document_id: row.get(2)?,
        collection_id: row.get(3)?,
        created_by_id: row.get(4)?,
        created_at: datetime(row, 5)?,
    })
}

pub(super) fn insert_pin(conn: &Connection, pin: &Pin) -> Result<()> {
    conn.execute(
        "INSERT INTO pins (id, team_id, document_id, collection_id, created_by_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            pin.id,
            pin.team_id,
            pin.document_id,
            pin.collection_id,
            pin.created_by_id,
            format_datetime(&pin.created_at),
        ],
    )?;
    Ok(())
}

pub(super) fn list_document_pins(conn: &Connection, document_id: &str) -> Result<Vec<Pin>> {
    let mut stmt = conn.prepare(
        "SELECT id, team_id, document_id, collection_id, created_by_id, created_at
         FROM pins WHERE document_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![document_id], pin_from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

pub(super) fn delete_collection_pins(
    conn: &Connection,
    document_id: &str,
    collection_id: &str,
) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM pins WHERE document_id = ?1 AND collection_id = ?2",
        params![document_id, collection_id],
    )?)
}

// Events

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        team_id: row.get(2)?,
        actor_id: row.get(3)?,
        collection_id: row.get(4)?,
        document_id: row.get(5)?,
        ip: row.get(6)?,
        data: json_column(7, &row.get::<_, String>(7)?)?,
        created_at: datetime(row, 8)?,
    })
}

pub(super) fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    conn.execute(
        "INSERT INTO events
             (id, name, team_id, actor_id, collection_id, document_id, ip, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            event.id,
            event.name,
            event.team_id,
            event.actor_id,
            event.collection_id,
            event.document_id,
            event.ip,
            serde_json::to_string(&event.data)?,
            format_datetime(&event.created_at),
        ],
    )?;
    Ok(())
}

pub(super) fn list_document_events(conn: &Connection, document_id: &str) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, team_id, actor_id, collection_id, document_id, ip, data, created_at
         FROM events WHERE document_id = ?1 ORDER BY created_at, rowid",
    )?;
    let rows = stmt.query_map(params![document_id], event_from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}
