pub const SCHEMA: &str = r#"
-- Teams are the tenant boundary
CREATE TABLE IF NOT EXISTS teams (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sharing INTEGER NOT NULL DEFAULT 1,
    member_collection_create INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    email TEXT,
    role TEXT NOT NULL DEFAULT 'member',  -- admin | member | viewer | guest
    suspended_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS groups (
    id TEXT PRIMARY KEY,
    team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    created_by_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(team_id, name)
);

CREATE TABLE IF NOT EXISTS group_users (
    group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE IF NOT EXISTS collections (
    id TEXT PRIMARY KEY,
    team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    icon TEXT,
    color TEXT,

    -- Default access for team members: none | read | read_write | admin.
    -- NULL = private, access only through memberships.
    permission TEXT,
    sharing INTEGER NOT NULL DEFAULT 1,

    -- Ordered navigation tree (JSON array of nodes), NULL until first write
    document_structure TEXT,

    created_by_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    archived_at TEXT,
    deleted_at TEXT            -- tombstone, purged later
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    url_id TEXT NOT NULL UNIQUE,
    team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    -- NULL = draft outside any collection
    collection_id TEXT REFERENCES collections(id) ON DELETE SET NULL,
    parent_document_id TEXT REFERENCES documents(id) ON DELETE SET NULL,
    title TEXT NOT NULL DEFAULT '',
    text TEXT NOT NULL DEFAULT '',
    content TEXT,              -- rich content JSON
    icon TEXT,
    color TEXT,
    template INTEGER NOT NULL DEFAULT 0,
    created_by_id TEXT NOT NULL REFERENCES users(id),
    last_modified_by_id TEXT NOT NULL REFERENCES users(id),

    -- Lifecycle
    published_at TEXT,
    archived_at TEXT,
    deleted_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS pins (
    id TEXT PRIMARY KEY,
    team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    collection_id TEXT REFERENCES collections(id) ON DELETE CASCADE,  -- NULL = pinned to home
    created_by_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(document_id, collection_id)
);

-- Memberships target exactly one of collection or document.
-- source_id is set on rows derived from an ancestor document's membership.
CREATE TABLE IF NOT EXISTS user_memberships (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    collection_id TEXT REFERENCES collections(id) ON DELETE CASCADE,
    document_id TEXT REFERENCES documents(id) ON DELETE CASCADE,
    permission TEXT NOT NULL,
    source_id TEXT REFERENCES user_memberships(id) ON DELETE CASCADE,
    created_by_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    CHECK ((collection_id IS NULL) <> (document_id IS NULL))
);

CREATE TABLE IF NOT EXISTS group_memberships (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    collection_id TEXT REFERENCES collections(id) ON DELETE CASCADE,
    document_id TEXT REFERENCES documents(id) ON DELETE CASCADE,
    permission TEXT NOT NULL,
    source_id TEXT REFERENCES group_memberships(id) ON DELETE CASCADE,
    created_by_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    CHECK ((collection_id IS NULL) <> (document_id IS NULL))
);

-- Append-only audit log
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    actor_id TEXT NOT NULL,
    collection_id TEXT,
    document_id TEXT,
    ip TEXT,
    data TEXT NOT NULL DEFAULT '{}',
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_users_team ON users(team_id);
CREATE INDEX IF NOT EXISTS idx_groups_team ON groups(team_id);
CREATE INDEX IF NOT EXISTS idx_group_users_user ON group_users(user_id);
CREATE INDEX IF NOT EXISTS idx_collections_team ON collections(team_id);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection_id);
CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(parent_document_id);
CREATE INDEX IF NOT EXISTS idx_pins_document ON pins(document_id);
CREATE INDEX IF NOT EXISTS idx_user_memberships_user ON user_memberships(user_id);
CREATE INDEX IF NOT EXISTS idx_user_memberships_document ON user_memberships(document_id);
CREATE INDEX IF NOT EXISTS idx_user_memberships_source ON user_memberships(source_id);
CREATE INDEX IF NOT EXISTS idx_group_memberships_group ON group_memberships(group_id);
CREATE INDEX IF NOT EXISTS idx_group_memberships_document ON group_memberships(document_id);
CREATE INDEX IF NOT EXISTS idx_group_memberships_source ON group_memberships(source_id);
CREATE INDEX IF NOT EXISTS idx_events_document ON events(document_id);
"#;
