//! SQL schema for the Inventa SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entities (
    entity_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS roles (
    role_id     TEXT PRIMARY KEY,
    entity_id   TEXT NOT NULL REFERENCES entities(entity_id),
    name        TEXT NOT NULL,
    permissions TEXT NOT NULL DEFAULT '[]',   -- JSON array of permission codes
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    entity_id     TEXT NOT NULL REFERENCES entities(entity_id),
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,             -- argon2 PHC string
    role_id       TEXT NOT NULL REFERENCES roles(role_id),
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS characteristics (
    characteristic_id TEXT PRIMARY KEY,
    entity_id         TEXT NOT NULL REFERENCES entities(entity_id),
    name              TEXT NOT NULL,
    name_key          TEXT NOT NULL,        -- lower-cased name, unique per entity
    description       TEXT,
    kind              TEXT NOT NULL,        -- never updated after insert
    options           TEXT,                 -- JSON array, choice kinds only
    units             TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id      TEXT PRIMARY KEY,
    entity_id   TEXT NOT NULL REFERENCES entities(entity_id),
    name        TEXT NOT NULL,
    color       TEXT NOT NULL,
    font_color  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS materials (
    material_id TEXT PRIMARY KEY,
    entity_id   TEXT NOT NULL REFERENCES entities(entity_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    deleted_at  TEXT                        -- soft delete marker
);

CREATE TABLE IF NOT EXISTS material_tags (
    material_id TEXT NOT NULL REFERENCES materials(material_id),
    tag_id      TEXT NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
    PRIMARY KEY (material_id, tag_id)
);

-- Values of soft-deleted materials go with their characteristic.
CREATE TABLE IF NOT EXISTS material_values (
    material_id       TEXT NOT NULL REFERENCES materials(material_id),
    characteristic_id TEXT NOT NULL
                      REFERENCES characteristics(characteristic_id) ON DELETE CASCADE,
    value_json        TEXT NOT NULL,        -- LiveValue payload, shape per kind
    set_at            TEXT NOT NULL,
    PRIMARY KEY (material_id, characteristic_id)
);

CREATE TABLE IF NOT EXISTS files (
    file_id     TEXT PRIMARY KEY,
    entity_id   TEXT NOT NULL REFERENCES entities(entity_id),
    name        TEXT NOT NULL,
    mime_type   TEXT NOT NULL,
    path        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Snapshots are strictly append-only.
CREATE TABLE IF NOT EXISTS material_snapshots (
    snapshot_id          TEXT PRIMARY KEY,
    material_id          TEXT NOT NULL REFERENCES materials(material_id),
    entity_id            TEXT NOT NULL,
    material_name        TEXT NOT NULL,
    recorded_at          TEXT NOT NULL,
    tags_json            TEXT NOT NULL,
    characteristics_json TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS material_snapshots_no_update
BEFORE UPDATE ON material_snapshots
BEGIN
    SELECT RAISE(ABORT, 'material snapshots are immutable');
END;

CREATE TRIGGER IF NOT EXISTS material_snapshots_no_delete
BEFORE DELETE ON material_snapshots
BEGIN
    SELECT RAISE(ABORT, 'material snapshots are immutable');
END;

CREATE TABLE IF NOT EXISTS audit_log (
    audit_id     TEXT PRIMARY KEY,
    entity_id    TEXT NOT NULL,
    kind         TEXT NOT NULL,
    subject_id   TEXT NOT NULL,
    subject_name TEXT NOT NULL,
    recorded_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS characteristics_entity_idx ON characteristics(entity_id);
CREATE UNIQUE INDEX IF NOT EXISTS characteristics_name_idx
    ON characteristics(entity_id, name_key);
CREATE INDEX IF NOT EXISTS tags_entity_idx            ON tags(entity_id);
CREATE INDEX IF NOT EXISTS materials_entity_idx       ON materials(entity_id);
CREATE INDEX IF NOT EXISTS material_tags_tag_idx      ON material_tags(tag_id);
CREATE INDEX IF NOT EXISTS material_values_char_idx   ON material_values(characteristic_id);
CREATE INDEX IF NOT EXISTS snapshots_material_idx     ON material_snapshots(material_id);
CREATE INDEX IF NOT EXISTS audit_entity_idx           ON audit_log(entity_id, recorded_at);

PRAGMA user_version = 1;
";
