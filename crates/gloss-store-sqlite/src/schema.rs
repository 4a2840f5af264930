//! SQL schema for the Gloss SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    project_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL
);

-- Documents are immutable once inserted; offsets into `text` count chars.
CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    name        TEXT NOT NULL,
    text        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS codes (
    code_id     TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    name        TEXT NOT NULL,
    description TEXT,
    color       TEXT,
    flags       TEXT NOT NULL DEFAULT '[]'   -- JSON array of strings
);

-- Disjointness is enforced by the engine, not by the schema.
CREATE TABLE IF NOT EXISTS segments (
    segment_id   TEXT PRIMARY KEY,
    document_id  TEXT NOT NULL REFERENCES documents(document_id),
    start_offset INTEGER NOT NULL,
    end_offset   INTEGER NOT NULL,
    text         TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    CHECK (start_offset >= 0 AND end_offset > start_offset)
);

-- One row per (segment, code). `position` keeps first-applied order.
CREATE TABLE IF NOT EXISTS coded_segments (
    segment_id TEXT NOT NULL REFERENCES segments(segment_id),
    code_id    TEXT NOT NULL REFERENCES codes(code_id),
    position   INTEGER NOT NULL,
    PRIMARY KEY (segment_id, code_id)
);

-- Single-row table.
CREATE TABLE IF NOT EXISTS settings (
    id               INTEGER PRIMARY KEY CHECK (id = 1),
    ai_enabled       INTEGER NOT NULL DEFAULT 0,
    suggestion_limit INTEGER NOT NULL DEFAULT 2
);

CREATE INDEX IF NOT EXISTS documents_project_idx ON documents(project_id);
CREATE INDEX IF NOT EXISTS codes_project_idx     ON codes(project_id);
CREATE INDEX IF NOT EXISTS segments_document_idx ON segments(document_id);
CREATE INDEX IF NOT EXISTS coded_segments_code_idx ON coded_segments(code_id);

PRAGMA user_version = 1;
";
