//! SQL schema for the Sojourn SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS event (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT,
    type        TEXT    NOT NULL,   -- 'calendar' | 'userstay'
    title       TEXT    NOT NULL,
    description TEXT    NOT NULL,
    location    TEXT    NOT NULL,
    color       INTEGER NOT NULL,
    start_time  INTEGER NOT NULL,   -- ms since epoch
    end_time    INTEGER NOT NULL,
    create_time INTEGER NOT NULL,
    CHECK (end_time >= start_time)
);

-- One row per distinct place; rows are shared between events through the
-- candidates table.
CREATE TABLE IF NOT EXISTS location (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    place_id    TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    address     TEXT    NOT NULL,
    latitude    REAL    NOT NULL,
    longitude   REAL    NOT NULL,
    been_there  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS event_location_candidates (
    event_id INTEGER NOT NULL REFERENCES event(id) ON DELETE CASCADE,
    loc_id   INTEGER NOT NULL REFERENCES location(id),
    PRIMARY KEY (event_id, loc_id)
);

CREATE INDEX IF NOT EXISTS event_start_idx     ON event(start_time);
CREATE INDEX IF NOT EXISTS event_external_idx  ON event(external_id);
CREATE INDEX IF NOT EXISTS location_place_idx  ON location(place_id);

PRAGMA user_version = 1;
";
