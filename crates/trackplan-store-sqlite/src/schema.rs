//! SQL schema for the Trackplan SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tracking_plans (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL CHECK (name <> ''),
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at  TEXT NOT NULL,
    UNIQUE (name)
);

-- Shared across plans; identified by (name, type).
CREATE TABLE IF NOT EXISTS events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL CHECK (name <> ''),
    type        TEXT NOT NULL
                CHECK (type IN ('track', 'identify', 'alias', 'screen', 'page')),
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (name, type)
);

-- Shared across events; identified by (name, type).
CREATE TABLE IF NOT EXISTS properties (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL CHECK (name <> ''),
    type             TEXT NOT NULL CHECK (type IN ('string', 'number', 'boolean')),
    description      TEXT NOT NULL,
    validation_rules TEXT CHECK (validation_rules IS NULL OR json_valid(validation_rules)),
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (name, type)
);

-- Link rows are owned by their plan; events survive the plan's deletion.
CREATE TABLE IF NOT EXISTS tracking_plan_events (
    tracking_plan_id              INTEGER NOT NULL
                                  REFERENCES tracking_plans(id) ON DELETE CASCADE,
    event_id                      INTEGER NOT NULL
                                  REFERENCES events(id) ON DELETE CASCADE,
    additional_properties_allowed INTEGER NOT NULL DEFAULT 0,
    UNIQUE (tracking_plan_id, event_id)
);

CREATE TABLE IF NOT EXISTS event_properties (
    event_id    INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    required    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (event_id, property_id)
);

CREATE INDEX IF NOT EXISTS tracking_plan_events_event_idx
    ON tracking_plan_events(event_id);
CREATE INDEX IF NOT EXISTS event_properties_property_idx
    ON event_properties(property_id);

PRAGMA user_version = 1;
";
