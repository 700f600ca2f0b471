//! Natural-key upserts and junction links.
//!
//! These run on a borrowed [`Connection`] (usually a [`rusqlite::Transaction`]
//! deref'd) so the plan writer can compose them inside one transaction. None
//! of them open or commit a transaction themselves.

use rusqlite::{Connection, OptionalExtension as _, Params, ffi};
use trackplan_core::{
  id::{EventId, PlanId, PropertyId},
  plan::{PlanEventInput, PlanPropertyInput},
};

use crate::encode::encode_rules;

/// `true` if `err` is a UNIQUE (or primary-key) constraint failure.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

// ─── Upsert-or-fetch ─────────────────────────────────────────────────────────

/// Run `insert` (an `INSERT ... ON CONFLICT DO NOTHING RETURNING id`); if it
/// returned no row the natural key already exists, so fetch its id with
/// `lookup`.
///
/// Constraint failures other than the natural-key conflict (NOT NULL, CHECK)
/// surface as errors from `insert`.
fn upsert_or_fetch<P: Params, K: Params>(
  conn: &Connection,
  insert: &str,
  values: P,
  lookup: &str,
  key: K,
) -> rusqlite::Result<i64> {
  let inserted: Option<i64> = conn
    .prepare_cached(insert)?
    .query_row(values, |row| row.get(0))
    .optional()?;

  match inserted {
    Some(id) => Ok(id),
    None => conn.prepare_cached(lookup)?.query_row(key, |row| row.get(0)),
  }
}

/// Insert the event identified by `(name, type)` unless it exists, returning
/// its id either way. An existing row's description is left untouched.
pub(crate) fn upsert_event(
  conn: &Connection,
  event: &PlanEventInput,
  now: &str,
) -> rusqlite::Result<EventId> {
  let event_type = event.event_type.as_str();
  upsert_or_fetch(
    conn,
    "INSERT INTO events (name, type, description, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?4)
     ON CONFLICT (name, type) DO NOTHING
     RETURNING id",
    rusqlite::params![event.name, event_type, event.description, now],
    "SELECT id FROM events WHERE name = ?1 AND type = ?2",
    rusqlite::params![event.name, event_type],
  )
  .map(EventId)
}

/// Insert the property identified by `(name, type)` unless it exists,
/// returning its id either way.
pub(crate) fn upsert_property(
  conn: &Connection,
  property: &PlanPropertyInput,
  now: &str,
) -> rusqlite::Result<PropertyId> {
  let property_type = property.property_type.as_str();
  let rules = encode_rules(property.validation_rules.as_ref());
  upsert_or_fetch(
    conn,
    "INSERT INTO properties
       (name, type, description, validation_rules, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?5)
     ON CONFLICT (name, type) DO NOTHING
     RETURNING id",
    rusqlite::params![property.name, property_type, property.description, rules, now],
    "SELECT id FROM properties WHERE name = ?1 AND type = ?2",
    rusqlite::params![property.name, property_type],
  )
  .map(PropertyId)
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// Link a property to an event. First write wins: if the pair is already
/// linked its `required` flag is kept. Returns whether a row was inserted.
pub(crate) fn link_event_property(
  conn: &Connection,
  event_id: EventId,
  property_id: PropertyId,
  required: bool,
) -> rusqlite::Result<bool> {
  let inserted = conn
    .prepare_cached(
      "INSERT INTO event_properties (event_id, property_id, required)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (event_id, property_id) DO NOTHING",
    )?
    .execute(rusqlite::params![event_id.0, property_id.0, required])?;
  Ok(inserted > 0)
}

/// Link an event to a plan. First write wins for
/// `additional_properties_allowed`. Returns whether a row was inserted.
pub(crate) fn link_plan_event(
  conn: &Connection,
  plan_id: PlanId,
  event_id: EventId,
  additional_properties: bool,
) -> rusqlite::Result<bool> {
  let inserted = conn
    .prepare_cached(
      "INSERT INTO tracking_plan_events
         (tracking_plan_id, event_id, additional_properties_allowed)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (tracking_plan_id, event_id) DO NOTHING",
    )?
    .execute(rusqlite::params![plan_id.0, event_id.0, additional_properties])?;
  Ok(inserted > 0)
}

// ─── Plan body ───────────────────────────────────────────────────────────────

/// Upsert and link every event and property of a plan document, in input
/// order. Stops at the first failing statement; the caller's transaction is
/// expected to roll back in that case.
pub(crate) fn write_plan_events(
  conn: &Connection,
  plan_id: PlanId,
  events: &[PlanEventInput],
  now: &str,
) -> rusqlite::Result<()> {
  for event in events {
    let event_id = upsert_event(conn, event, now)?;

    for property in &event.properties {
      let property_id = upsert_property(conn, property, now)?;
      link_event_property(conn, event_id, property_id, property.required)?;
    }

    link_plan_event(conn, plan_id, event_id, event.additional_properties)?;
  }
  Ok(())
}
