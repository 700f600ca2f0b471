//! Nested-document assembly: plan → events-per-plan → properties-per-event.
//!
//! One statement per plan and one per linked event. Plans are metadata-scale,
//! so no join flattening.

use rusqlite::Connection;

use crate::encode::{RawPlan, RawPlanDocument, RawPlanEvent, RawPlanProperty};

/// Events linked to `plan_id`, in link order, with their properties loaded.
fn plan_events(conn: &Connection, plan_id: i64) -> rusqlite::Result<Vec<RawPlanEvent>> {
  let mut stmt = conn.prepare_cached(
    "SELECT e.id, e.name, e.type, e.description, tpe.additional_properties_allowed
     FROM tracking_plan_events tpe
     JOIN events e ON tpe.event_id = e.id
     WHERE tpe.tracking_plan_id = ?1
     ORDER BY tpe.rowid",
  )?;

  let mut events = stmt
    .query_map([plan_id], |row| {
      Ok(RawPlanEvent {
        event_id:              row.get(0)?,
        name:                  row.get(1)?,
        event_type:            row.get(2)?,
        description:           row.get(3)?,
        additional_properties: row.get(4)?,
        properties:            Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for event in &mut events {
    event.properties = event_properties(conn, event.event_id)?;
  }
  Ok(events)
}

/// Properties linked to `event_id`, in link order.
fn event_properties(
  conn: &Connection,
  event_id: i64,
) -> rusqlite::Result<Vec<RawPlanProperty>> {
  let mut stmt = conn.prepare_cached(
    "SELECT p.name, p.type, p.description, ep.required
     FROM event_properties ep
     JOIN properties p ON ep.property_id = p.id
     WHERE ep.event_id = ?1
     ORDER BY ep.rowid",
  )?;

  stmt
    .query_map([event_id], |row| {
      Ok(RawPlanProperty {
        name:          row.get(0)?,
        property_type: row.get(1)?,
        description:   row.get(2)?,
        required:      row.get(3)?,
      })
    })?
    .collect()
}

/// Load everything linked beneath an already-fetched plan row.
pub(crate) fn assemble(conn: &Connection, plan: RawPlan) -> rusqlite::Result<RawPlanDocument> {
  let events = plan_events(conn, plan.id)?;
  Ok(RawPlanDocument { plan, events })
}
