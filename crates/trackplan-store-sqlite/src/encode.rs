//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, enum discriminants as their
//! lowercase names, and validation rules as compact JSON text. Booleans use
//! SQLite's 0/1 integers.

use chrono::{DateTime, Utc};
use trackplan_core::{
  event::{Event, EventType},
  id::{EventId, PlanId, PropertyId},
  plan::{PlanEvent, PlanProperty, TrackingPlan, TrackingPlanDocument},
  property::{Property, PropertyType},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Validation rules ────────────────────────────────────────────────────────

pub fn encode_rules(rules: Option<&serde_json::Value>) -> Option<String> {
  rules.map(serde_json::Value::to_string)
}

pub fn decode_rules(s: Option<&str>) -> Result<Option<serde_json::Value>> {
  Ok(s.map(serde_json::from_str::<serde_json::Value>).transpose()?)
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const PLAN_COLUMNS: &str = "id, name, description, created_at, updated_at";

pub const EVENT_COLUMNS: &str =
  "id, name, type, description, created_at, updated_at";

pub const PROPERTY_COLUMNS: &str =
  "id, name, type, description, validation_rules, created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `tracking_plans` row ([`PLAN_COLUMNS`]).
pub struct RawPlan {
  pub id:          i64,
  pub name:        String,
  pub description: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawPlan {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      created_at:  row.get(3)?,
      updated_at:  row.get(4)?,
    })
  }

  pub fn into_plan(self) -> Result<TrackingPlan> {
    Ok(TrackingPlan {
      id:          PlanId(self.id),
      name:        self.name,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from an `events` row ([`EVENT_COLUMNS`]).
pub struct RawEvent {
  pub id:          i64,
  pub name:        String,
  pub event_type:  String,
  pub description: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      event_type:  row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:          EventId(self.id),
      name:        self.name,
      event_type:  self.event_type.parse::<EventType>()?,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `properties` row ([`PROPERTY_COLUMNS`]).
pub struct RawProperty {
  pub id:               i64,
  pub name:             String,
  pub property_type:    String,
  pub description:      String,
  pub validation_rules: Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawProperty {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      name:             row.get(1)?,
      property_type:    row.get(2)?,
      description:      row.get(3)?,
      validation_rules: row.get(4)?,
      created_at:       row.get(5)?,
      updated_at:       row.get(6)?,
    })
  }

  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      id:               PropertyId(self.id),
      name:             self.name,
      property_type:    self.property_type.parse::<PropertyType>()?,
      description:      self.description,
      validation_rules: decode_rules(self.validation_rules.as_deref())?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Nested read model ───────────────────────────────────────────────────────

/// An `event_properties` link joined with its property.
pub struct RawPlanProperty {
  pub name:          String,
  pub property_type: String,
  pub description:   String,
  pub required:      bool,
}

impl RawPlanProperty {
  fn into_plan_property(self) -> Result<PlanProperty> {
    Ok(PlanProperty {
      name:          self.name,
      property_type: self.property_type.parse::<PropertyType>()?,
      required:      self.required,
      description:   self.description,
    })
  }
}

/// A `tracking_plan_events` link joined with its event, plus the event's
/// linked properties.
pub struct RawPlanEvent {
  pub event_id:              i64,
  pub name:                  String,
  pub event_type:            String,
  pub description:           String,
  pub additional_properties: bool,
  pub properties:            Vec<RawPlanProperty>,
}

impl RawPlanEvent {
  fn into_plan_event(self) -> Result<PlanEvent> {
    Ok(PlanEvent {
      name:                  self.name,
      event_type:            self.event_type.parse::<EventType>()?,
      description:           self.description,
      additional_properties: self.additional_properties,
      properties:            self
        .properties
        .into_iter()
        .map(RawPlanProperty::into_plan_property)
        .collect::<Result<_>>()?,
    })
  }
}

/// A plan row with everything linked beneath it.
pub struct RawPlanDocument {
  pub plan:   RawPlan,
  pub events: Vec<RawPlanEvent>,
}

impl RawPlanDocument {
  pub fn into_document(self) -> Result<TrackingPlanDocument> {
    Ok(TrackingPlanDocument {
      id:          PlanId(self.plan.id),
      name:        self.plan.name,
      description: self.plan.description,
      events:      self
        .events
        .into_iter()
        .map(RawPlanEvent::into_plan_event)
        .collect::<Result<_>>()?,
    })
  }
}
