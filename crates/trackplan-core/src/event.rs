//! Event definitions: named, typed occurrences shared across tracking plans.
//!
//! An event is identified by its natural key `(name, type)`: two events with
//! the same name but a different type are distinct rows.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, id::EventId};

/// The analytics call an event is emitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
  Track,
  Identify,
  Alias,
  Screen,
  Page,
}

impl EventType {
  /// The string stored in the `type` column. Must match the serde tags.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Track => "track",
      Self::Identify => "identify",
      Self::Alias => "alias",
      Self::Screen => "screen",
      Self::Page => "page",
    }
  }
}

impl FromStr for EventType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "track" => Ok(Self::Track),
      "identify" => Ok(Self::Identify),
      "alias" => Ok(Self::Alias),
      "screen" => Ok(Self::Screen),
      "page" => Ok(Self::Page),
      other => Err(Error::UnknownEventType(other.to_owned())),
    }
  }
}

/// A stored event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:          EventId,
  pub name:        String,
  #[serde(rename = "type")]
  pub event_type:  EventType,
  pub description: String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::CatalogStore::create_event`] and
/// [`crate::store::CatalogStore::update_event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
  pub name:        String,
  #[serde(rename = "type")]
  pub event_type:  EventType,
  pub description: String,
}
