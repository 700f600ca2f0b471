//! Property definitions: typed attributes attachable to events.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, id::PropertyId};

/// The value type a property carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
  String,
  Number,
  Boolean,
}

impl PropertyType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::String => "string",
      Self::Number => "number",
      Self::Boolean => "boolean",
    }
  }
}

impl FromStr for PropertyType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "string" => Ok(Self::String),
      "number" => Ok(Self::Number),
      "boolean" => Ok(Self::Boolean),
      other => Err(Error::UnknownPropertyType(other.to_owned())),
    }
  }
}

/// A stored property row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
  pub id:               PropertyId,
  pub name:             String,
  #[serde(rename = "type")]
  pub property_type:    PropertyType,
  pub description:      String,
  /// Opaque rules document; never interpreted by the catalog.
  pub validation_rules: Option<serde_json::Value>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Input to [`crate::store::CatalogStore::create_property`] and
/// [`crate::store::CatalogStore::update_property`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
  pub name:             String,
  #[serde(rename = "type")]
  pub property_type:    PropertyType,
  pub description:      String,
  #[serde(default)]
  pub validation_rules: Option<serde_json::Value>,
}
