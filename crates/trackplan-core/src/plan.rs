//! Tracking plans and the nested document written and read by the catalog.
//!
//! A plan is stored across four normalized tables (plans, events, properties
//! and two junctions). The nested shapes in this module are never stored as
//! such; the writer decomposes [`NewTrackingPlan`] on the way in and the
//! reader reassembles [`TrackingPlanDocument`] on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{event::EventType, id::PlanId, property::PropertyType};

// ─── Stored row ──────────────────────────────────────────────────────────────

/// A row of the tracking-plan table, without its events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPlan {
  pub id:          PlanId,
  pub name:        String,
  pub description: String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Returned by a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPlan {
  pub id: PlanId,
}

// ─── Inbound document ────────────────────────────────────────────────────────

/// Create/update payload. Replaces the plan's event list wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrackingPlan {
  pub name:        String,
  pub description: String,
  pub events:      Vec<PlanEventInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEventInput {
  pub name:                  String,
  #[serde(rename = "type")]
  pub event_type:            EventType,
  pub description:           String,
  /// Accepts `"true"`, `"false"` or a JSON boolean; absent means `false`.
  #[serde(
    rename = "additionalProperties",
    default,
    deserialize_with = "deserialize_flag"
  )]
  pub additional_properties: bool,
  pub properties:            Vec<PlanPropertyInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPropertyInput {
  pub name:             String,
  #[serde(rename = "type")]
  pub property_type:    PropertyType,
  pub description:      String,
  pub required:         bool,
  #[serde(default)]
  pub validation_rules: Option<serde_json::Value>,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Flag {
    Bool(bool),
    Text(String),
  }

  match Flag::deserialize(deserializer)? {
    Flag::Bool(b) => Ok(b),
    Flag::Text(s) => match s.as_str() {
      "true" => Ok(true),
      "false" => Ok(false),
      other => Err(de::Error::invalid_value(
        de::Unexpected::Str(other),
        &r#""true" or "false""#,
      )),
    },
  }
}

// ─── Outbound document ───────────────────────────────────────────────────────

/// The read model for a plan, assembled on every read from the
/// junction tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPlanDocument {
  pub id:          PlanId,
  pub name:        String,
  pub description: String,
  pub events:      Vec<PlanEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEvent {
  pub name:                  String,
  #[serde(rename = "type")]
  pub event_type:            EventType,
  pub description:           String,
  /// Taken from the plan-event link, so it may differ between plans.
  #[serde(rename = "additionalProperties")]
  pub additional_properties: bool,
  pub properties:            Vec<PlanProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProperty {
  pub name:          String,
  #[serde(rename = "type")]
  pub property_type: PropertyType,
  pub required:      bool,
  pub description:   String,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn event_json(flag: serde_json::Value) -> serde_json::Value {
    let mut event = json!({
      "name": "Product Viewed",
      "type": "track",
      "description": "e",
      "properties": [],
    });
    if !flag.is_null() {
      event["additionalProperties"] = flag;
    }
    event
  }

  #[test]
  fn additional_properties_accepts_strings() {
    let on: PlanEventInput = serde_json::from_value(event_json(json!("true"))).unwrap();
    let off: PlanEventInput =
      serde_json::from_value(event_json(json!("false"))).unwrap();
    assert!(on.additional_properties);
    assert!(!off.additional_properties);
  }

  #[test]
  fn additional_properties_accepts_bool() {
    let on: PlanEventInput = serde_json::from_value(event_json(json!(true))).unwrap();
    assert!(on.additional_properties);
  }

  #[test]
  fn additional_properties_defaults_to_false() {
    let event: PlanEventInput =
      serde_json::from_value(event_json(serde_json::Value::Null)).unwrap();
    assert!(!event.additional_properties);
  }

  #[test]
  fn additional_properties_rejects_other_strings() {
    let err = serde_json::from_value::<PlanEventInput>(event_json(json!("yes")));
    assert!(err.is_err());
  }

  #[test]
  fn unknown_event_type_is_rejected() {
    let mut event = event_json(serde_json::Value::Null);
    event["type"] = json!("invalid_type");
    assert!(serde_json::from_value::<PlanEventInput>(event).is_err());
  }

  #[test]
  fn document_serialises_with_camel_case_flag() {
    let doc = TrackingPlanDocument {
      id:          PlanId(7),
      name:        "Purchase Flow".into(),
      description: "d".into(),
      events:      vec![PlanEvent {
        name:                  "Product Viewed".into(),
        event_type:            EventType::Track,
        description:           "e".into(),
        additional_properties: true,
        properties:            vec![PlanProperty {
          name:          "product_id".into(),
          property_type: PropertyType::String,
          required:      true,
          description:   "p".into(),
        }],
      }],
    };

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["id"], json!(7));
    assert_eq!(value["events"][0]["type"], json!("track"));
    assert_eq!(value["events"][0]["additionalProperties"], json!(true));
    assert_eq!(value["events"][0]["properties"][0]["type"], json!("string"));
  }
}
