//! Request validation beyond what serde enforces.
//!
//! Enum membership (`type` values, the `additionalProperties` flag) is already
//! rejected during deserialisation. What remains is the non-empty checks on
//! names and descriptions, reported per field.

use trackplan_core::{
  event::NewEvent,
  plan::{NewTrackingPlan, PlanEventInput, PlanPropertyInput},
  property::NewProperty,
};

use crate::error::{ApiError, FieldError};

/// A request body that can be checked before it reaches the store.
pub trait Validate {
  fn validate(&self) -> Result<(), ApiError>;
}

#[derive(Default)]
struct Errors(Vec<FieldError>);

impl Errors {
  fn non_empty(&mut self, field: impl Into<String>, value: &str, label: &str) {
    if value.trim().is_empty() {
      self.0.push(FieldError {
        field:   field.into(),
        message: format!("{label} can't be empty"),
      });
    }
  }

  fn finish(self) -> Result<(), ApiError> {
    if self.0.is_empty() {
      Ok(())
    } else {
      Err(ApiError::Validation(self.0))
    }
  }
}

impl Validate for NewTrackingPlan {
  fn validate(&self) -> Result<(), ApiError> {
    let mut errors = Errors::default();
    errors.non_empty("name", &self.name, "tracking plan name");
    errors.non_empty("description", &self.description, "tracking plan description");

    for (i, event) in self.events.iter().enumerate() {
      check_event(&mut errors, &format!("events.{i}"), event);
    }
    errors.finish()
  }
}

fn check_event(errors: &mut Errors, prefix: &str, event: &PlanEventInput) {
  errors.non_empty(format!("{prefix}.name"), &event.name, "event name");
  errors.non_empty(
    format!("{prefix}.description"),
    &event.description,
    "event description",
  );
  for (j, property) in event.properties.iter().enumerate() {
    check_property(errors, &format!("{prefix}.properties.{j}"), property);
  }
}

fn check_property(errors: &mut Errors, prefix: &str, property: &PlanPropertyInput) {
  errors.non_empty(format!("{prefix}.name"), &property.name, "property name");
  errors.non_empty(
    format!("{prefix}.description"),
    &property.description,
    "property description",
  );
}

impl Validate for NewEvent {
  fn validate(&self) -> Result<(), ApiError> {
    let mut errors = Errors::default();
    errors.non_empty("name", &self.name, "name");
    errors.non_empty("description", &self.description, "description");
    errors.finish()
  }
}

impl Validate for NewProperty {
  fn validate(&self) -> Result<(), ApiError> {
    let mut errors = Errors::default();
    errors.non_empty("name", &self.name, "name");
    errors.non_empty("description", &self.description, "description");
    errors.finish()
  }
}

#[cfg(test)]
mod tests {
  use trackplan_core::{event::EventType, property::PropertyType};

  use super::*;

  fn fields(result: Result<(), ApiError>) -> Vec<String> {
    match result {
      Ok(()) => vec![],
      Err(ApiError::Validation(fields)) => fields.into_iter().map(|f| f.field).collect(),
      Err(other) => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn valid_plan_passes() {
    let plan = NewTrackingPlan {
      name:        "Purchase Flow".into(),
      description: "d".into(),
      events:      vec![],
    };
    assert!(plan.validate().is_ok());
  }

  #[test]
  fn nested_blank_fields_are_addressed_by_path() {
    let plan = NewTrackingPlan {
      name:        " ".into(),
      description: "d".into(),
      events:      vec![PlanEventInput {
        name:                  "Viewed".into(),
        event_type:            EventType::Screen,
        description:           "".into(),
        additional_properties: false,
        properties:            vec![
          PlanPropertyInput {
            name:             "ok".into(),
            property_type:    PropertyType::String,
            description:      "fine".into(),
            required:         true,
            validation_rules: None,
          },
          PlanPropertyInput {
            name:             "".into(),
            property_type:    PropertyType::Number,
            description:      "fine".into(),
            required:         false,
            validation_rules: None,
          },
        ],
      }],
    };

    assert_eq!(fields(plan.validate()), [
      "name",
      "events.0.description",
      "events.0.properties.1.name",
    ]);
  }

  #[test]
  fn blank_event_is_rejected() {
    let event = NewEvent {
      name:        "".into(),
      event_type:  EventType::Alias,
      description: "".into(),
    };
    assert_eq!(fields(event.validate()), ["name", "description"]);
  }
}
