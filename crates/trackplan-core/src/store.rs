//! The `CatalogStore` trait.
//!
//! Implemented by storage backends (e.g. `trackplan-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  error::StoreError,
  event::{Event, NewEvent},
  id::{EventId, PlanId, PropertyId},
  plan::{CreatedPlan, NewTrackingPlan, TrackingPlan, TrackingPlanDocument},
  property::{NewProperty, Property},
};

/// Abstraction over a tracking-plan catalog backend.
///
/// Events and properties are content-addressed by `(name, type)`: plan writes
/// reuse existing rows rather than duplicating them. Every plan write is a
/// single atomic transaction.
///
/// Reads return `None` for a missing row; turning that into a not-found
/// failure is the caller's job.
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  // ── Tracking plans: writer ───────────────────────────────────────────

  /// Write a new plan with all of its events and properties.
  ///
  /// Fails with an `AlreadyExists` error if a plan with the same name exists;
  /// nothing from the call is persisted in that case.
  fn create_plan(
    &self,
    plan: NewTrackingPlan,
  ) -> impl Future<Output = Result<CreatedPlan, Self::Error>> + Send + '_;

  /// Replace a plan's name, description and event links.
  ///
  /// Does not check existence up front; callers look the plan up with
  /// [`CatalogStore::get_plan`] first. Event and property rows referenced by
  /// the old links are left in place.
  fn update_plan(
    &self,
    id: PlanId,
    plan: NewTrackingPlan,
  ) -> impl Future<Output = Result<TrackingPlan, Self::Error>> + Send + '_;

  // ── Tracking plans: reader and lifecycle ──────────────────────────────

  /// Every plan, each with its nested events and properties. Empty when the
  /// store has no plans.
  fn list_plans(
    &self,
  ) -> impl Future<Output = Result<Vec<TrackingPlanDocument>, Self::Error>> + Send + '_;

  /// The plan row alone. Used for existence checks.
  fn get_plan(
    &self,
    id: PlanId,
  ) -> impl Future<Output = Result<Option<TrackingPlan>, Self::Error>> + Send + '_;

  /// A single plan with its nested events and properties.
  fn get_plan_document(
    &self,
    id: PlanId,
  ) -> impl Future<Output = Result<Option<TrackingPlanDocument>, Self::Error>>
  + Send
  + '_;

  /// Delete a plan and its event links, returning the removed row.
  fn delete_plan(
    &self,
    id: PlanId,
  ) -> impl Future<Output = Result<Option<TrackingPlan>, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Insert a standalone event. An existing `(name, type)` is a conflict.
  fn create_event(
    &self,
    event: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn update_event(
    &self,
    id: EventId,
    event: NewEvent,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn delete_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  // ── Properties ────────────────────────────────────────────────────────

  fn list_properties(
    &self,
  ) -> impl Future<Output = Result<Vec<Property>, Self::Error>> + Send + '_;

  fn get_property(
    &self,
    id: PropertyId,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  /// Insert a standalone property. An existing `(name, type)` is a conflict.
  fn create_property(
    &self,
    property: NewProperty,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + '_;

  fn update_property(
    &self,
    id: PropertyId,
    property: NewProperty,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  fn delete_property(
    &self,
    id: PropertyId,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;
}
