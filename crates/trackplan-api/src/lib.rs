//! JSON REST API for the tracking-plan catalog.
//!
//! Exposes an axum [`Router`] backed by any [`trackplan_core::store::CatalogStore`].
//! Transport concerns (tracing layers, binding) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", trackplan_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod events;
pub mod plans;
pub mod properties;
pub mod validate;

use std::sync::Arc;

use axum::{Router, routing::get};
use trackplan_core::store::CatalogStore;

pub use error::{ApiError, FieldError};

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    // Tracking plans
    .route("/tracking_plans", get(plans::list::<S>).post(plans::create::<S>))
    .route(
      "/tracking_plans/{id}",
      get(plans::get_one::<S>)
        .put(plans::update::<S>)
        .delete(plans::delete::<S>),
    )
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/{id}",
      get(events::get_one::<S>)
        .put(events::update::<S>)
        .delete(events::delete::<S>),
    )
    // Properties
    .route(
      "/properties",
      get(properties::list::<S>).post(properties::create::<S>),
    )
    .route(
      "/properties/{id}",
      get(properties::get_one::<S>)
        .put(properties::update::<S>)
        .delete(properties::delete::<S>),
    )
    .with_state(store)
}
