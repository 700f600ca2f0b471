//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Ordered by id |
//! | `POST`   | `/events` | Body: `{"name":..,"type":"track","description":..}` |
//! | `GET`    | `/events/{id}` | 404 if not found |
//! | `PUT`    | `/events/{id}` | 409 if `(name, type)` collides with another event |
//! | `DELETE` | `/events/{id}` | Drops the event's plan and property links |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use trackplan_core::{
  event::{Event, NewEvent},
  id::EventId,
  store::CatalogStore,
};

use crate::{error::ApiError, validate::Validate};

fn not_found(id: EventId) -> ApiError {
  ApiError::NotFound(format!("event {id} not found"))
}

/// `GET /events`
pub async fn list<S: CatalogStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let events = store.list_events().await.map_err(ApiError::from_store)?;
  Ok(Json(events))
}

/// `POST /events`
pub async fn create<S: CatalogStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(event) = body?;
  event.validate()?;

  let event = store.create_event(event).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events/{id}`
pub async fn get_one<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<EventId>,
) -> Result<Json<Event>, ApiError> {
  let event = store
    .get_event(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(event))
}

/// `PUT /events/{id}`
pub async fn update<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<EventId>,
  body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
  let Json(event) = body?;
  event.validate()?;

  store
    .get_event(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  let updated = store
    .update_event(id, event)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(updated))
}

/// `DELETE /events/{id}`
pub async fn delete<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<EventId>,
) -> Result<Json<Event>, ApiError> {
  store
    .get_event(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  let deleted = store
    .delete_event(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(deleted))
}
