//! Handlers for `/tracking_plans` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tracking_plans` | Every plan as a nested document |
//! | `POST`   | `/tracking_plans` | 201 with `{"id":..}`; 409 if the name is taken |
//! | `GET`    | `/tracking_plans/{id}` | Nested document; 404 if not found |
//! | `PUT`    | `/tracking_plans/{id}` | Replaces name, description and events |
//! | `DELETE` | `/tracking_plans/{id}` | Events and properties are kept |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use trackplan_core::{
  id::PlanId,
  plan::{NewTrackingPlan, TrackingPlan, TrackingPlanDocument},
  store::CatalogStore,
};

use crate::{error::ApiError, validate::Validate};

fn not_found(id: PlanId) -> ApiError {
  ApiError::NotFound(format!("tracking plan {id} not found"))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /tracking_plans`
pub async fn list<S: CatalogStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<TrackingPlanDocument>>, ApiError> {
  let plans = store.list_plans().await.map_err(ApiError::from_store)?;
  Ok(Json(plans))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /tracking_plans`
pub async fn create<S: CatalogStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewTrackingPlan>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(plan) = body?;
  plan.validate()?;

  let created = store.create_plan(plan).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /tracking_plans/{id}`
pub async fn get_one<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<PlanId>,
) -> Result<Json<TrackingPlanDocument>, ApiError> {
  let plan = store
    .get_plan_document(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(plan))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /tracking_plans/{id}`
pub async fn update<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<PlanId>,
  body: Result<Json<NewTrackingPlan>, JsonRejection>,
) -> Result<Json<TrackingPlan>, ApiError> {
  let Json(plan) = body?;
  plan.validate()?;

  store
    .get_plan(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  let updated = store.update_plan(id, plan).await.map_err(ApiError::from_store)?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /tracking_plans/{id}`
pub async fn delete<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<PlanId>,
) -> Result<Json<TrackingPlan>, ApiError> {
  store
    .get_plan(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  let deleted = store
    .delete_plan(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(deleted))
}
