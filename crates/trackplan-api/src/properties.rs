//! Handlers for `/properties` endpoints.
//!
//! Same shape as `/events`. `validation_rules` is optional on input and is
//! stored as an opaque JSON document.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use trackplan_core::{
  id::PropertyId,
  property::{NewProperty, Property},
  store::CatalogStore,
};

use crate::{error::ApiError, validate::Validate};

fn not_found(id: PropertyId) -> ApiError {
  ApiError::NotFound(format!("property {id} not found"))
}

pub async fn list<S: CatalogStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Property>>, ApiError> {
  let properties = store.list_properties().await.map_err(ApiError::from_store)?;
  Ok(Json(properties))
}

pub async fn create<S: CatalogStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewProperty>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(property) = body?;
  property.validate()?;

  let property = store
    .create_property(property)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(property)))
}

pub async fn get_one<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<PropertyId>,
) -> Result<Json<Property>, ApiError> {
  let property = store
    .get_property(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(property))
}

pub async fn update<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<PropertyId>,
  body: Result<Json<NewProperty>, JsonRejection>,
) -> Result<Json<Property>, ApiError> {
  let Json(property) = body?;
  property.validate()?;

  store
    .get_property(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  let updated = store
    .update_property(id, property)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(updated))
}

pub async fn delete<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<PropertyId>,
) -> Result<Json<Property>, ApiError> {
  store
    .get_property(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  let deleted = store
    .delete_property(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(deleted))
}
