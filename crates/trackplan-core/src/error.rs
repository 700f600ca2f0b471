//! Error types for `trackplan-core`, plus the classification every storage
//! backend error exposes to higher layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown event type: {0:?}")]
  UnknownEventType(String),

  #[error("unknown property type: {0:?}")]
  UnknownPropertyType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The coarse category of a store failure, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A create (or rename) hit an existing natural key.
  AlreadyExists,
  /// The target row of a write vanished or never existed.
  NotFound,
  /// Any other constraint violation, decode failure or connectivity problem.
  Storage,
}

/// Implemented by backend error types so callers can map failures without
/// depending on the concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}
