//! Error type for `trackplan-store-sqlite`.

use thiserror::Error;
use trackplan_core::{ErrorKind, StoreError, id::PlanId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] trackplan_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A natural-key conflict on create or rename, e.g. a duplicate plan name.
  #[error("{0} already exists")]
  AlreadyExists(String),

  /// An update targeted a plan id with no row.
  #[error("tracking plan not found: {0}")]
  PlanNotFound(PlanId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
      Error::PlanNotFound(_) => ErrorKind::NotFound,
      Error::Core(_)
      | Error::Database(_)
      | Error::Json(_)
      | Error::DateParse(_) => ErrorKind::Storage,
    }
  }
}
