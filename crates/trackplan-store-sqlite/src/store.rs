//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::{path::Path, time::Instant};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use trackplan_core::{
  event::{Event, NewEvent},
  id::{EventId, PlanId, PropertyId},
  plan::{CreatedPlan, NewTrackingPlan, TrackingPlan, TrackingPlanDocument},
  property::{NewProperty, Property},
  store::CatalogStore,
};

use crate::{
  encode::{
    EVENT_COLUMNS, PLAN_COLUMNS, PROPERTY_COLUMNS, RawEvent, RawPlan, RawProperty,
    encode_dt, encode_rules,
  },
  read::assemble,
  schema::SCHEMA,
  upsert::{is_unique_violation, write_plan_events},
  Error, Result,
};

/// Outcome of a write that may hit a natural-key conflict. Returned from
/// inside a connection closure so the conflict can be reported as a domain
/// error after the transaction has been dropped.
enum Write<T> {
  Done(T),
  Conflict,
}

fn log_query(op: &'static str, rows: usize, started: Instant) {
  debug!(
    op,
    rows,
    elapsed_us = started.elapsed().as_micros() as u64,
    "executed query"
  );
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Trackplan catalog backed by a single SQLite file.
///
/// Cloning shares the inner connection. Every call
/// runs on the connection's dedicated thread, so a plan write holds the
/// connection exclusively for the lifetime of its transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Row count of `table`; lets tests assert on junction tables directly.
  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count)
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Tracking plans: writer ───────────────────────────────────────────────

  async fn create_plan(&self, plan: NewTrackingPlan) -> Result<CreatedPlan> {
    let started = Instant::now();
    let name = plan.name.clone();
    let event_count = plan.events.len();
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let inserted: Option<i64> = tx
          .query_row(
            "INSERT INTO tracking_plans (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT (name) DO NOTHING
             RETURNING id",
            rusqlite::params![plan.name, plan.description, now],
            |row| row.get(0),
          )
          .optional()?;

        // Dropping `tx` without committing rolls it back.
        let Some(id) = inserted else {
          return Ok(Write::Conflict);
        };
        let id = PlanId(id);

        write_plan_events(&tx, id, &plan.events, &now)?;
        tx.commit()?;
        Ok(Write::Done(id))
      })
      .await?;

    match outcome {
      Write::Done(id) => {
        log_query("create_plan", event_count, started);
        info!(plan_id = %id, name = %name, events = event_count, "created tracking plan");
        Ok(CreatedPlan { id })
      }
      Write::Conflict => Err(Error::AlreadyExists(format!("tracking plan {name:?}"))),
    }
  }

  async fn update_plan(&self, id: PlanId, plan: NewTrackingPlan) -> Result<TrackingPlan> {
    let started = Instant::now();
    let name = plan.name.clone();
    let event_count = plan.events.len();
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let updated = tx
          .query_row(
            &format!(
              "UPDATE tracking_plans
               SET name = ?1, description = ?2, updated_at = ?3
               WHERE id = ?4
               RETURNING {PLAN_COLUMNS}"
            ),
            rusqlite::params![plan.name, plan.description, now, id.0],
            RawPlan::from_row,
          )
          .optional();

        let raw = match updated {
          Ok(Some(raw)) => raw,
          Ok(None) => return Ok(Write::Done(None)),
          Err(e) if is_unique_violation(&e) => return Ok(Write::Conflict),
          Err(e) => return Err(e.into()),
        };

        let unlinked = tx.execute(
          "DELETE FROM tracking_plan_events WHERE tracking_plan_id = ?1",
          [id.0],
        )?;

        write_plan_events(&tx, id, &plan.events, &now)?;
        tx.commit()?;
        Ok(Write::Done(Some((raw, unlinked))))
      })
      .await?;

    match outcome {
      Write::Done(Some((raw, unlinked))) => {
        log_query("update_plan", event_count, started);
        info!(
          plan_id = %id,
          name = %name,
          unlinked,
          events = event_count,
          "replaced tracking plan"
        );
        raw.into_plan()
      }
      Write::Done(None) => Err(Error::PlanNotFound(id)),
      Write::Conflict => Err(Error::AlreadyExists(format!("tracking plan {name:?}"))),
    }
  }

  // ── Tracking plans: reader and lifecycle ───────────────────────────────────

  async fn list_plans(&self) -> Result<Vec<TrackingPlanDocument>> {
    let started = Instant::now();

    let raws = self
      .conn
      .call(|conn| {
        let plans = conn
          .prepare(&format!("SELECT {PLAN_COLUMNS} FROM tracking_plans ORDER BY id"))?
          .query_map([], RawPlan::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let documents = plans
          .into_iter()
          .map(|plan| assemble(conn, plan))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(documents)
      })
      .await?;

    log_query("list_plans", raws.len(), started);
    raws.into_iter().map(|raw| raw.into_document()).collect()
  }

  async fn get_plan(&self, id: PlanId) -> Result<Option<TrackingPlan>> {
    let raw: Option<RawPlan> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PLAN_COLUMNS} FROM tracking_plans WHERE id = ?1"),
              [id.0],
              RawPlan::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlan::into_plan).transpose()
  }

  async fn get_plan_document(&self, id: PlanId) -> Result<Option<TrackingPlanDocument>> {
    let started = Instant::now();

    let raw = self
      .conn
      .call(move |conn| {
        let plan = conn
          .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM tracking_plans WHERE id = ?1"),
            [id.0],
            RawPlan::from_row,
          )
          .optional()?;

        Ok(plan.map(|plan| assemble(conn, plan)).transpose()?)
      })
      .await?;

    log_query("get_plan_document", usize::from(raw.is_some()), started);
    raw.map(|raw| raw.into_document()).transpose()
  }

  async fn delete_plan(&self, id: PlanId) -> Result<Option<TrackingPlan>> {
    let raw: Option<RawPlan> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("DELETE FROM tracking_plans WHERE id = ?1 RETURNING {PLAN_COLUMNS}"),
              [id.0],
              RawPlan::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    if raw.is_some() {
      info!(plan_id = %id, "deleted tracking plan");
    }
    raw.map(RawPlan::into_plan).transpose()
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let rows = conn
          .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id"))?
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
              [id.0],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn create_event(&self, event: NewEvent) -> Result<Event> {
    let label = format!("event {:?} ({})", event.name, event.event_type.as_str());
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.query_row(
          &format!(
            "INSERT INTO events (name, type, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {EVENT_COLUMNS}"
          ),
          rusqlite::params![event.name, event.event_type.as_str(), event.description, now],
          RawEvent::from_row,
        );
        match inserted {
          Ok(raw) => Ok(Write::Done(raw)),
          Err(e) if is_unique_violation(&e) => Ok(Write::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done(raw) => raw.into_event(),
      Write::Conflict => Err(Error::AlreadyExists(label)),
    }
  }

  async fn update_event(&self, id: EventId, event: NewEvent) -> Result<Option<Event>> {
    let label = format!("event {:?} ({})", event.name, event.event_type.as_str());
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let updated = conn
          .query_row(
            &format!(
              "UPDATE events SET name = ?1, type = ?2, description = ?3, updated_at = ?4
               WHERE id = ?5
               RETURNING {EVENT_COLUMNS}"
            ),
            rusqlite::params![
              event.name,
              event.event_type.as_str(),
              event.description,
              now,
              id.0,
            ],
            RawEvent::from_row,
          )
          .optional();
        match updated {
          Ok(raw) => Ok(Write::Done(raw)),
          Err(e) if is_unique_violation(&e) => Ok(Write::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done(raw) => raw.map(RawEvent::into_event).transpose(),
      Write::Conflict => Err(Error::AlreadyExists(label)),
    }
  }

  async fn delete_event(&self, id: EventId) -> Result<Option<Event>> {
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("DELETE FROM events WHERE id = ?1 RETURNING {EVENT_COLUMNS}"),
              [id.0],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  // ── Properties ────────────────────────────────────────────────────────────

  async fn list_properties(&self) -> Result<Vec<Property>> {
    let raws: Vec<RawProperty> = self
      .conn
      .call(|conn| {
        let rows = conn
          .prepare(&format!("SELECT {PROPERTY_COLUMNS} FROM properties ORDER BY id"))?
          .query_map([], RawProperty::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProperty::into_property).collect()
  }

  async fn get_property(&self, id: PropertyId) -> Result<Option<Property>> {
    let raw: Option<RawProperty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"),
              [id.0],
              RawProperty::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProperty::into_property).transpose()
  }

  async fn create_property(&self, property: NewProperty) -> Result<Property> {
    let label = format!(
      "property {:?} ({})",
      property.name,
      property.property_type.as_str()
    );
    let rules = encode_rules(property.validation_rules.as_ref());
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.query_row(
          &format!(
            "INSERT INTO properties
               (name, type, description, validation_rules, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {PROPERTY_COLUMNS}"
          ),
          rusqlite::params![
            property.name,
            property.property_type.as_str(),
            property.description,
            rules,
            now,
          ],
          RawProperty::from_row,
        );
        match inserted {
          Ok(raw) => Ok(Write::Done(raw)),
          Err(e) if is_unique_violation(&e) => Ok(Write::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done(raw) => raw.into_property(),
      Write::Conflict => Err(Error::AlreadyExists(label)),
    }
  }

  async fn update_property(
    &self,
    id: PropertyId,
    property: NewProperty,
  ) -> Result<Option<Property>> {
    let label = format!(
      "property {:?} ({})",
      property.name,
      property.property_type.as_str()
    );
    let rules = encode_rules(property.validation_rules.as_ref());
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let updated = conn
          .query_row(
            &format!(
              "UPDATE properties
               SET name = ?1, type = ?2, description = ?3, validation_rules = ?4,
                   updated_at = ?5
               WHERE id = ?6
               RETURNING {PROPERTY_COLUMNS}"
            ),
            rusqlite::params![
              property.name,
              property.property_type.as_str(),
              property.description,
              rules,
              now,
              id.0,
            ],
            RawProperty::from_row,
          )
          .optional();
        match updated {
          Ok(raw) => Ok(Write::Done(raw)),
          Err(e) if is_unique_violation(&e) => Ok(Write::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done(raw) => raw.map(RawProperty::into_property).transpose(),
      Write::Conflict => Err(Error::AlreadyExists(label)),
    }
  }

  async fn delete_property(&self, id: PropertyId) -> Result<Option<Property>> {
    let raw: Option<RawProperty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("DELETE FROM properties WHERE id = ?1 RETURNING {PROPERTY_COLUMNS}"),
              [id.0],
              RawProperty::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProperty::into_property).transpose()
  }
}
