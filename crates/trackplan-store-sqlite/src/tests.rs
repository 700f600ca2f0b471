//! Integration tests for `SqliteStore` against an in-memory database.

use serde_json::json;
use trackplan_core::{
  ErrorKind, StoreError,
  event::{EventType, NewEvent},
  id::{EventId, PlanId, PropertyId},
  plan::{NewTrackingPlan, PlanEventInput, PlanPropertyInput},
  property::{NewProperty, PropertyType},
  store::CatalogStore,
};

use crate::{
  Error, SqliteStore,
  schema::SCHEMA,
  upsert::{link_event_property, link_plan_event, upsert_event, upsert_property},
};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn property(name: &str, property_type: PropertyType, required: bool) -> PlanPropertyInput {
  PlanPropertyInput {
    name: name.into(),
    property_type,
    description: format!("{name} description"),
    required,
    validation_rules: None,
  }
}

fn event(
  name: &str,
  additional_properties: bool,
  properties: Vec<PlanPropertyInput>,
) -> PlanEventInput {
  PlanEventInput {
    name: name.into(),
    event_type: EventType::Track,
    description: format!("{name} description"),
    additional_properties,
    properties,
  }
}

fn plan(name: &str, events: Vec<PlanEventInput>) -> NewTrackingPlan {
  NewTrackingPlan {
    name: name.into(),
    description: format!("{name} description"),
    events,
  }
}

fn purchase_flow() -> NewTrackingPlan {
  NewTrackingPlan {
    name:        "Purchase Flow".into(),
    description: "d".into(),
    events:      vec![PlanEventInput {
      name:                  "Product Viewed".into(),
      event_type:            EventType::Track,
      description:           "e".into(),
      additional_properties: true,
      properties:            vec![PlanPropertyInput {
        name:             "product_id".into(),
        property_type:    PropertyType::String,
        description:      "p".into(),
        required:         true,
        validation_rules: None,
      }],
    }],
  }
}

async fn table_counts(s: &SqliteStore) -> [i64; 5] {
  [
    s.count_rows("tracking_plans").await.unwrap(),
    s.count_rows("events").await.unwrap(),
    s.count_rows("properties").await.unwrap(),
    s.count_rows("tracking_plan_events").await.unwrap(),
    s.count_rows("event_properties").await.unwrap(),
  ]
}

// ─── Upsert / link primitives ────────────────────────────────────────────────

fn raw_conn() -> rusqlite::Connection {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(SCHEMA).unwrap();
  conn
}

const NOW: &str = "2024-01-01T00:00:00+00:00";

#[test]
fn upsert_event_is_idempotent_within_a_transaction() {
  let mut conn = raw_conn();
  let tx = conn.transaction().unwrap();

  let input = event("Signed Up", false, vec![]);
  let first = upsert_event(&tx, &input, NOW).unwrap();
  let second = upsert_event(&tx, &input, NOW).unwrap();
  tx.commit().unwrap();

  assert_eq!(first, second);
  let count: i64 = conn
    .query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))
    .unwrap();
  assert_eq!(count, 1);
}

#[test]
fn upsert_event_is_idempotent_across_transactions() {
  let mut conn = raw_conn();
  let input = event("Signed Up", false, vec![]);

  let tx = conn.transaction().unwrap();
  let first = upsert_event(&tx, &input, NOW).unwrap();
  tx.commit().unwrap();

  let tx = conn.transaction().unwrap();
  let second = upsert_event(&tx, &input, NOW).unwrap();
  tx.commit().unwrap();

  assert_eq!(first, second);
}

#[test]
fn upsert_event_distinguishes_type() {
  let conn = raw_conn();
  let track = event("Home", false, vec![]);
  let mut page = track.clone();
  page.event_type = EventType::Page;

  let a = upsert_event(&conn, &track, NOW).unwrap();
  let b = upsert_event(&conn, &page, NOW).unwrap();
  assert_ne!(a, b);
}

#[test]
fn upsert_keeps_existing_attributes() {
  let conn = raw_conn();
  let original = property("price", PropertyType::Number, true);
  let mut changed = original.clone();
  changed.description = "something else".into();

  let a = upsert_property(&conn, &original, NOW).unwrap();
  let b = upsert_property(&conn, &changed, NOW).unwrap();
  assert_eq!(a, b);

  let description: String = conn
    .query_row("SELECT description FROM properties WHERE id = ?1", [a.0], |r| {
      r.get(0)
    })
    .unwrap();
  assert_eq!(description, "price description");
}

#[test]
fn upsert_propagates_other_constraint_violations() {
  let conn = raw_conn();
  let blank = property("", PropertyType::String, false);
  let err = upsert_property(&conn, &blank, NOW).unwrap_err();
  assert!(matches!(
    err,
    rusqlite::Error::SqliteFailure(ref e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  ));
}

#[test]
fn links_are_first_write_wins() {
  let conn = raw_conn();
  let event_id = upsert_event(&conn, &event("Checkout", false, vec![]), NOW).unwrap();
  let property_id =
    upsert_property(&conn, &property("total", PropertyType::Number, true), NOW).unwrap();

  assert!(link_event_property(&conn, event_id, property_id, true).unwrap());
  assert!(!link_event_property(&conn, event_id, property_id, false).unwrap());

  let required: bool = conn
    .query_row(
      "SELECT required FROM event_properties WHERE event_id = ?1 AND property_id = ?2",
      [event_id.0, property_id.0],
      |r| r.get(0),
    )
    .unwrap();
  assert!(required);

  conn
    .execute(
      "INSERT INTO tracking_plans (name, description, created_at, updated_at)
       VALUES ('p', 'd', ?1, ?1)",
      [NOW],
    )
    .unwrap();
  let plan_id = PlanId(conn.last_insert_rowid());
  assert!(link_plan_event(&conn, plan_id, event_id, false).unwrap());
  assert!(!link_plan_event(&conn, plan_id, event_id, true).unwrap());
}

// ─── Writer / reader ─────────────────────────────────────────────────────────

#[tokio::test]
async fn list_plans_on_empty_store_is_empty() {
  let s = store().await;
  let plans = s.list_plans().await.unwrap();
  assert!(plans.is_empty());
}

#[tokio::test]
async fn create_then_read_back_round_trips() {
  let s = store().await;
  let created = s.create_plan(purchase_flow()).await.unwrap();

  let doc = s.get_plan_document(created.id).await.unwrap().unwrap();
  assert_eq!(doc.id, created.id);
  assert_eq!(doc.name, "Purchase Flow");
  assert_eq!(doc.description, "d");
  assert_eq!(doc.events.len(), 1);

  let ev = &doc.events[0];
  assert_eq!(ev.name, "Product Viewed");
  assert_eq!(ev.event_type, EventType::Track);
  assert_eq!(ev.description, "e");
  assert!(ev.additional_properties);
  assert_eq!(ev.properties.len(), 1);

  let prop = &ev.properties[0];
  assert_eq!(prop.name, "product_id");
  assert_eq!(prop.property_type, PropertyType::String);
  assert!(prop.required);
  assert_eq!(prop.description, "p");

  let all = s.list_plans().await.unwrap();
  assert_eq!(all, vec![doc]);
}

#[tokio::test]
async fn get_plan_missing_returns_none() {
  let s = store().await;
  assert!(s.get_plan(PlanId(42)).await.unwrap().is_none());
  assert!(s.get_plan_document(PlanId(42)).await.unwrap().is_none());
}

#[tokio::test]
async fn list_plans_preserves_input_order() {
  let s = store().await;
  s.create_plan(plan(
    "Checkout",
    vec![
      event(
        "Cart Viewed",
        false,
        vec![
          property("cart_id", PropertyType::String, true),
          property("item_count", PropertyType::Number, false),
        ],
      ),
      event("Order Completed", true, vec![property("paid", PropertyType::Boolean, true)]),
    ],
  ))
  .await
  .unwrap();
  s.create_plan(plan("Auth", vec![event("Logged In", false, vec![])]))
    .await
    .unwrap();

  let plans = s.list_plans().await.unwrap();
  assert_eq!(plans.len(), 2);
  assert_eq!(plans[0].name, "Checkout");
  assert_eq!(plans[1].name, "Auth");

  let names: Vec<_> = plans[0].events.iter().map(|e| e.name.as_str()).collect();
  assert_eq!(names, ["Cart Viewed", "Order Completed"]);

  let props: Vec<_> = plans[0].events[0]
    .properties
    .iter()
    .map(|p| (p.name.as_str(), p.required))
    .collect();
  assert_eq!(props, [("cart_id", true), ("item_count", false)]);
  assert!(plans[1].events[0].properties.is_empty());
}

#[tokio::test]
async fn duplicate_plan_name_is_already_exists_and_writes_nothing() {
  let s = store().await;
  s.create_plan(purchase_flow()).await.unwrap();
  let before = table_counts(&s).await;

  let mut again = purchase_flow();
  again.events.push(event("Brand New", false, vec![property("x", PropertyType::String, true)]));

  let err = s.create_plan(again).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyExists(_)), "got {err:?}");
  assert_eq!(err.kind(), ErrorKind::AlreadyExists);
  assert_eq!(table_counts(&s).await, before);
}

#[tokio::test]
async fn failed_create_rolls_back_everything() {
  let s = store().await;

  let doomed = plan(
    "Doomed",
    vec![
      event("First", false, vec![property("a", PropertyType::String, true)]),
      event("Second", true, vec![property("b", PropertyType::Number, false)]),
      // An empty property name violates the CHECK constraint.
      event("Third", false, vec![property("", PropertyType::String, true)]),
    ],
  );

  let err = s.create_plan(doomed).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)), "got {err:?}");
  assert_eq!(err.kind(), ErrorKind::Storage);

  assert_eq!(table_counts(&s).await, [0; 5]);
  assert!(s.list_plans().await.unwrap().is_empty());
}

#[tokio::test]
async fn shared_events_are_reused_across_plans() {
  let s = store().await;
  let a = s
    .create_plan(plan("A", vec![event("Product Viewed", true, vec![])]))
    .await
    .unwrap();
  let b = s
    .create_plan(plan("B", vec![event("Product Viewed", false, vec![])]))
    .await
    .unwrap();

  assert_eq!(s.list_events().await.unwrap().len(), 1);
  assert_eq!(s.count_rows("tracking_plan_events").await.unwrap(), 2);

  let doc_a = s.get_plan_document(a.id).await.unwrap().unwrap();
  let doc_b = s.get_plan_document(b.id).await.unwrap().unwrap();
  assert!(doc_a.events[0].additional_properties);
  assert!(!doc_b.events[0].additional_properties);
}

#[tokio::test]
async fn repeated_event_in_one_plan_keeps_first_flags() {
  let s = store().await;
  let created = s
    .create_plan(plan(
      "Dupes",
      vec![
        event("Clicked", true, vec![property("target", PropertyType::String, true)]),
        event("Clicked", false, vec![property("target", PropertyType::String, false)]),
      ],
    ))
    .await
    .unwrap();

  let doc = s.get_plan_document(created.id).await.unwrap().unwrap();
  assert_eq!(doc.events.len(), 1);
  assert!(doc.events[0].additional_properties);
  assert_eq!(doc.events[0].properties.len(), 1);
  assert!(doc.events[0].properties[0].required);
}

#[tokio::test]
async fn update_replaces_associations_not_entities() {
  let s = store().await;
  let created = s
    .create_plan(plan(
      "Flow",
      vec![
        event("A", false, vec![property("a_prop", PropertyType::String, true)]),
        event("B", false, vec![]),
      ],
    ))
    .await
    .unwrap();

  let updated = s
    .update_plan(created.id, plan("Flow v2", vec![event("C", true, vec![])]))
    .await
    .unwrap();
  assert_eq!(updated.id, created.id);
  assert_eq!(updated.name, "Flow v2");
  assert!(updated.updated_at >= updated.created_at);

  let doc = s.get_plan_document(created.id).await.unwrap().unwrap();
  let names: Vec<_> = doc.events.iter().map(|e| e.name.as_str()).collect();
  assert_eq!(names, ["C"]);

  let events: Vec<_> = s
    .list_events()
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.name)
    .collect();
  assert_eq!(events, ["A", "B", "C"]);
  assert_eq!(s.list_properties().await.unwrap().len(), 1);
  assert_eq!(s.count_rows("event_properties").await.unwrap(), 1);
}

#[tokio::test]
async fn failed_update_leaves_previous_state() {
  let s = store().await;
  let created = s.create_plan(purchase_flow()).await.unwrap();
  let before_doc = s.get_plan_document(created.id).await.unwrap().unwrap();
  let before = table_counts(&s).await;

  let broken = plan(
    "Renamed",
    vec![
      event("X", false, vec![]),
      event("Y", false, vec![]),
      event("Z", false, vec![property("", PropertyType::Boolean, true)]),
    ],
  );
  let err = s.update_plan(created.id, broken).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Storage);

  assert_eq!(table_counts(&s).await, before);
  let after_doc = s.get_plan_document(created.id).await.unwrap().unwrap();
  assert_eq!(after_doc, before_doc);
}

#[tokio::test]
async fn update_missing_plan_is_not_found() {
  let s = store().await;
  let err = s
    .update_plan(PlanId(99), plan("Ghost", vec![event("Boo", false, vec![])]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PlanNotFound(PlanId(99))), "got {err:?}");
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(table_counts(&s).await, [0; 5]);
}

#[tokio::test]
async fn update_onto_taken_name_is_already_exists() {
  let s = store().await;
  s.create_plan(plan("Taken", vec![])).await.unwrap();
  let other = s.create_plan(plan("Other", vec![])).await.unwrap();

  let err = s
    .update_plan(other.id, plan("Taken", vec![]))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::AlreadyExists);
  assert_eq!(s.get_plan(other.id).await.unwrap().unwrap().name, "Other");
}

#[tokio::test]
async fn delete_plan_returns_row_and_keeps_entities() {
  let s = store().await;
  let created = s.create_plan(purchase_flow()).await.unwrap();

  let deleted = s.delete_plan(created.id).await.unwrap().unwrap();
  assert_eq!(deleted.id, created.id);
  assert_eq!(deleted.name, "Purchase Flow");

  assert!(s.get_plan(created.id).await.unwrap().is_none());
  assert_eq!(s.count_rows("tracking_plan_events").await.unwrap(), 0);
  assert_eq!(s.list_events().await.unwrap().len(), 1);
  assert_eq!(s.list_properties().await.unwrap().len(), 1);
  assert_eq!(s.count_rows("event_properties").await.unwrap(), 1);

  assert!(s.delete_plan(created.id).await.unwrap().is_none());
}

// ─── Events ──────────────────────────────────────────────────────────────────

fn new_event(name: &str, event_type: EventType) -> NewEvent {
  NewEvent {
    name: name.into(),
    event_type,
    description: format!("{name} description"),
  }
}

#[tokio::test]
async fn event_crud() {
  let s = store().await;

  let created = s.create_event(new_event("Page Loaded", EventType::Page)).await.unwrap();
  assert_eq!(created.event_type, EventType::Page);

  let fetched = s.get_event(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);

  let updated = s
    .update_event(created.id, new_event("Page Rendered", EventType::Page))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Page Rendered");
  assert_eq!(updated.created_at, created.created_at);

  let deleted = s.delete_event(created.id).await.unwrap().unwrap();
  assert_eq!(deleted.name, "Page Rendered");
  assert!(s.get_event(created.id).await.unwrap().is_none());
  assert!(s.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_event_conflict_propagates() {
  let s = store().await;
  s.create_event(new_event("Opened", EventType::Track)).await.unwrap();
  let err = s
    .create_event(new_event("Opened", EventType::Track))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::AlreadyExists);

  // Same name, different type is a distinct event.
  s.create_event(new_event("Opened", EventType::Screen)).await.unwrap();
  assert_eq!(s.list_events().await.unwrap().len(), 2);
}

#[tokio::test]
async fn create_event_storage_failure_propagates() {
  let s = store().await;
  let err = s
    .create_event(new_event("", EventType::Track))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Storage);
}

#[tokio::test]
async fn update_and_delete_missing_event_return_none() {
  let s = store().await;
  let missing = EventId(7);
  assert!(
    s.update_event(missing, new_event("Nope", EventType::Track))
      .await
      .unwrap()
      .is_none()
  );
  assert!(s.delete_event(missing).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_event_drops_its_links() {
  let s = store().await;
  let created = s.create_plan(purchase_flow()).await.unwrap();
  let event_id = s.list_events().await.unwrap()[0].id;

  s.delete_event(event_id).await.unwrap().unwrap();

  assert_eq!(s.count_rows("tracking_plan_events").await.unwrap(), 0);
  assert_eq!(s.count_rows("event_properties").await.unwrap(), 0);
  let doc = s.get_plan_document(created.id).await.unwrap().unwrap();
  assert!(doc.events.is_empty());
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn property_crud_with_validation_rules() {
  let s = store().await;
  let rules = json!({ "minimum": 0, "maximum": 100 });

  let created = s
    .create_property(NewProperty {
      name:             "percent".into(),
      property_type:    PropertyType::Number,
      description:      "A percentage".into(),
      validation_rules: Some(rules.clone()),
    })
    .await
    .unwrap();
  assert_eq!(created.validation_rules.as_ref(), Some(&rules));

  let fetched = s.get_property(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);

  let updated = s
    .update_property(created.id, NewProperty {
      name:             "percent".into(),
      property_type:    PropertyType::Number,
      description:      "Still a percentage".into(),
      validation_rules: None,
    })
    .await
    .unwrap()
    .unwrap();
  assert!(updated.validation_rules.is_none());
  assert_eq!(updated.description, "Still a percentage");

  assert!(s.delete_property(created.id).await.unwrap().is_some());
  assert!(s.get_property(created.id).await.unwrap().is_none());
  assert!(s.delete_property(PropertyId(123)).await.unwrap().is_none());
}

#[tokio::test]
async fn plan_write_reuses_standalone_property() {
  let s = store().await;
  let existing = s
    .create_property(NewProperty {
      name:             "product_id".into(),
      property_type:    PropertyType::String,
      description:      "from the catalogue".into(),
      validation_rules: Some(json!({ "pattern": "^P" })),
    })
    .await
    .unwrap();

  s.create_plan(purchase_flow()).await.unwrap();

  let props = s.list_properties().await.unwrap();
  assert_eq!(props.len(), 1);
  assert_eq!(props[0].id, existing.id);
  assert_eq!(props[0].description, "from the catalogue");
}

#[tokio::test]
async fn update_property_onto_existing_key_conflicts() {
  let s = store().await;
  let make = |name: &str| NewProperty {
    name:             name.into(),
    property_type:    PropertyType::Boolean,
    description:      "flag".into(),
    validation_rules: None,
  };
  s.create_property(make("enabled")).await.unwrap();
  let other = s.create_property(make("visible")).await.unwrap();

  let err = s.update_property(other.id, make("enabled")).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyExists(_)), "got {err:?}");
}
