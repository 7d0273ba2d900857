//! Integration tests for the catalog services.

use std::time::{Duration, Instant};

use refcat_core::catalog::{models, ModelRegistry};
use refcat_core::{seed_demo, CatalogService, Error, Store, StoreConfig, Value};
use serde_json::json;

struct TestContext {
    service: CatalogService,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreConfig::new(dir.path().join("catalog.db"))).unwrap();
        let registry = ModelRegistry::build(models::declared()).registry;
        store.create_schema(&registry).unwrap();

        Self {
            service: CatalogService::new(registry, store),
            _dir: dir,
        }
    }

    fn seeded() -> Self {
        let ctx = Self::new();
        assert!(seed_demo(&ctx.service).unwrap());
        ctx
    }

    fn count(&self, catalog: &str) -> usize {
        let model = self.service.resolve(catalog).unwrap();
        self.service.store().session().unwrap().count(model).unwrap()
    }
}

fn ids(rows: &[refcat_core::CatalogRow]) -> Vec<i64> {
    rows.iter()
        .map(|r| r.get("id").and_then(Value::as_int).unwrap())
        .collect()
}

#[test]
fn test_insert_single_record_with_default_null() {
    let ctx = TestContext::new();

    let inserted = ctx
        .service
        .insert_rows("section", &json!({"title": "Test"}))
        .unwrap();
    assert_eq!(inserted, 1);

    let rows = ctx.service.fetch_rows("section", 1).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("title"), Some(&Value::Text("Test".into())));
    assert_eq!(rows[0].get("description"), Some(&Value::Null));
    assert!(matches!(rows[0].get("id"), Some(Value::Int(_))));
}

#[test]
fn test_insert_batch_is_all_or_nothing_on_validation() {
    let ctx = TestContext::new();

    let payload = json!([
        {"title": "first"},
        {"title": 42},
        {"title": "third"},
    ]);
    let err = ctx.service.insert_rows("section", &payload).unwrap_err();

    match err {
        Error::Validation(v) => {
            assert_eq!(v.issues.len(), 1);
            assert_eq!(v.issues[0].record, Some(1));
            assert_eq!(v.issues[0].field, "title");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ctx.count("section"), 0);
}

#[test]
fn test_insert_batch_rolls_back_on_storage_failure() {
    let ctx = TestContext::seeded();
    let before = ctx.count("indicators");

    // The second record references a value type that does not exist.
    let payload = json!([
        {"title": "fine", "value_type_id": 1},
        {"title": "dangling", "value_type_id": 99},
    ]);
    let err = ctx.service.insert_rows("indicators", &payload).unwrap_err();

    assert!(matches!(err, Error::Storage(_)));
    assert_eq!(ctx.count("indicators"), before);
}

#[test]
fn test_insert_many() {
    let ctx = TestContext::seeded();

    let payload = json!([
        {"title": "Type 3", "section_id": 1},
        {"title": "Type 4", "section_id": 2, "description": "fourth"},
    ]);
    assert_eq!(ctx.service.insert_rows("indicator_types", &payload).unwrap(), 2);
    assert_eq!(ctx.count("indicator_types"), 4);
}

#[test]
fn test_fetch_direct_scope() {
    let ctx = TestContext::seeded();

    let rows = ctx.service.fetch_rows("indicator_types", 2).unwrap();
    assert_eq!(ids(&rows), vec![2]);
    assert_eq!(rows[0].get("section_id"), Some(&Value::Int(2)));
}

#[test]
fn test_fetch_inherited_scope() {
    let ctx = TestContext::seeded();

    let rows = ctx.service.fetch_rows("indicators", 1).unwrap();
    assert_eq!(ids(&rows), vec![1, 3]);
    for row in &rows {
        assert_eq!(row.get("section_id"), Some(&Value::Int(1)));
        assert_eq!(
            row.names().collect::<Vec<_>>(),
            vec!["id", "title", "value_type_id", "is_used", "section_id"]
        );
    }
    assert_eq!(rows[0].get("is_used"), Some(&Value::Bool(true)));

    let rows = ctx.service.fetch_rows("indicators", 2).unwrap();
    assert_eq!(ids(&rows), vec![2]);

    assert!(ctx.service.fetch_rows("indicators", 7).unwrap().is_empty());
}

#[test]
fn test_fetch_unscoped_returns_everything() {
    let ctx = TestContext::seeded();

    let rows = ctx.service.fetch_rows("section", 12345).unwrap();
    assert_eq!(ids(&rows), vec![1, 2]);
}

#[test]
fn test_unknown_catalog() {
    let ctx = TestContext::new();

    assert!(matches!(
        ctx.service.fetch_rows("unknown", 1),
        Err(Error::NotFound(name)) if name == "unknown"
    ));
    assert!(matches!(
        ctx.service.insert_rows("unknown", &json!({})),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_dynamic_model_is_writable_but_not_listed() {
    let ctx = TestContext::new();

    assert!(ctx
        .service
        .list_catalogs()
        .iter()
        .all(|c| c.name != "advices_d"));

    ctx.service
        .insert_rows("advices_d", &json!({"dt": "2024-05-01T10:00:00Z"}))
        .unwrap();
    let rows = ctx.service.fetch_rows("advices_d", 0).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(matches!(rows[0].get("dt"), Some(Value::DateTime(_))));
}

#[test]
fn test_seed_is_skipped_when_data_exists() {
    let ctx = TestContext::seeded();
    assert!(!seed_demo(&ctx.service).unwrap());
    assert_eq!(ctx.count("section"), 2);
}

#[test]
fn test_storage_failure_on_read() {
    let ctx = TestContext::seeded();
    ctx.service
        .store()
        .session()
        .unwrap()
        .execute_batch("DROP TABLE indicators")
        .unwrap();

    let err = ctx.service.fetch_rows("indicators", 1).unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(!err.is_client_error());
}

#[test]
fn test_insert_after_deadline_writes_nothing() {
    let ctx = TestContext::new();

    let late = ctx.service.until(Instant::now());
    let err = late.insert_rows("section", &json!({"title": "late"})).unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded));
    assert_eq!(ctx.count("section"), 0);
}

#[test]
fn test_insert_blocked_by_lock_gives_up_at_deadline() {
    let ctx = TestContext::new();
    let blocker = ctx.service.store().session().unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let started = Instant::now();
    let bounded = ctx.service.until(started + Duration::from_millis(100));
    let err = bounded
        .insert_rows("section", &json!({"title": "late"}))
        .unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded), "got {err:?}");
    // Well short of the store's own busy timeout.
    assert!(started.elapsed() < Duration::from_secs(2));

    drop(blocker);
    assert_eq!(ctx.count("section"), 0);

    // The same service without a deadline still writes.
    ctx.service
        .insert_rows("section", &json!({"title": "on time"}))
        .unwrap();
    assert_eq!(ctx.count("section"), 1);
}

#[test]
fn test_read_blocked_by_lock_gives_up_at_deadline() {
    let ctx = TestContext::seeded();
    let blocker = ctx.service.store().session().unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let bounded = ctx.service.until(Instant::now() + Duration::from_millis(100));
    let err = bounded.fetch_rows("indicators", 1).unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded), "got {err:?}");

    drop(blocker);
    let retry = ctx.service.until(Instant::now() + Duration::from_secs(5));
    assert_eq!(ids(&retry.fetch_rows("indicators", 1).unwrap()), vec![1, 3]);
}
