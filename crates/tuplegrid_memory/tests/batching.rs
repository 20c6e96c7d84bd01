//! Batched execution through `BatchingDialect` over the in-memory backend.

use std::sync::Arc;

use tuplegrid_core::{
    BatchingDialect, Config, GridDialect, GridError, MultiGetDialect, OperationsQueue, Value,
};
use tuplegrid_memory::{MapDatastore, MapDialect};
use tuplegrid_testkit::prelude::*;

struct Fixture {
    store: Arc<MapDatastore>,
    dialect: BatchingDialect<MapDialect>,
    config: Config,
}

fn setup() -> Fixture {
    init_tracing();
    let store = Arc::new(MapDatastore::new());
    Fixture {
        dialect: BatchingDialect::new(MapDialect::new(Arc::clone(&store))),
        store,
        config: Config::new().batching(true),
    }
}

impl Fixture {
    fn insert_now(&self, id: i64, name: &str) {
        let ctx = self.config.tuple_context(&person_metadata());
        let tuple = tuple_of([("name", Value::from(name))]);
        self.dialect.update_tuple(tuple, &person_key(id), &ctx).unwrap();
    }

    fn stored_name(&self, id: i64) -> Option<Value> {
        self.store
            .entity_document(&person_key(id))
            .unwrap()
            .and_then(|doc| doc.get("name").cloned())
    }
}

#[test]
fn unqueued_writes_apply_immediately() {
    let fx = setup();
    fx.insert_now(1, "Alice");
    assert_eq!(fx.stored_name(1), Some(Value::from("Alice")));
}

#[test]
fn queued_writes_wait_for_execute() {
    let fx = setup();
    let queue = OperationsQueue::new();
    let ctx = fx.config.batched_tuple_context(&person_metadata(), &queue);

    for id in 1..=3 {
        let mut tuple = fx.dialect.create_tuple(&person_key(id), &ctx);
        tuple.put("name", format!("p{id}"));
        fx.dialect.update_tuple(tuple, &person_key(id), &ctx).unwrap();
    }
    assert_eq!(queue.len(), 3);
    assert_eq!(fx.store.entity_count(), 0);

    fx.dialect.execute_batch(&queue).unwrap();
    assert!(queue.is_empty());
    assert_eq!(fx.store.entity_count(), 3);
    assert_eq!(fx.stored_name(2), Some(Value::from("p2")));
}

#[test]
fn reads_see_pending_writes() {
    let fx = setup();
    fx.insert_now(1, "Alice");
    fx.insert_now(2, "Bob");
    let queue = OperationsQueue::new();
    let ctx = fx.config.batched_tuple_context(&person_metadata(), &queue);

    let mut alice = fx.dialect.get_tuple(&person_key(1), &ctx).unwrap().unwrap();
    alice.put("name", "Alicia");
    fx.dialect.update_tuple(alice, &person_key(1), &ctx).unwrap();
    fx.dialect.remove_tuple(&person_key(2), &ctx).unwrap();
    let new = tuple_of([("name", Value::from("Carol"))]);
    fx.dialect.update_tuple(new, &person_key(3), &ctx).unwrap();

    let pending = fx.dialect.get_tuple(&person_key(1), &ctx).unwrap().unwrap();
    assert_eq!(pending.get("name"), Some(Value::from("Alicia")));
    assert_eq!(pending.get("id"), Some(Value::Integer(1)));
    assert!(fx.dialect.get_tuple(&person_key(2), &ctx).unwrap().is_none());

    let many = fx
        .dialect
        .inner()
        .get_tuples(&[person_key(1), person_key(2), person_key(3), person_key(4)], &ctx)
        .unwrap();
    let names: Vec<_> = many
        .iter()
        .map(|tuple| tuple.as_ref().and_then(|t| t.get("name")))
        .collect();
    assert_eq!(
        names,
        vec![Some(Value::from("Alicia")), None, Some(Value::from("Carol")), None]
    );

    // the store itself is untouched until the flush
    assert_eq!(fx.stored_name(1), Some(Value::from("Alice")));
    assert_eq!(fx.stored_name(2), Some(Value::from("Bob")));

    fx.dialect.execute_batch(&queue).unwrap();
    assert_eq!(fx.stored_name(1), Some(Value::from("Alicia")));
    assert_eq!(fx.stored_name(2), None);
    assert_eq!(fx.stored_name(3), Some(Value::from("Carol")));
}

#[test]
fn pending_associations_are_visible_in_the_batch() {
    let fx = setup();
    fx.insert_now(1, "Alice");
    let queue = OperationsQueue::new();
    let key = addresses_key(1);
    let ctx = fx.config.batched_association_context(&key, &queue);

    let mut association = fx.dialect.create_association(&key, &ctx).unwrap();
    let (row_key, row) = address_row(1, "Main", "Springfield");
    association.put(row_key.clone(), row);
    fx.dialect.update_association(association, &key, &ctx).unwrap();

    let pending = fx.dialect.get_association(&key, &ctx).unwrap().unwrap();
    assert_eq!(pending.row_keys(), vec![row_key]);
    let unbatched = fx.config.association_context(&key);
    assert!(fx.dialect.get_association(&key, &unbatched).unwrap().is_none());

    fx.dialect.remove_association(&key, &ctx).unwrap();
    assert!(fx.dialect.get_association(&key, &ctx).unwrap().is_none());

    fx.dialect.execute_batch(&queue).unwrap();
    assert!(fx.dialect.get_association(&key, &unbatched).unwrap().is_none());
}

#[test]
fn cleared_batch_leaves_no_trace() {
    let fx = setup();
    fx.insert_now(1, "Alice");
    let queue = OperationsQueue::new();
    let ctx = fx.config.batched_tuple_context(&person_metadata(), &queue);

    fx.dialect.remove_tuple(&person_key(1), &ctx).unwrap();
    assert!(fx.dialect.get_tuple(&person_key(1), &ctx).unwrap().is_none());

    fx.dialect.clear_batch(&queue);
    let reread = fx.dialect.get_tuple(&person_key(1), &ctx).unwrap().unwrap();
    assert_eq!(reread.get("name"), Some(Value::from("Alice")));
    fx.dialect.execute_batch(&queue).unwrap();
    assert_eq!(fx.stored_name(1), Some(Value::from("Alice")));
}

#[test]
fn failing_batch_applies_nothing() {
    let fx = setup();
    fx.insert_now(1, "Alice");
    let stale = fx
        .dialect
        .get_tuple(&person_key(1), &fx.config.tuple_context(&person_metadata()))
        .unwrap()
        .unwrap();
    let mut fresh = stale.clone();
    fresh.put("name", "Bob");
    fx.dialect
        .update_tuple(fresh, &person_key(1), &fx.config.tuple_context(&person_metadata()))
        .unwrap();

    let queue = OperationsQueue::new();
    let ctx = fx.config.batched_tuple_context(&person_metadata(), &queue);
    fx.dialect
        .update_tuple(tuple_of([("name", Value::from("Carol"))]), &person_key(2), &ctx)
        .unwrap();
    let mut stale = stale;
    stale.put("name", "Mallory");
    fx.dialect.update_tuple(stale, &person_key(1), &ctx).unwrap();

    let err = fx.dialect.execute_batch(&queue).unwrap_err();
    assert!(err.is_conflict());
    assert!(queue.is_empty());
    assert_eq!(fx.stored_name(1), Some(Value::from("Bob")));
    assert_eq!(fx.stored_name(2), None);
}

#[test]
fn checks_in_a_flush_use_the_state_before_it() {
    let fx = setup();
    fx.insert_now(1, "Alice");
    let queue = OperationsQueue::new();
    let tuple_ctx = fx.config.batched_tuple_context(&person_metadata(), &queue);
    let key = addresses_key(1);
    let association_ctx = fx.config.batched_association_context(&key, &queue);

    // owner update and in-entity association loaded at the same revision
    let mut owner = fx.dialect.get_tuple(&person_key(1), &tuple_ctx).unwrap().unwrap();
    let mut association = fx.dialect.create_association(&key, &association_ctx).unwrap();
    owner.put("name", "Alicia");
    fx.dialect.update_tuple(owner, &person_key(1), &tuple_ctx).unwrap();
    let (row_key, row) = address_row(1, "Main", "Springfield");
    association.put(row_key, row);
    fx.dialect
        .update_association(association, &key, &association_ctx)
        .unwrap();

    fx.dialect.execute_batch(&queue).unwrap();
    let document = fx.store.entity_document(&person_key(1)).unwrap().unwrap();
    assert_eq!(document.get("name"), Some(&Value::from("Alicia")));
    assert!(document.get("addresses").is_some());
}

#[test]
fn batch_scope_executes_on_success_and_discards_on_error() {
    let fx = setup();
    let config = fx.config.clone();

    fx.dialect
        .batch(|queue| {
            let ctx = config.batched_tuple_context(&person_metadata(), queue);
            let tuple = tuple_of([("name", Value::from("Alice"))]);
            fx.dialect.update_tuple(tuple, &person_key(1), &ctx)
        })
        .unwrap();
    assert_eq!(fx.stored_name(1), Some(Value::from("Alice")));

    let err = fx
        .dialect
        .batch(|queue| {
            let ctx = config.batched_tuple_context(&person_metadata(), queue);
            let tuple = tuple_of([("name", Value::from("Bob"))]);
            fx.dialect.update_tuple(tuple, &person_key(2), &ctx)?;
            Err::<(), _>(GridError::invalid_operation("abort"))
        })
        .unwrap_err();
    assert!(matches!(err, GridError::InvalidOperation { .. }));
    assert_eq!(fx.stored_name(2), None);
}

#[test]
fn batching_switch_off_executes_immediately() {
    let fx = setup();
    let config = Config::new();
    let queue = OperationsQueue::new();
    let ctx = config.batched_tuple_context(&person_metadata(), &queue);
    let tuple = tuple_of([("name", Value::from("Alice"))]);
    fx.dialect.update_tuple(tuple, &person_key(1), &ctx).unwrap();
    assert!(queue.is_empty());
    assert_eq!(fx.stored_name(1), Some(Value::from("Alice")));
}
