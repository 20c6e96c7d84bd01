//! Dialect conformance harness.
//!
//! Runs the behaviour every [`GridDialect`] must share against a concrete
//! backend. Checks panic on failure, so they are meant to be called from
//! `#[test]` functions. Each check writes its own keys; a fresh, empty
//! backend is expected but checks do not depend on one another.

use std::collections::HashSet;
use std::sync::Arc;

use tuplegrid_codec::Value;
use tuplegrid_core::{
    AssociationStorageStrategy, BatchingDialect, Config, EntityKey, EntityKeyMetadata,
    GridDialect, GridError, Tuple, TupleContext,
};

use crate::fixtures::{
    address_row, addresses_key, config_for, friend_row, friends_key, person_key, person_metadata,
    sequence_request, tuple_of, STRATEGIES,
};

/// Runs the shared dialect checks against one backend.
pub struct DialectHarness<D> {
    dialect: Arc<D>,
    config: Config,
}

impl<D: GridDialect> DialectHarness<D> {
    /// Creates a harness over `dialect` with the default configuration.
    pub fn new(dialect: D) -> Self {
        Self {
            dialect: Arc::new(dialect),
            config: Config::default(),
        }
    }

    /// The dialect under test.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    fn tuple_context(&self) -> TupleContext {
        self.config.tuple_context(&person_metadata())
    }

    fn insert_person(&self, id: i64, name: &str) {
        let ctx = self.tuple_context();
        let key = person_key(id);
        let mut tuple = self.dialect.create_tuple(&key, &ctx);
        tuple.put("name", name);
        self.dialect
            .update_tuple(tuple, &key, &ctx)
            .expect("Failed to insert person");
    }

    fn load_person(&self, id: i64) -> Option<Tuple> {
        self.dialect
            .get_tuple(&person_key(id), &self.tuple_context())
            .expect("Failed to load person")
    }

    /// Runs every check.
    pub fn run_all(&self) {
        self.check_create_tuple_is_local();
        self.check_tuple_round_trip();
        self.check_duplicate_insert();
        self.check_stale_tuple_write();
        self.check_remove_tuple();
        self.check_embedded_collection();
        self.check_association_strategies();
        self.check_for_each_tuple();
        self.check_next_value();
        self.check_batch_isolation();
    }

    /// `create_tuple` hands out a new tuple without writing anything.
    pub fn check_create_tuple_is_local(&self) {
        let ctx = self.tuple_context();
        let tuple = self.dialect.create_tuple(&person_key(100), &ctx);
        assert!(tuple.is_new());
        assert!(self.load_person(100).is_none(), "create_tuple must not persist");
    }

    /// Written columns come back on the next read; removed ones do not.
    pub fn check_tuple_round_trip(&self) {
        self.insert_person(110, "Alice");
        let mut loaded = self.load_person(110).expect("person 110 exists");
        assert!(!loaded.is_new());
        assert_eq!(loaded.get("name"), Some(Value::from("Alice")));
        assert_eq!(loaded.get("id"), Some(Value::Integer(110)));

        loaded.put("age", 42i64);
        loaded.remove("name");
        self.dialect
            .update_tuple(loaded, &person_key(110), &self.tuple_context())
            .expect("Failed to update person");

        let reloaded = self.load_person(110).expect("person 110 exists");
        assert_eq!(reloaded.get("age"), Some(Value::Integer(42)));
        assert_eq!(reloaded.get("name"), None);
    }

    /// Inserting over an existing entity fails.
    pub fn check_duplicate_insert(&self) {
        self.insert_person(120, "Alice");
        let ctx = self.tuple_context();
        let mut second = self.dialect.create_tuple(&person_key(120), &ctx);
        second.put("name", "Bob");
        let err = self
            .dialect
            .update_tuple(second, &person_key(120), &ctx)
            .expect_err("duplicate insert must fail");
        assert!(matches!(err, GridError::TupleAlreadyExists { .. }), "{err}");
        let stored = self.load_person(120).expect("person 120 exists");
        assert_eq!(stored.get("name"), Some(Value::from("Alice")));
    }

    /// The second of two writers holding the same revision loses.
    pub fn check_stale_tuple_write(&self) {
        self.insert_person(130, "Alice");
        let mut first = self.load_person(130).expect("person 130 exists");
        let mut second = self.load_person(130).expect("person 130 exists");
        let ctx = self.tuple_context();

        first.put("name", "Bob");
        self.dialect
            .update_tuple(first, &person_key(130), &ctx)
            .expect("first writer succeeds");

        second.put("name", "Carol");
        let err = self
            .dialect
            .update_tuple(second, &person_key(130), &ctx)
            .expect_err("stale writer must fail");
        assert!(err.is_conflict(), "{err}");
        let stored = self.load_person(130).expect("person 130 exists");
        assert_eq!(stored.get("name"), Some(Value::from("Bob")));
    }

    /// Removed entities are gone; removing twice is not an error.
    pub fn check_remove_tuple(&self) {
        self.insert_person(140, "Alice");
        let ctx = self.tuple_context();
        self.dialect
            .remove_tuple(&person_key(140), &ctx)
            .expect("Failed to remove person");
        assert!(self.load_person(140).is_none());
        self.dialect
            .remove_tuple(&person_key(140), &ctx)
            .expect("second remove is a no-op");
    }

    /// Two rows added to an empty embedded collection are found embedded in
    /// the owner and reload with exactly those row keys.
    pub fn check_embedded_collection(&self) {
        self.insert_person(150, "Alice");
        let key = addresses_key(150);
        let ctx = self.config.association_context(&key);
        assert!(self.dialect.is_stored_in_entity_structure(
            key.metadata(),
            ctx.association_type_context()
        ));
        assert!(self
            .dialect
            .get_association(&key, &ctx)
            .expect("Failed to load addresses")
            .is_none());

        let mut association = self
            .dialect
            .create_association(&key, &ctx)
            .expect("Failed to create addresses");
        assert_eq!(association.size(), 0);
        let (main, main_row) = address_row(150, "Main", "Springfield");
        let (elm, elm_row) = address_row(150, "Elm", "Shelbyville");
        association.put(main.clone(), main_row);
        association.put(elm.clone(), elm_row);
        self.dialect
            .update_association(association, &key, &ctx)
            .expect("Failed to update addresses");

        let owner = self.load_person(150).expect("person 150 exists");
        assert!(
            owner.get("addresses").is_some(),
            "rows must be embedded in the owner"
        );
        assert_eq!(owner.get("name"), Some(Value::from("Alice")));

        let loaded = self
            .dialect
            .get_association(&key, &ctx)
            .expect("Failed to load addresses")
            .expect("addresses exist");
        assert_eq!(loaded.size(), 2);
        let keys: HashSet<_> = loaded.row_keys().into_iter().collect();
        assert_eq!(keys, HashSet::from([main.clone(), elm]));
        assert_eq!(
            loaded.get(&main).and_then(|row| row.get("city")),
            Some(Value::from("Springfield"))
        );
    }

    /// Entity associations survive a write, an update and a removal under
    /// every storage strategy.
    pub fn check_association_strategies(&self) {
        for (offset, strategy) in (0i64..).zip(STRATEGIES) {
            self.check_association_lifecycle(160 + offset * 10, strategy);
        }
    }

    fn check_association_lifecycle(&self, owner: i64, strategy: AssociationStorageStrategy) {
        let config = config_for(strategy);
        self.insert_person(owner, "Owner");
        let key = friends_key(owner);
        let ctx = config.association_context(&key);

        let mut association = self
            .dialect
            .create_association(&key, &ctx)
            .expect("Failed to create friends");
        let (a, a_row) = friend_row(owner, owner + 1);
        let (b, b_row) = friend_row(owner, owner + 2);
        association.put(a.clone(), a_row);
        association.put(b.clone(), b_row);
        self.dialect
            .update_association(association, &key, &ctx)
            .expect("Failed to write friends");

        let mut loaded = self
            .dialect
            .get_association(&key, &ctx)
            .expect("Failed to load friends")
            .unwrap_or_else(|| panic!("friends missing under {strategy:?}"));
        assert_eq!(loaded.size(), 2, "{strategy:?}");
        assert_eq!(
            loaded.get(&b).and_then(|row| row.get("friend_id")),
            Some(Value::Integer(owner + 2))
        );

        loaded.remove(&a);
        self.dialect
            .update_association(loaded, &key, &ctx)
            .expect("Failed to update friends");
        let loaded = self
            .dialect
            .get_association(&key, &ctx)
            .expect("Failed to load friends")
            .expect("friends exist");
        assert_eq!(loaded.row_keys(), vec![b], "{strategy:?}");

        self.dialect
            .remove_association(&key, &ctx)
            .expect("Failed to remove friends");
        assert!(
            self.dialect
                .get_association(&key, &ctx)
                .expect("Failed to load friends")
                .is_none(),
            "{strategy:?}"
        );
        let owner_tuple = self.load_person(owner).expect("owner survives");
        assert_eq!(owner_tuple.get("name"), Some(Value::from("Owner")));
    }

    /// Every stored tuple of the requested shapes is visited exactly once.
    pub fn check_for_each_tuple(&self) {
        let scanned = Arc::new(EntityKeyMetadata::new("Scanned", ["id"]));
        let other = Arc::new(EntityKeyMetadata::new("Ignored", ["id"]));
        let ctx = self.config.tuple_context(&scanned);
        for (metadata, ids) in [(&scanned, 0..5i64), (&other, 0..3i64)] {
            for id in ids {
                let key = EntityKey::new(Arc::clone(metadata), [Value::Integer(id)])
                    .expect("valid key");
                let tuple = tuple_of([("n", Value::Integer(id))]);
                self.dialect
                    .update_tuple(tuple, &key, &ctx)
                    .expect("Failed to insert tuple");
            }
        }

        let mut seen = Vec::new();
        self.dialect
            .for_each_tuple(
                &mut |metadata, tuple| {
                    assert_eq!(metadata.table(), "Scanned");
                    seen.push(tuple.get("n"));
                    Ok(())
                },
                &[Arc::clone(&scanned)],
            )
            .expect("Failed to scan");
        seen.sort_by_key(|value| value.as_ref().and_then(Value::as_integer));
        let expected: Vec<_> = (0..5).map(|n| Some(Value::Integer(n))).collect();
        assert_eq!(seen, expected);

        let mut visited = 0;
        let err = self
            .dialect
            .for_each_tuple(
                &mut |_, _| {
                    visited += 1;
                    Err(GridError::invalid_operation("stop"))
                },
                &[scanned],
            )
            .expect_err("consumer error must propagate");
        assert!(matches!(err, GridError::InvalidOperation { .. }));
        assert_eq!(visited, 1);
    }

    /// Sequences start at the initial value and advance by the increment.
    pub fn check_next_value(&self) {
        if !self.dialect.supports_sequences() {
            return;
        }
        let request = sequence_request("conformance_seq", 5, 10);
        let values: Vec<i64> = (0..3)
            .map(|_| self.dialect.next_value(&request).expect("Failed to fetch value"))
            .collect();
        assert_eq!(values, [10, 15, 20]);
    }

    /// Batched writes are invisible until executed and gone once cleared.
    pub fn check_batch_isolation(&self) {
        if !self.dialect.capabilities().supports_batch() {
            return;
        }
        let batching = BatchingDialect::new(Arc::clone(&self.dialect));
        let config = Config::new().batching(true);
        let queue = tuplegrid_core::OperationsQueue::new();
        let ctx = config.batched_tuple_context(&person_metadata(), &queue);

        let mut tuple = batching.create_tuple(&person_key(200), &ctx);
        tuple.put("name", "Queued");
        batching
            .update_tuple(tuple, &person_key(200), &ctx)
            .expect("Failed to queue insert");
        assert!(self.load_person(200).is_none(), "queued write leaked");
        batching.execute_batch(&queue).expect("Failed to execute batch");
        assert!(self.load_person(200).is_some());

        let mut tuple = batching.create_tuple(&person_key(201), &ctx);
        tuple.put("name", "Discarded");
        batching
            .update_tuple(tuple, &person_key(201), &ctx)
            .expect("Failed to queue insert");
        batching.clear_batch(&queue);
        batching.execute_batch(&queue).expect("Failed to execute batch");
        assert!(self.load_person(201).is_none(), "cleared write applied");
    }
}
