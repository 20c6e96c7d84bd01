//! Association storage layouts as seen in the stored documents.

use std::sync::Arc;

use tuplegrid_core::{
    Association, AssociationStorageStrategy, Config, GridDialect, MapAssociationSnapshot, Value,
};
use tuplegrid_memory::{
    AssociationCollection, MapDatastore, MapDialect, GLOBAL_ASSOCIATION_COLLECTION, KEY_FIELD,
    ROWS_FIELD, TABLE_FIELD,
};
use tuplegrid_testkit::prelude::*;

fn setup() -> (Arc<MapDatastore>, MapDialect) {
    init_tracing();
    let store = Arc::new(MapDatastore::new());
    (Arc::clone(&store), MapDialect::new(store))
}

fn insert_person(dialect: &MapDialect, config: &Config, id: i64) {
    let key = person_key(id);
    let ctx = config.tuple_context(key.metadata());
    let mut tuple = dialect.create_tuple(&key, &ctx);
    tuple.put("name", format!("person {id}"));
    dialect.update_tuple(tuple, &key, &ctx).unwrap();
}

#[test]
fn embedded_rows_land_in_the_owner_document() {
    let (store, dialect) = setup();
    // even a document-storage configuration keeps embedded collections in the entity
    let config = config_for(AssociationStorageStrategy::DedicatedCollection);
    insert_person(&dialect, &config, 1);

    let key = addresses_key(1);
    let ctx = config.association_context(&key);
    let mut association = dialect.create_association(&key, &ctx).unwrap();
    assert_eq!(association.size(), 0);
    assert!(association.is_new());

    let (main, main_row) = address_row(1, "Main", "Springfield");
    let (elm, elm_row) = address_row(1, "Elm", "Shelbyville");
    association.put(main.clone(), main_row);
    association.put(elm.clone(), elm_row);
    dialect.update_association(association, &key, &ctx).unwrap();

    assert_eq!(store.association_document_count(), 0);
    let document = store.entity_document(&person_key(1)).unwrap().unwrap();
    let rows = document.get("addresses").unwrap().as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // association key columns are not repeated in embedded rows
    assert_eq!(
        rows[0],
        Value::text_map([
            ("city", Value::from("Springfield")),
            ("street", Value::from("Main")),
        ])
    );

    let owner = dialect
        .get_tuple(&person_key(1), &config.tuple_context(&person_metadata()))
        .unwrap()
        .unwrap();
    assert!(owner.get("addresses").is_some());

    let loaded = dialect.get_association(&key, &ctx).unwrap().unwrap();
    assert_eq!(loaded.size(), 2);
    assert_eq!(loaded.row_keys(), vec![main.clone(), elm]);
    assert_eq!(
        loaded.get(&main).unwrap().get("person_id"),
        Some(Value::Integer(1))
    );
}

#[test]
fn single_column_rows_are_stored_bare() {
    let (store, dialect) = setup();
    let config = Config::default();
    insert_person(&dialect, &config, 2);

    let key = tags_key(2);
    let ctx = config.association_context(&key);
    let mut association = dialect.create_association(&key, &ctx).unwrap();
    for tag in ["red", "blue"] {
        let (row_key, row) = tag_row(2, tag);
        association.put(row_key, row);
    }
    dialect.update_association(association, &key, &ctx).unwrap();

    let document = store.entity_document(&person_key(2)).unwrap().unwrap();
    assert_eq!(
        document.get("tags"),
        Some(&Value::Array(vec![Value::from("red"), Value::from("blue")]))
    );

    let loaded = dialect.get_association(&key, &ctx).unwrap().unwrap();
    let (red, _) = tag_row(2, "red");
    assert_eq!(loaded.get(&red).unwrap().get("tag"), Some(Value::from("red")));
    assert_eq!(loaded.size(), 2);
}

#[test]
fn document_strategies_use_their_collections() {
    let (store, dialect) = setup();

    for (owner, strategy, collection) in [
        (
            10,
            AssociationStorageStrategy::DedicatedCollection,
            AssociationCollection::dedicated("Person_friends"),
        ),
        (
            11,
            AssociationStorageStrategy::GlobalCollection,
            AssociationCollection::Global,
        ),
    ] {
        let config = config_for(strategy);
        insert_person(&dialect, &config, owner);
        let key = friends_key(owner);
        let ctx = config.association_context(&key);
        let mut association = dialect.create_association(&key, &ctx).unwrap();
        let (row_key, row) = friend_row(owner, 99);
        association.put(row_key, row);
        dialect.update_association(association, &key, &ctx).unwrap();

        let document = store.association_document(&collection, &key).unwrap().unwrap();
        assert_eq!(document.get(TABLE_FIELD), Some(&Value::from("Person_friends")));
        assert_eq!(
            document.get(KEY_FIELD),
            Some(&Value::text_map([("person_id", Value::Integer(owner))]))
        );
        assert_eq!(
            document.get(ROWS_FIELD),
            Some(&Value::Array(vec![Value::Integer(99)]))
        );
        let owner_doc = store.entity_document(&person_key(owner)).unwrap().unwrap();
        assert!(owner_doc.get("friends").is_none());
    }

    assert_eq!(
        store.association_collections(),
        vec![
            GLOBAL_ASSOCIATION_COLLECTION.to_string(),
            "associations_Person_friends".to_string(),
        ]
    );
}

#[test]
fn emptied_association_is_removed() {
    let (store, dialect) = setup();
    let config = config_for(AssociationStorageStrategy::GlobalCollection);
    insert_person(&dialect, &config, 20);
    let key = friends_key(20);
    let ctx = config.association_context(&key);

    let mut association = dialect.create_association(&key, &ctx).unwrap();
    let (row_key, row) = friend_row(20, 21);
    association.put(row_key, row);
    dialect.update_association(association, &key, &ctx).unwrap();
    assert_eq!(store.association_document_count(), 1);

    let mut loaded = dialect.get_association(&key, &ctx).unwrap().unwrap();
    loaded.clear();
    dialect.update_association(loaded, &key, &ctx).unwrap();
    assert_eq!(store.association_document_count(), 0);
    assert!(dialect.get_association(&key, &ctx).unwrap().is_none());
}

#[test]
fn association_for_missing_owner_is_created_with_the_owner_keys() {
    let (store, dialect) = setup();
    let config = Config::default();
    let key = addresses_key(30);
    let ctx = config.association_context(&key);

    // an empty association over a missing owner writes nothing
    dialect
        .update_association(Association::new(), &key, &ctx)
        .unwrap();
    assert_eq!(store.entity_count(), 0);

    let mut association = dialect.create_association(&key, &ctx).unwrap();
    let (row_key, row) = address_row(30, "Main", "Springfield");
    association.put(row_key, row);
    dialect.update_association(association, &key, &ctx).unwrap();

    let owner = store.entity_document(&person_key(30)).unwrap().unwrap();
    assert_eq!(owner.get("id"), Some(&Value::Integer(30)));
    assert!(owner.get("addresses").is_some());
}

#[test]
fn snapshots_are_not_aliased_with_the_store() {
    let (_store, dialect) = setup();
    let config = Config::default();
    insert_person(&dialect, &config, 40);
    let key = addresses_key(40);
    let ctx = config.association_context(&key);
    let mut association = dialect.create_association(&key, &ctx).unwrap();
    let (row_key, row) = address_row(40, "Main", "Springfield");
    association.put(row_key.clone(), row);
    dialect.update_association(association, &key, &ctx).unwrap();

    let mut first = dialect.get_association(&key, &ctx).unwrap().unwrap();
    first.remove(&row_key);
    assert!(first.is_empty());

    let second = dialect.get_association(&key, &ctx).unwrap().unwrap();
    assert_eq!(second.size(), 1);
    let snapshot = second.snapshot().as_any().downcast_ref::<MapAssociationSnapshot>();
    assert_eq!(snapshot.map(|s| s.rows().count()), Some(1));
}
