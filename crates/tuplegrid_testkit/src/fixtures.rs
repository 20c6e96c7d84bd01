//! Fixtures for a small `Person` model.
//!
//! `Person` entities own three associations:
//! - `addresses`: embedded collection, rows keyed by `(person_id, street)`
//!   with a `city` column
//! - `tags`: embedded collection of plain strings, rows keyed by
//!   `(person_id, tag)`
//! - `friends`: entity association to other `Person`s, rows keyed by
//!   `(person_id, friend_id)`

use std::sync::Arc;

use tuplegrid_codec::Value;
use tuplegrid_core::{
    AssociatedEntityKeyMetadata, AssociationDocumentStorageType, AssociationKey,
    AssociationKeyMetadata, AssociationKind, AssociationStorageStrategy, AssociationStorageType,
    AssociationType, Config, EntityKey, EntityKeyMetadata, IdSourceKey, IdSourceKeyMetadata,
    NextValueRequest, OptionSet, RowKey, Tuple,
};

/// Entity table used by the fixtures.
pub const PERSON_TABLE: &str = "Person";

/// Metadata of the `Person` entity, keyed by `id`.
pub fn person_metadata() -> Arc<EntityKeyMetadata> {
    Arc::new(EntityKeyMetadata::new(PERSON_TABLE, ["id"]))
}

/// Key of the person with `id`.
pub fn person_key(id: i64) -> EntityKey {
    EntityKey::new(person_metadata(), [Value::Integer(id)]).expect("valid person key")
}

/// A tuple holding the given columns.
pub fn tuple_of<const N: usize>(columns: [(&str, Value); N]) -> Tuple {
    columns.into_iter().collect()
}

/// Metadata of the embedded `addresses` collection.
pub fn addresses_metadata() -> Arc<AssociationKeyMetadata> {
    AssociationKeyMetadata::builder("Person_addresses", ["person_id"])
        .row_key_column_names(["person_id", "street"])
        .collection_role("addresses")
        .kind(AssociationKind::EmbeddedCollection)
        .association_type(AssociationType::Set)
        .build()
}

/// Key of the `addresses` collection of person `owner`.
pub fn addresses_key(owner: i64) -> AssociationKey {
    AssociationKey::new(addresses_metadata(), [Value::Integer(owner)], person_key(owner))
        .expect("valid addresses key")
}

/// One `addresses` row.
pub fn address_row(owner: i64, street: &str, city: &str) -> (RowKey, Tuple) {
    let key = RowKey::new(
        ["person_id", "street"],
        [Value::Integer(owner), Value::from(street)],
    )
    .expect("valid address row key");
    let tuple = tuple_of([
        ("person_id", Value::Integer(owner)),
        ("street", Value::from(street)),
        ("city", Value::from(city)),
    ]);
    (key, tuple)
}

/// Metadata of the embedded `tags` collection.
pub fn tags_metadata() -> Arc<AssociationKeyMetadata> {
    AssociationKeyMetadata::builder("Person_tags", ["person_id"])
        .row_key_column_names(["person_id", "tag"])
        .collection_role("tags")
        .kind(AssociationKind::EmbeddedCollection)
        .build()
}

/// Key of the `tags` collection of person `owner`.
pub fn tags_key(owner: i64) -> AssociationKey {
    AssociationKey::new(tags_metadata(), [Value::Integer(owner)], person_key(owner))
        .expect("valid tags key")
}

/// One `tags` row.
pub fn tag_row(owner: i64, tag: &str) -> (RowKey, Tuple) {
    let key = RowKey::new(["person_id", "tag"], [Value::Integer(owner), Value::from(tag)])
        .expect("valid tag row key");
    let tuple = tuple_of([
        ("person_id", Value::Integer(owner)),
        ("tag", Value::from(tag)),
    ]);
    (key, tuple)
}

/// Metadata of the `friends` association between persons.
pub fn friends_metadata() -> Arc<AssociationKeyMetadata> {
    AssociationKeyMetadata::builder("Person_friends", ["person_id"])
        .row_key_column_names(["person_id", "friend_id"])
        .associated_entity_key_metadata(AssociatedEntityKeyMetadata::new(
            ["friend_id"],
            person_metadata(),
        ))
        .collection_role("friends")
        .kind(AssociationKind::Association)
        .build()
}

/// Key of the `friends` association of person `owner`.
pub fn friends_key(owner: i64) -> AssociationKey {
    AssociationKey::new(friends_metadata(), [Value::Integer(owner)], person_key(owner))
        .expect("valid friends key")
}

/// One `friends` row.
pub fn friend_row(owner: i64, friend: i64) -> (RowKey, Tuple) {
    let key = RowKey::new(
        ["person_id", "friend_id"],
        [Value::Integer(owner), Value::Integer(friend)],
    )
    .expect("valid friend row key");
    let tuple = tuple_of([
        ("person_id", Value::Integer(owner)),
        ("friend_id", Value::Integer(friend)),
    ]);
    (key, tuple)
}

/// A configuration under which entity associations resolve to `strategy`.
///
/// Embedded collections resolve in-entity whatever the configuration.
pub fn config_for(strategy: AssociationStorageStrategy) -> Config {
    let options = match strategy {
        AssociationStorageStrategy::InEntity => {
            OptionSet::new().association_storage(AssociationStorageType::InEntity)
        }
        AssociationStorageStrategy::DedicatedCollection => OptionSet::new()
            .association_storage(AssociationStorageType::AssociationDocument)
            .association_document_storage(AssociationDocumentStorageType::CollectionPerAssociation),
        AssociationStorageStrategy::GlobalCollection => OptionSet::new()
            .association_storage(AssociationStorageType::AssociationDocument)
            .association_document_storage(AssociationDocumentStorageType::GlobalCollection),
    };
    Config::new().global_options(options)
}

/// All three strategies.
pub const STRATEGIES: [AssociationStorageStrategy; 3] = [
    AssociationStorageStrategy::InEntity,
    AssociationStorageStrategy::DedicatedCollection,
    AssociationStorageStrategy::GlobalCollection,
];

/// Request for the next value of sequence `name`.
pub fn sequence_request(name: &str, increment: i64, initial_value: i64) -> NextValueRequest {
    let key = IdSourceKey::for_sequence(IdSourceKeyMetadata::for_sequence(name))
        .expect("valid sequence key");
    NextValueRequest::new(key, increment, initial_value)
}

/// Request for the next value of segment `segment` in a table generator.
pub fn table_request(segment: &str, increment: i64, initial_value: i64) -> NextValueRequest {
    let metadata = IdSourceKeyMetadata::for_table("hibernate_sequences", "sequence_name", "next_val");
    let key = IdSourceKey::for_table(metadata, segment).expect("valid table key");
    NextValueRequest::new(key, increment, initial_value)
}
