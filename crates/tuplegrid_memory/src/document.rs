//! Document layout of tuples and associations.
//!
//! An entity is a map of its columns. An association stored inside its
//! owner is an array under the field named by its collection role; stored
//! on its own it is a map with the owner table, the association key and the
//! same `rows` array. Rows drop the association key columns, and a row left
//! with only its one distinguishing row key column is stored as that bare
//! value.

use std::collections::BTreeMap;
use std::sync::Arc;

use tuplegrid_codec::Value;
use tuplegrid_core::{
    Association, AssociationKey, AssociationKeyMetadata, EntityKey, GridResult,
    MapAssociationSnapshot, MapTupleSnapshot, Revision, RowKey, RowKeyBuilder, Tuple,
    TupleOperationKind,
};

use crate::datastore::DocumentId;
use crate::error::MemoryError;

/// Field holding the rows of a standalone association document.
pub const ROWS_FIELD: &str = "rows";
/// Field holding the association key columns of a standalone document.
pub const KEY_FIELD: &str = "key";
/// Field holding the association table of a standalone document.
pub const TABLE_FIELD: &str = "table";

pub(crate) fn columns_of(document: &Value, id: &DocumentId) -> GridResult<BTreeMap<String, Value>> {
    let entries = document
        .as_map()
        .ok_or_else(|| MemoryError::corrupted(id, "document is not a map"))?;
    let mut columns = BTreeMap::new();
    for (name, value) in entries {
        let name = name
            .as_text()
            .ok_or_else(|| MemoryError::corrupted(id, "field name is not text"))?;
        columns.insert(name.to_string(), value.clone());
    }
    Ok(columns)
}

fn insert_key_columns(columns: &mut BTreeMap<String, Value>, names: &[String], values: &[Value]) {
    for (name, value) in names.iter().zip(values) {
        columns.insert(name.clone(), value.clone());
    }
}

/// Columns of a fresh document for `key`.
pub(crate) fn key_columns(key: &EntityKey) -> BTreeMap<String, Value> {
    let mut columns = BTreeMap::new();
    insert_key_columns(&mut columns, key.column_names(), key.column_values());
    columns
}

pub(crate) fn tuple_from_columns(columns: BTreeMap<String, Value>, revision: Option<Revision>) -> Tuple {
    Tuple::from_snapshot(Arc::new(MapTupleSnapshot::new(columns).with_revision(revision)))
}

pub(crate) fn tuple_from_document(
    document: &Value,
    revision: Revision,
    id: &DocumentId,
) -> GridResult<Tuple> {
    Ok(tuple_from_columns(columns_of(document, id)?, Some(revision)))
}

/// The document `key` holds after `tuple` is written over `current`.
///
/// Existing fields the tuple never touched, such as embedded associations,
/// are kept.
pub(crate) fn merge_tuple(
    current: Option<&Value>,
    tuple: &Tuple,
    key: &EntityKey,
    id: &DocumentId,
) -> GridResult<Value> {
    let mut columns = match current {
        Some(document) => {
            let mut columns = columns_of(document, id)?;
            for operation in tuple.operations() {
                match &operation.kind {
                    TupleOperationKind::Put(value) => {
                        columns.insert(operation.column.clone(), value.clone());
                    }
                    TupleOperationKind::PutNull => {
                        columns.insert(operation.column.clone(), Value::Null);
                    }
                    TupleOperationKind::Remove => {
                        columns.remove(&operation.column);
                    }
                }
            }
            columns
        }
        None => tuple.to_columns(),
    };
    insert_key_columns(&mut columns, key.column_names(), key.column_values());
    Ok(Value::text_map(columns))
}

fn row_to_value(metadata: &AssociationKeyMetadata, bare: Option<&str>, tuple: &Tuple) -> Value {
    let mut columns = tuple.to_columns();
    columns.retain(|column, _| !metadata.is_key_column(column));
    if columns.len() == 1 {
        // maps stay wrapped so they cannot be mistaken for a row
        let single = bare.and_then(|column| columns.get(column)).filter(|v| v.as_map().is_none());
        if let Some(value) = single {
            return value.clone();
        }
    }
    Value::text_map(columns)
}

/// Rows of `association` in document form.
pub(crate) fn rows_to_value(metadata: &AssociationKeyMetadata, association: &Association) -> Value {
    let bare = metadata.single_row_key_column_not_contained_in_association_key();
    Value::Array(
        association
            .rows()
            .iter()
            .map(|(_, tuple)| row_to_value(metadata, bare, tuple))
            .collect(),
    )
}

/// Rebuilds rows, restoring the association key columns.
pub(crate) fn rows_from_value(
    key: &AssociationKey,
    rows: &Value,
    id: &DocumentId,
) -> GridResult<Vec<(RowKey, Tuple)>> {
    let metadata = key.metadata();
    let elements = rows
        .as_array()
        .ok_or_else(|| MemoryError::corrupted(id, "association rows are not an array"))?;
    let builder = RowKeyBuilder::new().add_columns(metadata.row_key_column_names());
    let bare = metadata.single_row_key_column_not_contained_in_association_key();

    let mut result = Vec::with_capacity(elements.len());
    for element in elements {
        let mut columns = match (element, bare) {
            (Value::Map(_), _) => columns_of(element, id)?,
            (value, Some(column)) => BTreeMap::from([(column.to_string(), value.clone())]),
            (_, None) => {
                return Err(MemoryError::corrupted(id, "bare row value without a row key column").into())
            }
        };
        insert_key_columns(&mut columns, key.column_names(), key.column_values());
        let tuple = tuple_from_columns(columns, None);
        let row_key = builder.build(&tuple)?;
        result.push((row_key, tuple));
    }
    Ok(result)
}

pub(crate) fn association_from_rows(rows: Vec<(RowKey, Tuple)>, revision: Option<Revision>) -> Association {
    Association::from_snapshot(Arc::new(MapAssociationSnapshot::new(rows).with_revision(revision)))
}

/// Standalone document of `association`.
pub(crate) fn association_document(key: &AssociationKey, association: &Association) -> Value {
    let key_columns = key
        .column_names()
        .iter()
        .cloned()
        .zip(key.column_values().iter().cloned());
    Value::text_map([
        (TABLE_FIELD, Value::from(key.table())),
        (KEY_FIELD, Value::text_map(key_columns)),
        (ROWS_FIELD, rows_to_value(key.metadata(), association)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplegrid_core::{AssociationKind, EntityKeyMetadata};

    fn owner() -> EntityKey {
        let meta = Arc::new(EntityKeyMetadata::new("Person", ["id"]));
        EntityKey::new(meta, [Value::Integer(1)]).unwrap()
    }

    fn nicknames() -> AssociationKey {
        let meta = AssociationKeyMetadata::builder("Person_nicknames", ["person_id"])
            .row_key_column_names(["person_id", "nickname"])
            .collection_role("nicknames")
            .kind(AssociationKind::EmbeddedCollection)
            .build();
        AssociationKey::new(meta, [Value::Integer(1)], owner()).unwrap()
    }

    fn addresses() -> AssociationKey {
        let meta = AssociationKeyMetadata::builder("Person_addresses", ["person_id"])
            .row_key_column_names(["person_id", "street", "city"])
            .collection_role("addresses")
            .kind(AssociationKind::EmbeddedCollection)
            .build();
        AssociationKey::new(meta, [Value::Integer(1)], owner()).unwrap()
    }

    fn row(key: &AssociationKey, columns: &[(&str, Value)]) -> (RowKey, Tuple) {
        let mut tuple = Tuple::new();
        tuple.put("person_id", Value::Integer(1));
        for (name, value) in columns {
            tuple.put(*name, value.clone());
        }
        let row_key = RowKeyBuilder::new()
            .add_columns(key.metadata().row_key_column_names())
            .build(&tuple)
            .unwrap();
        (row_key, tuple)
    }

    fn id() -> DocumentId {
        DocumentId::Entity(owner())
    }

    #[test]
    fn single_column_rows_are_bare_values() {
        let key = nicknames();
        let mut association = Association::new();
        let (rk, t) = row(&key, &[("nickname", Value::from("Bob"))]);
        association.put(rk, t);

        let value = rows_to_value(key.metadata(), &association);
        assert_eq!(value, Value::Array(vec![Value::from("Bob")]));

        let rows = rows_from_value(&key, &value, &id()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.get("person_id"), Some(Value::Integer(1)));
        assert_eq!(rows[0].1.get("nickname"), Some(Value::from("Bob")));
    }

    #[test]
    fn multi_column_rows_drop_key_columns() {
        let key = addresses();
        let mut association = Association::new();
        let (rk, t) = row(
            &key,
            &[("street", Value::from("Main")), ("city", Value::from("Springfield"))],
        );
        association.put(rk.clone(), t);

        let value = rows_to_value(key.metadata(), &association);
        let expected = Value::text_map([
            ("city", Value::from("Springfield")),
            ("street", Value::from("Main")),
        ]);
        assert_eq!(value, Value::Array(vec![expected]));

        let rows = rows_from_value(&key, &value, &id()).unwrap();
        assert_eq!(rows[0].0, rk);
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let key = owner();
        let current = Value::text_map([
            ("id", Value::Integer(1)),
            ("name", Value::from("Alice")),
            ("nicknames", Value::Array(vec![Value::from("Al")])),
        ]);
        let mut tuple = tuple_from_document(&current, Revision::first(b"x"), &id()).unwrap();
        tuple.put("name", "Alicia");
        tuple.remove("missing");

        let merged = merge_tuple(Some(&current), &tuple, &key, &id()).unwrap();
        assert_eq!(merged.get("name"), Some(&Value::from("Alicia")));
        assert_eq!(merged.get("nicknames"), Some(&Value::Array(vec![Value::from("Al")])));
    }

    #[test]
    fn fresh_documents_get_key_columns() {
        let mut tuple = Tuple::new();
        tuple.put("name", "Alice");
        let merged = merge_tuple(None, &tuple, &owner(), &id()).unwrap();
        assert_eq!(merged.get("id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn malformed_rows_are_backend_errors() {
        let err = rows_from_value(&addresses(), &Value::from("oops"), &id()).unwrap_err();
        assert!(matches!(err, tuplegrid_core::GridError::Backend(_)));
        let err = rows_from_value(&addresses(), &Value::Array(vec![Value::Integer(3)]), &id())
            .unwrap_err();
        assert!(matches!(err, tuplegrid_core::GridError::Backend(_)));
    }

    #[test]
    fn standalone_document_layout() {
        let key = nicknames();
        let mut association = Association::new();
        let (rk, t) = row(&key, &[("nickname", Value::from("Bob"))]);
        association.put(rk, t);
        let doc = association_document(&key, &association);
        assert_eq!(doc.get(TABLE_FIELD), Some(&Value::from("Person_nicknames")));
        assert_eq!(
            doc.get(KEY_FIELD),
            Some(&Value::text_map([("person_id", Value::Integer(1))]))
        );
        assert_eq!(doc.get(ROWS_FIELD), Some(&Value::Array(vec![Value::from("Bob")])));
    }
}
