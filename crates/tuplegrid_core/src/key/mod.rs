//! Identity model: entity, association, row and id-source keys.
//!
//! Every key is a shape (metadata or plain column names) plus an immutable
//! sequence of column values, with the hash computed once at
//! construction. Column names and values live in `Arc<[T]>`, so callers can
//! share them freely but only ever see `&[T]`.

mod association;
mod entity;
mod id_source;
mod metadata;
mod row;

pub use association::AssociationKey;
pub use entity::EntityKey;
pub use id_source::{IdSourceKey, IdSourceKeyMetadata, IdSourceType};
pub use metadata::{
    AssociatedEntityKeyMetadata, AssociationKeyMetadata, AssociationKeyMetadataBuilder,
    AssociationKind, AssociationType, EntityKeyMetadata,
};
pub use row::{RowKey, RowKeyBuilder};

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tuplegrid_codec::Value;

use crate::error::{GridError, GridResult};

/// Anything that describes the column layout of a key.
pub(crate) trait KeyShape: Hash + Eq {
    fn key_column_names(&self) -> &[String];
}

impl KeyShape for [String] {
    fn key_column_names(&self) -> &[String] {
        self
    }
}

impl KeyShape for EntityKeyMetadata {
    fn key_column_names(&self) -> &[String] {
        self.column_names()
    }
}

impl KeyShape for AssociationKeyMetadata {
    fn key_column_names(&self) -> &[String] {
        self.column_names()
    }
}

/// Shared body of every key kind.
///
/// Equality compares the precomputed hash, then the values, then the shape,
/// which orders the checks from cheapest-discriminating to most expensive.
pub(crate) struct KeyBody<S: ?Sized> {
    shape: Arc<S>,
    values: Arc<[Value]>,
    hash: u64,
}

impl<S: KeyShape + ?Sized> KeyBody<S> {
    pub(crate) fn new(shape: Arc<S>, values: Arc<[Value]>) -> GridResult<Self> {
        let columns = shape.key_column_names().len();
        if columns != values.len() {
            return Err(GridError::KeyShape {
                columns,
                values: values.len(),
            });
        }
        let mut hasher = DefaultHasher::new();
        shape.hash(&mut hasher);
        values.hash(&mut hasher);
        Ok(Self {
            shape,
            values,
            hash: hasher.finish(),
        })
    }

    pub(crate) fn shape(&self) -> &Arc<S> {
        &self.shape
    }

    pub(crate) fn column_names(&self) -> &[String] {
        self.shape.key_column_names()
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn value_of(&self, column: &str) -> GridResult<&Value> {
        self.column_names()
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| GridError::unknown_key_column(column))
    }

    pub(crate) fn fmt_columns(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.column_names().iter().zip(self.values.iter()).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}=")?;
            fmt_value(value, f)?;
        }
        f.write_str("}")
    }
}

impl<S: ?Sized> Clone for KeyBody<S> {
    fn clone(&self) -> Self {
        Self {
            shape: Arc::clone(&self.shape),
            values: Arc::clone(&self.values),
            hash: self.hash,
        }
    }
}

impl<S: KeyShape + ?Sized> PartialEq for KeyBody<S> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.values == other.values
            && (Arc::ptr_eq(&self.shape, &other.shape) || self.shape == other.shape)
    }
}

impl<S: KeyShape + ?Sized> Eq for KeyBody<S> {}

impl<S: ?Sized> Hash for KeyBody<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<S: KeyShape + fmt::Debug + ?Sized> fmt::Debug for KeyBody<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBody")
            .field("shape", &self.shape)
            .field("values", &self.values)
            .finish()
    }
}

fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Integer(n) => write!(f, "{n}"),
        Value::Float(x) => write!(f, "{x}"),
        Value::Text(s) => write!(f, "{s:?}"),
        Value::Uuid(u) => write!(f, "{u}"),
        Value::Timestamp(ms) => write!(f, "@{ms}"),
        other => write!(f, "{other:?}"),
    }
}

/// Any key, tagged with its kind.
///
/// Used where heterogeneous keys meet: document ids inside backends and
/// error reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// An entity row.
    Entity(EntityKey),
    /// One association instance.
    Association(AssociationKey),
    /// One row inside an association.
    Row(RowKey),
}

impl Key {
    /// Table of the key, if its kind has one.
    pub fn table(&self) -> Option<&str> {
        match self {
            Key::Entity(k) => Some(k.table()),
            Key::Association(k) => Some(k.table()),
            Key::Row(_) => None,
        }
    }

    /// Column names of the key.
    pub fn column_names(&self) -> &[String] {
        match self {
            Key::Entity(k) => k.column_names(),
            Key::Association(k) => k.column_names(),
            Key::Row(k) => k.column_names(),
        }
    }

    /// Column values of the key, parallel to [`Key::column_names`].
    pub fn column_values(&self) -> &[Value] {
        match self {
            Key::Entity(k) => k.column_values(),
            Key::Association(k) => k.column_values(),
            Key::Row(k) => k.column_values(),
        }
    }
}

impl From<EntityKey> for Key {
    fn from(key: EntityKey) -> Self {
        Key::Entity(key)
    }
}

impl From<AssociationKey> for Key {
    fn from(key: AssociationKey) -> Self {
        Key::Association(key)
    }
}

impl From<RowKey> for Key {
    fn from(key: RowKey) -> Self {
        Key::Row(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Entity(k) => fmt::Display::fmt(k, f),
            Key::Association(k) => fmt::Display::fmt(k, f),
            Key::Row(k) => fmt::Display::fmt(k, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Arc<EntityKeyMetadata> {
        Arc::new(EntityKeyMetadata::new("Person", ["id"]))
    }

    #[test]
    fn key_variants_are_distinct() {
        let entity = EntityKey::new(person(), [Value::Integer(1)]).unwrap();
        let row = RowKey::new(["id"], [Value::Integer(1)]).unwrap();
        assert_ne!(Key::from(entity.clone()), Key::from(row));
        assert_eq!(Key::from(entity.clone()), Key::Entity(entity));
    }

    #[test]
    fn key_display() {
        let entity = EntityKey::new(person(), [Value::Integer(7)]).unwrap();
        assert_eq!(Key::from(entity).to_string(), "Person{id=7}");

        let row = RowKey::new(["person_id", "street"], [Value::Integer(7), Value::from("Main")])
            .unwrap();
        assert_eq!(row.to_string(), "Row{person_id=7, street=\"Main\"}");
    }

    #[test]
    fn key_accessors() {
        let key = Key::from(EntityKey::new(person(), [Value::Integer(3)]).unwrap());
        assert_eq!(key.table(), Some("Person"));
        assert_eq!(key.column_names(), ["id".to_string()]);
        assert_eq!(key.column_values(), [Value::Integer(3)]);

        let row = Key::from(RowKey::new(["a"], [Value::Null]).unwrap());
        assert_eq!(row.table(), None);
    }
}
