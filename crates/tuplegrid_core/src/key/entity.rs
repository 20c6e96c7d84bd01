use std::fmt;
use std::sync::Arc;

use tuplegrid_codec::Value;

use super::{EntityKeyMetadata, KeyBody};
use crate::error::GridResult;

/// Identifies one entity row.
///
/// Keys of the same entity type share one [`EntityKeyMetadata`]; the key
/// itself only carries the column values.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    body: KeyBody<EntityKeyMetadata>,
}

impl EntityKey {
    /// Creates an entity key.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::KeyShape`](crate::GridError::KeyShape) if the
    /// number of values differs from the number of key columns.
    pub fn new(
        metadata: Arc<EntityKeyMetadata>,
        values: impl Into<Arc<[Value]>>,
    ) -> GridResult<Self> {
        Ok(Self {
            body: KeyBody::new(metadata, values.into())?,
        })
    }

    /// Returns the shared metadata.
    pub fn metadata(&self) -> &Arc<EntityKeyMetadata> {
        self.body.shape()
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        self.body.shape().table()
    }

    /// Returns the key column names.
    pub fn column_names(&self) -> &[String] {
        self.body.column_names()
    }

    /// Returns the key column values.
    pub fn column_values(&self) -> &[Value] {
        self.body.values()
    }

    /// Returns the value of one key column.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnknownKeyColumn`](crate::GridError::UnknownKeyColumn)
    /// if `column` is not a key column.
    pub fn column_value(&self, column: &str) -> GridResult<&Value> {
        self.body.value_of(column)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())?;
        self.body.fmt_columns(f)
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridError;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &EntityKey) -> u64 {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    fn order_line() -> Arc<EntityKeyMetadata> {
        Arc::new(EntityKeyMetadata::new("OrderLine", ["order_id", "line"]))
    }

    #[test]
    fn equal_keys_from_equal_parts() {
        let a = EntityKey::new(order_line(), vec![Value::Integer(1), Value::Integer(2)]).unwrap();
        let b = EntityKey::new(order_line(), vec![Value::Integer(1), Value::Integer(2)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn changing_one_value_breaks_equality() {
        let a = EntityKey::new(order_line(), [Value::Integer(1), Value::Integer(2)]).unwrap();
        let b = EntityKey::new(order_line(), [Value::Integer(1), Value::Integer(3)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_tables_are_different_keys() {
        let other = Arc::new(EntityKeyMetadata::new("Invoice", ["order_id", "line"]));
        let a = EntityKey::new(order_line(), [Value::Integer(1), Value::Integer(2)]).unwrap();
        let b = EntityKey::new(other, [Value::Integer(1), Value::Integer(2)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn mismatched_lengths_fail_at_construction() {
        let err = EntityKey::new(order_line(), [Value::Integer(1)]).unwrap_err();
        assert!(matches!(
            err,
            GridError::KeyShape {
                columns: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn column_lookup() {
        let key = EntityKey::new(order_line(), [Value::Integer(1), Value::Integer(2)]).unwrap();
        assert_eq!(key.column_value("line").unwrap(), &Value::Integer(2));
        assert!(matches!(
            key.column_value("sku"),
            Err(GridError::UnknownKeyColumn { .. })
        ));
    }
}
