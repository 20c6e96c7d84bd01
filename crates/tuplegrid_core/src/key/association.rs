use std::fmt;
use std::sync::Arc;

use tuplegrid_codec::Value;

use super::{AssociationKeyMetadata, EntityKey, KeyBody};
use crate::error::GridResult;

/// Identifies one association instance, e.g. the `addresses` collection of
/// one person.
///
/// Equality and hashing use the metadata and column values only; the owning
/// entity key is carried along for dialects that store the association
/// inside the owner.
#[derive(Clone)]
pub struct AssociationKey {
    body: KeyBody<AssociationKeyMetadata>,
    owner: EntityKey,
}

impl AssociationKey {
    /// Creates an association key.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::KeyShape`](crate::GridError::KeyShape) if the
    /// number of values differs from the number of key columns.
    pub fn new(
        metadata: Arc<AssociationKeyMetadata>,
        values: impl Into<Arc<[Value]>>,
        owner: EntityKey,
    ) -> GridResult<Self> {
        Ok(Self {
            body: KeyBody::new(metadata, values.into())?,
            owner,
        })
    }

    /// Returns the shared metadata.
    pub fn metadata(&self) -> &Arc<AssociationKeyMetadata> {
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

    /// Returns the key of the entity owning the association.
    pub fn owner(&self) -> &EntityKey {
        &self.owner
    }
}

impl PartialEq for AssociationKey {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

impl Eq for AssociationKey {}

impl std::hash::Hash for AssociationKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&self.body, state);
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())?;
        self.body.fmt_columns(f)
    }
}

impl fmt::Debug for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationKey({self} of {})", self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{AssociationKind, EntityKeyMetadata};

    fn owner(id: i64) -> EntityKey {
        let meta = Arc::new(EntityKeyMetadata::new("Person", ["id"]));
        EntityKey::new(meta, [Value::Integer(id)]).unwrap()
    }

    fn metadata() -> Arc<AssociationKeyMetadata> {
        AssociationKeyMetadata::builder("Person_addresses", ["person_id"])
            .kind(AssociationKind::EmbeddedCollection)
            .build()
    }

    #[test]
    fn equality_ignores_owner() {
        let a = AssociationKey::new(metadata(), [Value::Integer(1)], owner(1)).unwrap();
        let b = AssociationKey::new(metadata(), [Value::Integer(1)], owner(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.owner().column_values(), [Value::Integer(2)]);
    }

    #[test]
    fn values_discriminate() {
        let a = AssociationKey::new(metadata(), [Value::Integer(1)], owner(1)).unwrap();
        let b = AssociationKey::new(metadata(), [Value::Integer(2)], owner(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn shape_is_checked() {
        assert!(AssociationKey::new(metadata(), Vec::<Value>::new(), owner(1)).is_err());
    }
}
