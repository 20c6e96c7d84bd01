//! Key metadata: the table and column layout shared by many keys.
//!
//! Metadata instances are meant to be created once per entity or
//! association shape and shared behind an `Arc`. Both metadata types hash
//! by table name only and compare the table before the column names.
//! This is a throughput tradeoff for the common case of interned shapes;
//! it does not make equality any stronger.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Whether an association points at other entities or holds value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Reference to another entity.
    Association,
    /// Collection of value types with no identity of their own.
    EmbeddedCollection,
}

/// Collection semantics of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationType {
    /// Unordered collection allowing duplicates.
    Bag,
    /// Unordered collection without duplicates.
    Set,
    /// Ordered collection with an index column.
    List,
    /// Keyed collection with a map-key column.
    Map,
    /// Single-valued association.
    OneToOne,
}

/// Table and key column layout of an entity type.
#[derive(Debug, Clone)]
pub struct EntityKeyMetadata {
    table: String,
    column_names: Arc<[String]>,
}

impl EntityKeyMetadata {
    /// Creates entity key metadata.
    pub fn new<S: Into<String>>(
        table: impl Into<String>,
        column_names: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            table: table.into(),
            column_names: column_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the table (collection) name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the key column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Returns true if `column` is one of the key columns.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

impl PartialEq for EntityKeyMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.column_names == other.column_names
    }
}

impl Eq for EntityKeyMetadata {}

impl Hash for EntityKeyMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
    }
}

/// Maps the columns of an association row onto the key columns of the
/// entity on the far side, by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedEntityKeyMetadata {
    association_key_columns: Arc<[String]>,
    entity_key_metadata: Arc<EntityKeyMetadata>,
}

impl AssociatedEntityKeyMetadata {
    /// Creates the mapping.
    pub fn new<S: Into<String>>(
        association_key_columns: impl IntoIterator<Item = S>,
        entity_key_metadata: Arc<EntityKeyMetadata>,
    ) -> Self {
        Self {
            association_key_columns: association_key_columns
                .into_iter()
                .map(Into::into)
                .collect(),
            entity_key_metadata,
        }
    }

    /// Columns of the association row that reference the far-side entity.
    pub fn association_key_columns(&self) -> &[String] {
        &self.association_key_columns
    }

    /// Key metadata of the far-side entity.
    pub fn entity_key_metadata(&self) -> &Arc<EntityKeyMetadata> {
        &self.entity_key_metadata
    }

    /// Returns the entity key column matching an association row column.
    pub fn corresponding_entity_key_column(&self, association_key_column: &str) -> Option<&str> {
        let index = self
            .association_key_columns
            .iter()
            .position(|c| c == association_key_column)?;
        self.entity_key_metadata
            .column_names()
            .get(index)
            .map(String::as_str)
    }

    /// Returns true if `column` references the far-side entity.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.association_key_columns.iter().any(|c| c == column)
    }
}

/// Layout of one association: where it lives and how its rows are keyed.
///
/// Built with [`AssociationKeyMetadata::builder`].
#[derive(Debug, Clone)]
pub struct AssociationKeyMetadata {
    table: String,
    column_names: Arc<[String]>,
    row_key_column_names: Arc<[String]>,
    row_key_index_column_names: Arc<[String]>,
    associated_entity_key_metadata: Option<AssociatedEntityKeyMetadata>,
    collection_role: String,
    kind: AssociationKind,
    association_type: AssociationType,
    inverse: bool,
}

impl AssociationKeyMetadata {
    /// Starts building metadata for the given table and key columns.
    pub fn builder<S: Into<String>>(
        table: impl Into<String>,
        column_names: impl IntoIterator<Item = S>,
    ) -> AssociationKeyMetadataBuilder {
        AssociationKeyMetadataBuilder {
            inner: AssociationKeyMetadata {
                table: table.into(),
                column_names: column_names.into_iter().map(Into::into).collect(),
                row_key_column_names: Arc::from([]),
                row_key_index_column_names: Arc::from([]),
                associated_entity_key_metadata: None,
                collection_role: String::new(),
                kind: AssociationKind::Association,
                association_type: AssociationType::Bag,
                inverse: false,
            },
        }
    }

    /// Returns the table (collection) name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns identifying the owner of the association.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Columns that together identify one row of the association.
    pub fn row_key_column_names(&self) -> &[String] {
        &self.row_key_column_names
    }

    /// Index or map-key columns of ordered and keyed collections.
    pub fn row_key_index_column_names(&self) -> &[String] {
        &self.row_key_index_column_names
    }

    /// Far-side entity mapping, if the association targets entities.
    pub fn associated_entity_key_metadata(&self) -> Option<&AssociatedEntityKeyMetadata> {
        self.associated_entity_key_metadata.as_ref()
    }

    /// Role of the collection on the owning entity, e.g. `Person.addresses`.
    ///
    /// Falls back to the table name when no role was set.
    pub fn collection_role(&self) -> &str {
        if self.collection_role.is_empty() {
            &self.table
        } else {
            &self.collection_role
        }
    }

    /// Association or embedded collection.
    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    /// Collection semantics.
    pub fn association_type(&self) -> AssociationType {
        self.association_type
    }

    /// True if this is the non-owning side of a bidirectional association.
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// True for single-valued associations.
    pub fn is_one_to_one(&self) -> bool {
        self.association_type == AssociationType::OneToOne
    }

    /// Returns true if `column` is one of the association key columns.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Filters out the association key columns, keeping order.
    pub fn columns_without_key_columns<'a>(
        &self,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Vec<&'a str> {
        columns
            .into_iter()
            .filter(|c| !self.is_key_column(c))
            .collect()
    }

    /// The row key column not covered by the association key, if exactly one.
    ///
    /// Rows of such associations can be stored as a bare value instead of a
    /// column map.
    pub fn single_row_key_column_not_contained_in_association_key(&self) -> Option<&str> {
        let mut remaining = self
            .row_key_column_names
            .iter()
            .filter(|c| !self.is_key_column(c));
        match (remaining.next(), remaining.next()) {
            (Some(only), None) => Some(only.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for AssociationKeyMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.column_names == other.column_names
    }
}

impl Eq for AssociationKeyMetadata {}

impl Hash for AssociationKeyMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
    }
}

/// Builder for [`AssociationKeyMetadata`].
#[derive(Debug, Clone)]
#[must_use]
pub struct AssociationKeyMetadataBuilder {
    inner: AssociationKeyMetadata,
}

impl AssociationKeyMetadataBuilder {
    /// Sets the row key columns.
    pub fn row_key_column_names<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.inner.row_key_column_names = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the index or map-key columns.
    pub fn row_key_index_column_names<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.inner.row_key_index_column_names = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the far-side entity mapping.
    pub fn associated_entity_key_metadata(mut self, metadata: AssociatedEntityKeyMetadata) -> Self {
        self.inner.associated_entity_key_metadata = Some(metadata);
        self
    }

    /// Sets the collection role.
    pub fn collection_role(mut self, role: impl Into<String>) -> Self {
        self.inner.collection_role = role.into();
        self
    }

    /// Sets the association kind.
    pub const fn kind(mut self, kind: AssociationKind) -> Self {
        self.inner.kind = kind;
        self
    }

    /// Sets the collection semantics.
    pub const fn association_type(mut self, association_type: AssociationType) -> Self {
        self.inner.association_type = association_type;
        self
    }

    /// Marks the association as the inverse side.
    pub const fn inverse(mut self, inverse: bool) -> Self {
        self.inner.inverse = inverse;
        self
    }

    /// Finishes the metadata, ready to be shared.
    pub fn build(self) -> Arc<AssociationKeyMetadata> {
        Arc::new(self.inner)
    }
}
