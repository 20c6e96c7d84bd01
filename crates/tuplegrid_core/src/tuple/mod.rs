//! Tuples: one entity's columns as loaded, plus local changes.

mod snapshot;

pub use snapshot::{EmptyTupleSnapshot, MapTupleSnapshot, TupleSnapshot};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tuplegrid_codec::Value;

use crate::revision::Revision;

/// Kind of a pending column change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleOperationKind {
    /// Set the column to a value.
    Put(Value),
    /// Set the column to null, keeping it present.
    PutNull,
    /// Remove the column.
    Remove,
}

/// A pending change to one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleOperation {
    /// Column being changed.
    pub column: String,
    /// What happens to it.
    pub kind: TupleOperationKind,
}

/// Minimal column-level difference between a tuple and its snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleDiff {
    /// Columns absent from the snapshot that now have a value.
    pub inserted: Vec<(String, Value)>,
    /// Snapshot columns whose value changed.
    pub updated: Vec<(String, Value)>,
    /// Snapshot columns that were removed.
    pub removed: Vec<String>,
}

impl TupleDiff {
    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// An entity's columns: a snapshot with a put/remove overlay on top.
///
/// Nothing here talks to a backend. Changes only reach storage when the
/// tuple is handed to [`GridDialect::update_tuple`](crate::GridDialect::update_tuple).
#[derive(Clone)]
pub struct Tuple {
    snapshot: Arc<dyn TupleSnapshot>,
    // BTreeMap::new does not allocate, so untouched tuples stay cheap
    operations: BTreeMap<String, TupleOperation>,
}

impl Tuple {
    /// A tuple with no backing row.
    pub fn new() -> Self {
        Self::from_snapshot(EmptyTupleSnapshot::shared())
    }

    /// A tuple over a loaded snapshot.
    pub fn from_snapshot(snapshot: Arc<dyn TupleSnapshot>) -> Self {
        Self {
            snapshot,
            operations: BTreeMap::new(),
        }
    }

    /// Value of a column, with local changes applied.
    pub fn get(&self, column: &str) -> Option<Value> {
        match self.operations.get(column).map(|op| &op.kind) {
            Some(TupleOperationKind::Put(value)) => Some(value.clone()),
            Some(TupleOperationKind::PutNull) => Some(Value::Null),
            Some(TupleOperationKind::Remove) => None,
            None => self.snapshot.get(column),
        }
    }

    /// Sets a column. A null value is recorded as [`TupleOperationKind::PutNull`].
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        let kind = if value.is_null() {
            TupleOperationKind::PutNull
        } else {
            TupleOperationKind::Put(value)
        };
        self.record(column.into(), kind);
    }

    /// Sets a column to null.
    pub fn put_null(&mut self, column: impl Into<String>) {
        self.record(column.into(), TupleOperationKind::PutNull);
    }

    /// Removes a column.
    pub fn remove(&mut self, column: impl Into<String>) {
        self.record(column.into(), TupleOperationKind::Remove);
    }

    fn record(&mut self, column: String, kind: TupleOperationKind) {
        self.operations
            .insert(column.clone(), TupleOperation { column, kind });
    }

    /// Names of all present columns, with local changes applied.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.snapshot.column_names().into_iter().collect();
        for op in self.operations.values() {
            match op.kind {
                TupleOperationKind::Remove => {
                    names.remove(&op.column);
                }
                _ => {
                    names.insert(op.column.clone());
                }
            }
        }
        names.into_iter().collect()
    }

    /// All present columns and their current values.
    pub fn to_columns(&self) -> BTreeMap<String, Value> {
        self.column_names()
            .into_iter()
            .filter_map(|name| self.get(&name).map(|value| (name, value)))
            .collect()
    }

    /// Pending changes, ordered by column name.
    pub fn operations(&self) -> impl Iterator<Item = &TupleOperation> {
        self.operations.values()
    }

    /// True if there are pending changes.
    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    /// The as-loaded view.
    pub fn snapshot(&self) -> &Arc<dyn TupleSnapshot> {
        &self.snapshot
    }

    /// True if the backend has never persisted this tuple.
    pub fn is_new(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Revision captured when the snapshot was loaded.
    pub fn revision(&self) -> Option<Revision> {
        self.snapshot.revision()
    }

    /// Computes the minimal change set against the snapshot.
    ///
    /// Puts of a value equal to the stored one and removals of absent
    /// columns are dropped.
    pub fn diff(&self) -> TupleDiff {
        let mut diff = TupleDiff::default();
        for op in self.operations.values() {
            let stored = self.snapshot.get(&op.column);
            let value = match &op.kind {
                TupleOperationKind::Remove => {
                    if stored.is_some() {
                        diff.removed.push(op.column.clone());
                    }
                    continue;
                }
                TupleOperationKind::Put(value) => value.clone(),
                TupleOperationKind::PutNull => Value::Null,
            };
            match stored {
                None => diff.inserted.push((op.column.clone(), value)),
                Some(old) if old != value => diff.updated.push((op.column.clone(), value)),
                Some(_) => {}
            }
        }
        diff
    }
}

impl Default for Tuple {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuple")
            .field("columns", &self.to_columns())
            .field("new", &self.is_new())
            .finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Tuple {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut tuple = Tuple::new();
        for (column, value) in iter {
            tuple.put(column, value);
        }
        tuple
    }
}
