//! Associations: the rows linking an owner to its elements, as loaded plus
//! local changes.

mod snapshot;
mod strategy;

pub use snapshot::{AssociationSnapshot, EmptyAssociationSnapshot, MapAssociationSnapshot};
pub use strategy::{
    AssociationDocumentStorageType, AssociationStorageStrategy, AssociationStorageType,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::key::RowKey;
use crate::revision::Revision;
use crate::tuple::Tuple;

/// A pending change to an association.
#[derive(Debug, Clone)]
pub enum AssociationOperation {
    /// Insert or replace a row.
    Put(RowKey, Tuple),
    /// Remove a row.
    Remove(RowKey),
    /// Remove every row loaded in the snapshot.
    Clear,
}

/// An association's rows: a snapshot with a put/remove overlay on top.
#[derive(Clone)]
pub struct Association {
    snapshot: Arc<dyn AssociationSnapshot>,
    current: HashMap<RowKey, AssociationOperation>,
    order: Vec<RowKey>,
    cleared: bool,
}

impl Association {
    /// An association with no stored rows.
    pub fn new() -> Self {
        Self::from_snapshot(EmptyAssociationSnapshot::shared())
    }

    /// An association over a loaded snapshot.
    pub fn from_snapshot(snapshot: Arc<dyn AssociationSnapshot>) -> Self {
        Self {
            snapshot,
            current: HashMap::new(),
            order: Vec::new(),
            cleared: false,
        }
    }

    /// The row under `row_key`, with local changes applied.
    pub fn get(&self, row_key: &RowKey) -> Option<Tuple> {
        match self.current.get(row_key) {
            Some(AssociationOperation::Put(_, tuple)) => Some(tuple.clone()),
            Some(_) => None,
            None if self.cleared => None,
            None => self.snapshot.get(row_key),
        }
    }

    /// Inserts or replaces a row.
    pub fn put(&mut self, row_key: RowKey, tuple: Tuple) {
        self.record(row_key.clone(), AssociationOperation::Put(row_key, tuple));
    }

    /// Removes a row.
    pub fn remove(&mut self, row_key: &RowKey) {
        self.record(row_key.clone(), AssociationOperation::Remove(row_key.clone()));
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.cleared = true;
        self.current.clear();
        self.order.clear();
    }

    fn record(&mut self, row_key: RowKey, operation: AssociationOperation) {
        if self.current.insert(row_key.clone(), operation).is_none() {
            self.order.push(row_key);
        }
    }

    fn in_snapshot(&self, row_key: &RowKey) -> bool {
        !self.cleared && self.snapshot.contains_key(row_key)
    }

    /// Number of rows, with local changes applied.
    pub fn size(&self) -> usize {
        let base = if self.cleared { 0 } else { self.snapshot.size() };
        self.current.iter().fold(base, |size, (key, op)| match op {
            AssociationOperation::Put(..) if !self.in_snapshot(key) => size + 1,
            AssociationOperation::Remove(_) if self.in_snapshot(key) => size - 1,
            _ => size,
        })
    }

    /// True if no rows remain.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Row keys: surviving snapshot rows first, then new rows in insertion order.
    pub fn row_keys(&self) -> Vec<RowKey> {
        let mut keys = Vec::with_capacity(self.size());
        if !self.cleared {
            keys.extend(self.snapshot.row_keys().into_iter().filter(|key| {
                !matches!(self.current.get(key), Some(AssociationOperation::Remove(_)))
            }));
        }
        for key in &self.order {
            if matches!(self.current.get(key), Some(AssociationOperation::Put(..)))
                && !self.in_snapshot(key)
            {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Pending changes in the order they were made; a clear comes first.
    pub fn operations(&self) -> Vec<AssociationOperation> {
        let mut operations = Vec::with_capacity(self.order.len() + 1);
        if self.cleared {
            operations.push(AssociationOperation::Clear);
        }
        operations.extend(
            self.order
                .iter()
                .filter_map(|key| self.current.get(key).cloned()),
        );
        operations
    }

    /// True if there are pending changes.
    pub fn has_operations(&self) -> bool {
        self.cleared || !self.current.is_empty()
    }

    /// The as-loaded view.
    pub fn snapshot(&self) -> &Arc<dyn AssociationSnapshot> {
        &self.snapshot
    }

    /// True if the backend holds no rows for this association.
    pub fn is_new(&self) -> bool {
        self.snapshot.size() == 0
    }

    /// Revision captured when the snapshot was loaded.
    pub fn revision(&self) -> Option<Revision> {
        self.snapshot.revision()
    }

    /// Current rows in [`Association::row_keys`] order.
    pub fn rows(&self) -> Vec<(RowKey, Tuple)> {
        self.row_keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|tuple| (key, tuple)))
            .collect()
    }
}

impl Default for Association {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("rows", &self.rows())
            .field("cleared", &self.cleared)
            .finish()
    }
}
