use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::key::RowKey;
use crate::revision::Revision;
use crate::tuple::Tuple;

/// Read-only view of an association's rows as the backend loaded them.
pub trait AssociationSnapshot: fmt::Debug + Send + Sync {
    /// The row stored under `row_key`.
    fn get(&self, row_key: &RowKey) -> Option<Tuple>;

    /// True if a row is stored under `row_key`.
    fn contains_key(&self, row_key: &RowKey) -> bool;

    /// Number of stored rows.
    fn size(&self) -> usize;

    /// Keys of the stored rows, in storage order.
    fn row_keys(&self) -> Vec<RowKey>;

    /// Revision token captured at load time, for stores that have one.
    fn revision(&self) -> Option<Revision> {
        None
    }

    /// Access to the concrete type, for dialects reading back their own snapshots.
    fn as_any(&self) -> &dyn Any;
}

/// The canonical association snapshot with no rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyAssociationSnapshot;

impl EmptyAssociationSnapshot {
    /// The shared instance.
    pub fn shared() -> Arc<dyn AssociationSnapshot> {
        static INSTANCE: OnceLock<Arc<EmptyAssociationSnapshot>> = OnceLock::new();
        let instance = INSTANCE.get_or_init(|| Arc::new(EmptyAssociationSnapshot));
        Arc::clone(instance) as Arc<dyn AssociationSnapshot>
    }
}

impl AssociationSnapshot for EmptyAssociationSnapshot {
    fn get(&self, _row_key: &RowKey) -> Option<Tuple> {
        None
    }

    fn contains_key(&self, _row_key: &RowKey) -> bool {
        false
    }

    fn size(&self) -> usize {
        0
    }

    fn row_keys(&self) -> Vec<RowKey> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Snapshot over rows held in memory, keeping their order.
#[derive(Debug, Clone, Default)]
pub struct MapAssociationSnapshot {
    rows: Vec<(RowKey, Tuple)>,
    index: HashMap<RowKey, usize>,
    revision: Option<Revision>,
}

impl MapAssociationSnapshot {
    /// Creates a snapshot; a repeated row key replaces the earlier row.
    pub fn new(rows: impl IntoIterator<Item = (RowKey, Tuple)>) -> Self {
        let mut snapshot = Self::default();
        for (key, tuple) in rows {
            match snapshot.index.get(&key) {
                Some(&i) => snapshot.rows[i].1 = tuple,
                None => {
                    snapshot.index.insert(key.clone(), snapshot.rows.len());
                    snapshot.rows.push((key, tuple));
                }
            }
        }
        snapshot
    }

    /// Attaches a revision token.
    #[must_use]
    pub fn with_revision(mut self, revision: Option<Revision>) -> Self {
        self.revision = revision;
        self
    }

    /// Iterates rows in storage order.
    pub fn rows(&self) -> impl Iterator<Item = &(RowKey, Tuple)> {
        self.rows.iter()
    }
}

impl AssociationSnapshot for MapAssociationSnapshot {
    fn get(&self, row_key: &RowKey) -> Option<Tuple> {
        self.index.get(row_key).map(|&i| self.rows[i].1.clone())
    }

    fn contains_key(&self, row_key: &RowKey) -> bool {
        self.index.contains_key(row_key)
    }

    fn size(&self) -> usize {
        self.rows.len()
    }

    fn row_keys(&self) -> Vec<RowKey> {
        self.rows.iter().map(|(key, _)| key.clone()).collect()
    }

    fn revision(&self) -> Option<Revision> {
        self.revision.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
