use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tuplegrid_codec::Value;

use crate::revision::Revision;

/// Read-only view of a row as the backend loaded it.
///
/// Implementations wrap whatever the backend naturally produces (a
/// document, a row map, a node property view). `get` returns `Some(Null)`
/// for a column stored as null and `None` for a column that is absent.
pub trait TupleSnapshot: fmt::Debug + Send + Sync {
    /// Value of a column.
    fn get(&self, column: &str) -> Option<Value>;

    /// True if the backend has never persisted this row.
    fn is_empty(&self) -> bool;

    /// Names of the stored columns.
    fn column_names(&self) -> Vec<String>;

    /// Revision token captured at load time, for stores that have one.
    fn revision(&self) -> Option<Revision> {
        None
    }

    /// Access to the concrete type, for dialects reading back their own snapshots.
    fn as_any(&self) -> &dyn Any;
}

/// Snapshot of a row that does not exist yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTupleSnapshot;

impl EmptyTupleSnapshot {
    /// The shared instance.
    pub fn shared() -> Arc<dyn TupleSnapshot> {
        static INSTANCE: OnceLock<Arc<EmptyTupleSnapshot>> = OnceLock::new();
        let instance = INSTANCE.get_or_init(|| Arc::new(EmptyTupleSnapshot));
        Arc::clone(instance) as Arc<dyn TupleSnapshot>
    }
}

impl TupleSnapshot for EmptyTupleSnapshot {
    fn get(&self, _column: &str) -> Option<Value> {
        None
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn column_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Snapshot over a plain column map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapTupleSnapshot {
    columns: BTreeMap<String, Value>,
    revision: Option<Revision>,
}

impl MapTupleSnapshot {
    /// Creates a snapshot over `columns`.
    pub fn new(columns: BTreeMap<String, Value>) -> Self {
        Self {
            columns,
            revision: None,
        }
    }

    /// Attaches a revision token.
    #[must_use]
    pub fn with_revision(mut self, revision: Option<Revision>) -> Self {
        self.revision = revision;
        self
    }

    /// Returns the column map.
    pub fn columns(&self) -> &BTreeMap<String, Value> {
        &self.columns
    }
}

impl TupleSnapshot for MapTupleSnapshot {
    fn get(&self, column: &str) -> Option<Value> {
        self.columns.get(column).cloned()
    }

    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn revision(&self) -> Option<Revision> {
        self.revision.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MapTupleSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
