//! The dialect contract every backend implements.

mod logger;

pub use logger::LoggingDialect;

use std::fmt;
use std::sync::Arc;

use crate::association::Association;
use crate::batch::OperationsQueue;
use crate::context::{AssociationContext, AssociationTypeContext, TupleContext};
use crate::error::GridResult;
use crate::key::{AssociationKey, AssociationKeyMetadata, EntityKey, EntityKeyMetadata, IdSourceKey};
use crate::tuple::Tuple;
use crate::types::{LogicalType, SharedGridType};

/// Consumer handed every tuple visited by [`GridDialect::for_each_tuple`].
pub type TupleConsumer<'a> = dyn FnMut(&EntityKeyMetadata, Tuple) -> GridResult<()> + 'a;

/// Parameters of an id generator increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextValueRequest {
    key: IdSourceKey,
    increment: i64,
    initial_value: i64,
}

impl NextValueRequest {
    /// Creates a request.
    pub fn new(key: IdSourceKey, increment: i64, initial_value: i64) -> Self {
        Self {
            key,
            increment,
            initial_value,
        }
    }

    /// Generator segment being incremented.
    pub fn key(&self) -> &IdSourceKey {
        &self.key
    }

    /// Step added on every call after the first.
    pub fn increment(&self) -> i64 {
        self.increment
    }

    /// Value returned by the first call for a segment.
    pub fn initial_value(&self) -> i64 {
        self.initial_value
    }
}

/// Executes a queue of operations as one unit.
pub trait BatchExecutor: Send + Sync {
    /// Applies every queued operation in enqueue order.
    ///
    /// Implementations may drain `queue`; callers clear it afterwards
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Whether earlier operations were applied
    /// is backend specific.
    fn execute_batch(&self, queue: &OperationsQueue) -> GridResult<()>;
}

/// Loads several tuples in one round trip.
pub trait MultiGetDialect: Send + Sync {
    /// Returns one entry per key, in key order; `None` for missing tuples.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn get_tuples(&self, keys: &[EntityKey], context: &TupleContext) -> GridResult<Vec<Option<Tuple>>>;
}

/// Optional features a dialect supports.
///
/// A dialect declares each capability by handing out a trait object, usually
/// `self`. Decorators forward or replace them.
#[derive(Clone, Copy, Default)]
pub struct DialectCapabilities<'a> {
    /// Batched execution of queued mutations.
    pub batch: Option<&'a dyn BatchExecutor>,
    /// Multi-key tuple reads.
    pub multi_get: Option<&'a dyn MultiGetDialect>,
}

impl DialectCapabilities<'_> {
    /// True if the dialect accepts batches.
    pub fn supports_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// True if the dialect reads many tuples at once.
    pub fn supports_multi_get(&self) -> bool {
        self.multi_get.is_some()
    }
}

impl fmt::Debug for DialectCapabilities<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectCapabilities")
            .field("batch", &self.supports_batch())
            .field("multi_get", &self.supports_multi_get())
            .finish()
    }
}

/// The uniform CRUD contract between the mapping kernel and one datastore.
///
/// Tuples and associations are plain in-memory values: nothing touches the
/// backend except the methods below. Reads return fresh values, so callers
/// may mutate them freely before handing them back.
///
/// # Invariants
///
/// - `create_*` never performs a write
/// - `update_tuple` inserts when the tuple's snapshot is empty and updates
///   otherwise
/// - a write whose revision precondition fails returns
///   [`GridError::StaleState`] and applies nothing
/// - removals of absent documents succeed
///
/// # Implementors
///
/// Backends implement this directly; [`crate::BatchingDialect`] and
/// [`LoggingDialect`] decorate any implementation.
pub trait GridDialect: Send + Sync {
    /// Loads the tuple for `key`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn get_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<Option<Tuple>>;

    /// Creates an empty tuple for a new entity. Never touches the backend.
    fn create_tuple(&self, _key: &EntityKey, _context: &TupleContext) -> Tuple {
        Tuple::new()
    }

    /// Inserts or updates the tuple for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TupleAlreadyExists`] when inserting over an
    /// existing entity, [`GridError::StaleState`] when the revision moved.
    fn update_tuple(&self, tuple: Tuple, key: &EntityKey, context: &TupleContext) -> GridResult<()>;

    /// Removes the tuple for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn remove_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<()>;

    /// Loads the association for `key`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn get_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Option<Association>>;

    /// Creates an empty association for `key`.
    ///
    /// Backends that check in-entity associations against the owner's
    /// revision may read the owner here; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if such a read fails.
    fn create_association(
        &self,
        _key: &AssociationKey,
        _context: &AssociationContext,
    ) -> GridResult<Association> {
        Ok(Association::new())
    }

    /// Writes the association for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::StaleState`] when the revision guarding the
    /// association moved.
    fn update_association(
        &self,
        association: Association,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<()>;

    /// Removes the association for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn remove_association(&self, key: &AssociationKey, context: &AssociationContext) -> GridResult<()>;

    /// Atomically increments and returns the generator value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot perform the increment.
    fn next_value(&self, request: &NextValueRequest) -> GridResult<i64>;

    /// True if the backend has native sequences.
    fn supports_sequences(&self) -> bool {
        false
    }

    /// Visits every stored tuple whose shape is in `metadata`, once each.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the backend or by `consumer`;
    /// the scan stops there.
    fn for_each_tuple(
        &self,
        consumer: &mut TupleConsumer<'_>,
        metadata: &[Arc<EntityKeyMetadata>],
    ) -> GridResult<()>;

    /// Replaces the default translation for `logical`; `None` keeps it.
    fn override_type(&self, _logical: LogicalType) -> Option<SharedGridType> {
        None
    }

    /// True if rows of this association live inside the owner's tuple.
    fn is_stored_in_entity_structure(
        &self,
        metadata: &AssociationKeyMetadata,
        context: &AssociationTypeContext,
    ) -> bool {
        context
            .storage_strategy(metadata.kind())
            .is_embedded_in_entity()
    }

    /// Optional features of this dialect.
    fn capabilities(&self) -> DialectCapabilities<'_> {
        DialectCapabilities::default()
    }
}

impl<D: GridDialect + ?Sized> GridDialect for Arc<D> {
    fn get_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<Option<Tuple>> {
        (**self).get_tuple(key, context)
    }

    fn create_tuple(&self, key: &EntityKey, context: &TupleContext) -> Tuple {
        (**self).create_tuple(key, context)
    }

    fn update_tuple(&self, tuple: Tuple, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        (**self).update_tuple(tuple, key, context)
    }

    fn remove_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        (**self).remove_tuple(key, context)
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Option<Association>> {
        (**self).get_association(key, context)
    }

    fn create_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Association> {
        (**self).create_association(key, context)
    }

    fn update_association(
        &self,
        association: Association,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<()> {
        (**self).update_association(association, key, context)
    }

    fn remove_association(&self, key: &AssociationKey, context: &AssociationContext) -> GridResult<()> {
        (**self).remove_association(key, context)
    }

    fn next_value(&self, request: &NextValueRequest) -> GridResult<i64> {
        (**self).next_value(request)
    }

    fn supports_sequences(&self) -> bool {
        (**self).supports_sequences()
    }

    fn for_each_tuple(
        &self,
        consumer: &mut TupleConsumer<'_>,
        metadata: &[Arc<EntityKeyMetadata>],
    ) -> GridResult<()> {
        (**self).for_each_tuple(consumer, metadata)
    }

    fn override_type(&self, logical: LogicalType) -> Option<SharedGridType> {
        (**self).override_type(logical)
    }

    fn is_stored_in_entity_structure(
        &self,
        metadata: &AssociationKeyMetadata,
        context: &AssociationTypeContext,
    ) -> bool {
        (**self).is_stored_in_entity_structure(metadata, context)
    }

    fn capabilities(&self) -> DialectCapabilities<'_> {
        (**self).capabilities()
    }
}
