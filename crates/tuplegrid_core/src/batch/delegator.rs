use std::sync::Arc;

use super::queue::{Operation, OperationsQueue};
use crate::association::Association;
use crate::context::{AssociationContext, AssociationTypeContext, TupleContext};
use crate::dialect::{
    BatchExecutor, DialectCapabilities, GridDialect, NextValueRequest, TupleConsumer,
};
use crate::error::GridResult;
use crate::key::{AssociationKey, AssociationKeyMetadata, EntityKey, EntityKeyMetadata};
use crate::tuple::Tuple;
use crate::types::{LogicalType, SharedGridType};

/// Dialect decorator that defers mutations into the context's queue.
///
/// A mutation is queued only if the wrapped dialect declares a `batch`
/// capability and the context carries an open [`OperationsQueue`]; in every
/// other case it runs immediately. Reads always run immediately, with the
/// queue still in the context so the backend can see pending writes.
#[derive(Debug, Clone)]
pub struct BatchingDialect<D> {
    inner: D,
}

/// Closes the queue when dropped, whatever the exit path.
struct CloseOnDrop<'q>(&'q OperationsQueue);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl<D: GridDialect> BatchingDialect<D> {
    /// Wraps `inner`.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped dialect.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> D {
        self.inner
    }

    /// The queue a mutation should go to, if any.
    fn deferring<'c>(&self, queue: Option<&'c OperationsQueue>) -> Option<&'c OperationsQueue> {
        if self.inner.capabilities().supports_batch() {
            queue
        } else {
            None
        }
    }

    /// Flushes `queue` to the backend in enqueue order, then clears it.
    ///
    /// The queue is cleared even when the flush fails.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure; a [`GridError::StaleState`](crate::GridError::StaleState)
    /// from any queued write fails the whole flush.
    pub fn execute_batch(&self, queue: &OperationsQueue) -> GridResult<()> {
        if queue.is_empty() {
            return Ok(());
        }
        tracing::debug!(operations = queue.len(), "executing batch");
        let result = match self.inner.capabilities().batch {
            Some(executor) => executor.execute_batch(queue),
            None => self.apply_each(queue),
        };
        queue.clear();
        if let Err(e) = &result {
            tracing::debug!(error = %e, "batch failed");
        }
        result
    }

    /// Discards every operation in `queue`.
    pub fn clear_batch(&self, queue: &OperationsQueue) {
        tracing::debug!(operations = queue.len(), "clearing batch");
        queue.clear();
    }

    /// Runs `work` with a fresh queue and flushes it if `work` succeeds.
    ///
    /// The queue is closed on every exit path, including errors and
    /// panics, so stray handles cannot keep queuing.
    ///
    /// # Errors
    ///
    /// Returns the error from `work` (nothing is flushed) or from the flush.
    pub fn batch<T>(&self, work: impl FnOnce(&OperationsQueue) -> GridResult<T>) -> GridResult<T> {
        let queue = OperationsQueue::new();
        let _close = CloseOnDrop(&queue);
        let value = work(&queue)?;
        self.execute_batch(&queue)?;
        Ok(value)
    }

    // Used when operations reach a dialect without a batch executor.
    fn apply_each(&self, queue: &OperationsQueue) -> GridResult<()> {
        while let Some(operation) = queue.poll() {
            match operation {
                Operation::UpdateTuple {
                    tuple,
                    key,
                    context,
                } => self.inner.update_tuple(tuple, &key, &context)?,
                Operation::RemoveTuple { key, context } => self.inner.remove_tuple(&key, &context)?,
                Operation::UpdateAssociation {
                    association,
                    key,
                    context,
                } => self.inner.update_association(association, &key, &context)?,
                Operation::RemoveAssociation { key, context } => {
                    self.inner.remove_association(&key, &context)?
                }
            }
        }
        Ok(())
    }
}

impl<D: GridDialect> GridDialect for BatchingDialect<D> {
    fn get_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<Option<Tuple>> {
        self.inner.get_tuple(key, context)
    }

    fn create_tuple(&self, key: &EntityKey, context: &TupleContext) -> Tuple {
        self.inner.create_tuple(key, context)
    }

    fn update_tuple(&self, tuple: Tuple, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        match self.deferring(context.open_queue()) {
            Some(queue) => queue.add(Operation::UpdateTuple {
                tuple,
                key: key.clone(),
                context: context.detached(),
            }),
            None => self.inner.update_tuple(tuple, key, context),
        }
    }

    fn remove_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        match self.deferring(context.open_queue()) {
            Some(queue) => queue.add(Operation::RemoveTuple {
                key: key.clone(),
                context: context.detached(),
            }),
            None => self.inner.remove_tuple(key, context),
        }
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Option<Association>> {
        self.inner.get_association(key, context)
    }

    fn create_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Association> {
        self.inner.create_association(key, context)
    }

    fn update_association(
        &self,
        association: Association,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<()> {
        match self.deferring(context.open_queue()) {
            Some(queue) => queue.add(Operation::UpdateAssociation {
                association,
                key: key.clone(),
                context: context.detached(),
            }),
            None => self.inner.update_association(association, key, context),
        }
    }

    fn remove_association(&self, key: &AssociationKey, context: &AssociationContext) -> GridResult<()> {
        match self.deferring(context.open_queue()) {
            Some(queue) => queue.add(Operation::RemoveAssociation {
                key: key.clone(),
                context: context.detached(),
            }),
            None => self.inner.remove_association(key, context),
        }
    }

    fn next_value(&self, request: &NextValueRequest) -> GridResult<i64> {
        self.inner.next_value(request)
    }

    fn supports_sequences(&self) -> bool {
        self.inner.supports_sequences()
    }

    fn for_each_tuple(
        &self,
        consumer: &mut TupleConsumer<'_>,
        metadata: &[Arc<EntityKeyMetadata>],
    ) -> GridResult<()> {
        self.inner.for_each_tuple(consumer, metadata)
    }

    fn override_type(&self, logical: LogicalType) -> Option<SharedGridType> {
        self.inner.override_type(logical)
    }

    fn is_stored_in_entity_structure(
        &self,
        metadata: &AssociationKeyMetadata,
        context: &AssociationTypeContext,
    ) -> bool {
        self.inner.is_stored_in_entity_structure(metadata, context)
    }

    fn capabilities(&self) -> DialectCapabilities<'_> {
        let inner = self.inner.capabilities();
        DialectCapabilities {
            batch: inner.batch.map(|_| self as &dyn BatchExecutor),
            multi_get: inner.multi_get,
        }
    }
}

impl<D: GridDialect> BatchExecutor for BatchingDialect<D> {
    fn execute_batch(&self, queue: &OperationsQueue) -> GridResult<()> {
        BatchingDialect::execute_batch(self, queue)
    }
}
