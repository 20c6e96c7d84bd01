use std::sync::Arc;

use super::{
    BatchExecutor, DialectCapabilities, GridDialect, MultiGetDialect, NextValueRequest,
    TupleConsumer,
};
use crate::association::Association;
use crate::batch::OperationsQueue;
use crate::context::{AssociationContext, AssociationTypeContext, TupleContext};
use crate::error::{GridError, GridResult};
use crate::key::{AssociationKey, AssociationKeyMetadata, EntityKey, EntityKeyMetadata};
use crate::tuple::Tuple;
use crate::types::{LogicalType, SharedGridType};

/// Dialect decorator that traces every call at `trace` level.
///
/// Enable with `RUST_LOG=tuplegrid_core::dialect=trace`.
#[derive(Debug, Clone)]
pub struct LoggingDialect<D> {
    inner: D,
}

impl<D: GridDialect> LoggingDialect<D> {
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
}

impl<D: GridDialect> GridDialect for LoggingDialect<D> {
    fn get_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<Option<Tuple>> {
        let result = self.inner.get_tuple(key, context);
        tracing::trace!(%key, found = matches!(result, Ok(Some(_))), "get_tuple");
        result
    }

    fn create_tuple(&self, key: &EntityKey, context: &TupleContext) -> Tuple {
        tracing::trace!(%key, "create_tuple");
        self.inner.create_tuple(key, context)
    }

    fn update_tuple(&self, tuple: Tuple, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        tracing::trace!(
            %key,
            new = tuple.is_new(),
            operations = tuple.operations().count(),
            "update_tuple"
        );
        self.inner.update_tuple(tuple, key, context)
    }

    fn remove_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        tracing::trace!(%key, "remove_tuple");
        self.inner.remove_tuple(key, context)
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Option<Association>> {
        let result = self.inner.get_association(key, context);
        tracing::trace!(
            %key,
            rows = ?result.as_ref().ok().and_then(|a| a.as_ref()).map(Association::size),
            "get_association"
        );
        result
    }

    fn create_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Association> {
        tracing::trace!(%key, "create_association");
        self.inner.create_association(key, context)
    }

    fn update_association(
        &self,
        association: Association,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<()> {
        tracing::trace!(%key, rows = association.size(), "update_association");
        self.inner.update_association(association, key, context)
    }

    fn remove_association(&self, key: &AssociationKey, context: &AssociationContext) -> GridResult<()> {
        tracing::trace!(%key, "remove_association");
        self.inner.remove_association(key, context)
    }

    fn next_value(&self, request: &NextValueRequest) -> GridResult<i64> {
        let result = self.inner.next_value(request);
        tracing::trace!(key = %request.key(), value = ?result.as_ref().ok(), "next_value");
        result
    }

    fn supports_sequences(&self) -> bool {
        self.inner.supports_sequences()
    }

    fn for_each_tuple(
        &self,
        consumer: &mut TupleConsumer<'_>,
        metadata: &[Arc<EntityKeyMetadata>],
    ) -> GridResult<()> {
        let tables: Vec<&str> = metadata.iter().map(|m| m.table()).collect();
        tracing::trace!(?tables, "for_each_tuple");
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
            multi_get: inner.multi_get.map(|_| self as &dyn MultiGetDialect),
        }
    }
}

impl<D: GridDialect> BatchExecutor for LoggingDialect<D> {
    fn execute_batch(&self, queue: &OperationsQueue) -> GridResult<()> {
        let executor = self
            .inner
            .capabilities()
            .batch
            .ok_or_else(|| GridError::unsupported("execute_batch"))?;
        tracing::trace!(operations = queue.len(), "execute_batch");
        executor.execute_batch(queue)
    }
}

impl<D: GridDialect> MultiGetDialect for LoggingDialect<D> {
    fn get_tuples(&self, keys: &[EntityKey], context: &TupleContext) -> GridResult<Vec<Option<Tuple>>> {
        let multi_get = self
            .inner
            .capabilities()
            .multi_get
            .ok_or_else(|| GridError::unsupported("get_tuples"))?;
        tracing::trace!(keys = keys.len(), "get_tuples");
        multi_get.get_tuples(keys, context)
    }
}
