//! Per-operation contexts handed to dialects.

use crate::association::AssociationStorageStrategy;
use crate::batch::OperationsQueue;
use crate::key::AssociationKind;
use crate::options::OptionsContext;

/// Context of a tuple operation: resolved options and the open batch, if any.
#[derive(Debug, Clone, Default)]
pub struct TupleContext {
    options: OptionsContext,
    queue: Option<OperationsQueue>,
}

impl TupleContext {
    /// Creates a context without a batch.
    pub fn new(options: OptionsContext) -> Self {
        Self {
            options,
            queue: None,
        }
    }

    /// Attaches a batch queue.
    #[must_use]
    pub fn with_queue(mut self, queue: OperationsQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Resolved options for the entity.
    pub fn options(&self) -> &OptionsContext {
        &self.options
    }

    /// The batch queue, if one was attached.
    pub fn operations_queue(&self) -> Option<&OperationsQueue> {
        self.queue.as_ref()
    }

    /// The batch queue, if one is attached and still open.
    pub fn open_queue(&self) -> Option<&OperationsQueue> {
        self.queue.as_ref().filter(|q| !q.is_closed())
    }

    /// A copy of this context without its queue.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            options: self.options.clone(),
            queue: None,
        }
    }
}

/// Options of the owning side of an association, at property level.
#[derive(Debug, Clone, Default)]
pub struct AssociationTypeContext {
    options: OptionsContext,
    role_on_main_side: Option<String>,
}

impl AssociationTypeContext {
    /// Creates a type context.
    pub fn new(options: OptionsContext) -> Self {
        Self {
            options,
            role_on_main_side: None,
        }
    }

    /// Records the property name on the main side of a bidirectional association.
    #[must_use]
    pub fn with_role_on_main_side(mut self, role: impl Into<String>) -> Self {
        self.role_on_main_side = Some(role.into());
        self
    }

    /// Resolved options.
    pub fn options(&self) -> &OptionsContext {
        &self.options
    }

    /// Property name on the main side, for inverse associations.
    pub fn role_on_main_side(&self) -> Option<&str> {
        self.role_on_main_side.as_deref()
    }

    /// Storage layout for an association of `kind` under these options.
    pub fn storage_strategy(&self, kind: AssociationKind) -> AssociationStorageStrategy {
        AssociationStorageStrategy::resolve(
            kind,
            self.options.association_storage(),
            self.options.association_document_storage(),
        )
    }
}

/// Context of an association operation.
#[derive(Debug, Clone, Default)]
pub struct AssociationContext {
    type_context: AssociationTypeContext,
    queue: Option<OperationsQueue>,
}

impl AssociationContext {
    /// Creates a context without a batch.
    pub fn new(type_context: AssociationTypeContext) -> Self {
        Self {
            type_context,
            queue: None,
        }
    }

    /// Attaches a batch queue.
    #[must_use]
    pub fn with_queue(mut self, queue: OperationsQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// The association's type context.
    pub fn association_type_context(&self) -> &AssociationTypeContext {
        &self.type_context
    }

    /// Resolved options for the association property.
    pub fn options(&self) -> &OptionsContext {
        self.type_context.options()
    }

    /// The batch queue, if one was attached.
    pub fn operations_queue(&self) -> Option<&OperationsQueue> {
        self.queue.as_ref()
    }

    /// The batch queue, if one is attached and still open.
    pub fn open_queue(&self) -> Option<&OperationsQueue> {
        self.queue.as_ref().filter(|q| !q.is_closed())
    }

    /// A copy of this context without its queue.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            type_context: self.type_context.clone(),
            queue: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{AssociationDocumentStorageType, AssociationStorageType};
    use crate::options::OptionSet;

    #[test]
    fn open_queue_ignores_closed_queues() {
        let queue = OperationsQueue::new();
        let ctx = TupleContext::default().with_queue(queue.clone());
        assert!(ctx.open_queue().is_some());
        queue.close();
        assert!(ctx.open_queue().is_none());
        assert!(ctx.operations_queue().is_some());
    }

    #[test]
    fn detached_context_keeps_options() {
        let options = OptionsContext::global(
            OptionSet::new().association_storage(AssociationStorageType::AssociationDocument),
        );
        let ctx = AssociationContext::new(AssociationTypeContext::new(options))
            .with_queue(OperationsQueue::new());
        let detached = ctx.detached();
        assert!(detached.operations_queue().is_none());
        assert_eq!(
            detached.options().association_storage(),
            AssociationStorageType::AssociationDocument
        );
    }

    #[test]
    fn type_context_resolves_strategy() {
        let options = OptionsContext::global(
            OptionSet::new()
                .association_storage(AssociationStorageType::AssociationDocument)
                .association_document_storage(
                    AssociationDocumentStorageType::CollectionPerAssociation,
                ),
        );
        let ctx = AssociationTypeContext::new(options);
        assert_eq!(
            ctx.storage_strategy(AssociationKind::Association),
            AssociationStorageStrategy::DedicatedCollection
        );
        assert_eq!(
            ctx.storage_strategy(AssociationKind::EmbeddedCollection),
            AssociationStorageStrategy::InEntity
        );
    }
}
