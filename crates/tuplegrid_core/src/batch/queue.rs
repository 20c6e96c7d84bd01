use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::association::Association;
use crate::context::{AssociationContext, TupleContext};
use crate::error::{GridError, GridResult};
use crate::key::{AssociationKey, EntityKey};
use crate::tuple::Tuple;

/// A deferred dialect mutation.
///
/// Contexts stored here are detached from their queue.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Deferred [`GridDialect::update_tuple`](crate::GridDialect::update_tuple).
    UpdateTuple {
        /// Tuple to write.
        tuple: Tuple,
        /// Entity key.
        key: EntityKey,
        /// Context of the original call.
        context: TupleContext,
    },
    /// Deferred [`GridDialect::remove_tuple`](crate::GridDialect::remove_tuple).
    RemoveTuple {
        /// Entity key.
        key: EntityKey,
        /// Context of the original call.
        context: TupleContext,
    },
    /// Deferred [`GridDialect::update_association`](crate::GridDialect::update_association).
    UpdateAssociation {
        /// Association to write.
        association: Association,
        /// Association key.
        key: AssociationKey,
        /// Context of the original call.
        context: AssociationContext,
    },
    /// Deferred [`GridDialect::remove_association`](crate::GridDialect::remove_association).
    RemoveAssociation {
        /// Association key.
        key: AssociationKey,
        /// Context of the original call.
        context: AssociationContext,
    },
}

impl Operation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::UpdateTuple { .. } => "update_tuple",
            Operation::RemoveTuple { .. } => "remove_tuple",
            Operation::UpdateAssociation { .. } => "update_association",
            Operation::RemoveAssociation { .. } => "remove_association",
        }
    }
}

/// State of a key according to the operations still waiting in a queue.
#[derive(Debug, Clone)]
pub enum Pending<T> {
    /// The last queued operation writes this value.
    Updated(T),
    /// The last queued operation removes the key.
    Removed,
}

#[derive(Default)]
struct QueueState {
    operations: VecDeque<Operation>,
    closed: bool,
}

/// An explicit, shareable batch of deferred operations.
///
/// The queue is passed through contexts rather than living in thread-local
/// state. Clones share the same underlying queue. Once closed, a queue
/// rejects new operations.
#[derive(Clone, Default)]
pub struct OperationsQueue {
    state: Arc<Mutex<QueueState>>,
}

impl OperationsQueue {
    /// Opens a new, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidOperation`] if the queue is closed.
    pub fn add(&self, operation: Operation) -> GridResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(GridError::invalid_operation(format!(
                "cannot queue {} on a closed operations queue",
                operation.name()
            )));
        }
        state.operations.push_back(operation);
        Ok(())
    }

    /// Takes the oldest operation.
    pub fn poll(&self) -> Option<Operation> {
        self.state.lock().operations.pop_front()
    }

    /// Takes all operations in enqueue order.
    pub fn drain(&self) -> Vec<Operation> {
        self.state.lock().operations.drain(..).collect()
    }

    /// Number of waiting operations.
    pub fn len(&self) -> usize {
        self.state.lock().operations.len()
    }

    /// True if no operation is waiting.
    pub fn is_empty(&self) -> bool {
        self.state.lock().operations.is_empty()
    }

    /// Discards every waiting operation. The queue stays open.
    pub fn clear(&self) {
        self.state.lock().operations.clear();
    }

    /// Discards every waiting operation and rejects further ones.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.operations.clear();
        state.closed = true;
    }

    /// True once [`OperationsQueue::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// True if both handles refer to the same queue.
    pub fn same_queue(&self, other: &OperationsQueue) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// What the queued operations will do to an entity.
    pub fn pending_tuple(&self, key: &EntityKey) -> Option<Pending<Tuple>> {
        let state = self.state.lock();
        state.operations.iter().rev().find_map(|op| match op {
            Operation::UpdateTuple { tuple, key: k, .. } if k == key => {
                Some(Pending::Updated(tuple.clone()))
            }
            Operation::RemoveTuple { key: k, .. } if k == key => Some(Pending::Removed),
            _ => None,
        })
    }

    /// What the queued operations will do to an association.
    pub fn pending_association(&self, key: &AssociationKey) -> Option<Pending<Association>> {
        let state = self.state.lock();
        state.operations.iter().rev().find_map(|op| match op {
            Operation::UpdateAssociation {
                association, key: k, ..
            } if k == key => Some(Pending::Updated(association.clone())),
            Operation::RemoveAssociation { key: k, .. } if k == key => Some(Pending::Removed),
            _ => None,
        })
    }
}

impl fmt::Debug for OperationsQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("OperationsQueue")
            .field("len", &state.operations.len())
            .field("closed", &state.closed)
            .finish()
    }
}
