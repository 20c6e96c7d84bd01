//! Deferred execution of dialect mutations.

mod delegator;
mod queue;

pub use delegator::BatchingDialect;
pub use queue::{Operation, OperationsQueue, Pending};
