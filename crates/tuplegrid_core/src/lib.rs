//! # TupleGrid Core
//!
//! Datastore-agnostic mapping kernel for NoSQL backends.
//!
//! This crate provides:
//! - Keys for entities, associations, association rows and id sources
//! - Tuples and associations: loaded snapshots with local change overlays
//! - The association storage-strategy resolver and option precedence
//! - The [`GridDialect`] contract every backend implements, plus the
//!   [`BatchingDialect`] and [`LoggingDialect`] decorators
//! - The type-translation pipeline between application values and native
//!   [`Value`]s
//! - Revision tokens for optimistic concurrency
//!
//! ## Design Principles
//!
//! - Tuples and associations never touch the backend; only dialect calls do
//! - Batches are explicit [`OperationsQueue`] values carried by contexts
//! - Translation is lossless or fails
//! - [`GridError::StaleState`] is the only error callers are expected to
//!   handle as a normal outcome
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tuplegrid_core::{EntityKey, EntityKeyMetadata, Tuple, Value};
//!
//! let person = Arc::new(EntityKeyMetadata::new("Person", ["id"]));
//! let key = EntityKey::new(person, [Value::Integer(1)]).unwrap();
//! assert_eq!(key.to_string(), "Person{id=1}");
//!
//! let mut tuple = Tuple::new();
//! tuple.put("name", "Alice");
//! assert!(tuple.is_new());
//! assert_eq!(tuple.get("name"), Some(Value::from("Alice")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod association;
mod batch;
mod config;
mod context;
mod dialect;
mod error;
mod key;
mod options;
mod revision;
mod tuple;
pub mod types;

pub use association::{
    Association, AssociationDocumentStorageType, AssociationOperation, AssociationSnapshot,
    AssociationStorageStrategy, AssociationStorageType, EmptyAssociationSnapshot,
    MapAssociationSnapshot,
};
pub use batch::{BatchingDialect, Operation, OperationsQueue, Pending};
pub use config::Config;
pub use context::{AssociationContext, AssociationTypeContext, TupleContext};
pub use dialect::{
    BatchExecutor, DialectCapabilities, GridDialect, LoggingDialect, MultiGetDialect,
    NextValueRequest, TupleConsumer,
};
pub use error::{BackendError, GridError, GridResult};
pub use key::{
    AssociatedEntityKeyMetadata, AssociationKey, AssociationKeyMetadata,
    AssociationKeyMetadataBuilder, AssociationKind, AssociationType, EntityKey, EntityKeyMetadata,
    IdSourceKey, IdSourceKeyMetadata, IdSourceType, Key, RowKey, RowKeyBuilder,
};
pub use options::{OptionSet, OptionsContext};
pub use revision::{check_revision, Revision};
pub use tuple::{
    EmptyTupleSnapshot, MapTupleSnapshot, Tuple, TupleDiff, TupleOperation, TupleOperationKind,
    TupleSnapshot,
};
pub use tuplegrid_codec::Value;
