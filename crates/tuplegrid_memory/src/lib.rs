//! # TupleGrid Memory
//!
//! In-memory document backend for TupleGrid.
//!
//! Entities are stored as CBOR documents keyed by [`EntityKey`]. Association
//! rows are embedded in the owner's document or kept in association
//! documents, depending on the resolved storage strategy. Every document
//! carries a revision that is checked on write.
//!
//! ## Design Principles
//!
//! - [`MapDatastore`] is a plain document store with no knowledge of keys
//!   beyond their identity
//! - [`MapDialect`] owns the mapping from tuples and associations to
//!   documents
//! - Batches are staged against one write lock and committed all or nothing
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tuplegrid_core::{EntityKey, EntityKeyMetadata, GridDialect, Tuple, TupleContext, Value};
//! use tuplegrid_memory::{MapDatastore, MapDialect};
//!
//! let dialect = MapDialect::new(Arc::new(MapDatastore::new()));
//! let person = Arc::new(EntityKeyMetadata::new("Person", ["id"]));
//! let key = EntityKey::new(person, [Value::Integer(1)]).unwrap();
//! let ctx = TupleContext::default();
//!
//! let mut tuple = Tuple::new();
//! tuple.put("name", "Alice");
//! dialect.update_tuple(tuple, &key, &ctx).unwrap();
//!
//! let loaded = dialect.get_tuple(&key, &ctx).unwrap().unwrap();
//! assert_eq!(loaded.get("name"), Some(Value::from("Alice")));
//! ```
//!
//! [`EntityKey`]: tuplegrid_core::EntityKey

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod datastore;
mod dialect;
mod document;
mod error;

pub use datastore::{
    AssociationCollection, DocumentId, MapDatastore, WriteBatch, ASSOCIATION_COLLECTION_PREFIX,
    GLOBAL_ASSOCIATION_COLLECTION,
};
pub use dialect::MapDialect;
pub use document::{KEY_FIELD, ROWS_FIELD, TABLE_FIELD};
pub use error::{MemoryError, MemoryResult};
