//! # TupleGrid Testkit
//!
//! Test utilities for TupleGrid.
//!
//! This crate provides:
//! - Fixtures for a small `Person` model with embedded and entity associations
//! - Property-based test generators using proptest
//! - A dialect conformance harness runnable against any [`GridDialect`]
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tuplegrid_testkit::prelude::*;
//!
//! #[test]
//! fn my_backend_conforms() {
//!     init_tracing();
//!     DialectHarness::new(MyDialect::default()).run_all();
//! }
//! ```
//!
//! [`GridDialect`]: tuplegrid_core::GridDialect

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod conformance;
pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::conformance::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use conformance::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
