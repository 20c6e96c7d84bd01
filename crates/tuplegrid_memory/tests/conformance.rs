//! Shared dialect checks run against the in-memory backend.

use std::sync::Arc;

use tuplegrid_core::LoggingDialect;
use tuplegrid_memory::{MapDatastore, MapDialect};
use tuplegrid_testkit::prelude::*;

fn fresh() -> MapDialect {
    MapDialect::new(Arc::new(MapDatastore::new()))
}

#[test]
fn map_dialect_conforms() {
    init_tracing();
    DialectHarness::new(fresh()).run_all();
}

#[test]
fn map_dialect_without_native_uuid_conforms() {
    init_tracing();
    DialectHarness::new(fresh().with_native_uuid(false)).run_all();
}

#[test]
fn logging_decorator_conforms() {
    init_tracing();
    let harness = DialectHarness::new(LoggingDialect::new(fresh()));
    harness.run_all();
    assert!(harness.dialect().inner().datastore().entity_count() > 0);
}
