//! Id generation under concurrent callers.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use tuplegrid_core::{GridDialect, GridError};
use tuplegrid_memory::{MapDatastore, MapDialect};
use tuplegrid_testkit::prelude::*;

#[test]
fn table_segments_advance_independently() {
    init_tracing();
    let dialect = MapDialect::new(Arc::new(MapDatastore::new()));
    let orders = table_request("orders", 1, 1);
    let invoices = table_request("invoices", 10, 100);

    assert_eq!(dialect.next_value(&orders).unwrap(), 1);
    assert_eq!(dialect.next_value(&invoices).unwrap(), 100);
    assert_eq!(dialect.next_value(&orders).unwrap(), 2);
    assert_eq!(dialect.next_value(&invoices).unwrap(), 110);
    assert_eq!(dialect.datastore().current_value(orders.key()), Some(2));
}

#[test]
fn concurrent_callers_never_share_a_value() {
    const THREADS: usize = 8;
    const CALLS: usize = 250;
    init_tracing();
    let dialect = MapDialect::new(Arc::new(MapDatastore::new()));
    let request = sequence_request("shared", 3, 7);

    let (dialect, request) = (&dialect, &request);
    let values: Vec<i64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    (0..CALLS)
                        .map(|_| dialect.next_value(request).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let total = (THREADS * CALLS) as i64;
    let unique: HashSet<_> = values.iter().copied().collect();
    assert_eq!(unique.len() as i64, total);
    assert_eq!(values.iter().min(), Some(&7));
    assert_eq!(values.iter().max(), Some(&(7 + 3 * (total - 1))));
}

#[test]
fn overflow_is_a_backend_error() {
    let dialect = MapDialect::new(Arc::new(MapDatastore::new()));
    let request = sequence_request("edge", i64::MAX, 0);
    assert_eq!(dialect.next_value(&request).unwrap(), 0);
    assert_eq!(dialect.next_value(&request).unwrap(), i64::MAX);
    let err = dialect.next_value(&request).unwrap_err();
    assert!(matches!(err, GridError::Backend(_)));
    assert!(!err.is_conflict());
}
