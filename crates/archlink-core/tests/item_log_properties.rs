//! Property-based tests for the received item log.
//!
//! These tests verify critical invariants:
//! - A contiguous batch grows the log by exactly its size, in order
//! - A non-contiguous batch never changes the log
//! - Replacing the log never disturbs readers of the old one

use std::{sync::Arc, thread};

use archlink_core::{AppendOutcome, ItemLogHandle, ReceivedItems};
use proptest::prelude::*;

proptest! {
    /// INVARIANT: Contiguous batches append in delivered order.
    #[test]
    fn prop_contiguous_batches_preserve_order(
        batches in prop::collection::vec(prop::collection::vec(any::<u32>(), 0..16), 0..16),
    ) {
        let log = ReceivedItems::new();
        let mut expected = Vec::new();

        for batch in batches {
            let before = log.len();
            let outcome = log.append_batch(before, batch.clone());
            prop_assert_eq!(
                outcome,
                AppendOutcome::Appended { count: batch.len(), len: before + batch.len() }
            );
            expected.extend(batch);
        }

        prop_assert_eq!(log.snapshot(), expected.clone());
        for (i, item) in expected.iter().enumerate() {
            prop_assert_eq!(log.get(i + 1), Some(*item));
        }
    }

    /// INVARIANT: A batch starting anywhere but the end is rejected whole.
    #[test]
    fn prop_divergent_batch_changes_nothing(
        initial in prop::collection::vec(any::<u32>(), 0..32),
        start in 0usize..64,
        batch in prop::collection::vec(any::<u32>(), 0..8),
    ) {
        prop_assume!(start != initial.len());

        let log = ReceivedItems::new();
        log.append_batch(0, initial.clone());

        let outcome = log.append_batch(start, batch);
        prop_assert_eq!(
            outcome,
            AppendOutcome::Diverged { expected: initial.len(), received: start }
        );
        prop_assert_eq!(log.snapshot(), initial);
    }
}

/// INVARIANT: Concurrent readers only ever see whole batches.
#[test]
fn readers_never_see_partial_batches() {
    const BATCH: usize = 4;
    const BATCHES: usize = 500;

    let handle = Arc::new(ItemLogHandle::<usize>::new());

    let writer = {
        let handle = Arc::clone(&handle);
        thread::spawn(move || {
            for n in 0..BATCHES {
                if n % 100 == 99 {
                    handle.replace();
                }
                let log = handle.current();
                let start = log.len();
                log.append_batch(start, vec![n; BATCH]);
            }
        })
    };

    let reader = {
        let handle = Arc::clone(&handle);
        thread::spawn(move || {
            for _ in 0..BATCHES {
                let snapshot = handle.current().snapshot();
                assert_eq!(snapshot.len() % BATCH, 0, "torn batch observed");
                for chunk in snapshot.chunks(BATCH) {
                    assert!(chunk.iter().all(|n| *n == chunk[0]), "mixed batch observed");
                }
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}
