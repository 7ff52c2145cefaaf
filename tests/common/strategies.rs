use proptest::prelude::*;
use std::collections::BTreeSet;

/// A stored id set together with the subset that vanishes before lookup
pub fn ids_with_vanished_strategy() -> impl Strategy<Value = (BTreeSet<i64>, BTreeSet<i64>)> {
    prop::collection::btree_set(1i64..500, 0..40).prop_flat_map(|ids| {
        let all: Vec<i64> = ids.iter().copied().collect();
        let len = all.len();
        (
            Just(ids),
            prop::collection::vec(any::<bool>(), len).prop_map(move |mask| {
                all.iter()
                    .zip(mask)
                    .filter_map(|(id, vanished)| vanished.then_some(*id))
                    .collect::<BTreeSet<i64>>()
            }),
        )
    })
}

/// Pool capacities worth exercising, including the degenerate single slot
pub fn capacity_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), 2usize..8, Just(10usize)]
}
