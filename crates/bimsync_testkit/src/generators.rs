//! Property-based test generators using proptest.
//!
//! Provides strategies for generating record batches that respect the
//! record source contract (oldest to newest by `modified_at`).

use bimsync_engine::ChangeRecord;
use proptest::prelude::*;

/// Entity references a generated document contains.
pub const KNOWN_ENTITIES: &[&str] = &["A1", "A2", "A3", "B1", "B2"];

/// Entity reference no generated document contains.
pub const UNKNOWN_ENTITY: &str = "Z9";

/// Strategy for generating fire ratings, in minutes.
pub fn rating_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        prop::sample::select(vec![0.0, 20.0, 30.0, 45.0, 60.0, 90.0, 120.0, 180.0]),
        (0u32..2_400).prop_map(|tenths| f64::from(tenths) / 10.0),
    ]
}

/// Strategy for generating label text.
pub fn label_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z]{1,3}[0-9]{0,3}").expect("Invalid regex")
}

/// Strategy for generating one record for a known entity.
pub fn change_record_strategy() -> impl Strategy<Value = ChangeRecord> {
    (
        prop::sample::select(KNOWN_ENTITIES),
        rating_strategy(),
        label_strategy(),
        1u64..1_000_000,
    )
        .prop_map(|(entity, rating, label, modified_at)| {
            ChangeRecord::new(entity, rating, label, modified_at)
        })
}

/// Strategy for generating a batch of records for known entities, sorted
/// by `modified_at`.
pub fn record_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<ChangeRecord>> {
    prop::collection::vec(change_record_strategy(), 1..=max_len.max(1)).prop_map(|mut batch| {
        batch.sort_by_key(|record| record.modified_at);
        batch
    })
}

/// Strategy for generating a batch in which exactly one record names an
/// unknown entity.
///
/// Yields the batch and the position of the bad record.
pub fn faulty_batch_strategy(max_len: usize) -> impl Strategy<Value = (Vec<ChangeRecord>, usize)> {
    record_batch_strategy(max_len)
        .prop_flat_map(|batch| {
            let len = batch.len();
            (Just(batch), 0..len)
        })
        .prop_map(|(mut batch, index)| {
            batch[index].entity_ref = UNKNOWN_ENTITY.into();
            (batch, index)
        })
}

/// Returns the last rating and label each entity receives from a batch.
pub fn expected_final_values(batch: &[ChangeRecord]) -> Vec<(String, f64, String)> {
    KNOWN_ENTITIES
        .iter()
        .filter_map(|entity| {
            batch
                .iter()
                .rev()
                .find(|record| record.entity_ref.as_str() == *entity)
                .map(|record| (entity.to_string(), record.rating_value, record.label.clone()))
        })
        .collect()
}
