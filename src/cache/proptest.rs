//! Property-Based Tests for the Snapshot Codec
//!
//! Uses proptest to verify encode/decode correctness across arbitrary
//! snapshots.
//!
//! # Test Properties
//!
//! 1. **Roundtrip Correctness**: decode(encode(snapshot)) == snapshot
//! 2. **Order Preservation**: entry order survives the round trip
//! 3. **Ordering Invariant**: ranked snapshots stay non-increasing in score

#![cfg(test)]

use proptest::prelude::*;

use super::codec::{decode_snapshot, encode_snapshot};
use super::TOP_DESTINATIONS_KEY;
use crate::domain::{Destination, RankingSnapshot};

// =============================================================================
// Property Strategies
// =============================================================================

/// Strategy for a single destination with arbitrary text fields.
fn destination_strategy() -> impl Strategy<Value = Destination> {
    (
        "[a-zA-Z ]{1,30}",
        ".{0,100}",
        ".{0,40}",
        0i64..1_000_000,
    )
        .prop_map(
            |(country, description, best_time_to_visit, popularity_score)| Destination {
                country,
                description,
                best_time_to_visit,
                popularity_score,
            },
        )
}

/// Strategy for a ranked snapshot of up to 10 destinations, sorted the way
/// the ranking query returns them (popularity descending, stable on ties).
fn snapshot_strategy() -> impl Strategy<Value = RankingSnapshot> {
    prop::collection::vec(destination_strategy(), 0..=10).prop_map(|mut destinations| {
        destinations.sort_by(|a, b| b.popularity_score.cmp(&a.popularity_score));
        RankingSnapshot::new(destinations)
    })
}

// =============================================================================
// Roundtrip Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Encoding then decoding returns the original snapshot.
    #[test]
    fn prop_roundtrip(snapshot in snapshot_strategy()) {
        let bytes = encode_snapshot(&snapshot).unwrap();
        let decoded = decode_snapshot(TOP_DESTINATIONS_KEY, &bytes).unwrap();

        prop_assert_eq!(decoded, snapshot);
    }

    /// Property: Entry order survives the round trip.
    #[test]
    fn prop_roundtrip_preserves_order(snapshot in snapshot_strategy()) {
        let bytes = encode_snapshot(&snapshot).unwrap();
        let decoded = decode_snapshot(TOP_DESTINATIONS_KEY, &bytes).unwrap();

        let countries: Vec<&str> = snapshot
            .destinations
            .iter()
            .map(|d| d.country.as_str())
            .collect();
        let decoded_countries: Vec<&str> = decoded
            .destinations
            .iter()
            .map(|d| d.country.as_str())
            .collect();
        prop_assert_eq!(decoded_countries, countries);
    }

    /// Property: A ranked snapshot stays non-increasing in popularity score
    /// after the round trip.
    #[test]
    fn prop_roundtrip_keeps_ordering_invariant(snapshot in snapshot_strategy()) {
        prop_assert!(snapshot.is_ordered());

        let bytes = encode_snapshot(&snapshot).unwrap();
        let decoded = decode_snapshot(TOP_DESTINATIONS_KEY, &bytes).unwrap();

        prop_assert!(decoded.is_ordered());
    }
}
