//! Deterministic hash-based traffic allocation.
//!
//! Assignment must reproduce the server's bucketing decision exactly, so the hash function is not
//! negotiable: murmur3 (32-bit, seed 0) over the visitor id, reduced modulo 100, walked against
//! the cumulative variation weights.
use std::io::Cursor;

use crate::configuration::Variation;

const ALLOCATION_SEED: u32 = 0;

/// Compute the visitor's bucket in `0..100`.
pub fn visitor_bucket(visitor_id: &str) -> u32 {
    let hash = murmur3::murmur3_32(&mut Cursor::new(visitor_id.as_bytes()), ALLOCATION_SEED)
        .expect("reading from an in-memory cursor cannot fail");
    hash % 100
}

/// Select the variation a visitor falls into, walking `variations` in declared order and
/// accumulating allocation weights.
///
/// Returns `None` when the visitor's bucket lies beyond the summed weights ("no allocation").
/// That is a valid decision outcome, not an error: the campaign is simply omitted for this
/// visitor.
///
/// The result is purely deterministic: the same visitor id and the same ordered weight list
/// produce the same variation in any process at any time.
pub fn allocate<'a>(visitor_id: &str, variations: &'a [Variation]) -> Option<&'a Variation> {
    let bucket = visitor_bucket(visitor_id);

    let mut cumulative = 0;
    for variation in variations {
        cumulative += variation.allocation;
        if bucket < cumulative {
            return Some(variation);
        }
    }

    None
}
