use crate::{calculate_hash, Randomness};

use tracing::{debug, info_span};

/// Derives the randomness of a beacon contribution from a public seed, for
/// example a future block hash. The seed is hashed once and the digest is
/// then re-hashed `iterations` times, so that nobody can predict the output
/// before the seed is known.
pub fn beacon_randomness(seed: &[u8], iterations: u64) -> Randomness {
    let span = info_span!("phase2-beacon", iterations);
    let _enter = span.enter();

    let mut digest = calculate_hash(seed);
    let report_every = (iterations / 16).max(1);
    for i in 0..iterations {
        if i % report_every == 0 {
            debug!(done = i, total = iterations, "computing beacon");
        }
        digest = calculate_hash(&digest);
    }
    Randomness::from_digest(digest)
}
