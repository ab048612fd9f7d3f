//! Chain rotation.
//!
//! Each round, the participant at join position `p` contributes to chain
//! `(p + round) mod participant_count`. For any fixed round this is a
//! bijection, so every chain receives exactly one contribution per phase.
//! Rounds past the participant count wrap around and revisit chains.

use std::num::NonZeroUsize;

/// Returns the chain the participant at `position` contributes to in `round`.
#[must_use]
pub fn chain_index(position: usize, round: usize, participant_count: NonZeroUsize) -> usize {
    let count = participant_count.get();
    (position % count + round % count) % count
}

/// Returns the join position of the participant who contributes to `chain`
/// in `round`. Inverse of [`chain_index`] for a fixed round.
#[must_use]
pub fn contributor(chain: usize, round: usize, participant_count: NonZeroUsize) -> usize {
    let count = participant_count.get();
    (chain % count + count - round % count) % count
}
