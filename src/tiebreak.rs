//! Popularity-rank tie-breaking for candidate sets the resolver could not
//! narrow on its own.

use crate::error::PredictError;
use crate::resolver::ResolutionState;
use crate::types::RaceResultRow;

/// Resolve leftover candidate sets against the official popularity order
/// and return the final `(favorite, rival)` pair.
///
/// Candidates are compared by popularity rank ascending (1 = most publicly
/// bet). When the favorite set resolves, the beaten candidates stay in
/// contention for rival, merged with any existing rival candidates, and the
/// rival is picked by the same rule. A rival of `None` is legitimate; a
/// favorite that cannot be ranked at all is a data error.
pub fn break_ties(
    race_id: &str,
    state: ResolutionState,
    results: &[RaceResultRow],
) -> Result<(Option<u8>, Option<u8>), PredictError> {
    match state {
        ResolutionState::Unresolved => Ok((None, None)),
        ResolutionState::Resolved { favorite, rival } => Ok((Some(favorite), rival)),
        ResolutionState::FavoriteCandidates(candidates) => {
            let favorite = pick_most_popular(&candidates, results).ok_or_else(|| {
                PredictError::AmbiguousResolution {
                    race_id: race_id.to_string(),
                    candidates: candidates.clone(),
                }
            })?;
            let rivals: Vec<u8> = candidates
                .iter()
                .copied()
                .filter(|&horse| horse != favorite)
                .collect();
            Ok((Some(favorite), pick_most_popular(&rivals, results)))
        }
        ResolutionState::RivalCandidates {
            favorite,
            candidates,
        } => Ok((Some(favorite), pick_most_popular(&candidates, results))),
    }
}

/// The candidate with the best (lowest) popularity rank.
///
/// A single candidate needs no ranking. With several candidates, only
/// ranked ones are compared; `None` when none of them appear in the result
/// rows, since any pick would be arbitrary. Candidates arrive sorted by
/// horse number, which keeps the pick deterministic if ranks ever collide.
fn pick_most_popular(candidates: &[u8], results: &[RaceResultRow]) -> Option<u8> {
    match candidates {
        [] => None,
        &[only] => Some(only),
        _ => candidates
            .iter()
            .copied()
            .filter_map(|horse| popularity_of(horse, results).map(|rank| (rank, horse)))
            .min_by_key(|&(rank, horse)| (rank, horse))
            .map(|(_, horse)| horse),
    }
}

fn popularity_of(horse_number: u8, results: &[RaceResultRow]) -> Option<u32> {
    results
        .iter()
        .find(|row| row.horse_number == horse_number)
        .map(|row| row.popularity)
}
