//! Candidate narrowing: one pass per ticket type, in priority order.

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use crate::config::PredictorConfig;
use crate::types::{BettingTicketDetail, TicketType};
use crate::votes::max_vote_set;

/// Resolution progress for one race.
///
/// Replaces the historical status bitmask with explicit states so each row
/// of the transition table can be exercised on its own. A fixed favorite is
/// never cleared; candidate sets are replaced wholesale between passes,
/// never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    /// No pass has produced a usable vote yet.
    Unresolved,
    /// Favorite narrowed to the contained set (two or more, sorted).
    FavoriteCandidates(Vec<u8>),
    /// Favorite fixed; rival narrowed to `candidates` (sorted, may be empty
    /// when no other horse has received a vote yet).
    RivalCandidates { favorite: u8, candidates: Vec<u8> },
    /// Terminal: favorite fixed, rival fixed or legitimately absent.
    Resolved { favorite: u8, rival: Option<u8> },
}

impl ResolutionState {
    pub fn favorite(&self) -> Option<u8> {
        match self {
            ResolutionState::RivalCandidates { favorite, .. }
            | ResolutionState::Resolved { favorite, .. } => Some(*favorite),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionState::Resolved { .. })
    }
}

/// Narrows favorite and rival candidates by replaying the race's tickets
/// one ticket type at a time, highest-confidence type first.
pub struct CandidateResolver<'a> {
    config: &'a PredictorConfig,
}

impl<'a> CandidateResolver<'a> {
    pub fn new(config: &'a PredictorConfig) -> Self {
        Self { config }
    }

    /// Run every ticket type in `RESOLUTION_ORDER` through the state
    /// machine. Stops as soon as the state turns terminal; ticket types the
    /// bettor skipped are skipped here too.
    pub fn resolve(
        &self,
        grouped: &BTreeMap<TicketType, Vec<&BettingTicketDetail>>,
    ) -> ResolutionState {
        let total_payment: u64 = grouped
            .values()
            .flatten()
            .map(|d| d.payment as u64)
            .sum();

        let mut state = ResolutionState::Unresolved;
        for ticket_type in TicketType::RESOLUTION_ORDER {
            if state.is_terminal() {
                break;
            }
            let Some(details) = grouped.get(&ticket_type) else {
                continue;
            };
            if details.is_empty() {
                continue;
            }
            state = self.step(state, ticket_type, details, total_payment);
            trace!("after {}: {:?}", ticket_type, state);
        }
        state
    }

    /// One transition of the state table for a single ticket type.
    fn step(
        &self,
        state: ResolutionState,
        ticket_type: TicketType,
        details: &[&BettingTicketDetail],
        total_payment: u64,
    ) -> ResolutionState {
        match state {
            ResolutionState::Unresolved => {
                // A lone small win bet must not force the favorite: win votes
                // only count when they carry a meaningful share of the stake.
                if ticket_type == TicketType::Win
                    && !self.win_share_met(details, total_payment)
                {
                    return ResolutionState::Unresolved;
                }

                let favorites = max_vote_set(details, self.config, &BTreeSet::new(), None);
                match favorites.as_slice() {
                    [] => ResolutionState::Unresolved,
                    &[favorite] => self.fix_favorite(favorite, details),
                    _ => ResolutionState::FavoriteCandidates(favorites),
                }
            }
            ResolutionState::FavoriteCandidates(candidates) => {
                let allowed: BTreeSet<u8> = candidates.iter().copied().collect();
                let narrowed =
                    max_vote_set(details, self.config, &BTreeSet::new(), Some(&allowed));
                match narrowed.as_slice() {
                    // This type's tickets mention none of the candidates.
                    [] => ResolutionState::FavoriteCandidates(candidates),
                    &[favorite] => self.fix_favorite(favorite, details),
                    _ => ResolutionState::FavoriteCandidates(narrowed),
                }
            }
            ResolutionState::RivalCandidates {
                favorite,
                candidates,
            } => {
                let exclude: BTreeSet<u8> = [favorite].into_iter().collect();
                let allowed: Option<BTreeSet<u8>> = if candidates.is_empty() {
                    None
                } else {
                    Some(candidates.iter().copied().collect())
                };
                let narrowed =
                    max_vote_set(details, self.config, &exclude, allowed.as_ref());
                match narrowed.as_slice() {
                    [] => ResolutionState::RivalCandidates {
                        favorite,
                        candidates,
                    },
                    &[rival] => ResolutionState::Resolved {
                        favorite,
                        rival: Some(rival),
                    },
                    _ => ResolutionState::RivalCandidates {
                        favorite,
                        candidates: narrowed,
                    },
                }
            }
            resolved @ ResolutionState::Resolved { .. } => resolved,
        }
    }

    /// Favorite fixed from this type's votes; the same type's remaining
    /// votes get one shot at fixing the rival.
    fn fix_favorite(&self, favorite: u8, details: &[&BettingTicketDetail]) -> ResolutionState {
        let exclude: BTreeSet<u8> = [favorite].into_iter().collect();
        let rivals = max_vote_set(details, self.config, &exclude, None);
        match rivals.as_slice() {
            [] => ResolutionState::RivalCandidates {
                favorite,
                candidates: Vec::new(),
            },
            &[rival] => ResolutionState::Resolved {
                favorite,
                rival: Some(rival),
            },
            _ => ResolutionState::RivalCandidates {
                favorite,
                candidates: rivals,
            },
        }
    }

    fn win_share_met(&self, details: &[&BettingTicketDetail], total_payment: u64) -> bool {
        if total_payment == 0 {
            return false;
        }
        let win_payment: u64 = details.iter().map(|d| d.payment as u64).sum();
        win_payment as f64 / total_payment as f64 >= self.config.win_stake_share_threshold
    }
}
