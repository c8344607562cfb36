//! Weighted stake aggregation over one ticket type's details.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::PredictorConfig;
use crate::types::BettingTicketDetail;

/// Accumulate `payment × slot weight` per horse number.
///
/// `exclude` drops horse numbers from counting entirely; `restrict`, when
/// given, counts only horse numbers inside it. Both filters apply per slot,
/// not per ticket: the other numbers on the same line still count. Scores
/// are keyed in a `BTreeMap` so iteration order never depends on input
/// order.
pub fn tally_votes(
    details: &[&BettingTicketDetail],
    config: &PredictorConfig,
    exclude: &BTreeSet<u8>,
    restrict: Option<&BTreeSet<u8>>,
) -> BTreeMap<u8, f64> {
    let mut scores = BTreeMap::new();

    for detail in details {
        for (slot, &horse) in detail.bet_number.numbers().iter().enumerate() {
            if exclude.contains(&horse) {
                continue;
            }
            if let Some(allowed) = restrict {
                if !allowed.contains(&horse) {
                    continue;
                }
            }

            let weight = config.weight(detail.ticket_type, slot);
            *scores.entry(horse).or_insert(0.0) += detail.payment as f64 * weight;
        }
    }

    scores
}

/// Horse numbers holding the maximum accumulated score, sorted ascending.
///
/// Ties are preserved as a set rather than collapsed; the caller decides
/// how to break them. Empty input yields an empty set.
pub fn max_vote_set(
    details: &[&BettingTicketDetail],
    config: &PredictorConfig,
    exclude: &BTreeSet<u8>,
    restrict: Option<&BTreeSet<u8>>,
) -> Vec<u8> {
    let scores = tally_votes(details, config, exclude, restrict);

    let max = match scores.values().cloned().fold(None, |acc: Option<f64>, s| {
        Some(acc.map_or(s, |m| m.max(s)))
    }) {
        Some(max) => max,
        None => return Vec::new(),
    };

    scores
        .iter()
        .filter(|(_, &score)| score == max)
        .map(|(&horse, _)| horse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetNumber, TicketType};

    fn ticket(ticket_type: TicketType, numbers: Vec<u8>, payment: u32) -> BettingTicketDetail {
        BettingTicketDetail {
            ticket_type,
            bet_number: BetNumber::new(numbers),
            payment,
            repayment: 0,
            winning: false,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        let config = PredictorConfig::default();
        let set = max_vote_set(&[], &config, &BTreeSet::new(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_quinella_counts_both_horses_in_full() {
        let config = PredictorConfig::default();
        let t = ticket(TicketType::Quinella, vec![3, 7], 1000);
        let scores = tally_votes(&[&t], &config, &BTreeSet::new(), None);

        assert_eq!(scores[&3], 1000.0);
        assert_eq!(scores[&7], 1000.0);

        let set = max_vote_set(&[&t], &config, &BTreeSet::new(), None);
        assert_eq!(set, vec![3, 7]);
    }

    #[test]
    fn test_exacta_second_slot_weighted_down() {
        let config = PredictorConfig::default();
        let t = ticket(TicketType::Exacta, vec![4, 9], 400);
        let scores = tally_votes(&[&t], &config, &BTreeSet::new(), None);

        assert_eq!(scores[&4], 400.0);
        assert_eq!(scores[&9], 100.0);
    }

    #[test]
    fn test_trifecta_slot_weights() {
        let config = PredictorConfig::default();
        let t = ticket(TicketType::Trifecta, vec![1, 2, 3], 1000);
        let scores = tally_votes(&[&t], &config, &BTreeSet::new(), None);

        assert_eq!(scores[&1], 1000.0);
        assert_eq!(scores[&2], 250.0);
        assert_eq!(scores[&3], 100.0);
    }

    #[test]
    fn test_accumulates_across_tickets() {
        let config = PredictorConfig::default();
        let a = ticket(TicketType::Quinella, vec![3, 7], 500);
        let b = ticket(TicketType::Quinella, vec![3, 9], 300);
        let scores = tally_votes(&[&a, &b], &config, &BTreeSet::new(), None);

        assert_eq!(scores[&3], 800.0);
        assert_eq!(scores[&7], 500.0);
        assert_eq!(scores[&9], 300.0);

        let set = max_vote_set(&[&a, &b], &config, &BTreeSet::new(), None);
        assert_eq!(set, vec![3]);
    }

    #[test]
    fn test_exclusion_drops_only_that_horse() {
        let config = PredictorConfig::default();
        let t = ticket(TicketType::Exacta, vec![4, 9], 400);
        let exclude: BTreeSet<u8> = [4].into_iter().collect();
        let scores = tally_votes(&[&t], &config, &exclude, None);

        assert!(!scores.contains_key(&4));
        assert_eq!(scores[&9], 100.0);
    }

    #[test]
    fn test_restriction_counts_only_candidates() {
        let config = PredictorConfig::default();
        let a = ticket(TicketType::Quinella, vec![3, 7], 500);
        let b = ticket(TicketType::Quinella, vec![7, 9], 300);
        let allowed: BTreeSet<u8> = [3, 7].into_iter().collect();
        let scores = tally_votes(&[&a, &b], &config, &BTreeSet::new(), Some(&allowed));

        assert_eq!(scores[&3], 500.0);
        assert_eq!(scores[&7], 800.0);
        assert!(!scores.contains_key(&9));
    }

    #[test]
    fn test_restricted_tally_can_be_empty() {
        let config = PredictorConfig::default();
        let t = ticket(TicketType::Quinella, vec![3, 7], 500);
        let allowed: BTreeSet<u8> = [10, 11].into_iter().collect();
        let set = max_vote_set(&[&t], &config, &BTreeSet::new(), Some(&allowed));
        assert!(set.is_empty());
    }

    #[test]
    fn test_score_monotonic_in_payment() {
        let config = PredictorConfig::default();
        let low = ticket(TicketType::Exacta, vec![4, 9], 400);
        let high = ticket(TicketType::Exacta, vec![4, 9], 500);
        let other = ticket(TicketType::Exacta, vec![2, 4], 300);

        let before = tally_votes(&[&low, &other], &config, &BTreeSet::new(), None);
        let after = tally_votes(&[&high, &other], &config, &BTreeSet::new(), None);

        for (horse, score) in &before {
            assert!(after[horse] >= *score);
        }
    }
}
