//! Per-race resolution pipeline and batch driver.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::assemble::assemble_record;
use crate::config::PredictorConfig;
use crate::error::PredictError;
use crate::resolver::CandidateResolver;
use crate::tiebreak::break_ties;
use crate::types::{BettingTicketDetail, PredictionRecord, RaceCard, TicketType};

/// A race that failed to resolve; the rest of the batch is unaffected.
#[derive(Debug, Clone)]
pub struct RaceFailure {
    pub race_id: String,
    pub error: PredictError,
}

/// Partial results of a batch run: resolved records plus per-race failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<PredictionRecord>,
    pub failures: Vec<RaceFailure>,
}

/// Resolve a single race end to end: validate, group, narrow candidates,
/// break remaining ties, assemble.
pub fn resolve_race(
    race_id: &str,
    tickets: &[BettingTicketDetail],
    card: &RaceCard,
    config: &PredictorConfig,
) -> Result<PredictionRecord, PredictError> {
    for ticket in tickets {
        ticket.bet_number.validate(ticket.ticket_type)?;
    }

    let grouped = group_by_type(tickets);
    let state = CandidateResolver::new(config).resolve(&grouped);
    let (favorite, rival) = break_ties(race_id, state, &card.results)?;

    assemble_record(race_id, tickets, &card.results, &card.payouts, favorite, rival)
}

/// Group tickets by type. Within a type, details are sorted into a
/// canonical order so vote accumulation cannot depend on how the caller
/// happened to iterate its records.
fn group_by_type(
    tickets: &[BettingTicketDetail],
) -> BTreeMap<TicketType, Vec<&BettingTicketDetail>> {
    let mut grouped: BTreeMap<TicketType, Vec<&BettingTicketDetail>> = BTreeMap::new();
    for ticket in tickets {
        grouped.entry(ticket.ticket_type).or_default().push(ticket);
    }
    for details in grouped.values_mut() {
        details.sort_by(|a, b| {
            (a.bet_number.numbers(), a.payment, a.repayment)
                .cmp(&(b.bet_number.numbers(), b.payment, b.repayment))
        });
    }
    grouped
}

/// Resolve every race, collecting per-race failures instead of aborting.
///
/// A race id with no matching card fails with `UnknownRace`. Race ids are
/// visited in sorted order so output order is stable; races are otherwise
/// independent of each other.
pub fn resolve_batch(
    tickets_by_race: &HashMap<String, Vec<BettingTicketDetail>>,
    cards: &HashMap<String, RaceCard>,
    config: &PredictorConfig,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    let mut race_ids: Vec<&String> = tickets_by_race.keys().collect();
    race_ids.sort();

    for race_id in race_ids {
        let tickets = &tickets_by_race[race_id];
        let result = match cards.get(race_id) {
            Some(card) => resolve_race(race_id, tickets, card, config),
            None => Err(PredictError::UnknownRace {
                race_id: race_id.clone(),
            }),
        };

        match result {
            Ok(record) => {
                debug!(
                    "resolved race {}: favorite={:?} rival={:?}",
                    race_id,
                    record.favorite.as_ref().map(|h| h.horse_number),
                    record.rival.as_ref().map(|h| h.horse_number),
                );
                outcome.records.push(record);
            }
            Err(error) => {
                warn!("race {} failed: {}", race_id, error);
                outcome.failures.push(RaceFailure {
                    race_id: race_id.clone(),
                    error,
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetNumber, PayoutTable, PredictionStatus, RaceResultRow};

    fn ticket(ticket_type: TicketType, numbers: Vec<u8>, payment: u32) -> BettingTicketDetail {
        BettingTicketDetail {
            ticket_type,
            bet_number: BetNumber::new(numbers),
            payment,
            repayment: 0,
            winning: false,
        }
    }

    fn row(horse_number: u8, popularity: u32) -> RaceResultRow {
        RaceResultRow {
            horse_number,
            finish_order: popularity,
            horse_name: format!("Horse {}", horse_number),
            jockey: format!("Jockey {}", horse_number),
            odds: popularity as f64 * 1.8,
            popularity,
        }
    }

    fn card(rows: Vec<RaceResultRow>) -> RaceCard {
        RaceCard {
            results: rows,
            payouts: PayoutTable::default(),
        }
    }

    #[test]
    fn test_race_without_tickets_yields_empty_record() {
        let config = PredictorConfig::default();
        let card = card(vec![row(1, 1), row(2, 2)]);
        let record = resolve_race("r1", &[], &card, &config).unwrap();

        assert_eq!(record.status, PredictionStatus::Uncompleted);
        assert!(record.favorite.is_none());
        assert!(record.rival.is_none());
        assert_eq!(record.total_payment, 0);
        assert_eq!(record.total_repayment, 0);
    }

    #[test]
    fn test_quinella_tie_resolved_by_popularity() {
        // A single quinella on {3, 7} votes both horses equally; the
        // public's pick (7, rank 1) becomes favorite, 3 becomes rival.
        let config = PredictorConfig::default();
        let card = card(vec![row(3, 4), row(7, 1), row(12, 2)]);
        let tickets = vec![ticket(TicketType::Quinella, vec![3, 7], 1000)];

        let record = resolve_race("r1", &tickets, &card, &config).unwrap();
        assert_eq!(record.status, PredictionStatus::Completed);
        assert_eq!(record.favorite.as_ref().unwrap().horse_number, 7);
        assert_eq!(record.rival.as_ref().unwrap().horse_number, 3);
    }

    #[test]
    fn test_win_and_exacta_resolve_without_tiebreak() {
        let config = PredictorConfig::default();
        let card = card(vec![row(4, 2), row(9, 5)]);
        let tickets = vec![
            ticket(TicketType::Win, vec![4], 2000),
            ticket(TicketType::Exacta, vec![4, 9], 400),
        ];

        let record = resolve_race("r1", &tickets, &card, &config).unwrap();
        assert_eq!(record.favorite.as_ref().unwrap().horse_number, 4);
        assert_eq!(record.rival.as_ref().unwrap().horse_number, 9);
        assert_eq!(record.total_payment, 2400);
    }

    #[test]
    fn test_favorite_and_rival_never_coincide() {
        let config = PredictorConfig::default();
        let card = card((1..=12).map(|n| row(n, n as u32)).collect());
        let tickets = vec![
            ticket(TicketType::Win, vec![4], 900),
            ticket(TicketType::Exacta, vec![4, 9], 400),
            ticket(TicketType::Quinella, vec![4, 7], 600),
            ticket(TicketType::Trio, vec![2, 4, 9], 300),
        ];

        let record = resolve_race("r1", &tickets, &card, &config).unwrap();
        let favorite = record.favorite.unwrap().horse_number;
        let rival = record.rival.unwrap().horse_number;
        assert_ne!(favorite, rival);
    }

    #[test]
    fn test_resolution_ignores_ticket_iteration_order() {
        let config = PredictorConfig::default();
        let rows: Vec<RaceResultRow> = (1..=12).map(|n| row(n, n as u32)).collect();
        let tickets = vec![
            ticket(TicketType::Quinella, vec![3, 7], 500),
            ticket(TicketType::Quinella, vec![7, 9], 500),
            ticket(TicketType::Trio, vec![3, 7, 9], 300),
            ticket(TicketType::Place, vec![9], 200),
        ];

        let forward = resolve_race("r1", &tickets, &card(rows.clone()), &config).unwrap();

        let mut reversed = tickets.clone();
        reversed.reverse();
        let backward = resolve_race("r1", &reversed, &card(rows), &config).unwrap();

        assert_eq!(
            forward.favorite.as_ref().map(|h| h.horse_number),
            backward.favorite.as_ref().map(|h| h.horse_number)
        );
        assert_eq!(
            forward.rival.as_ref().map(|h| h.horse_number),
            backward.rival.as_ref().map(|h| h.horse_number)
        );
    }

    #[test]
    fn test_payment_conserved_across_assembly() {
        let config = PredictorConfig::default();
        let card = card(vec![row(4, 1)]);
        let tickets = vec![
            ticket(TicketType::Win, vec![4], 1200),
            ticket(TicketType::Place, vec![4], 800),
            ticket(TicketType::Quinella, vec![4, 9], 500),
        ];
        let input_total: u64 = tickets.iter().map(|t| t.payment as u64).sum();

        let record = resolve_race("r1", &tickets, &card, &config).unwrap();
        assert_eq!(record.total_payment, input_total);
    }

    #[test]
    fn test_malformed_bet_number_fails_the_race() {
        let config = PredictorConfig::default();
        let card = card(vec![row(4, 1)]);
        let tickets = vec![ticket(TicketType::Trifecta, vec![4, 9], 100)];

        let err = resolve_race("r1", &tickets, &card, &config).unwrap_err();
        assert!(matches!(err, PredictError::MalformedBetNumber { .. }));
    }

    #[test]
    fn test_batch_collects_failures_without_aborting() {
        let config = PredictorConfig::default();

        let mut tickets_by_race = HashMap::new();
        tickets_by_race.insert(
            "2024_tokyo_11".to_string(),
            vec![ticket(TicketType::Win, vec![4], 2000)],
        );
        tickets_by_race.insert(
            "2024_kyoto_05".to_string(),
            vec![ticket(TicketType::Win, vec![1], 500)],
        );

        // Only one of the two races has result data.
        let mut cards = HashMap::new();
        cards.insert("2024_tokyo_11".to_string(), card(vec![row(4, 1)]));

        let outcome = resolve_batch(&tickets_by_race, &cards, &config);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].race_id, "2024_tokyo_11");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].race_id, "2024_kyoto_05");
        assert!(matches!(
            outcome.failures[0].error,
            PredictError::UnknownRace { .. }
        ));
    }

    #[test]
    fn test_batch_output_order_is_stable() {
        let config = PredictorConfig::default();
        let mut tickets_by_race = HashMap::new();
        let mut cards = HashMap::new();
        for race_id in ["r3", "r1", "r2"] {
            tickets_by_race.insert(
                race_id.to_string(),
                vec![ticket(TicketType::Win, vec![4], 2000)],
            );
            cards.insert(race_id.to_string(), card(vec![row(4, 1)]));
        }

        let outcome = resolve_batch(&tickets_by_race, &cards, &config);
        let order: Vec<&str> = outcome.records.iter().map(|r| r.race_id.as_str()).collect();
        assert_eq!(order, vec!["r1", "r2", "r3"]);
    }
}
