//! Final record assembly: merge the resolved picks with result rows,
//! stake totals, and official payouts.

use crate::error::PredictError;
use crate::types::{
    BettingTicketDetail, HorseRecord, PayoutTable, PredictionRecord, PredictionStatus,
    RaceResultRow, WinningTicket,
};

/// Build the race's immutable output record.
///
/// Sums payment and repayment over every ticket (so the totals always
/// conserve the input stakes), and attaches the official payout odds to
/// each winning line, looked up by the ticket's origin type.
pub fn assemble_record(
    race_id: &str,
    tickets: &[BettingTicketDetail],
    results: &[RaceResultRow],
    payouts: &PayoutTable,
    favorite: Option<u8>,
    rival: Option<u8>,
) -> Result<PredictionRecord, PredictError> {
    let total_payment: u64 = tickets.iter().map(|t| t.payment as u64).sum();
    let total_repayment: u64 = tickets.iter().map(|t| t.repayment as u64).sum();

    let mut winning_tickets = Vec::new();
    for ticket in tickets.iter().filter(|t| t.winning) {
        let key = ticket.bet_number.payout_key(ticket.ticket_type);
        let payout_odds = payouts.get(ticket.ticket_type, &key).ok_or_else(|| {
            PredictError::UnknownPayoutEntry {
                ticket_type: ticket.ticket_type.origin(),
                key: key.clone(),
            }
        })?;
        winning_tickets.push(WinningTicket {
            ticket_type: ticket.ticket_type,
            bet_number: ticket.bet_number.clone(),
            payment: ticket.payment,
            repayment: ticket.repayment,
            payout_odds,
        });
    }

    let status = match (favorite, rival) {
        (None, _) => PredictionStatus::Uncompleted,
        (Some(_), None) => PredictionStatus::FavoriteOnly,
        (Some(_), Some(_)) => PredictionStatus::Completed,
    };

    Ok(PredictionRecord {
        race_id: race_id.to_string(),
        status,
        favorite: favorite.map(|horse| horse_record(horse, results)),
        rival: rival.map(|horse| horse_record(horse, results)),
        total_payment,
        total_repayment,
        winning_tickets,
    })
}

/// Attach official result data to a resolved horse number.
fn horse_record(horse_number: u8, results: &[RaceResultRow]) -> HorseRecord {
    match results.iter().find(|row| row.horse_number == horse_number) {
        Some(row) => HorseRecord {
            horse_number,
            horse_name: Some(row.horse_name.clone()),
            jockey: Some(row.jockey.clone()),
            odds: Some(row.odds),
            popularity: Some(row.popularity),
        },
        None => HorseRecord {
            horse_number,
            horse_name: None,
            jockey: None,
            odds: None,
            popularity: None,
        },
    }
}
