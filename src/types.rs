//! Domain and API types for the baken predictor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::PredictError;

/// Bet ticket categories on the JRA ticket menu.
///
/// Wheel and formation variants are purchased as multiple lines but settle
/// against the payout table of their origin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Win,
    Place,
    BracketQuinella,
    Quinella,
    Exacta,
    ExactaWheelOfFirst,
    QuinellaPlace,
    QuinellaPlaceWheel,
    Trio,
    TrioFormation,
    TrioWheelOfFirst,
    Trifecta,
    TrifectaFormation,
    TrifectaWheelOfFirst,
    TrifectaWheelOfSecondMulti,
}

impl TicketType {
    /// Ticket types in resolution priority order, highest confidence first.
    /// Types not listed never drive candidate narrowing; they still count
    /// toward stake totals and winning tickets.
    pub const RESOLUTION_ORDER: [TicketType; 13] = [
        TicketType::Win,
        TicketType::Exacta,
        TicketType::Trifecta,
        TicketType::TrifectaWheelOfFirst,
        TicketType::TrifectaFormation,
        TicketType::QuinellaPlaceWheel,
        TicketType::Quinella,
        TicketType::QuinellaPlace,
        TicketType::TrioWheelOfFirst,
        TicketType::Trio,
        TicketType::TrioFormation,
        TicketType::Place,
        TicketType::BracketQuinella,
    ];

    /// Canonical type used when looking up official payout tables.
    pub fn origin(self) -> TicketType {
        match self {
            TicketType::ExactaWheelOfFirst => TicketType::Exacta,
            TicketType::QuinellaPlaceWheel => TicketType::QuinellaPlace,
            TicketType::TrioFormation | TicketType::TrioWheelOfFirst => TicketType::Trio,
            TicketType::TrifectaFormation
            | TicketType::TrifectaWheelOfFirst
            | TicketType::TrifectaWheelOfSecondMulti => TicketType::Trifecta,
            other => other,
        }
    }

    /// Number of horse numbers a bet number of this type carries.
    pub fn cardinality(self) -> usize {
        match self.origin() {
            TicketType::Win | TicketType::Place => 1,
            TicketType::BracketQuinella
            | TicketType::Quinella
            | TicketType::Exacta
            | TicketType::QuinellaPlace => 2,
            _ => 3,
        }
    }

    /// Whether slot position inside the bet number predicts finish order.
    pub fn is_ordered(self) -> bool {
        matches!(self.origin(), TicketType::Exacta | TicketType::Trifecta)
    }

    pub fn name(self) -> &'static str {
        match self {
            TicketType::Win => "win",
            TicketType::Place => "place",
            TicketType::BracketQuinella => "bracket_quinella",
            TicketType::Quinella => "quinella",
            TicketType::Exacta => "exacta",
            TicketType::ExactaWheelOfFirst => "exacta_wheel_of_first",
            TicketType::QuinellaPlace => "quinella_place",
            TicketType::QuinellaPlaceWheel => "quinella_place_wheel",
            TicketType::Trio => "trio",
            TicketType::TrioFormation => "trio_formation",
            TicketType::TrioWheelOfFirst => "trio_wheel_of_first",
            TicketType::Trifecta => "trifecta",
            TicketType::TrifectaFormation => "trifecta_formation",
            TicketType::TrifectaWheelOfFirst => "trifecta_wheel_of_first",
            TicketType::TrifectaWheelOfSecondMulti => "trifecta_wheel_of_second_multi",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, fixed-arity sequence of horse numbers on one ticket line.
///
/// Whether the order carries meaning depends on the ticket type: an exacta
/// `4-9` predicts 4 then 9, a quinella `4-9` is the unordered pair {4, 9}.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetNumber(Vec<u8>);

impl BetNumber {
    pub fn new(numbers: Vec<u8>) -> Self {
        Self(numbers)
    }

    pub fn numbers(&self) -> &[u8] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Check the arity against the ticket type's cardinality.
    pub fn validate(&self, ticket_type: TicketType) -> Result<(), PredictError> {
        let expected = ticket_type.cardinality();
        if self.arity() != expected {
            return Err(PredictError::MalformedBetNumber {
                ticket_type,
                expected,
                actual: self.arity(),
            });
        }
        Ok(())
    }

    /// Key into the official payout table, e.g. "4-9-12". Positions are
    /// sorted ascending for unordered origin types so any purchase order
    /// of the same combination hits the same entry.
    pub fn payout_key(&self, ticket_type: TicketType) -> String {
        let mut numbers = self.0.clone();
        if !ticket_type.is_ordered() {
            numbers.sort_unstable();
        }
        numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for BetNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("-");
        f.write_str(&joined)
    }
}

/// One purchased ticket line. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingTicketDetail {
    pub ticket_type: TicketType,
    pub bet_number: BetNumber,
    /// Stake in yen.
    pub payment: u32,
    /// Payout in yen, 0 if lost.
    #[serde(default)]
    pub repayment: u32,
    #[serde(default)]
    pub winning: bool,
}

/// One starting horse's official result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceResultRow {
    pub horse_number: u8,
    pub finish_order: u32,
    pub horse_name: String,
    pub jockey: String,
    /// Win odds, decimal format (e.g. 4.2).
    pub odds: f64,
    /// Official popularity rank, 1 = most publicly bet.
    pub popularity: u32,
}

/// Official payout odds per origin ticket type, keyed by bet number string
/// (unordered combinations keyed in ascending order).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutTable {
    #[serde(default)]
    pub win: HashMap<String, f64>,
    #[serde(default)]
    pub place: HashMap<String, f64>,
    #[serde(default)]
    pub bracket_quinella: HashMap<String, f64>,
    #[serde(default)]
    pub quinella: HashMap<String, f64>,
    #[serde(default)]
    pub exacta: HashMap<String, f64>,
    #[serde(default)]
    pub quinella_place: HashMap<String, f64>,
    #[serde(default)]
    pub trio: HashMap<String, f64>,
    #[serde(default)]
    pub trifecta: HashMap<String, f64>,
}

impl PayoutTable {
    fn table(&self, origin: TicketType) -> &HashMap<String, f64> {
        match origin {
            TicketType::Win => &self.win,
            TicketType::Place => &self.place,
            TicketType::BracketQuinella => &self.bracket_quinella,
            TicketType::Quinella => &self.quinella,
            TicketType::Exacta => &self.exacta,
            TicketType::QuinellaPlace => &self.quinella_place,
            TicketType::Trio => &self.trio,
            _ => &self.trifecta,
        }
    }

    fn table_mut(&mut self, origin: TicketType) -> &mut HashMap<String, f64> {
        match origin {
            TicketType::Win => &mut self.win,
            TicketType::Place => &mut self.place,
            TicketType::BracketQuinella => &mut self.bracket_quinella,
            TicketType::Quinella => &mut self.quinella,
            TicketType::Exacta => &mut self.exacta,
            TicketType::QuinellaPlace => &mut self.quinella_place,
            TicketType::Trio => &mut self.trio,
            _ => &mut self.trifecta,
        }
    }

    /// Look up payout odds; wheel/formation variants collapse to their
    /// origin type's table.
    pub fn get(&self, ticket_type: TicketType, key: &str) -> Option<f64> {
        self.table(ticket_type.origin()).get(key).copied()
    }

    pub fn insert(&mut self, ticket_type: TicketType, key: impl Into<String>, odds: f64) {
        self.table_mut(ticket_type.origin()).insert(key.into(), odds);
    }
}

/// What the result/payout collaborator supplies for one race.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceCard {
    pub results: Vec<RaceResultRow>,
    #[serde(default)]
    pub payouts: PayoutTable,
}

/// How far resolution got for a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    /// No favorite could be fixed (e.g. no tickets on the race).
    Uncompleted,
    /// Favorite fixed, no distinguishable rival.
    FavoriteOnly,
    /// Favorite and rival both fixed.
    Completed,
}

/// A resolved pick merged with its official result row. Lookup fields stay
/// `None` when the horse number is missing from the result rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorseRecord {
    pub horse_number: u8,
    pub horse_name: Option<String>,
    pub jockey: Option<String>,
    pub odds: Option<f64>,
    pub popularity: Option<u32>,
}

/// A winning ticket line with its official payout odds attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinningTicket {
    pub ticket_type: TicketType,
    pub bet_number: BetNumber,
    pub payment: u32,
    pub repayment: u32,
    /// Official payout per 100 yen for this bet number.
    pub payout_odds: f64,
}

/// Final output for one race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub race_id: String,
    pub status: PredictionStatus,
    pub favorite: Option<HorseRecord>,
    pub rival: Option<HorseRecord>,
    pub total_payment: u64,
    pub total_repayment: u64,
    pub winning_tickets: Vec<WinningTicket>,
}

/// Batch resolution request: tickets and race cards keyed by race id.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub tickets: HashMap<String, Vec<BettingTicketDetail>>,
    #[serde(default)]
    pub races: HashMap<String, RaceCard>,
}

/// A race that failed, rendered for output.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub race_id: String,
    pub error: String,
}

/// Batch resolution response.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub records: Vec<PredictionRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureReport>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
