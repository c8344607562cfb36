//! Per-race error taxonomy for the resolution pipeline.

use thiserror::Error;

use crate::types::TicketType;

/// Errors that fail a single race's resolution.
///
/// Every variant is scoped to one race. The batch driver collects them and
/// keeps processing the remaining races, so the caller always gets a partial
/// result set plus the list of failures.
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    /// A betting record references a race the result collaborator knows
    /// nothing about.
    #[error("no race result data for race {race_id}")]
    UnknownRace { race_id: String },

    /// A bet number's arity does not match its ticket type. Indicates an
    /// upstream parsing defect; never ignored silently.
    #[error("bet number has {actual} horse numbers, {ticket_type} expects {expected}")]
    MalformedBetNumber {
        ticket_type: TicketType,
        expected: usize,
        actual: usize,
    },

    /// More than one favorite candidate survived the popularity tie-break.
    /// Structurally this needs every candidate to be missing from the result
    /// rows, but it is guarded rather than assumed.
    #[error("favorite still ambiguous in race {race_id}: candidates {candidates:?}")]
    AmbiguousResolution { race_id: String, candidates: Vec<u8> },

    /// A winning ticket's bet number has no entry in the race's payout table.
    #[error("no payout entry for {ticket_type} {key}")]
    UnknownPayoutEntry { ticket_type: TicketType, key: String },
}
