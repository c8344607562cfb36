//! Configuration for the baken predictor.

use serde::{Deserialize, Serialize};

use crate::types::TicketType;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Resolution tuning: the stake-share gate and the positional vote weights.
///
/// The defaults are empirically chosen against production wager history and
/// have no documented derivation; treat them as defaults, not as optimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Minimum share of the race's total stake that win tickets must carry
    /// before a win bet may fix the favorite.
    #[serde(default = "default_win_stake_share_threshold")]
    pub win_stake_share_threshold: f64,
    /// Vote weight of the 2nd slot on ordered bet numbers (exacta family).
    #[serde(default = "default_ordered_second_weight")]
    pub ordered_second_weight: f64,
    /// Vote weight of the 3rd slot on ordered bet numbers (trifecta family).
    #[serde(default = "default_ordered_third_weight")]
    pub ordered_third_weight: f64,
}

fn default_win_stake_share_threshold() -> f64 {
    0.15
}

fn default_ordered_second_weight() -> f64 {
    0.25
}

fn default_ordered_third_weight() -> f64 {
    0.10
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            win_stake_share_threshold: default_win_stake_share_threshold(),
            ordered_second_weight: default_ordered_second_weight(),
            ordered_third_weight: default_ordered_third_weight(),
        }
    }
}

impl PredictorConfig {
    /// Vote weight for a horse number in positional slot `slot` (0-based).
    ///
    /// The lead slot always counts in full. Later slots on ordered types
    /// are weighted down: they represent lower-confidence picks.
    pub fn weight(&self, ticket_type: TicketType, slot: usize) -> f64 {
        match slot {
            0 => 1.0,
            1 if ticket_type.is_ordered() => self.ordered_second_weight,
            1 => 1.0,
            2 if ticket_type.is_ordered() => self.ordered_third_weight,
            2 => 1.0,
            _ => 0.0,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub predictor: PredictorConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (BAKEN_SERVER_PORT, etc.)
            .add_source(
                config::Environment::with_prefix("BAKEN")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
