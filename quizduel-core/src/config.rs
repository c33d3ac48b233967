use crate::error::{QuizduelError, Result};
use crate::types::GameConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub total_rounds: u32,
    pub category: String,
    pub bid_limits: BidLimits,
    pub tick_interval: Duration,
}

/// Range of the bid slider, in countdown ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidLimits {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for BidLimits {
    fn default() -> Self {
        Self {
            min: 1,
            max: 30,
            default: 12,
        }
    }
}

impl BidLimits {
    pub fn clamp(&self, bid: u32) -> u32 {
        bid.clamp(self.min, self.max)
    }

    pub fn contains(&self, bid: u32) -> bool {
        (self.min..=self.max).contains(&bid)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            total_rounds: 10,
            category: GameConfig::ALL_CATEGORIES.to_string(),
            bid_limits: BidLimits::default(),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl MatchConfig {
    pub fn new(total_rounds: u32, category: impl Into<String>) -> Self {
        Self {
            total_rounds,
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// The part of the configuration the client gets to see
    pub fn game_config(&self) -> GameConfig {
        GameConfig::new(self.total_rounds, self.category.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_rounds == 0 {
            return Err(QuizduelError::config("A match needs at least one round"));
        }

        if self.category.trim().is_empty() {
            return Err(QuizduelError::config("Category cannot be empty"));
        }

        let limits = &self.bid_limits;
        if limits.min == 0 {
            return Err(QuizduelError::config("Minimum bid must be greater than 0"));
        }

        if !(limits.min <= limits.default && limits.default <= limits.max) {
            return Err(QuizduelError::config(format!(
                "Default bid {} must lie within {}..={}",
                limits.default, limits.min, limits.max
            )));
        }

        if self.tick_interval.is_zero() {
            return Err(QuizduelError::config("Tick interval must be greater than 0"));
        }

        Ok(())
    }
}
