//! Match configuration

use serde::{Deserialize, Serialize};

/// Default number of combat log lines kept
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Default turn cap for autoplay
pub const DEFAULT_MAX_TURNS: u32 = 500;

/// Settings for one match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Seed for shuffling the starting turn order (None = spawn order)
    pub shuffle_seed: Option<u64>,
    /// Combat log lines kept before the oldest is dropped
    pub log_capacity: usize,
    /// Turns `autoplay` runs before giving up
    pub max_turns: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            shuffle_seed: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl MatchConfig {
    /// Shuffle turn order with the given seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.shuffle_seed, None);
        assert_eq!(config.log_capacity, 50);
        assert_eq!(config.max_turns, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"shuffle_seed": 7}"#).unwrap();
        assert_eq!(config, MatchConfig::default().with_seed(7));
    }
}
