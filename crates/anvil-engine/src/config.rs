//! Simulation configuration.
//!
//! [`SimConfig`] is plain data with a [`Default`] for every field, so a JSON
//! document only needs to name what it changes:
//!
//! ```
//! use anvil_engine::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "seed": 7, "columns": 12 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.columns, 12);
//! assert_eq!(config.rows, 10);
//! ```

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Tunables of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the simulation RNG.
    pub seed: u64,
    pub columns: i32,
    pub rows: i32,
    /// Slide travel speed in tiles per second.
    pub slide_speed: f64,
    /// Visual settle time after a rotation.
    pub rotate_duration_ms: f64,
    /// Delay between the heal effect and the hit point change.
    pub heal_delay_ms: f64,
    /// Logic tick cadence.
    pub logic_interval_ms: f64,
    /// Ore spawner period.
    pub spawn_interval_ms: f64,
    /// Chance that a spawn outside a raid is a goblin instead of ore.
    pub goblin_chance: f64,
    /// Player actions before the first raid.
    pub raid_threshold: u32,
    /// Threshold increase after each raid.
    pub raid_threshold_growth: u32,
    /// Maximum hostiles per raid.
    pub raid_size: u32,
    pub starting_coins: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            columns: 10,
            rows: 10,
            slide_speed: 30.0,
            rotate_duration_ms: 100.0,
            heal_delay_ms: 300.0,
            logic_interval_ms: 500.0,
            spawn_interval_ms: 10_000.0,
            goblin_chance: 0.1,
            raid_threshold: 50,
            raid_threshold_growth: 25,
            raid_size: 10,
            starting_coins: 0,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        fn invalid(reason: String) -> Result<(), EngineError> {
            Err(EngineError::InvalidConfig { reason })
        }

        if self.columns <= 0 || self.rows <= 0 {
            return invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.columns, self.rows
            ));
        }
        let positive = [
            ("slide_speed", self.slide_speed),
            ("logic_interval_ms", self.logic_interval_ms),
            ("spawn_interval_ms", self.spawn_interval_ms),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return invalid(format!("{name} must be positive and finite, got {value}"));
            }
        }
        let non_negative = [
            ("rotate_duration_ms", self.rotate_duration_ms),
            ("heal_delay_ms", self.heal_delay_ms),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return invalid(format!("{name} must be non-negative, got {value}"));
            }
        }
        if !(0.0..=1.0).contains(&self.goblin_chance) {
            return invalid(format!(
                "goblin_chance must lie in [0, 1], got {}",
                self.goblin_chance
            ));
        }
        if self.raid_threshold == 0 {
            return invalid("raid_threshold must be at least 1".to_owned());
        }
        Ok(())
    }
}
