//! Designer-tunable configuration (scoring weights, combat tuning).
//!
//! Оба конфига: Bevy resources с Default и JSON загрузкой.
//! Значения по умолчанию совпадают с baseline scoring model:
//!
//! | weight                          | default | effect                                  |
//! |---------------------------------|---------|-----------------------------------------|
//! | `intent_match_bonus`            | 50      | intent equals requested intent          |
//! | `intent_mismatch_penalty`       | 25      | intent differs (subtracted)             |
//! | `distance_half_window`          | 25      | tent response spans ±this value         |
//! | `degenerate_range_extent`       | 1       | half-width at or below → no distance    |
//! | `facing_bonus`                  | 10      | Forward candidate inside facing cone    |
//! | `facing_dot_threshold`          | 0.25    | ~75.5° half cone                        |
//! | `jitter_amplitude`              | 5       | uniform [-a, +a] per scoring call       |
//! | `base_weight_scale`             | 10      | attack: selection_weight × scale        |
//! | `required_tag_bonus`            | 5       | attack: per required tag present        |
//! | `missing_required_tag_penalty`  | 15      | attack: per required tag missing        |
//! | `excluded_tag_penalty`          | 20      | attack: per excluded tag present        |
//! | `situation_match_bonus`         | 10      | attack: per satisfied required flag     |
//! | `situation_mismatch_penalty`    | 20      | attack: per violated required/excluded  |

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("weight `{name}` must be finite and non-negative (got {value})")]
    InvalidWeight { name: &'static str, value: f32 },
}

/// Scoring weights shared by attack and defense choosers.
#[derive(Resource, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct ScoringConfig {
    pub intent_match_bonus: f32,
    pub intent_mismatch_penalty: f32,
    pub distance_half_window: f32,
    pub degenerate_range_extent: f32,
    pub facing_bonus: f32,
    pub facing_dot_threshold: f32,
    pub jitter_amplitude: f32,
    pub base_weight_scale: f32,
    pub required_tag_bonus: f32,
    pub missing_required_tag_penalty: f32,
    pub excluded_tag_penalty: f32,
    pub situation_match_bonus: f32,
    pub situation_mismatch_penalty: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            intent_match_bonus: 50.0,
            intent_mismatch_penalty: 25.0,
            distance_half_window: 25.0,
            degenerate_range_extent: 1.0,
            facing_bonus: 10.0,
            facing_dot_threshold: 0.25,
            jitter_amplitude: 5.0,
            base_weight_scale: 10.0,
            required_tag_bonus: 5.0,
            missing_required_tag_penalty: 15.0,
            excluded_tag_penalty: 20.0,
            situation_match_bonus: 10.0,
            situation_mismatch_penalty: 20.0,
        }
    }
}

impl ScoringConfig {
    /// Parse from JSON; missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("intent_match_bonus", self.intent_match_bonus),
            ("intent_mismatch_penalty", self.intent_mismatch_penalty),
            ("distance_half_window", self.distance_half_window),
            ("degenerate_range_extent", self.degenerate_range_extent),
            ("facing_bonus", self.facing_bonus),
            ("jitter_amplitude", self.jitter_amplitude),
            ("base_weight_scale", self.base_weight_scale),
            ("required_tag_bonus", self.required_tag_bonus),
            ("missing_required_tag_penalty", self.missing_required_tag_penalty),
            ("excluded_tag_penalty", self.excluded_tag_penalty),
            ("situation_match_bonus", self.situation_match_bonus),
            ("situation_mismatch_penalty", self.situation_mismatch_penalty),
        ];

        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        // Порог facing: косинус, может быть отрицательным, но не NaN
        if !self.facing_dot_threshold.is_finite() {
            return Err(ConfigError::InvalidWeight {
                name: "facing_dot_threshold",
                value: self.facing_dot_threshold,
            });
        }

        Ok(())
    }
}

/// Combat tuning outside of scoring.
#[derive(Resource, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct CombatConfig {
    /// Radius for the attack-started target lookup (world units)
    pub attack_target_range: f32,
    /// Blend in/out cap when chaining from an open combo window (seconds)
    pub combo_blend_cap: f32,
    /// Movement input below this length maps to Omni
    pub direction_dead_zone: f32,
    /// Dot threshold for Forward/Backward (then Right/Left) classification (~60°)
    pub direction_threshold: f32,
    /// Speed above which the agent counts as running
    pub running_speed_threshold: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_target_range: 2500.0,
            combo_blend_cap: 0.05,
            direction_dead_zone: 0.2,
            direction_threshold: 0.5,
            running_speed_threshold: 300.0,
        }
    }
}

impl CombatConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("attack_target_range", self.attack_target_range),
            ("combo_blend_cap", self.combo_blend_cap),
            ("direction_dead_zone", self.direction_dead_zone),
            ("running_speed_threshold", self.running_speed_threshold),
        ];

        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        // Dot threshold: косинус в [-1, 1]
        if !(-1.0..=1.0).contains(&self.direction_threshold) {
            return Err(ConfigError::InvalidWeight {
                name: "direction_threshold",
                value: self.direction_threshold,
            });
        }

        Ok(())
    }
}
