// Gameplay tuning. Defaults are the shipped values; the page can pass a JSON
// override to `start_game` for balancing sessions without a rebuild.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    // --- Session ---
    pub duration_secs: f64,

    // --- Horizontal inertia ---
    pub max_speed: f64, // scaled by the character's speed multiplier
    pub tap_acceleration: f64,
    pub velocity_decay: f64,     // per 60 Hz frame without a tap
    pub acceleration_decay: f64, // per 60 Hz frame
    pub acceleration_epsilon: f64,
    pub velocity_epsilon: f64,

    // --- Screen wrap ---
    pub right_boundary: f64,
    pub left_offset: f64,
    pub min_x: f64,
    pub wrap_bonus: f64,
    pub distance_per_speed: f64, // distance per unit of speed per frame

    // --- Vertical ---
    pub gravity: f64,
    pub jump_velocity: f64, // scaled by the character's jump multiplier
    pub double_jump_max_rise: f64,

    // --- Scoring ---
    pub combo_step: f64,
    pub combo_boost: f64, // step multiplier for ComboBoost characters
    pub combo_max: f64,
    pub tick_points: u64,
    pub item_points: u64,
    pub item_coins: u64,
    pub golden_points: u64,
    pub golden_coins: u64,
    pub golden_distance: f64,

    // --- Spawning (seconds) ---
    pub obstacle_interval: f64,
    pub item_interval: f64,
    pub falling_item_interval: f64,
    pub bomb_interval: f64,

    // --- Collisions ---
    pub obstacle_slowdown: f64,
    pub knockback: f64,
    pub bomb_knockback: f64,
    pub bomb_lift: f64,
    pub bomb_speed_factor: f64,
    pub bomb_coin_loss: u64, // max coins lost per bomb
    pub invulnerable_secs: f64,
    pub magnet_factor: f64, // pickup box scale for ItemMagnet characters
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,

            max_speed: 400.0,
            tap_acceleration: 30.0,
            velocity_decay: 0.95,
            acceleration_decay: 0.9,
            acceleration_epsilon: 0.1,
            velocity_epsilon: 1.0,

            right_boundary: 750.0,
            left_offset: 50.0,
            min_x: 50.0,
            wrap_bonus: 100.0,
            distance_per_speed: 0.01,

            gravity: 800.0,
            jump_velocity: 400.0,
            double_jump_max_rise: 200.0,

            combo_step: 0.5,
            combo_boost: 1.2,
            combo_max: 5.0,
            tick_points: 1,
            item_points: 100,
            item_coins: 10,
            golden_points: 5000,
            golden_coins: 500,
            golden_distance: 5000.0,

            obstacle_interval: 2.0,
            item_interval: 3.0,
            falling_item_interval: 4.5,
            bomb_interval: 5.0,

            obstacle_slowdown: 150.0,
            knockback: 50.0,
            bomb_knockback: 120.0,
            bomb_lift: 300.0,
            bomb_speed_factor: 0.3,
            bomb_coin_loss: 50,
            invulnerable_secs: 0.6,
            magnet_factor: 1.5,
        }
    }
}

impl RunConfig {
    /// Parse an override; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Config for an optional override. A malformed override is logged and
    /// the defaults are used instead.
    pub fn from_override(raw: Option<&str>) -> Self {
        match raw.map(Self::from_json) {
            None => Self::default(),
            Some(Ok(cfg)) => {
                log::info!("run config override loaded");
                cfg
            }
            Some(Err(err)) => {
                log::warn!("ignoring malformed run config override: {err}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg = RunConfig::from_json(r#"{"duration_secs": 10.0, "bomb_interval": 1.5}"#).unwrap();
        assert_eq!(cfg.duration_secs, 10.0);
        assert_eq!(cfg.bomb_interval, 1.5);
        assert_eq!(cfg.max_speed, RunConfig::default().max_speed);
    }

    #[test]
    fn override_falls_back_on_bad_json() {
        assert_eq!(RunConfig::from_override(None), RunConfig::default());
        assert_eq!(RunConfig::from_override(Some("{duration")), RunConfig::default());
        let cfg = RunConfig::from_override(Some(r#"{"gravity": 600.0}"#));
        assert_eq!(cfg.gravity, 600.0);
        assert_eq!(cfg.duration_secs, 30.0);
    }
}
