use std::path::Path;

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::components::ActorKind;
use crate::error::{PhysicsError, Result};

pub const CONFIG_PATH_ENV: &str = "TILEWORLD_PHYSICS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "physics.json";

/// Per-kind motion and health tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    pub begin_health: i32,
    pub max_health: i32,
    /// Horizontal speed given immediately when a move starts.
    pub run_start_speed: f64,
    pub max_speed: f64,
    pub max_speed_ducking: f64,
    pub horizontal_acceleration: f64,
    /// Zero means the kind cannot jump.
    pub jump_speed: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindProfiles {
    pub player: MotionProfile,
    pub plant: MotionProfile,
    pub slime: MotionProfile,
    pub shark: MotionProfile,
}

impl Default for KindProfiles {
    fn default() -> Self {
        Self {
            player: MotionProfile {
                begin_health: 100,
                max_health: 500,
                run_start_speed: 1.0,
                max_speed: 3.0,
                max_speed_ducking: 1.0,
                horizontal_acceleration: 0.9,
                jump_speed: 8.0,
            },
            plant: MotionProfile {
                begin_health: 1,
                max_health: 1,
                run_start_speed: 0.5,
                max_speed: 0.5,
                max_speed_ducking: 0.5,
                horizontal_acceleration: 0.0,
                jump_speed: 0.0,
            },
            slime: MotionProfile {
                begin_health: 100,
                max_health: 100,
                run_start_speed: 0.0,
                max_speed: 2.5,
                max_speed_ducking: 2.5,
                horizontal_acceleration: 0.7,
                jump_speed: 0.0,
            },
            shark: MotionProfile {
                begin_health: 100,
                max_health: 100,
                run_start_speed: 0.0,
                max_speed: 4.0,
                max_speed_ducking: 4.0,
                horizontal_acceleration: 1.5,
                jump_speed: 2.0,
            },
        }
    }
}

/// Physics constants (tunable, loaded from JSON when present)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Longest frame `World::advance_time` accepts, in seconds.
    pub max_frame_length: f64,
    /// How long a zero-health actor lingers before removal.
    pub death_grace_period: f64,
    pub gravity: f64,
    pub meters_per_pixel: f64,
    pub magma_damage: i32,
    pub magma_cooldown: f64,
    pub water_damage: i32,
    pub water_cooldown: f64,
    pub shark_air_damage: i32,
    pub shark_air_cooldown: f64,
    pub enemy_contact_damage: i32,
    pub enemy_contact_cooldown: f64,
    pub plant_heal: i32,
    /// Health every groupmate loses when one member is hurt.
    pub group_damage: i32,
    pub plant_move_time: f64,
    pub profiles: KindProfiles,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_frame_length: 0.2,
            death_grace_period: 0.6,
            gravity: -10.0,
            meters_per_pixel: 0.01,
            magma_damage: -50,
            magma_cooldown: 0.0,
            water_damage: -2,
            water_cooldown: 0.2,
            shark_air_damage: -6,
            shark_air_cooldown: 0.2,
            enemy_contact_damage: -50,
            enemy_contact_cooldown: 0.6,
            plant_heal: 50,
            group_damage: 1,
            plant_move_time: 0.5,
            profiles: KindProfiles::default(),
        }
    }
}

impl PhysicsConfig {
    pub fn profile(&self, kind: ActorKind) -> &MotionProfile {
        match kind {
            ActorKind::Player => &self.profiles.player,
            ActorKind::Plant => &self.profiles.plant,
            ActorKind::Slime => &self.profiles.slime,
            ActorKind::Shark => &self.profiles.shark,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_frame_length.is_finite() && self.max_frame_length > 0.0) {
            return Err(PhysicsError::InvalidArgument(format!(
                "max_frame_length must be positive, got {}",
                self.max_frame_length
            )));
        }
        if !(self.meters_per_pixel.is_finite() && self.meters_per_pixel > 0.0) {
            return Err(PhysicsError::InvalidArgument(format!(
                "meters_per_pixel must be positive, got {}",
                self.meters_per_pixel
            )));
        }
        if !(self.death_grace_period.is_finite() && self.death_grace_period >= 0.0) {
            return Err(PhysicsError::InvalidArgument(format!(
                "death_grace_period must be non-negative, got {}",
                self.death_grace_period
            )));
        }
        for kind in ActorKind::ALL {
            let profile = self.profile(kind);
            if profile.max_health <= 0 || profile.begin_health > profile.max_health {
                return Err(PhysicsError::InvalidArgument(format!(
                    "{} health range {}..={} is invalid",
                    kind.label(),
                    profile.begin_health,
                    profile.max_health
                )));
            }
        }
        Ok(())
    }

    /// Loads the file named by `TILEWORLD_PHYSICS_CONFIG` (or `physics.json`),
    /// falling back to defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(cfg) => {
                    info!("[tileworld] Loaded physics config from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("[tileworld] Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = PhysicsConfig::from_json_str(r#"{ "gravity": -9.81 }"#).unwrap();
        assert_eq!(cfg.gravity, -9.81);
        assert_eq!(cfg.max_frame_length, 0.2);
        assert_eq!(cfg.profiles.player.jump_speed, 8.0);
    }

    #[test]
    fn rejects_non_positive_frame_length() {
        let err = PhysicsConfig::from_json_str(r#"{ "max_frame_length": 0.0 }"#).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PhysicsConfig::from_json_str("{ gravity: }").unwrap_err();
        assert!(matches!(err, PhysicsError::Config(_)));
    }

    #[test]
    fn rejects_begin_health_above_max() {
        let mut cfg = PhysicsConfig::default();
        cfg.profiles.slime.begin_health = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_reads_files_and_falls_back() {
        let dir = std::env::temp_dir();
        let good = dir.join("tileworld_config_test_good.json");
        let bad = dir.join("tileworld_config_test_bad.json");
        std::fs::write(&good, r#"{ "death_grace_period": 1.5 }"#).unwrap();
        std::fs::write(&bad, "not json").unwrap();

        assert_eq!(PhysicsConfig::load_from(&good).death_grace_period, 1.5);
        assert_eq!(PhysicsConfig::load_from(&bad), PhysicsConfig::default());
        assert_eq!(
            PhysicsConfig::load_from(&dir.join("tileworld_config_test_missing.json")),
            PhysicsConfig::default()
        );

        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(bad);
    }
}
