//! Item tuning
//!
//! Presets for the thrown items, loaded from JSON. Every field has a default,
//! so a tuning file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::sim::effect::{DamageRate, DamageSpec, EffectKind, EffectSpec};
use crate::sim::projectile::ProjectileConfig;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("Failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid tuning: {0}")]
    Invalid(String),
}

/// One throwable item: how it flies and what it does on activation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrenadePreset {
    #[serde(default)]
    pub projectile: ProjectileConfig,
    /// Vertical launch speed handed to the ballistic solver
    #[serde(default = "default_launch_speed")]
    pub launch_speed: f32,
    pub effect: EffectSpec,
}

fn default_launch_speed() -> f32 {
    5.0
}

impl GrenadePreset {
    /// Lands, then relocates everything nearby to a random point 8-15 units away
    pub fn wormhole() -> Self {
        Self {
            projectile: ProjectileConfig {
                fuse_duration: 1.0,
                arm_on_collision: true,
                arm_timeout: Some(4.0),
                ..Default::default()
            },
            launch_speed: 6.0,
            effect: EffectSpec {
                kind: EffectKind::TeleportRandom {
                    min_distance: 8.0,
                    max_distance: 15.0,
                    attempts: crate::consts::PLACEMENT_ATTEMPTS,
                },
                radius: 4.0,
                duration: 0.0,
                damage: None,
                can_affect_owner: false,
            },
        }
    }

    /// Pulls entities inward for three seconds, damaging every half second
    pub fn black_hole() -> Self {
        Self {
            projectile: ProjectileConfig {
                fuse_duration: 2.0,
                ..Default::default()
            },
            launch_speed: 5.0,
            effect: EffectSpec {
                kind: EffectKind::Pull { force: 3.0 },
                radius: 5.0,
                duration: 3.0,
                damage: Some(DamageSpec {
                    rate: DamageRate::PerTick(10.0),
                    interval: 0.5,
                    core_radius: 0.0,
                }),
                can_affect_owner: false,
            },
        }
    }

    /// Single burst of damage, doubled near the center
    pub fn frag() -> Self {
        Self {
            projectile: ProjectileConfig {
                fuse_duration: 2.5,
                bounciness: 0.3,
                ..Default::default()
            },
            launch_speed: 4.0,
            effect: EffectSpec {
                kind: EffectKind::DamageOnly,
                radius: 4.0,
                duration: 0.0,
                damage: Some(DamageSpec {
                    rate: DamageRate::PerTick(25.0),
                    interval: 0.0,
                    core_radius: 1.5,
                }),
                can_affect_owner: true,
            },
        }
    }

    fn validate(&self, name: &str) -> Result<(), TuningError> {
        let invalid = |what: &str| -> Result<(), TuningError> {
            Err(TuningError::Invalid(format!("{name}: {what}")))
        };

        let p = &self.projectile;
        if !p.fuse_duration.is_finite() || p.fuse_duration < 0.0 {
            return invalid("projectile.fuse_duration must be finite and non-negative");
        }
        if let Some(timeout) = p.arm_timeout
            && (!timeout.is_finite() || timeout <= 0.0)
        {
            return invalid("projectile.arm_timeout must be positive");
        }
        if !p.radius.is_finite() || p.radius <= 0.0 {
            return invalid("projectile.radius must be positive");
        }
        if !(0.0..=1.0).contains(&p.bounciness) {
            return invalid("projectile.bounciness must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&p.friction) {
            return invalid("projectile.friction must be within 0..=1");
        }
        if !p.gravity.is_finite() || p.gravity < 0.0 {
            return invalid("projectile.gravity must be finite and non-negative");
        }
        if !self.launch_speed.is_finite() {
            return invalid("launch_speed must be finite");
        }

        let e = &self.effect;
        if !e.radius.is_finite() || e.radius <= 0.0 {
            return invalid("effect.radius must be positive");
        }
        if !e.duration.is_finite() || e.duration < 0.0 {
            return invalid("effect.duration must be finite and non-negative");
        }
        match e.kind {
            EffectKind::Pull { force } if !force.is_finite() || force < 0.0 => {
                return invalid("effect.force must be finite and non-negative");
            }
            EffectKind::TeleportRandom {
                min_distance,
                max_distance,
                ..
            } if !(min_distance >= 0.0 && max_distance >= min_distance && max_distance.is_finite()) => {
                return invalid("effect teleport distances must satisfy 0 <= min <= max");
            }
            _ => {}
        }
        if let Some(damage) = e.damage {
            if !damage.interval.is_finite() || damage.interval < 0.0 {
                return invalid("effect.damage.interval must be finite and non-negative");
            }
            if e.duration > 0.0 && damage.interval <= 0.0 {
                return invalid("lingering damage needs a positive interval");
            }
            if !damage.amount_per_application().is_finite() {
                return invalid("effect.damage amount must be finite");
            }
        }
        Ok(())
    }
}

/// World-level settings plus every item preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seconds before the same entity can be relocated again
    pub relocation_cooldown: f32,
    /// RNG seed used when none is given on the command line
    pub seed: Option<u64>,
    pub wormhole: GrenadePreset,
    pub black_hole: GrenadePreset,
    pub frag: GrenadePreset,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            relocation_cooldown: crate::consts::RELOCATION_COOLDOWN,
            seed: None,
            wormhole: GrenadePreset::wormhole(),
            black_hole: GrenadePreset::black_hole(),
            frag: GrenadePreset::frag(),
        }
    }
}

impl Tuning {
    pub const PRESET_NAMES: [&'static str; 3] = ["wormhole", "black_hole", "frag"];

    /// Load tuning from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, TuningError> {
        let contents = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&contents)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Parse and validate tuning JSON
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !self.relocation_cooldown.is_finite() || self.relocation_cooldown < 0.0 {
            return Err(TuningError::Invalid(
                "relocation_cooldown must be finite and non-negative".to_string(),
            ));
        }
        for name in Self::PRESET_NAMES {
            if let Some(preset) = self.preset(name) {
                preset.validate(name)?;
            }
        }
        Ok(())
    }

    /// Look up a preset by name
    pub fn preset(&self, name: &str) -> Option<&GrenadePreset> {
        match name.to_lowercase().as_str() {
            "wormhole" => Some(&self.wormhole),
            "black_hole" | "blackhole" => Some(&self.black_hole),
            "frag" => Some(&self.frag),
            _ => None,
        }
    }
}
