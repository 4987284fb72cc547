//! Engine configuration
//!
//! All tunables live in one serde struct with defaults, so a partial config
//! file merges over the documented defaults and unknown keys are ignored.
//! TOML is the primary on-disk format; JSON is accepted for compatibility
//! with older deployments.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Immutable detection tunables. Replacing the active config rebuilds ray
/// geometry and, when the capture-region size changed, restarts the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reference color of the target
    pub target_color: [u8; 3],
    /// Per-channel tolerance for the target color
    pub target_color_tolerance: u8,
    /// Reference color of the crosshair pixel check
    pub crosshair_color: [u8; 3],
    /// Per-channel tolerance for the crosshair check
    pub crosshair_color_tolerance: u8,
    /// Half side of the captured square region, in pixels
    pub trigger_zone_size: u32,
    /// Half side of the center direct-hit zone, in pixels
    pub center_zone_size: u32,
    /// Maximum ray length in steps
    pub max_ray_distance: u32,
    /// Rays per fan (up, right, left each)
    pub rays_per_direction: u32,
    /// Angular spread of each fan around its anchor, degrees
    pub ray_angle_spread: f32,
    /// Worker thread count; the pipeline caps this at 8
    pub num_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_color: [252, 60, 250],
            target_color_tolerance: 60,
            crosshair_color: [65, 255, 0],
            crosshair_color_tolerance: 25,
            trigger_zone_size: 50,
            center_zone_size: 3,
            max_ray_distance: 50,
            rays_per_direction: 5,
            ray_angle_spread: 30.0,
            num_threads: 4,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML or JSON file, selected by extension. Missing keys
    /// fall back to defaults; unknown keys are ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self = match extension(path) {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Persist to a TOML or JSON file, selected by extension
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Parse(e.to_string()))?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Check field ranges. A failed reload keeps the previous config in
    /// effect, so this runs before anything is swapped in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_zone_size == 0 {
            return Err(ConfigError::Invalid {
                field: "trigger_zone_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_ray_distance == 0 {
            return Err(ConfigError::Invalid {
                field: "max_ray_distance",
                reason: "must be at least 1".into(),
            });
        }
        if self.rays_per_direction == 0 {
            return Err(ConfigError::Invalid {
                field: "rays_per_direction",
                reason: "must be at least 1".into(),
            });
        }
        if !self.ray_angle_spread.is_finite()
            || self.ray_angle_spread < 0.0
            || self.ray_angle_spread > 180.0
        {
            return Err(ConfigError::Invalid {
                field: "ray_angle_spread",
                reason: "must be between 0 and 180 degrees".into(),
            });
        }
        if self.num_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "num_threads",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}
