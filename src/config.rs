//! Gameplay tunables and where the game keeps its files.

use crate::error::{FlappyError, Result};
use directories::ProjectDirs;
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "flappy.toml";

/// Every gameplay constant in one place, in world units (y grows upward).
///
/// Any field may be left out of `flappy.toml`; missing fields keep their
/// default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub world_width: f64,
    pub world_height: f64,
    /// Height of the ground strip at the bottom of the world.
    pub ground_height: f64,
    pub gravity: f64,
    pub flap_velocity: f64,
    /// Horizontal speed shared by obstacles and the scrolling ground.
    pub obstacle_speed: f64,
    pub bottom_obstacle_min_fraction: f64,
    pub bottom_obstacle_max_fraction: f64,
    pub gap_to_player_height_ratio: f64,
    pub first_spawn_delay: f64,
    pub every_spawn_delay: f64,
    /// Step length of the scorecard reveal.
    pub animation_delay: f64,
    pub frame_millis: u64,
    /// Upper bound on a single frame's dt, so a stalled terminal can't tunnel
    /// the bird through the ground.
    pub max_frame_dt: f64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            world_width: 320.0,
            world_height: 480.0,
            ground_height: 80.0,
            gravity: -350.0,
            flap_velocity: 150.0,
            obstacle_speed: 250.0,
            bottom_obstacle_min_fraction: 0.1,
            bottom_obstacle_max_fraction: 0.6,
            gap_to_player_height_ratio: 3.5,
            first_spawn_delay: 0.5,
            every_spawn_delay: 2.0,
            animation_delay: 0.3,
            frame_millis: 33,
            max_frame_dt: 0.1,
        }
    }
}

impl Tunables {
    /// Vertical extent above the ground strip.
    pub fn playable_height(&self) -> f64 {
        self.world_height - self.ground_height
    }

    /// World y of the ground line.
    pub fn playable_start(&self) -> f64 {
        self.ground_height
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("obstacle_speed", self.obstacle_speed),
            ("every_spawn_delay", self.every_spawn_delay),
            ("max_frame_dt", self.max_frame_dt),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(FlappyError::InvalidTunables(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.ground_height < 0.0 || self.ground_height >= self.world_height {
            return Err(FlappyError::InvalidTunables(format!(
                "ground_height must be in [0, {}), got {}",
                self.world_height, self.ground_height
            )));
        }
        if self.first_spawn_delay < 0.0 || self.animation_delay < 0.0 {
            return Err(FlappyError::InvalidTunables(
                "delays must not be negative".to_string(),
            ));
        }
        if self.bottom_obstacle_min_fraction > self.bottom_obstacle_max_fraction {
            return Err(FlappyError::InvalidTunables(format!(
                "bottom_obstacle_min_fraction ({}) exceeds bottom_obstacle_max_fraction ({})",
                self.bottom_obstacle_min_fraction, self.bottom_obstacle_max_fraction
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let tunables: Tunables = toml::from_str(text)?;
        tunables.validate()?;
        Ok(tunables)
    }

    /// Reads tunables from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`Tunables::load`], but a broken config only costs a warning.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring {}: {e}", path.display());
            Self::default()
        })
    }
}

/// Platform directories for config, scores and the log file.
pub struct GamePaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl GamePaths {
    pub fn discover() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "flappy-felipe").ok_or(FlappyError::NoProjectDirs)?;
        let paths = Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        };
        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;
        Ok(paths)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn scores_file(&self) -> PathBuf {
        self.data_dir.join("scores.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("flappy.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let t = Tunables::default();
        assert!(t.validate().is_ok());
        assert_eq!(t.playable_start(), 80.0);
        assert_eq!(t.playable_height(), 400.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let t = Tunables::from_toml_str("gravity = -500.0\nevery_spawn_delay = 1.5\n").unwrap();
        assert_eq!(t.gravity, -500.0);
        assert_eq!(t.every_spawn_delay, 1.5);
        assert_eq!(t.flap_velocity, Tunables::default().flap_velocity);
    }

    #[test]
    fn test_inverted_fractions_rejected() {
        let text = "bottom_obstacle_min_fraction = 0.7\nbottom_obstacle_max_fraction = 0.2\n";
        assert!(matches!(
            Tunables::from_toml_str(text),
            Err(FlappyError::InvalidTunables(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            Tunables::from_toml_str("gravity = \"down\""),
            Err(FlappyError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("flappy-felipe-does-not-exist.toml");
        assert_eq!(Tunables::load(&path).unwrap(), Tunables::default());
    }
}
