//! Garden configuration: controller tuning, forest layout, paths,
//! sculptures, ambience emitters and audio behaviours.
//!
//! Configuration is JSON. Missing fields fall back to the defaults below,
//! so a file only needs to name what it changes.
//!
//! # Example
//!
//! ```ignore
//! use garden_core::config::load_config;
//!
//! let config = load_config("assets/garden.json")?;
//! assert_eq!(config.forest.elem_spacing, 12);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::audio::{Ease, FadeSpec};
use crate::behavior::BehaviorEntry;
use crate::forest::{CullingTier, ElementCategory};

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// Malformed JSON
    Json(serde_json::Error),
    /// Well-formed but violates a configuration invariant
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rectangle the player is kept inside (x/z plane).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: -130.0,
            max_x: 140.0,
            min_z: -240.0,
            max_z: 250.0,
        }
    }
}

impl WorldBounds {
    /// Clamp a horizontal position into the rectangle.
    pub fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        (x.clamp(self.min_x, self.max_x), z.clamp(self.min_z, self.max_z))
    }
}

/// Player controller tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Walking speed (units/sec)
    pub move_speed: f32,
    /// Degrees of rotation per unit of look axis
    pub mouse_sensitivity: f32,
    /// Converts raw mouse motion (pixels) into look-axis units
    pub mouse_axis_scale: f32,
    /// Pitch clamp in degrees, within [0, 90]
    pub y_rotation_limit: f32,
    /// Distance at which a sculpture counts as in bounds
    pub sculpture_bound: f32,
    /// Stillness seconds before the inner world is revealed
    pub transition_secs: f32,
    /// Quantized seconds between sculpture drains
    pub drain_interval_secs: i32,
    /// Fog start distance outside a stillness episode
    pub default_fog_start: f32,
    /// Exponential rate at which fog closes in during a transition
    pub fog_growth_rate: f32,
    /// Fog end distance
    pub fog_end: f32,
    /// Fog color (linear RGB)
    pub fog_color: [f32; 3],
    /// Props within this Manhattan distance of a revealed sculpture are hidden
    pub clear_radius: f32,
    /// Fixed eye height above the ground
    pub eye_height: f32,
    pub bounds: WorldBounds,
    /// Fade applied to filler ambience when an episode starts
    pub ambience_fade_out: FadeSpec,
    /// Fade applied to filler ambience when movement resumes
    pub ambience_restore: FadeSpec,
    pub start_position: [f32; 3],
    /// Audio program bound to the player at session start
    pub footsteps_program: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            mouse_sensitivity: 2.0,
            mouse_axis_scale: 0.1,
            y_rotation_limit: 88.0,
            sculpture_bound: 10.0,
            transition_secs: 30.0,
            drain_interval_secs: 6,
            default_fog_start: 50.0,
            fog_growth_rate: 0.3,
            fog_end: 300.0,
            fog_color: [0.55, 0.58, 0.62],
            clear_radius: 25.0,
            eye_height: 3.0,
            bounds: WorldBounds::default(),
            ambience_fade_out: FadeSpec::new(0.0, 26.0, 7.0, Ease::InQuad),
            ambience_restore: FadeSpec::new(1.0, 0.1, 0.0, Ease::OutExpo),
            start_position: [0.0, 3.0, -200.0],
            footsteps_program: "footsteps.ck".to_string(),
        }
    }
}

/// Procedural forest layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Extent of the lattice along x, centered on the origin
    pub forest_x: i32,
    /// Extent of the lattice along z, centered on the origin
    pub forest_z: i32,
    /// Lattice step
    pub elem_spacing: i32,
    /// Cells closer than this to any path sample are left empty
    pub path_margin: f32,
    /// Samples taken along each path
    pub samples_per_path: usize,
    /// Visibility range for near-tier props
    pub near_cull_distance: f32,
    /// Visibility range for far-tier props
    pub far_cull_distance: f32,
    /// Fixed seed for reproducible layouts; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Categories in priority order
    pub categories: Vec<ElementCategory>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            forest_x: 350,
            forest_z: 550,
            elem_spacing: 12,
            path_margin: 20.0,
            samples_per_path: 100,
            near_cull_distance: 200.0,
            far_cull_distance: 350.0,
            seed: None,
            categories: vec![
                ElementCategory::new(
                    "Trees",
                    &[
                        "models/tree_pine.glb#Scene0",
                        "models/tree_birch.glb#Scene0",
                        "models/tree_dead.glb#Scene0",
                    ],
                    5,
                ),
                ElementCategory::new(
                    "SilentSculptures",
                    &["models/silent_arch.glb#Scene0", "models/silent_monolith.glb#Scene0"],
                    1,
                ),
                ElementCategory::new(
                    "Bushes",
                    &["models/bush_round.glb#Scene0", "models/bush_fern.glb#Scene0"],
                    6,
                ),
            ],
        }
    }
}

impl ForestConfig {
    /// Visibility range for a tier.
    pub fn cull_distance(&self, tier: CullingTier) -> f32 {
        match tier {
            CullingTier::Near => self.near_cull_distance,
            CullingTier::Far => self.far_cull_distance,
        }
    }
}

/// A sculpture and its paired inner world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SculptureConfig {
    pub name: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub inner_world_model: Option<String>,
    /// Spin rate (degrees/sec per axis) for the inner world's particles
    #[serde(default)]
    pub inner_world_spin: Option<[f32; 3]>,
}

impl SculptureConfig {
    pub fn new(name: &str, position: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            position,
            model: None,
            inner_world_model: None,
            inner_world_spin: None,
        }
    }
}

/// A filler-ambience emitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillerConfig {
    pub name: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub clip: Option<String>,
}

/// Top-level garden configuration.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    pub controller: ControllerConfig,
    pub forest: ForestConfig,
    /// Path control points, one list per path
    pub paths: Vec<Vec<[f32; 3]>>,
    pub sculptures: Vec<SculptureConfig>,
    pub fillers: Vec<FillerConfig>,
    pub behaviors: Vec<BehaviorEntry>,
    /// Audio clip played for each program name
    pub program_clips: HashMap<String, String>,
}

impl Default for GardenConfig {
    fn default() -> Self {
        let sculpture = |name: &str, position: [f32; 3]| SculptureConfig {
            model: Some(format!("models/{}.glb#Scene0", name)),
            inner_world_model: Some(format!("models/{}_inner.glb#Scene0", name)),
            inner_world_spin: Some([0.0, 6.0, 0.0]),
            ..SculptureConfig::new(name, position)
        };

        Self {
            controller: ControllerConfig::default(),
            forest: ForestConfig::default(),
            paths: vec![
                vec![
                    [0.0, 0.0, -240.0],
                    [-20.0, 0.0, -120.0],
                    [10.0, 0.0, 0.0],
                    [-15.0, 0.0, 120.0],
                    [0.0, 0.0, 245.0],
                ],
                vec![
                    [-125.0, 0.0, 40.0],
                    [-40.0, 0.0, 10.0],
                    [60.0, 0.0, -30.0],
                    [135.0, 0.0, -60.0],
                ],
            ],
            sculptures: vec![
                sculpture("spire", [-60.0, 0.0, -150.0]),
                sculpture("hollow", [80.0, 0.0, -90.0]),
                sculpture("chime", [-90.0, 0.0, 60.0]),
                sculpture("lantern", [70.0, 0.0, 110.0]),
                sculpture("cradle", [0.0, 0.0, 200.0]),
            ],
            fillers: vec![
                FillerConfig {
                    name: "static_north".to_string(),
                    position: [0.0, 5.0, 180.0],
                    clip: Some("audio/static_north.ogg".to_string()),
                },
                FillerConfig {
                    name: "static_south".to_string(),
                    position: [0.0, 5.0, -180.0],
                    clip: Some("audio/static_south.ogg".to_string()),
                },
            ],
            behaviors: Vec::new(),
            program_clips: HashMap::new(),
        }
    }
}

impl GardenConfig {
    /// Parse and validate configuration from a JSON string.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: GardenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the controller and placer rely on.
    pub fn validate(&self) -> ConfigResult<()> {
        let c = &self.controller;
        if !(0.0..=90.0).contains(&c.y_rotation_limit) {
            return Err(invalid(format!(
                "y_rotation_limit {} outside [0, 90]",
                c.y_rotation_limit
            )));
        }
        if c.drain_interval_secs <= 0 {
            return Err(invalid("drain_interval_secs must be positive".to_string()));
        }
        if c.sculpture_bound < 0.0 {
            return Err(invalid("sculpture_bound must not be negative".to_string()));
        }
        if c.bounds.min_x > c.bounds.max_x || c.bounds.min_z > c.bounds.max_z {
            return Err(invalid("world bounds are inverted".to_string()));
        }

        let f = &self.forest;
        if f.elem_spacing <= 0 {
            return Err(invalid("elem_spacing must be positive".to_string()));
        }
        if f.forest_x <= 0 || f.forest_z <= 0 {
            return Err(invalid("forest extents must be positive".to_string()));
        }
        for category in &f.categories {
            if !(1..=10).contains(&category.density) {
                return Err(invalid(format!(
                    "category '{}' density {} outside [1, 10]",
                    category.name, category.density
                )));
            }
            if category.prefabs.is_empty() {
                return Err(invalid(format!(
                    "category '{}' has no prefabs",
                    category.name
                )));
            }
        }

        let mut names = HashSet::new();
        for sculpture in &self.sculptures {
            if !names.insert(sculpture.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate sculpture name '{}'",
                    sculpture.name
                )));
            }
        }

        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

/// Load and validate configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<GardenConfig> {
    let json = fs::read_to_string(path)?;
    GardenConfig::from_json_str(&json)
}
