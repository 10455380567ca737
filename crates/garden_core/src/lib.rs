//! Core behaviour for the Stillness Garden installation.
//!
//! This crate provides:
//! - First-person player controller with the stillness-triggered world transition
//! - Procedural forest placement that keeps paths clear
//! - In-memory scene model shared by both
//! - Audio, fade and path collaborator interfaces
//! - Configuration loading
//! - The Bevy plugin that wires everything to the ECS

pub mod audio;
pub mod behavior;
pub mod config;
pub mod controller;
pub mod forest;
pub mod input;
pub mod path;
pub mod plugin;
pub mod rng;
pub mod spin;
pub mod stillness;
pub mod world;

pub use audio::{
    AudioBus, AudioCollaborator, AudioCommand, AudioQueue, AudioTarget, Ease, FadeSpec,
    VolumeFader,
};
pub use behavior::{AudioBehavior, BehaviorEntry, BehaviorTable};
pub use config::{
    load_config, ConfigError, ConfigResult, ControllerConfig, FillerConfig, ForestConfig,
    GardenConfig, SculptureConfig, WorldBounds,
};
pub use controller::{
    movement_vector, orientation_from_degrees, FrameReport, MovementMode, PlayerController, Stage,
};
pub use forest::{CullingTier, ElementCategory, ForestPlacer};
pub use input::{FrameInput, KeyBindings};
pub use path::{PathSampler, PathSet, VertexPath, VERTICES_PER_SEGMENT};
pub use plugin::{AudioLink, GardenPlayer, GardenPlugin, GardenSystems, PendingCulling, SceneLink};
pub use rng::{GardenRng, StdRandom};
pub use spin::{spin_system, Spin};
pub use stillness::{fog_start_distance, StillnessTimer, UNSET_MARKER};
pub use world::{Emitter, ForestProp, GardenWorld, InnerWorld, SceneObject, Sculpture};
