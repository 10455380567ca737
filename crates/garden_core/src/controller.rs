//! First-person player controller and the stillness-triggered world transition.
//!
//! Walking with the keyboard and looking with the mouse is ordinary
//! first-person movement. Standing still within reach of a sculpture starts
//! a stillness episode:
//! - fog closes in exponentially with elapsed stillness
//! - filler ambience fades out
//! - other sculptures vanish one at a time, farthest first
//! - after `transition_secs` the sculpture's inner world is revealed and
//!   nearby forest props are cleared
//!
//! Walking again restores the forest.

use bevy::prelude::*;

use crate::audio::{AudioBus, AudioCollaborator, AudioTarget};
use crate::config::ControllerConfig;
use crate::input::FrameInput;
use crate::stillness::{fog_start_distance, StillnessTimer, UNSET_MARKER};
use crate::world::GardenWorld;

/// Whether the player is walking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MovementMode {
    #[default]
    Stationary,
    Moving,
}

impl MovementMode {
    /// Value sent to the audio engine's `mode` parameter.
    pub fn as_value(self) -> f32 {
        match self {
            MovementMode::Stationary => 0.0,
            MovementMode::Moving => 1.0,
        }
    }
}

/// Where the player is in the transition cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Moving,
    /// Still, but not near any sculpture
    Searching,
    /// Still near a sculpture, inner world not yet revealed
    Transitioning,
    /// Inner world revealed
    Revealed,
}

/// Outcome of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// The quit action was held this frame
    pub quit_requested: bool,
    /// Movement mode differs from the previous frame
    pub mode_changed: bool,
    /// Sculpture the player is in bounds of, if still
    pub in_bounds: Option<usize>,
}

#[derive(Resource, Clone, Debug)]
pub struct PlayerController {
    config: ControllerConfig,
    position: Vec3,
    /// Yaw (x) and pitch (y) in degrees
    rotation: Vec2,
    orientation: Quat,
    mode: MovementMode,
    previous_mode: MovementMode,
    timer: StillnessTimer,
    /// Sculpture indices ordered nearest to farthest at episode start
    drain_order: Vec<usize>,
    in_bounds: Option<usize>,
    revealed: Option<usize>,
    stage: Stage,
}

impl PlayerController {
    pub fn new(mut config: ControllerConfig) -> Self {
        config.y_rotation_limit = config.y_rotation_limit.clamp(0.0, 90.0);
        config.drain_interval_secs = config.drain_interval_secs.max(1);
        let position = Vec3::from(config.start_position);
        Self {
            config,
            position,
            rotation: Vec2::ZERO,
            orientation: Quat::IDENTITY,
            mode: MovementMode::Stationary,
            previous_mode: MovementMode::Stationary,
            timer: StillnessTimer::default(),
            drain_order: Vec::new(),
            in_bounds: None,
            revealed: None,
            stage: Stage::Searching,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Yaw and pitch in degrees.
    pub fn rotation_degrees(&self) -> Vec2 {
        self.rotation
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn timer(&self) -> &StillnessTimer {
        &self.timer
    }

    /// Sculptures not yet drained this episode, nearest first.
    pub fn drain_order(&self) -> &[usize] {
        &self.drain_order
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }

    /// Bind the footstep program to the player.
    pub fn start(&self, audio: &mut dyn AudioCollaborator) {
        audio.start_program(AudioTarget::Player, &self.config.footsteps_program, true);
    }

    /// Run one frame.
    pub fn advance<A: AudioBus + ?Sized>(
        &mut self,
        input: &FrameInput,
        dt: f32,
        world: &mut GardenWorld,
        audio: &mut A,
    ) -> FrameReport {
        let mut report = FrameReport {
            quit_requested: input.quit,
            ..default()
        };

        self.in_bounds = None;
        if input.is_walking() {
            if self.mode == MovementMode::Stationary {
                self.on_resume_movement(world, audio);
            }
            self.mode = MovementMode::Moving;
        } else {
            if self.mode == MovementMode::Moving {
                self.on_begin_stillness();
            }

            self.in_bounds = world.which_sculpture(self.position, self.config.sculpture_bound);
            if let Some(index) = self.in_bounds {
                if self.timer.elapsed() <= self.config.transition_secs {
                    self.transition(index, dt, world, audio);
                } else {
                    self.activate_inner_world(index, world, audio);
                }
            }
        }
        report.in_bounds = self.in_bounds;

        let movement = movement_vector(input, self.orientation);
        self.position += movement * self.config.move_speed * dt;

        let (x, z) = self.config.bounds.clamp(self.position.x, self.position.z);
        self.position = Vec3::new(x, self.config.eye_height, z);

        self.rotation.x += input.look.x * self.config.mouse_sensitivity;
        self.rotation.y += input.look.y * self.config.mouse_sensitivity;
        self.rotation.y = self
            .rotation
            .y
            .clamp(-self.config.y_rotation_limit, self.config.y_rotation_limit);
        self.orientation = orientation_from_degrees(self.rotation);

        if self.mode != self.previous_mode {
            audio.set_parameter(AudioTarget::Player, "mode", self.mode.as_value());
            audio.broadcast_event(AudioTarget::Player, "changeHappened");
            self.previous_mode = self.mode;
            report.mode_changed = true;
        }

        self.update_stage();
        report
    }

    /// Movement stopped: start a new stillness period.
    pub fn on_begin_stillness(&mut self) {
        self.mode = MovementMode::Stationary;
        self.timer.reset();
        self.drain_order.clear();
    }

    /// Movement resumed after stillness: restore fog, forest, sculptures and ambience.
    pub fn on_resume_movement<A: AudioBus + ?Sized>(
        &mut self,
        world: &mut GardenWorld,
        audio: &mut A,
    ) {
        world.set_fog_start(self.config.default_fog_start);
        world.set_forest_active(true);

        for i in 0..world.sculptures().len() {
            world.set_inner_world_active(i, false);
            world.set_sculpture_active(i, true);
            world.set_sculpture_spatialized(i, true);
            audio.set_spatialized(AudioTarget::Sculpture(i), true);
        }

        for emitter in 0..world.emitters().len() {
            audio.fade_volume(emitter, self.config.ambience_restore);
        }

        if self.revealed.take().is_some() || self.timer.marker() != UNSET_MARKER {
            info!("Movement resumed; forest restored");
        }
    }

    /// One frame of the transition toward the inner world.
    pub fn transition<A: AudioBus + ?Sized>(
        &mut self,
        index: usize,
        dt: f32,
        world: &mut GardenWorld,
        audio: &mut A,
    ) {
        let second = self.timer.quantized();
        self.timer.advance(dt);
        world.set_fog_start(fog_start_distance(
            self.config.default_fog_start,
            self.config.fog_growth_rate,
            self.timer.elapsed(),
        ));

        if second == 0 {
            if self.timer.marker() == UNSET_MARKER {
                self.begin_episode(index, world, audio);
                self.timer.mark(0);
            }
        } else if second % self.config.drain_interval_secs == 0 && second != self.timer.marker() {
            if let Some(farthest) = self.drain_order.pop() {
                world.set_sculpture_active(farthest, false);
                debug!(
                    "Drained sculpture '{}' at {}s",
                    world.sculptures()[farthest].name,
                    second
                );
            }
            self.timer.mark(second);
        }
    }

    fn begin_episode<A: AudioBus + ?Sized>(
        &mut self,
        index: usize,
        world: &GardenWorld,
        audio: &mut A,
    ) {
        let position = self.position;
        let mut order: Vec<usize> = (0..world.sculptures().len()).collect();
        // Stable: equal distances keep declaration order
        order.sort_by(|&a, &b| {
            let da = (world.sculptures()[a].position - position).length_squared();
            let db = (world.sculptures()[b].position - position).length_squared();
            da.total_cmp(&db)
        });
        self.drain_order = order;

        for emitter in 0..world.emitters().len() {
            audio.fade_volume(emitter, self.config.ambience_fade_out);
        }

        info!(
            "Stillness episode started at sculpture '{}'",
            world.sculptures()[index].name
        );
    }

    /// Reveal the inner world paired with `index`. Re-evaluated every frame.
    pub fn activate_inner_world<A: AudioBus + ?Sized>(
        &mut self,
        index: usize,
        world: &mut GardenWorld,
        audio: &mut A,
    ) {
        world.set_inner_world_active(index, true);
        world.set_sculpture_spatialized(index, false);
        audio.set_spatialized(AudioTarget::Sculpture(index), false);

        let center = world.sculptures()[index].position;
        for i in 0..world.props().len() {
            let prop = world.props()[i].position;
            let manhattan = (prop.x - center.x).abs() + (prop.z - center.z).abs();
            world.set_prop_active(i, manhattan >= self.config.clear_radius);
        }

        for i in 0..world.sculptures().len() {
            if i != index {
                world.set_sculpture_active(i, false);
            }
        }

        if self.revealed != Some(index) {
            self.revealed = Some(index);
            info!(
                "Inner world of '{}' revealed ({} props hidden)",
                world.sculptures()[index].name,
                world.props().len() - world.active_prop_count()
            );
        }
    }

    fn update_stage(&mut self) {
        let stage = match (self.mode, self.in_bounds) {
            (MovementMode::Moving, _) => Stage::Moving,
            (MovementMode::Stationary, None) => Stage::Searching,
            (MovementMode::Stationary, Some(_)) => {
                if self.timer.elapsed() > self.config.transition_secs {
                    Stage::Revealed
                } else {
                    Stage::Transitioning
                }
            }
        };
        if stage != self.stage {
            info!("Stage {:?} -> {:?}", self.stage, stage);
            self.stage = stage;
        }
    }
}

/// Movement direction for the held keys.
///
/// Checks forward, back, left, right in that order and keeps the last one
/// held; directions are not summed. The vertical component is dropped.
pub fn movement_vector(input: &FrameInput, orientation: Quat) -> Vec3 {
    let forward = orientation * Vec3::NEG_Z;
    let right = orientation * Vec3::X;

    let mut movement = Vec3::ZERO;
    if input.forward {
        movement = forward;
    }
    if input.back {
        movement = -forward;
    }
    if input.left {
        movement = -right;
    }
    if input.right {
        movement = right;
    }
    movement.y = 0.0;
    movement
}

/// Yaw about world up, then pitch about the yawed horizontal axis.
pub fn orientation_from_degrees(rotation: Vec2) -> Quat {
    Quat::from_rotation_y(-rotation.x.to_radians())
        * Quat::from_rotation_x(rotation.y.to_radians())
}
