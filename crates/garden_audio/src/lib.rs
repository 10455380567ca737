//! Bevy audio bridge for the garden.
//!
//! Drains the `AudioQueue` filled by the controller each frame and applies
//! the requests to entities carrying an `AudioLink`. Programs are tracked as
//! `AudioProgram` components; a program with an entry in
//! `GardenConfig::program_clips` also gets a looping `AudioPlayer`.
//!
//! Playback follows the garden state:
//! - the player's program plays only while its `mode` parameter says moving
//! - a sculpture's program is paused while the sculpture is inactive
//! - toggling spatialization rebuilds the sink with the new setting
//!
//! Volume fades run on the entity's audio sink until they reach their target.

use std::collections::HashMap;

use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use garden_core::{
    AudioCommand, AudioLink, AudioQueue, AudioTarget, FadeSpec, GardenConfig, GardenSystems,
    GardenWorld, MovementMode,
};

pub struct GardenAudioPlugin;

impl Plugin for GardenAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioQueue>().add_systems(
            Update,
            (
                apply_audio_commands,
                update_program_playback,
                apply_playback_to_sinks,
                tick_volume_fades,
            )
                .chain()
                .after(GardenSystems::Advance),
        );
    }
}

/// A running audio program and the state the controller has pushed to it.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct AudioProgram {
    pub name: String,
    pub spatial: bool,
    pub parameters: HashMap<String, f32>,
    pub last_event: Option<String>,
    /// Whether the program's sink should be playing
    pub playing: bool,
}

impl AudioProgram {
    pub fn new(name: &str, spatial: bool) -> Self {
        Self {
            name: name.to_string(),
            spatial,
            parameters: HashMap::new(),
            last_event: None,
            playing: true,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }
}

/// Whether the program bound to `target` should be audible.
///
/// Footsteps stop while the player stands still. Sculptures fall silent when
/// drained or hidden by a revealed inner world.
pub fn should_play(
    target: AudioTarget,
    program: &AudioProgram,
    world: Option<&GardenWorld>,
) -> bool {
    match target {
        AudioTarget::Player => {
            let mode = program
                .parameter("mode")
                .unwrap_or(MovementMode::Stationary.as_value());
            mode == MovementMode::Moving.as_value()
        }
        AudioTarget::Sculpture(i) => world
            .and_then(|w| w.sculptures().get(i))
            .map_or(true, |s| s.active),
        AudioTarget::Emitter(_) => true,
    }
}

/// An in-flight volume fade on an ambience emitter.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct VolumeFade {
    pub spec: FadeSpec,
    pub from: f32,
    pub elapsed: f32,
}

impl VolumeFade {
    pub fn new(spec: FadeSpec, from: f32) -> Self {
        Self {
            spec,
            from,
            elapsed: 0.0,
        }
    }

    pub fn current(&self) -> f32 {
        self.spec.volume_at(self.from, self.elapsed)
    }

    pub fn is_finished(&self) -> bool {
        self.spec.is_finished(self.elapsed)
    }
}

/// Apply every queued request to its linked entity.
pub fn apply_audio_commands(
    mut commands: Commands,
    mut queue: ResMut<AudioQueue>,
    config: Res<GardenConfig>,
    asset_server: Option<Res<AssetServer>>,
    links: Query<(Entity, &AudioLink, Option<&AudioPlayer>)>,
    mut programs: Query<&mut AudioProgram>,
    sinks: Query<(Option<&AudioSink>, Option<&SpatialAudioSink>)>,
) {
    if queue.is_empty() {
        return;
    }

    let mut targets: HashMap<AudioTarget, Entity> = HashMap::new();
    let mut clips: HashMap<Entity, Handle<AudioSource>> = HashMap::new();
    for (entity, link, player) in links.iter() {
        targets.insert(link.0, entity);
        if let Some(player) = player {
            clips.insert(entity, player.0.clone());
        }
    }
    // Programs started this frame are not visible to the query until commands flush
    let mut started: HashMap<Entity, AudioProgram> = HashMap::new();

    for command in queue.drain() {
        match command {
            AudioCommand::StartProgram {
                target,
                name,
                spatial,
            } => {
                let Some(&entity) = targets.get(&target) else {
                    warn!("No audio entity for {:?}, dropping program {}", target, name);
                    continue;
                };
                if !clips.contains_key(&entity) {
                    if let (Some(clip), Some(assets)) =
                        (config.program_clips.get(&name), asset_server.as_ref())
                    {
                        let handle: Handle<AudioSource> = assets.load(clip.clone());
                        commands.entity(entity).insert((
                            AudioPlayer::new(handle.clone()),
                            PlaybackSettings::LOOP.with_spatial(spatial),
                        ));
                        clips.insert(entity, handle);
                    }
                }
                debug!("Starting program {} on {:?}", name, target);
                started.insert(entity, AudioProgram::new(&name, spatial));
            }
            AudioCommand::SetParameter {
                target,
                name,
                value,
            } => {
                with_program(&targets, &mut started, &mut programs, target, |_, program| {
                    debug!("{:?}: {} = {}", target, name, value);
                    program.parameters.insert(name, value);
                });
            }
            AudioCommand::BroadcastEvent { target, name } => {
                with_program(&targets, &mut started, &mut programs, target, |_, program| {
                    debug!("{:?}: event {}", target, name);
                    program.last_event = Some(name);
                });
            }
            AudioCommand::SetSpatialized { target, spatial } => {
                with_program(&targets, &mut started, &mut programs, target, |entity, program| {
                    if program.spatial == spatial {
                        return;
                    }
                    program.spatial = spatial;
                    // Spatial and plain sinks are different components, so the sink is rebuilt
                    if let Some(clip) = clips.get(&entity) {
                        commands
                            .entity(entity)
                            .remove::<(AudioSink, SpatialAudioSink)>()
                            .insert((
                                AudioPlayer::new(clip.clone()),
                                PlaybackSettings::LOOP.with_spatial(spatial),
                            ));
                    }
                    debug!("{:?}: spatialized = {}", target, spatial);
                });
            }
            AudioCommand::FadeVolume { emitter, fade } => {
                let Some(&entity) = targets.get(&AudioTarget::Emitter(emitter)) else {
                    warn!("No ambience emitter {}, dropping fade", emitter);
                    continue;
                };
                let from = match sinks.get(entity) {
                    Ok((Some(sink), _)) => sink.volume().to_linear(),
                    Ok((_, Some(sink))) => sink.volume().to_linear(),
                    _ => 1.0,
                };
                commands.entity(entity).insert(VolumeFade::new(fade, from));
            }
        }
    }

    for (entity, program) in started {
        commands.entity(entity).insert(program);
    }
}

fn with_program(
    targets: &HashMap<AudioTarget, Entity>,
    started: &mut HashMap<Entity, AudioProgram>,
    programs: &mut Query<&mut AudioProgram>,
    target: AudioTarget,
    apply: impl FnOnce(Entity, &mut AudioProgram),
) {
    let Some(&entity) = targets.get(&target) else {
        warn!("No audio entity for {:?}", target);
        return;
    };
    if let Some(program) = started.get_mut(&entity) {
        apply(entity, program);
    } else if let Ok(mut program) = programs.get_mut(entity) {
        apply(entity, &mut program);
    } else {
        warn!("{:?} has no running program", target);
    }
}

/// Decide which programs should be audible this frame.
pub fn update_program_playback(
    world: Option<Res<GardenWorld>>,
    mut programs: Query<(&AudioLink, &mut AudioProgram)>,
) {
    let world = world.as_deref();
    for (link, mut program) in programs.iter_mut() {
        let playing = should_play(link.0, &program, world);
        if program.playing != playing {
            program.playing = playing;
        }
    }
}

/// Pause or resume sinks to match their program.
pub fn apply_playback_to_sinks(
    programs: Query<(
        &AudioProgram,
        Option<&AudioSink>,
        Option<&SpatialAudioSink>,
    )>,
) {
    for (program, sink, spatial_sink) in programs.iter() {
        if let Some(sink) = sink {
            sync_paused(sink, program.playing);
        }
        if let Some(sink) = spatial_sink {
            sync_paused(sink, program.playing);
        }
    }
}

fn sync_paused(sink: &impl AudioSinkPlayback, playing: bool) {
    if playing && sink.is_paused() {
        sink.play();
    } else if !playing && !sink.is_paused() {
        sink.pause();
    }
}

/// Step volume fades and push the result to the audio sink.
pub fn tick_volume_fades(
    mut commands: Commands,
    time: Res<Time>,
    mut fades: Query<(
        Entity,
        &mut VolumeFade,
        Option<&mut AudioSink>,
        Option<&mut SpatialAudioSink>,
    )>,
) {
    let dt = time.delta_secs();
    for (entity, mut fade, sink, spatial_sink) in fades.iter_mut() {
        fade.elapsed += dt;
        let volume = Volume::Linear(fade.current());
        if let Some(mut sink) = sink {
            sink.set_volume(volume);
        }
        if let Some(mut sink) = spatial_sink {
            sink.set_volume(volume);
        }
        if fade.is_finished() {
            commands.entity(entity).remove::<VolumeFade>();
        }
    }
}
