//! Audio and volume-fade collaborator interfaces.
//!
//! The controller never talks to an audio engine directly. It issues
//! program, parameter, event and spatialization requests through
//! `AudioCollaborator`, and volume fades through `VolumeFader`.
//! `AudioQueue` implements both by recording `AudioCommand`s, which the
//! audio plugin drains once per frame.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Object an audio request is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioTarget {
    /// The player (footsteps, movement mode).
    Player,
    /// A sculpture by declaration index.
    Sculpture(usize),
    /// A filler-ambience emitter by declaration index.
    Emitter(usize),
}

/// Requests understood by the audio engine.
pub trait AudioCollaborator {
    /// Start a named audio program bound to the target.
    fn start_program(&mut self, target: AudioTarget, name: &str, spatial: bool);
    /// Set a named float parameter on the target's program.
    fn set_parameter(&mut self, target: AudioTarget, name: &str, value: f32);
    /// Broadcast a named event to the target's program.
    fn broadcast_event(&mut self, target: AudioTarget, name: &str);
    /// Toggle positional audio for the target.
    fn set_spatialized(&mut self, target: AudioTarget, spatial: bool);
}

/// Smooth volume changes on filler-ambience emitters.
pub trait VolumeFader {
    fn fade_volume(&mut self, emitter: usize, fade: FadeSpec);
}

/// Everything the controller needs from audio in one bound.
pub trait AudioBus: AudioCollaborator + VolumeFader {}

impl<T: AudioCollaborator + VolumeFader + ?Sized> AudioBus for T {}

/// Easing curve applied to fade progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    OutExpo,
}

impl Ease {
    /// Map linear progress in [0, 1] onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InQuad => t * t,
            Ease::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
        }
    }
}

/// A volume fade: reach `target` over `duration` seconds after `delay` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FadeSpec {
    pub target: f32,
    pub duration: f32,
    pub delay: f32,
    pub ease: Ease,
}

impl FadeSpec {
    pub fn new(target: f32, duration: f32, delay: f32, ease: Ease) -> Self {
        Self {
            target,
            duration,
            delay,
            ease,
        }
    }

    /// Volume `elapsed` seconds after the fade was requested, starting from `from`.
    pub fn volume_at(&self, from: f32, elapsed: f32) -> f32 {
        if elapsed < self.delay {
            return from;
        }
        if self.duration <= 0.0 {
            return self.target;
        }
        let progress = (elapsed - self.delay) / self.duration;
        from + (self.target - from) * self.ease.apply(progress)
    }

    /// True once the fade has reached its target.
    pub fn is_finished(&self, elapsed: f32) -> bool {
        elapsed >= self.delay + self.duration.max(0.0)
    }
}

/// A recorded audio request.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    StartProgram {
        target: AudioTarget,
        name: String,
        spatial: bool,
    },
    SetParameter {
        target: AudioTarget,
        name: String,
        value: f32,
    },
    BroadcastEvent {
        target: AudioTarget,
        name: String,
    },
    SetSpatialized {
        target: AudioTarget,
        spatial: bool,
    },
    FadeVolume {
        emitter: usize,
        fade: FadeSpec,
    },
}

/// Frame-local buffer of audio requests.
#[derive(Resource, Default, Debug)]
pub struct AudioQueue {
    commands: Vec<AudioCommand>,
}

impl AudioQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last drain, in issue order.
    pub fn commands(&self) -> &[AudioCommand] {
        &self.commands
    }

    /// Take every pending command, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl AudioCollaborator for AudioQueue {
    fn start_program(&mut self, target: AudioTarget, name: &str, spatial: bool) {
        self.commands.push(AudioCommand::StartProgram {
            target,
            name: name.to_string(),
            spatial,
        });
    }

    fn set_parameter(&mut self, target: AudioTarget, name: &str, value: f32) {
        self.commands.push(AudioCommand::SetParameter {
            target,
            name: name.to_string(),
            value,
        });
    }

    fn broadcast_event(&mut self, target: AudioTarget, name: &str) {
        self.commands.push(AudioCommand::BroadcastEvent {
            target,
            name: name.to_string(),
        });
    }

    fn set_spatialized(&mut self, target: AudioTarget, spatial: bool) {
        self.commands
            .push(AudioCommand::SetSpatialized { target, spatial });
    }
}

impl VolumeFader for AudioQueue {
    fn fade_volume(&mut self, emitter: usize, fade: FadeSpec) {
        self.commands.push(AudioCommand::FadeVolume { emitter, fade });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        for ease in [Ease::Linear, Ease::InQuad, Ease::OutExpo] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
        }
        assert!((Ease::InQuad.apply(0.5) - 0.25).abs() < 1e-6);
        assert!(Ease::OutExpo.apply(0.5) > 0.9);
    }

    #[test]
    fn test_fade_respects_delay() {
        let fade = FadeSpec::new(0.0, 26.0, 7.0, Ease::InQuad);
        assert_eq!(fade.volume_at(1.0, 0.0), 1.0);
        assert_eq!(fade.volume_at(1.0, 6.9), 1.0);
        // Halfway through the ramp, in-quad has covered a quarter of the drop
        let halfway = fade.volume_at(1.0, 7.0 + 13.0);
        assert!((halfway - 0.75).abs() < 1e-5);
        assert_eq!(fade.volume_at(1.0, 40.0), 0.0);
        assert!(!fade.is_finished(32.9));
        assert!(fade.is_finished(33.0));
    }

    #[test]
    fn test_zero_duration_fade_jumps() {
        let fade = FadeSpec::new(1.0, 0.0, 0.0, Ease::Linear);
        assert_eq!(fade.volume_at(0.2, 0.0), 1.0);
        assert!(fade.is_finished(0.0));
    }

    #[test]
    fn test_queue_records_in_order_and_drains() {
        let mut queue = AudioQueue::new();
        queue.start_program(AudioTarget::Player, "footsteps.ck", true);
        queue.set_parameter(AudioTarget::Player, "mode", 1.0);
        queue.fade_volume(0, FadeSpec::new(1.0, 0.1, 0.0, Ease::OutExpo));

        assert_eq!(queue.commands().len(), 3);
        assert!(matches!(
            queue.commands()[0],
            AudioCommand::StartProgram { spatial: true, .. }
        ));

        let drained = queue.drain();
        assert_eq!(drained.len(), 3);
        assert!(queue.is_empty());
    }
}
