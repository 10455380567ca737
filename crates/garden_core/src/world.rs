//! In-memory scene model shared by the forest placer and the player controller.
//!
//! `GardenWorld` owns every object whose state the core changes: forest
//! props, sculptures, their paired inner worlds, filler-ambience emitters
//! and the fog start distance. The Bevy layer mirrors it onto entities.
//!
//! Sculptures and inner worlds are created together, so they are always
//! equal in length and index-aligned.

use bevy::prelude::*;

use crate::audio::{AudioCollaborator, AudioTarget};
use crate::behavior::BehaviorTable;
use crate::config::GardenConfig;
use crate::forest::CullingTier;

/// Address of an object whose active flag the world tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneObject {
    ForestRoot,
    Prop(usize),
    Sculpture(usize),
    InnerWorld(usize),
}

/// A placed environmental prop.
#[derive(Clone, Debug, PartialEq)]
pub struct ForestProp {
    /// Category that planted this prop
    pub category: String,
    /// Asset path of the instantiated prefab
    pub prefab: String,
    /// Lattice cell the prop was planted in
    pub cell: IVec2,
    pub position: Vec3,
    pub rotation: Quat,
    /// Uniform scale
    pub scale: f32,
    pub tier: CullingTier,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sculpture {
    pub name: String,
    pub position: Vec3,
    pub active: bool,
    /// Whether the sculpture's audio is positional
    pub spatialized: bool,
}

impl Sculpture {
    pub fn new(name: &str, position: Vec3) -> Self {
        Self {
            name: name.to_string(),
            position,
            active: true,
            spatialized: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InnerWorld {
    pub active: bool,
}

/// A filler-ambience audio emitter.
#[derive(Clone, Debug, PartialEq)]
pub struct Emitter {
    pub name: String,
    pub position: Vec3,
}

#[derive(Resource, Clone, Debug)]
pub struct GardenWorld {
    forest_active: bool,
    props: Vec<ForestProp>,
    sculptures: Vec<Sculpture>,
    inner_worlds: Vec<InnerWorld>,
    emitters: Vec<Emitter>,
    fog_start: f32,
}

impl GardenWorld {
    /// Build a world with one hidden inner world per sculpture and no props.
    pub fn new(sculptures: Vec<Sculpture>, emitters: Vec<Emitter>, fog_start: f32) -> Self {
        let inner_worlds = vec![InnerWorld::default(); sculptures.len()];
        Self {
            forest_active: true,
            props: Vec::new(),
            sculptures,
            inner_worlds,
            emitters,
            fog_start,
        }
    }

    pub fn from_config(config: &GardenConfig) -> Self {
        let sculptures = config
            .sculptures
            .iter()
            .map(|s| Sculpture::new(&s.name, Vec3::from(s.position)))
            .collect();
        let emitters = config
            .fillers
            .iter()
            .map(|f| Emitter {
                name: f.name.clone(),
                position: Vec3::from(f.position),
            })
            .collect();
        Self::new(sculptures, emitters, config.controller.default_fog_start)
    }

    /// Index of the first sculpture, in declaration order, within `bound` of `position`.
    pub fn which_sculpture(&self, position: Vec3, bound: f32) -> Option<usize> {
        self.sculptures
            .iter()
            .position(|s| s.position.distance(position) <= bound)
    }

    /// Add a prop under the forest root, returning its index.
    pub fn instantiate_prop(&mut self, prop: ForestProp) -> usize {
        self.props.push(prop);
        self.props.len() - 1
    }

    /// Start each sculpture's audio program as resolved from the behaviour table.
    pub fn start_programs(&self, behaviors: &BehaviorTable, audio: &mut dyn AudioCollaborator) {
        for (i, sculpture) in self.sculptures.iter().enumerate() {
            let behavior = behaviors.resolve(&sculpture.name);
            audio.start_program(AudioTarget::Sculpture(i), &behavior.program, behavior.spatial);
        }
    }

    pub fn props(&self) -> &[ForestProp] {
        &self.props
    }

    pub fn sculptures(&self) -> &[Sculpture] {
        &self.sculptures
    }

    pub fn inner_worlds(&self) -> &[InnerWorld] {
        &self.inner_worlds
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn fog_start(&self) -> f32 {
        self.fog_start
    }

    pub fn set_fog_start(&mut self, distance: f32) {
        self.fog_start = distance;
    }

    pub fn forest_active(&self) -> bool {
        self.forest_active
    }

    pub fn set_forest_active(&mut self, active: bool) {
        self.forest_active = active;
    }

    pub fn set_prop_active(&mut self, index: usize, active: bool) {
        self.props[index].active = active;
    }

    pub fn set_sculpture_active(&mut self, index: usize, active: bool) {
        self.sculptures[index].active = active;
    }

    pub fn set_sculpture_spatialized(&mut self, index: usize, spatialized: bool) {
        self.sculptures[index].spatialized = spatialized;
    }

    pub fn set_inner_world_active(&mut self, index: usize, active: bool) {
        self.inner_worlds[index].active = active;
    }

    /// The object's own active flag.
    pub fn is_active(&self, object: SceneObject) -> bool {
        match object {
            SceneObject::ForestRoot => self.forest_active,
            SceneObject::Prop(i) => self.props[i].active,
            SceneObject::Sculpture(i) => self.sculptures[i].active,
            SceneObject::InnerWorld(i) => self.inner_worlds[i].active,
        }
    }

    /// Index of the revealed inner world, if any.
    pub fn active_inner_world(&self) -> Option<usize> {
        self.inner_worlds.iter().position(|w| w.active)
    }

    pub fn active_prop_count(&self) -> usize {
        self.props.iter().filter(|p| p.active).count()
    }

    pub fn active_sculpture_count(&self) -> usize {
        self.sculptures.iter().filter(|s| s.active).count()
    }
}
