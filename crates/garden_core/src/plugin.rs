//! Bevy integration: builds the garden at startup and drives the controller each frame.
//!
//! The core state lives in two resources, `GardenWorld` and
//! `PlayerController`. Entities carry a `SceneLink` back to the object they
//! represent; `mirror_scene` copies active flags onto `Visibility`, the fog
//! start distance onto the camera's `DistanceFog`, and the controller's
//! transform onto the camera. Prop meshes get a `VisibilityRange` for their
//! culling tier once their scene has spawned.

use bevy::app::AppExit;
use bevy::camera::visibility::VisibilityRange;
use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

use crate::audio::{AudioQueue, AudioTarget};
use crate::behavior::BehaviorTable;
use crate::config::GardenConfig;
use crate::controller::PlayerController;
use crate::forest::ForestPlacer;
use crate::input::{FrameInput, KeyBindings};
use crate::path::PathSet;
use crate::rng::StdRandom;
use crate::spin::{spin_system, Spin};
use crate::world::{GardenWorld, SceneObject};

/// Ordering of the per-frame garden systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GardenSystems {
    /// Read input and run the controller
    Advance,
    /// Copy core state onto entities
    Mirror,
}

/// Plugin that builds the garden and runs the player controller.
pub struct GardenPlugin {
    pub config: GardenConfig,
}

impl GardenPlugin {
    pub fn new(config: GardenConfig) -> Self {
        Self { config }
    }
}

impl Default for GardenPlugin {
    fn default() -> Self {
        Self::new(GardenConfig::default())
    }
}

impl Plugin for GardenPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .init_resource::<KeyBindings>()
            .init_resource::<AudioQueue>()
            .configure_sets(
                Update,
                (GardenSystems::Advance, GardenSystems::Mirror).chain(),
            )
            .add_systems(Startup, setup_garden)
            .add_systems(
                Update,
                (
                    advance_player.in_set(GardenSystems::Advance),
                    mirror_scene.in_set(GardenSystems::Mirror),
                    apply_prop_culling,
                    spin_system,
                ),
            );
    }
}

/// Marks the first-person camera.
#[derive(Component)]
pub struct GardenPlayer;

/// Links an entity to the core object whose active flag it shows.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneLink(pub SceneObject);

/// Links an entity to the audio target it plays for.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioLink(pub AudioTarget);

/// Cull distance waiting to be applied to a prop's meshes.
///
/// Removed once the prop's scene has spawned and its meshes carry a
/// `VisibilityRange`.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PendingCulling {
    pub distance: f32,
}

fn setup_garden(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<GardenConfig>,
    mut audio: ResMut<AudioQueue>,
) {
    let mut world = GardenWorld::from_config(&config);
    let paths = PathSet::from_points(&config.paths);
    let placer = ForestPlacer::new(config.forest.clone(), &paths);
    let mut rng = match config.forest.seed {
        Some(seed) => StdRandom::from_seed(seed),
        None => StdRandom::from_entropy(),
    };
    placer.generate(&mut world, &mut rng);

    let controller = PlayerController::new(config.controller.clone());
    controller.start(&mut *audio);
    let behaviors = BehaviorTable::from_entries(&config.behaviors);
    world.start_programs(&behaviors, &mut *audio);

    let c = &config.controller;
    commands.spawn((
        Camera3d::default(),
        controller.transform(),
        DistanceFog {
            color: Color::linear_rgb(c.fog_color[0], c.fog_color[1], c.fog_color[2]),
            falloff: FogFalloff::Linear {
                start: world.fog_start(),
                end: c.fog_end,
            },
            ..default()
        },
        SpatialListener::default(),
        GardenPlayer,
        AudioLink(AudioTarget::Player),
    ));

    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            SceneLink(SceneObject::ForestRoot),
        ))
        .with_children(|parent| {
            for (i, prop) in world.props().iter().enumerate() {
                parent.spawn((
                    SceneRoot(asset_server.load(prop.prefab.clone())),
                    Transform {
                        translation: prop.position,
                        rotation: prop.rotation,
                        scale: Vec3::splat(prop.scale),
                    },
                    SceneLink(SceneObject::Prop(i)),
                    PendingCulling {
                        distance: config.forest.cull_distance(prop.tier),
                    },
                ));
            }
        });

    for (i, sculpture) in config.sculptures.iter().enumerate() {
        let position = Vec3::from(sculpture.position);

        let mut entity = commands.spawn((
            Transform::from_translation(position),
            Visibility::default(),
            SceneLink(SceneObject::Sculpture(i)),
            AudioLink(AudioTarget::Sculpture(i)),
        ));
        if let Some(model) = &sculpture.model {
            entity.insert(SceneRoot(asset_server.load(model.clone())));
        }

        let mut inner = commands.spawn((
            Transform::from_translation(position),
            Visibility::Hidden,
            SceneLink(SceneObject::InnerWorld(i)),
        ));
        if let Some(model) = &sculpture.inner_world_model {
            inner.insert(SceneRoot(asset_server.load(model.clone())));
        }
        if let Some(rate) = sculpture.inner_world_spin {
            inner.insert(Spin::new(Vec3::from(rate)));
        }
    }

    for (i, (emitter, filler)) in world.emitters().iter().zip(&config.fillers).enumerate() {
        let mut entity = commands.spawn((
            Transform::from_translation(emitter.position),
            AudioLink(AudioTarget::Emitter(i)),
        ));
        if let Some(clip) = &filler.clip {
            entity.insert((
                AudioPlayer::new(asset_server.load(clip.clone())),
                PlaybackSettings::LOOP.with_spatial(true),
            ));
        }
    }

    info!(
        "Garden ready: {} sculptures, {} props, {} ambience emitters, {} audio behaviours",
        world.sculptures().len(),
        world.props().len(),
        world.emitters().len(),
        behaviors.len()
    );

    commands.insert_resource(world);
    commands.insert_resource(controller);
}

fn advance_player(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    bindings: Res<KeyBindings>,
    mut controller: ResMut<PlayerController>,
    mut world: ResMut<GardenWorld>,
    mut audio: ResMut<AudioQueue>,
    mut exit: MessageWriter<AppExit>,
) {
    let input = FrameInput::from_devices(
        &keys,
        &bindings,
        mouse_motion.delta,
        controller.config().mouse_axis_scale,
    );
    let report = controller.advance(&input, time.delta_secs(), &mut world, &mut *audio);

    if report.quit_requested {
        info!("Quit requested");
        exit.write(AppExit::Success);
    }
}

fn mirror_scene(
    world: Res<GardenWorld>,
    controller: Res<PlayerController>,
    mut player: Query<(&mut Transform, Option<&mut DistanceFog>), With<GardenPlayer>>,
    mut linked: Query<(&SceneLink, &mut Visibility)>,
) {
    if let Ok((mut transform, fog)) = player.single_mut() {
        *transform = controller.transform();
        if let Some(mut fog) = fog {
            if let FogFalloff::Linear { start, .. } = &mut fog.falloff {
                *start = world.fog_start();
            }
        }
    }

    for (link, mut visibility) in linked.iter_mut() {
        visibility.set_if_neq(if world.is_active(link.0) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
}

/// Give every mesh under a freshly spawned prop scene its tier's visibility range.
fn apply_prop_culling(
    mut commands: Commands,
    pending: Query<(Entity, &PendingCulling)>,
    children: Query<&Children>,
    meshes: Query<(), With<Mesh3d>>,
) {
    for (prop, culling) in pending.iter() {
        let mut found = false;
        for descendant in children.iter_descendants(prop) {
            if meshes.contains(descendant) {
                commands
                    .entity(descendant)
                    .insert(VisibilityRange::abrupt(0.0, culling.distance));
                found = true;
            }
        }
        // Scenes spawn whole, so the first frame with meshes sees all of them
        if found {
            commands.entity(prop).remove::<PendingCulling>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::forest::CullingTier;
    use crate::world::{ForestProp, Sculpture};

    fn prop_at(x: f32, z: f32) -> ForestProp {
        ForestProp {
            category: "Trees".to_string(),
            prefab: "tree.glb".to_string(),
            cell: IVec2::new(x as i32, z as i32),
            position: Vec3::new(x, 0.0, z),
            rotation: Quat::IDENTITY,
            scale: 1.0,
            tier: CullingTier::Far,
            active: true,
        }
    }

    /// Two sculptures and two props, all well away from the start position.
    fn small_world() -> GardenWorld {
        let mut world = GardenWorld::new(
            vec![
                Sculpture::new("spire", Vec3::new(50.0, 0.0, 50.0)),
                Sculpture::new("hollow", Vec3::new(-50.0, 0.0, 50.0)),
            ],
            Vec::new(),
            50.0,
        );
        world.instantiate_prop(prop_at(30.0, 30.0));
        world.instantiate_prop(prop_at(-30.0, 30.0));
        world
    }

    fn test_app(world: GardenWorld) -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<AccumulatedMouseMotion>()
            .init_resource::<KeyBindings>()
            .init_resource::<AudioQueue>()
            .insert_resource(world)
            .insert_resource(PlayerController::new(ControllerConfig::default()))
            .configure_sets(
                Update,
                (GardenSystems::Advance, GardenSystems::Mirror).chain(),
            )
            .add_systems(
                Update,
                (
                    advance_player.in_set(GardenSystems::Advance),
                    mirror_scene.in_set(GardenSystems::Mirror),
                    apply_prop_culling,
                ),
            );
        app
    }

    fn visibility(app: &App, entity: Entity) -> Visibility {
        *app.world().get::<Visibility>(entity).unwrap()
    }

    #[test]
    fn test_quit_key_exits() {
        let mut app = test_app(small_world());
        app.update();
        assert_eq!(app.should_exit(), None);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();
        assert_eq!(app.should_exit(), Some(AppExit::Success));
    }

    #[test]
    fn test_active_flags_reach_visibility() {
        let mut world = small_world();
        world.set_prop_active(1, false);
        world.set_sculpture_active(0, false);
        world.set_inner_world_active(1, true);
        let mut app = test_app(world);

        let objects = [
            SceneObject::ForestRoot,
            SceneObject::Prop(0),
            SceneObject::Prop(1),
            SceneObject::Sculpture(0),
            SceneObject::Sculpture(1),
            SceneObject::InnerWorld(0),
            SceneObject::InnerWorld(1),
        ];
        let entities: Vec<Entity> = objects
            .iter()
            .map(|&object| {
                app.world_mut()
                    .spawn((SceneLink(object), Visibility::default()))
                    .id()
            })
            .collect();
        app.update();

        let shown: Vec<Visibility> = entities.iter().map(|&e| visibility(&app, e)).collect();
        assert_eq!(
            shown,
            vec![
                Visibility::Inherited,
                Visibility::Inherited,
                Visibility::Hidden,
                Visibility::Hidden,
                Visibility::Inherited,
                Visibility::Hidden,
                Visibility::Inherited,
            ]
        );

        app.world_mut()
            .resource_mut::<GardenWorld>()
            .set_forest_active(false);
        app.update();
        assert_eq!(visibility(&app, entities[0]), Visibility::Hidden);
    }

    #[test]
    fn test_camera_follows_controller_and_fog() {
        let mut app = test_app(small_world());
        let camera = app
            .world_mut()
            .spawn((
                GardenPlayer,
                Transform::default(),
                DistanceFog {
                    falloff: FogFalloff::Linear {
                        start: 50.0,
                        end: 300.0,
                    },
                    ..default()
                },
            ))
            .id();

        app.world_mut()
            .resource_mut::<GardenWorld>()
            .set_fog_start(31.5);
        app.update();

        let fog = app.world().get::<DistanceFog>(camera).unwrap();
        assert!(matches!(
            fog.falloff,
            FogFalloff::Linear { start, end } if start == 31.5 && end == 300.0
        ));
        let expected = app.world().resource::<PlayerController>().transform();
        assert_eq!(*app.world().get::<Transform>(camera).unwrap(), expected);
        assert_eq!(expected.translation, Vec3::new(0.0, 3.0, -200.0));
    }

    #[test]
    fn test_culling_waits_for_prop_meshes() {
        let mut app = test_app(small_world());
        let prop = app
            .world_mut()
            .spawn((Transform::default(), PendingCulling { distance: 200.0 }))
            .id();
        app.update();
        assert!(app.world().get::<PendingCulling>(prop).is_some());

        // Scene instance: an empty node with a mesh underneath
        let node = app
            .world_mut()
            .spawn((Transform::default(), ChildOf(prop)))
            .id();
        let mesh = app
            .world_mut()
            .spawn((Mesh3d::default(), ChildOf(node)))
            .id();
        app.update();

        let range = app.world().get::<VisibilityRange>(mesh).unwrap();
        assert_eq!(range.end_margin, 200.0..200.0);
        assert!(app.world().get::<VisibilityRange>(node).is_none());
        assert!(app.world().get::<PendingCulling>(prop).is_none());
    }
}
