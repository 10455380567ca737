use bevy::prelude::*;
use garden_audio::GardenAudioPlugin;
use garden_core::{load_config, GardenConfig, GardenPlugin};
use garden_debug::GardenDebugPlugin;

const CONFIG_PATH: &str = "assets/garden.json";

fn main() {
    let (config, load_error) = match load_config(CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(e) => (GardenConfig::default(), Some(e.to_string())),
    };
    let [r, g, b] = config.controller.fog_color;

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Stillness Garden".to_string(),
            ..default()
        }),
        ..default()
    }))
    // Sky matches the fog so distant props dissolve into it
    .insert_resource(ClearColor(Color::linear_rgb(r, g, b)))
    .add_plugins(GardenPlugin::new(config))
    .add_plugins(GardenAudioPlugin)
    .add_plugins(GardenDebugPlugin);

    // Logging is only available once the app's LogPlugin is built
    if let Some(error) = load_error {
        app.add_systems(Startup, move || {
            warn!("Failed to load {}: {}, using defaults", CONFIG_PATH, error);
        });
    }

    app.run();
}
