use bevy::prelude::*;
use bevy_mod_imgui::prelude::*;
use garden_core::{GardenConfig, GardenWorld, PlayerController};

pub struct GardenDebugPlugin;

impl Plugin for GardenDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(bevy_mod_imgui::ImguiPlugin::default())
            .add_systems(Update, stillness_ui);
    }
}

fn stillness_ui(
    mut context: NonSendMut<ImguiContext>,
    config: Res<GardenConfig>,
    controller: Option<Res<PlayerController>>,
    world: Option<Res<GardenWorld>>,
) {
    let ui = context.ui();

    // Both resources are inserted by the garden's startup system
    let (Some(controller), Some(world)) = (controller, world) else {
        return;
    };

    ui.window("Stillness")
        .size([320.0, 220.0], Condition::FirstUseEver)
        .build(|| {
            let position = controller.position();
            ui.text(format!("Mode: {:?}", controller.mode()));
            ui.text(format!("Stage: {:?}", controller.stage()));
            ui.text(format!(
                "Still for: {:.1}s (marker {})",
                controller.timer().elapsed(),
                controller.timer().marker()
            ));
            ui.separator();

            ui.text(format!(
                "Position: {:.1}, {:.1}, {:.1}",
                position.x, position.y, position.z
            ));
            let near = world.which_sculpture(position, config.controller.sculpture_bound);
            match near {
                Some(i) => ui.text(format!("Near sculpture: {}", world.sculptures()[i].name)),
                None => ui.text("Near sculpture: none"),
            }
            match world.active_inner_world() {
                Some(i) => ui.text(format!("Inner world: {}", world.sculptures()[i].name)),
                None => ui.text("Inner world: none"),
            }
            ui.separator();

            ui.text(format!(
                "Props: {} / {} active",
                world.active_prop_count(),
                world.props().len()
            ));
            ui.text(format!(
                "Sculptures: {} / {} active",
                world.active_sculpture_count(),
                world.sculptures().len()
            ));
            ui.text(format!("Fog start: {:.1}", world.fog_start()));
            ui.text(format!("Drain queue: {}", controller.drain_order().len()));
        });
}
