//! Keyboard and pointer input turned into simulation commands.

use bevy::picking::events::{Click, Out, Over, Pointer};
use bevy::prelude::*;

use crate::simulation::{Simulation, SimulationCommand};
use crate::viewer::BodyMarker;

const TIME_SCALE_STEP: f64 = 2.0;

pub fn keyboard_commands(
    keys: Res<ButtonInput<KeyCode>>,
    simulation: Res<Simulation>,
    mut commands: MessageWriter<SimulationCommand>,
) {
    let bindings = [
        (KeyCode::Space, SimulationCommand::TogglePause),
        (KeyCode::KeyR, SimulationCommand::ResetCamera),
        (KeyCode::KeyO, SimulationCommand::ToggleOrbits),
        (KeyCode::KeyL, SimulationCommand::ToggleLabels),
        (KeyCode::KeyT, SimulationCommand::ToggleTrails),
        (KeyCode::KeyF, SimulationCommand::FollowSelected),
        (KeyCode::Escape, SimulationCommand::StopFollowing),
        (KeyCode::Backspace, SimulationCommand::Deselect),
        (KeyCode::BracketRight, SimulationCommand::ScaleTime(TIME_SCALE_STEP)),
        (KeyCode::BracketLeft, SimulationCommand::ScaleTime(1.0 / TIME_SCALE_STEP)),
        (KeyCode::KeyM, SimulationCommand::ToggleRealisticScale),
    ];
    for (key, command) in bindings {
        if keys.just_pressed(key) {
            commands.write(command);
        }
    }

    if keys.just_pressed(KeyCode::KeyN) {
        let mut options = *simulation.hierarchy().options();
        options.show_moons = !options.show_moons;
        commands.write(SimulationCommand::Rebuild(options));
    }

    if keys.just_pressed(KeyCode::KeyI) {
        log_selected_info(&simulation);
    }
    if keys.just_pressed(KeyCode::KeyP) {
        match serde_json::to_string_pretty(&simulation.snapshot()) {
            Ok(json) => info!("System snapshot:\n{}", json),
            Err(err) => warn!("failed to serialize snapshot: {err}"),
        }
    }
}

fn log_selected_info(simulation: &Simulation) {
    let Some(info) = simulation.selected_info() else {
        info!("Nothing selected");
        return;
    };
    match serde_json::to_string_pretty(&info) {
        Ok(json) => info!("{}:\n{}", info.name, json),
        Err(err) => warn!("failed to serialize {}: {err}", info.name),
    }
}

pub fn handle_body_clicks(
    mut clicks: MessageReader<Pointer<Click>>,
    markers: Query<&BodyMarker>,
    mut commands: MessageWriter<SimulationCommand>,
) {
    for ev in clicks.read() {
        if let Ok(marker) = markers.get(ev.entity) {
            commands.write(SimulationCommand::SelectBody(marker.0));
        }
    }
}

pub fn handle_body_hover(
    mut over: MessageReader<Pointer<Over>>,
    mut out: MessageReader<Pointer<Out>>,
    markers: Query<&BodyMarker>,
    mut commands: MessageWriter<SimulationCommand>,
) {
    for ev in out.read() {
        if markers.contains(ev.entity) {
            commands.write(SimulationCommand::Hover(None));
        }
    }
    for ev in over.read() {
        if let Ok(marker) = markers.get(ev.entity) {
            commands.write(SimulationCommand::Hover(Some(marker.0)));
        }
    }
}
