//! Viewer module
//!
//! Bevy glue around the simulation: spawns an entity per body, mirrors
//! transforms every frame, draws orbits and trails with gizmos, and turns
//! pointer and keyboard input into [`SimulationCommand`](crate::simulation::SimulationCommand)
//! messages.

use bevy::prelude::*;

use crate::body::BodyId;

pub mod camera;
pub mod gizmos;
pub mod input;
pub mod scene;

/// Main 3D camera driven by PanOrbit and the follow controller.
#[derive(Component)]
pub struct MainCamera;

/// Mesh entity for one body.
#[derive(Component, Clone, Copy, Debug)]
pub struct BodyMarker(pub BodyId);

/// Screen-space name label for one body.
#[derive(Component, Clone, Copy, Debug)]
pub struct BodyLabel(pub BodyId);

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (scene::setup_scene, camera::setup_camera))
            .add_systems(
                Update,
                (
                    (input::keyboard_commands, input::handle_body_clicks, input::handle_body_hover),
                    camera::apply_commands,
                    camera::tick_simulation,
                    scene::respawn_bodies,
                    scene::sync_body_transforms,
                    scene::update_labels,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (gizmos::draw_orbits, gizmos::draw_trails, gizmos::draw_highlights)
                    .after(camera::tick_simulation),
            );
    }
}
