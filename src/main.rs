use bevy::picking::prelude::*;
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{RenderCreation, WgpuSettings};
use bevy::window::{PresentMode, Window, WindowPlugin};

use bevy_panorbit_camera::PanOrbitCameraPlugin;

#[cfg(feature = "dev_camera")]
use bevy_camera_controller::free_camera::{FreeCamera, FreeCameraPlugin};
#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

mod body;
mod config;
mod orbital;
mod selection;
mod simulation;
mod viewer;

use simulation::SimulationPlugin;
use viewer::ViewerPlugin;

#[cfg(feature = "dev_camera")]
use viewer::MainCamera;

#[cfg(feature = "dev_camera")]
#[derive(Component)]
struct DevCamera;

#[cfg(feature = "dev_camera")]
fn setup_dev_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.001,
            far: 5_000.0,
            ..default()
        }),
        Camera {
            order: 2,
            is_active: false,
            ..default()
        },
        FreeCamera::default(),
        DevCamera,
        Transform::from_xyz(0.0, 60.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

#[cfg(feature = "dev_camera")]
fn toggle_dev_camera(
    input: Res<ButtonInput<KeyCode>>,
    mut main_camera: Query<&mut Camera, (With<MainCamera>, Without<DevCamera>)>,
    mut dev_camera: Query<&mut Camera, With<DevCamera>>,
) {
    if !input.just_pressed(KeyCode::F2) {
        return;
    }

    if let Ok(mut main) = main_camera.single_mut()
        && let Ok(mut dev) = dev_camera.single_mut()
    {
        let dev_active = dev.is_active;
        dev.is_active = !dev_active;
        main.is_active = dev_active;
    }
}

fn main() {
    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Orrery".to_string(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(RenderPlugin {
                render_creation: RenderCreation::Automatic(WgpuSettings { ..default() }),
                ..default()
            }),
    );

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    #[cfg(feature = "dev_camera")]
    app.add_plugins(FreeCameraPlugin);

    app.add_plugins(PanOrbitCameraPlugin);
    app.add_plugins(MeshPickingPlugin);

    app.add_plugins(SimulationPlugin);
    app.add_plugins(ViewerPlugin);

    #[cfg(feature = "dev_camera")]
    {
        app.add_systems(Startup, setup_dev_camera);
        app.add_systems(Update, toggle_dev_camera);
    }

    app.run();
}
