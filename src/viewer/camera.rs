//! Bridge between the simulation's camera rig and `PanOrbitCamera`.
//!
//! The simulation thinks in a position plus orbit target. PanOrbit thinks
//! in focus, radius, yaw and pitch. Follow translations only shift the
//! focus, so the user's viewing angle and zoom survive.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::math::DVec3;
use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::selection::{CameraRig, CameraUpdate};
use crate::simulation::{Simulation, SimulationCommand};
use crate::viewer::MainCamera;

pub fn setup_camera(mut commands: Commands, simulation: Res<Simulation>) {
    let home = CameraRig::default();
    let (radius, yaw, pitch) = orbit_angles(home.position - home.target);
    let config = simulation.config();

    let pan_orbit = PanOrbitCamera {
        focus: home.target.as_vec3(),
        radius: Some(radius),
        yaw: Some(yaw),
        pitch: Some(pitch),
        zoom_lower_limit: config.default_min_camera_distance as f32,
        zoom_upper_limit: Some(config.max_camera_distance as f32),
        force_update: true,
        ..default()
    };

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            // Moons can be a few thousandths of a unit across; the outer planets sit ~600 out.
            near: 0.001,
            far: 5_000.0,
            ..default()
        }),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        pan_orbit,
        MainCamera,
        Tonemapping::TonyMcMapface,
        Transform::from_translation(home.position.as_vec3()).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Radius, yaw and pitch of an offset from the focus.
fn orbit_angles(offset: DVec3) -> (f32, f32, f32) {
    let radius = offset.length().max(f64::EPSILON);
    let direction = offset / radius;
    let pitch = direction.y.clamp(-1.0, 1.0).asin();
    let yaw = direction.x.atan2(direction.z);
    (radius as f32, yaw as f32, pitch as f32)
}

pub fn rig_from_camera(pan_orbit: &PanOrbitCamera, transform: &Transform) -> CameraRig {
    CameraRig {
        position: transform.translation.as_dvec3(),
        target: pan_orbit.focus.as_dvec3(),
    }
}

/// Jump the camera to `rig` without smoothing.
fn place_camera(pan_orbit: &mut PanOrbitCamera, rig: &CameraRig) {
    let (radius, yaw, pitch) = orbit_angles(rig.position - rig.target);
    let focus = rig.target.as_vec3();

    pan_orbit.focus = focus;
    pan_orbit.target_focus = focus;
    pan_orbit.target_radius = radius;
    pan_orbit.target_yaw = yaw;
    pan_orbit.target_pitch = pitch;
    pan_orbit.radius = Some(radius);
    pan_orbit.yaw = Some(yaw);
    pan_orbit.pitch = Some(pitch);
    pan_orbit.force_update = true;
}

fn apply_camera_update(pan_orbit: &mut PanOrbitCamera, update: CameraUpdate) {
    match update {
        CameraUpdate::None | CameraUpdate::Recorded => {}
        CameraUpdate::Framed { position, target } => {
            place_camera(pan_orbit, &CameraRig { position, target });
        }
        CameraUpdate::Translated(delta) => {
            let delta = delta.as_vec3();
            pan_orbit.focus += delta;
            pan_orbit.target_focus += delta;
        }
    }
}

/// Drain input messages into the simulation between ticks.
pub fn apply_commands(
    mut messages: MessageReader<SimulationCommand>,
    mut simulation: ResMut<Simulation>,
    mut camera: Query<(&mut PanOrbitCamera, &Transform), With<MainCamera>>,
) {
    let Ok((mut pan_orbit, transform)) = camera.single_mut() else {
        return;
    };
    for command in messages.read() {
        let mut rig = rig_from_camera(&pan_orbit, transform);
        let before = rig;
        let reset = matches!(command, SimulationCommand::ResetCamera);
        simulation.apply(command.clone(), &mut rig);
        if reset || rig != before {
            place_camera(&mut pan_orbit, &rig);
        }
    }
}

/// One simulation tick per frame, then move the camera with the followed body.
pub fn tick_simulation(
    time: Res<Time>,
    mut simulation: ResMut<Simulation>,
    mut camera: Query<(&mut PanOrbitCamera, &Transform), With<MainCamera>>,
) {
    let Ok((mut pan_orbit, transform)) = camera.single_mut() else {
        warn!("tick_simulation: main camera not found");
        return;
    };
    let mut rig = rig_from_camera(&pan_orbit, transform);
    let outcome = simulation.tick(time.elapsed_secs_f64(), &mut rig);
    apply_camera_update(&mut pan_orbit, outcome.camera);

    if !outcome.report.failures.is_empty() {
        debug!("{} bodies failed to update this tick", outcome.report.failures.len());
    }

    let min_distance = simulation.controller().min_distance() as f32;
    if pan_orbit.zoom_lower_limit != min_distance {
        pan_orbit.zoom_lower_limit = min_distance;
        pan_orbit.target_radius = pan_orbit.target_radius.max(min_distance);
    }
}
