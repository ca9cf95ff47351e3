//! Body entities, lights and screen-space labels.

use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;

use crate::body::{BodyId, BodyKind};
use crate::simulation::Simulation;
use crate::viewer::{BodyLabel, BodyMarker, MainCamera};

const FALLBACK_COLOR: Srgba = Srgba::rgb(0.6, 0.6, 0.6);
const LABEL_FONT_SIZE: f32 = 13.0;
const LABEL_OFFSET_PX: f32 = 8.0;

#[derive(Resource)]
pub struct BodyMeshes {
    sphere: Handle<Mesh>,
}

/// Hierarchy generation the current entities were spawned for.
#[derive(Resource, Default)]
pub struct SpawnedGeneration(Option<u32>);

pub fn setup_scene(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.insert_resource(GlobalAmbientLight {
        brightness: 60.0,
        ..default()
    });

    // The star is the only light source.
    commands.spawn((
        PointLight {
            intensity: 5.0e9,
            range: 2_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(Vec3::ZERO),
        Name::new("Star Light"),
    ));

    let sphere = match Sphere::new(1.0).mesh().ico(5) {
        Ok(mesh) => mesh,
        Err(err) => {
            warn!("ico sphere failed ({err}); using UV sphere");
            Sphere::new(1.0).mesh().uv(48, 24)
        }
    };
    commands.insert_resource(BodyMeshes {
        sphere: meshes.add(sphere),
    });
    commands.init_resource::<SpawnedGeneration>();
}

fn body_color(hex: &str) -> Srgba {
    Srgba::hex(hex).unwrap_or_else(|_| {
        warn!("invalid body color {hex}");
        FALLBACK_COLOR
    })
}

/// Despawn and respawn every body entity when the hierarchy generation changes.
pub fn respawn_bodies(
    mut commands: Commands,
    simulation: Res<Simulation>,
    assets: Res<BodyMeshes>,
    mut spawned: ResMut<SpawnedGeneration>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, Or<(With<BodyMarker>, With<BodyLabel>)>>,
) {
    let hierarchy = simulation.hierarchy();
    if spawned.0 == Some(hierarchy.generation()) {
        return;
    }
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    for (id, body) in hierarchy.iter() {
        let color = body_color(&body.color);
        let material = if body.kind == BodyKind::Star {
            StandardMaterial {
                base_color: color.into(),
                emissive: LinearRgba::from(color) * 8.0,
                unlit: true,
                ..default()
            }
        } else {
            StandardMaterial {
                base_color: color.into(),
                perceptual_roughness: 0.9,
                ..default()
            }
        };

        commands.spawn((
            Mesh3d(assets.sphere.clone()),
            MeshMaterial3d(materials.add(material)),
            Transform::from_translation(body.world_position.as_vec3())
                .with_scale(Vec3::splat(body.display_radius as f32)),
            BodyMarker(id),
            Name::new(body.name.clone()),
        ));

        commands.spawn((
            Text::new(body.name.clone()),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(Color::WHITE),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            Visibility::Hidden,
            BodyLabel(id),
        ));
    }

    info!(
        "Spawned {} bodies for generation {}",
        hierarchy.len(),
        hierarchy.generation()
    );
    spawned.0 = Some(hierarchy.generation());
}

pub fn sync_body_transforms(
    simulation: Res<Simulation>,
    mut bodies: Query<(&BodyMarker, &mut Transform, &mut Visibility)>,
) {
    let hierarchy = simulation.hierarchy();
    for (marker, mut transform, mut visibility) in bodies.iter_mut() {
        let Some(world) = hierarchy.transform(marker.0) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        transform.translation = world.translation.as_vec3();
        transform.rotation = world.rotation.as_quat();
        transform.scale = Vec3::splat(world.scale as f32);
        *visibility = Visibility::Inherited;
    }
}

pub fn update_labels(
    simulation: Res<Simulation>,
    camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut labels: Query<(&BodyLabel, &mut Node, &mut TextColor, &mut Visibility)>,
) {
    let Ok((camera, camera_transform)) = camera.single() else {
        return;
    };
    let camera_position = camera_transform.translation().as_dvec3();

    for (label, mut node, mut color, mut visibility) in labels.iter_mut() {
        let (id, opacity) = (label.0, simulation.label_opacity(label.0, camera_position));
        let Some(screen) = screen_position(&simulation, id, camera, camera_transform) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        if opacity <= 0.0 {
            *visibility = Visibility::Hidden;
            continue;
        }
        node.left = Val::Px(screen.x + LABEL_OFFSET_PX);
        node.top = Val::Px(screen.y - LABEL_OFFSET_PX);
        color.0 = Color::srgba(1.0, 1.0, 1.0, opacity as f32);
        *visibility = Visibility::Visible;
    }
}

fn screen_position(
    simulation: &Simulation,
    id: BodyId,
    camera: &Camera,
    camera_transform: &GlobalTransform,
) -> Option<Vec2> {
    let body = simulation.hierarchy().get(id)?;
    camera
        .world_to_viewport(camera_transform, body.world_position.as_vec3())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_color_parses_hex() {
        let color = body_color("#FF8000");
        assert!((color.red - 1.0).abs() < 1e-6);
        assert!((color.green - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(body_color("not a color"), FALLBACK_COLOR);
    }
}
