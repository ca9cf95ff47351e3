//! Orbit lines, trails and selection highlights drawn with gizmos.

use bevy::prelude::*;

use crate::body::BodyKind;
use crate::simulation::Simulation;

const ORBIT_ALPHA: f32 = 0.35;
const MOON_ORBIT_ALPHA: f32 = 0.2;
const SELECTED_ORBIT_ALPHA: f32 = 0.8;
const HIGHLIGHT_SCALE: f32 = 1.6;

pub fn draw_orbits(simulation: Res<Simulation>, mut gizmos: Gizmos) {
    let hierarchy = simulation.hierarchy();
    for (id, body) in hierarchy.iter() {
        if !body.visibility.show_orbit {
            continue;
        }
        let Some(points) = hierarchy.orbit_line_world(id) else {
            continue;
        };
        let alpha = if body.is_selected() {
            SELECTED_ORBIT_ALPHA
        } else if body.kind == BodyKind::Moon {
            MOON_ORBIT_ALPHA
        } else {
            ORBIT_ALPHA
        };
        let color = Srgba::hex(&body.color).unwrap_or(Srgba::rgb(0.6, 0.6, 0.6)).with_alpha(alpha);
        gizmos.linestrip(points.into_iter().map(|p| p.as_vec3()), color);
    }
}

/// Trails fade from transparent at the oldest point to half opacity.
pub fn draw_trails(simulation: Res<Simulation>, mut gizmos: Gizmos) {
    for (_, body) in simulation.hierarchy().iter() {
        if !body.visibility.show_trail || body.trail.len() < 2 {
            continue;
        }
        let base = Srgba::hex(&body.color).unwrap_or(Srgba::rgb(0.6, 0.6, 0.6));
        let count = body.trail.len() as f32;
        gizmos.linestrip_gradient(body.trail.points().enumerate().map(|(i, p)| {
            let alpha = 0.5 * (i as f32 + 1.0) / count;
            (p.as_vec3(), Color::from(base.with_alpha(alpha)))
        }));
    }
}

pub fn draw_highlights(simulation: Res<Simulation>, mut gizmos: Gizmos) {
    for (_, body) in simulation.hierarchy().iter() {
        let color = if body.is_selected() {
            Color::srgba(1.0, 1.0, 0.4, 0.9)
        } else if body.selection.hovered {
            Color::srgba(0.6, 0.9, 1.0, 0.6)
        } else {
            continue;
        };
        gizmos.sphere(
            body.world_position.as_vec3(),
            body.display_radius as f32 * HIGHLIGHT_SCALE,
            color,
        );
    }
}
