//! Arena of bodies addressed by generational handles.
//!
//! Bodies are stored parent before child, so a single pass in index order
//! always sees a parent's new world position before its children need it.
//! A rebuild replaces the whole arena and bumps the generation, which turns
//! every outstanding [`BodyId`] into a handle that resolves to nothing.

use bevy::math::{DQuat, DVec3};
use bevy::prelude::*;
use std::f64::consts::TAU;

use crate::body::catalog::{Catalog, MoonEntry, PlanetEntry};
use crate::body::model::{Body, BodyId, BodyKind, BodyUpdateError, Motion, StepOutcome};
use crate::body::scale;
use crate::config::{DisplayOptions, SimulationConfig};
use crate::orbital::engine::{self, KeplerOrbit};
use crate::orbital::{OrbitalElements, SimulationClock};

pub const MOON_ORBIT_SEGMENTS: usize = 64;

/// Star parameters every planet update needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarParams {
    pub mass_solar: f64,
    pub radius_solar: f64,
    /// Kelvin
    pub temperature: f64,
}

/// Running counters for non-fatal numeric problems.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub kepler_non_convergence: u64,
    pub update_failures: u64,
}

/// What happened during one [`BodyHierarchy::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub moved: usize,
    pub non_converged: usize,
    pub failures: Vec<(BodyId, BodyUpdateError)>,
}

/// World transform of one body, f64 throughout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyTransform {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: f64,
}

#[derive(Clone, Debug)]
pub struct BodyHierarchy {
    bodies: Vec<Body>,
    generation: u32,
    star: StarParams,
    options: DisplayOptions,
    pub diagnostics: Diagnostics,
}

impl BodyHierarchy {
    pub fn build(catalog: &Catalog, options: DisplayOptions, config: &SimulationConfig) -> Self {
        Self::build_generation(catalog, options, config, 0)
    }

    /// Tear down every body and build again from the catalog.
    ///
    /// Orbital phase restarts from the catalog start angles.
    pub fn rebuild(&mut self, catalog: &Catalog, options: DisplayOptions, config: &SimulationConfig) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::build_generation(catalog, options, config, generation);
    }

    fn build_generation(
        catalog: &Catalog,
        options: DisplayOptions,
        config: &SimulationConfig,
        generation: u32,
    ) -> Self {
        let star = &catalog.star;
        let mut hierarchy = Self {
            bodies: Vec::with_capacity(1 + catalog.planets.len() + catalog.moon_count()),
            generation,
            star: StarParams {
                mass_solar: star.mass_solar,
                radius_solar: star.radius_solar,
                temperature: star.temperature,
            },
            options,
            diagnostics: Diagnostics::default(),
        };

        let mut root = Body::new(
            &star.id,
            &star.name,
            BodyKind::Star,
            OrbitalElements {
                rotation_period: star.rotation_period,
                ..Default::default()
            },
        );
        root.size = star.size;
        root.mass = Some(star.mass);
        root.display_radius = star.display_radius;
        root.color = star.color.clone();
        root.asset = star.asset.clone();
        root.temperature = Some(star.temperature);
        root.visibility.show_orbit = false;
        let root_id = hierarchy.push(root);

        for entry in &catalog.planets {
            let planet_id = hierarchy.push_planet(entry, root_id, config);
            for moon in &entry.moons {
                hierarchy.push_moon(moon, entry, planet_id, config);
            }
        }

        info!(
            "Built body hierarchy generation {} with {} bodies ({} moons {})",
            generation,
            hierarchy.bodies.len(),
            catalog.moon_count(),
            if options.show_moons { "shown" } else { "hidden" }
        );
        hierarchy
    }

    fn push(&mut self, mut body: Body) -> BodyId {
        let id = BodyId {
            index: self.bodies.len() as u32,
            generation: self.generation,
        };
        if let Some(parent) = body.parent {
            let parent_body = &mut self.bodies[parent.index as usize];
            parent_body.children.push(id);
            body.world_position = parent_body.world_position + body.local_position;
        } else {
            body.world_position = body.local_position;
        }
        self.bodies.push(body);
        id
    }

    fn push_planet(&mut self, entry: &PlanetEntry, parent: BodyId, config: &SimulationConfig) -> BodyId {
        let elements = entry.elements();
        let orbit = KeplerOrbit {
            semi_major_axis: engine::au_to_scene(entry.semi_major_axis),
            eccentricity: entry.eccentricity,
            inclination: entry.inclination,
            start_angle: entry.start_angle,
            mean_motion: engine::orbital_speed(entry.semi_major_axis, self.star.mass_solar)
                * config.planet_orbit_sign,
        };
        let start = engine::position(&orbit, 0.0);

        let mut body = Body::new(&entry.id, &entry.name, BodyKind::Planet, elements);
        body.size = entry.size;
        body.mass = Some(entry.mass);
        body.display_radius = scale::planet_display_radius(entry.size, &self.options);
        body.parent = Some(parent);
        body.motion = Motion::Kepler(orbit);
        body.local_position = start.position;
        body.current_distance = start.radius / engine::AU_TO_SCENE;
        body.temperature = Some(self.planet_temperature(body.current_distance));
        body.orbit_line = engine::orbit_line_points(
            orbit.semi_major_axis,
            entry.eccentricity,
            entry.inclination,
            engine::DEFAULT_ORBIT_SEGMENTS,
        );
        body.color = entry.color.clone();
        body.asset = entry.asset.clone();
        self.push(body)
    }

    fn push_moon(
        &mut self,
        moon: &MoonEntry,
        planet: &PlanetEntry,
        parent: BodyId,
        config: &SimulationConfig,
    ) -> BodyId {
        let layout = &planet.moon_system;
        let planet_display = self.bodies[parent.index as usize].display_radius;
        let display_radius = scale::moon_display_radius(moon.size, planet_display, layout);
        let distance = scale::moon_display_distance(moon, planet_display, display_radius, layout);

        let retrograde = if moon.orbital_period < 0.0 { -1.0 } else { 1.0 };
        let angular_speed = TAU / engine::days_to_sim_time(moon.orbital_period.abs())
            * config.moon_orbit_sign
            * retrograde;
        let tilt = moon.ecliptic_inclination.unwrap_or(planet.axial_tilt);
        let frame = engine::axial_tilt_rotation(tilt);
        let angle = hash_phase(&moon.id);

        let elements = OrbitalElements {
            semi_major_axis: moon.distance,
            eccentricity: 0.0,
            inclination: moon.ecliptic_inclination.unwrap_or(0.0),
            start_angle: angle,
            axial_tilt: tilt,
            // Tidally locked: one turn per orbit, in hours
            rotation_period: moon.orbital_period * 24.0,
        };

        let mut body = Body::new(&moon.id, &moon.name, BodyKind::Moon, elements);
        body.size = moon.size;
        body.display_radius = display_radius;
        body.parent = Some(parent);
        body.motion = Motion::Circular {
            distance,
            angular_speed,
            angle,
            frame,
        };
        body.local_position = frame * DVec3::new(distance * angle.cos(), 0.0, distance * angle.sin());
        body.rotation_angle = angle;
        body.current_distance = moon.distance;
        body.orbit_line = engine::circle_points(distance, MOON_ORBIT_SEGMENTS)
            .into_iter()
            .map(|p| frame * p)
            .collect();
        body.enabled = self.options.show_moons;
        body.color = moon.color.clone();
        body.asset = moon.asset.clone();
        self.push(body)
    }

    fn planet_temperature(&self, distance_au: f64) -> f64 {
        engine::temperature(
            distance_au,
            self.star.temperature,
            self.star.radius_solar,
            engine::DEFAULT_ALBEDO,
        )
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn star(&self) -> &StarParams {
        &self.star
    }

    pub fn root(&self) -> BodyId {
        BodyId {
            index: 0,
            generation: self.generation,
        }
    }

    fn id_at(&self, index: usize) -> BodyId {
        BodyId {
            index: index as u32,
            generation: self.generation,
        }
    }

    fn slot(&self, id: BodyId) -> Option<usize> {
        let index = id.index as usize;
        (id.generation == self.generation && index < self.bodies.len()).then_some(index)
    }

    /// Resolve a handle. Stale handles and disabled moons resolve to None.
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.slot(id)
            .map(|index| &self.bodies[index])
            .filter(|body| body.enabled)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let index = self.slot(id)?;
        let body = &mut self.bodies[index];
        body.enabled.then_some(body)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.get(id).is_some()
    }

    /// Enabled bodies in parent-before-child order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> + '_ {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.enabled)
            .map(|(index, body)| (self.id_at(index), body))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> + '_ {
        self.bodies.iter_mut().filter(|body| body.enabled)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn planets(&self) -> impl Iterator<Item = (BodyId, &Body)> + '_ {
        self.iter().filter(|(_, body)| body.kind == BodyKind::Planet)
    }

    /// Enabled children of `id` in catalog order.
    pub fn children(&self, id: BodyId) -> Vec<BodyId> {
        self.get(id)
            .map(|body| {
                body.children
                    .iter()
                    .copied()
                    .filter(|child| self.contains(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, id: BodyId) -> Option<BodyId> {
        self.get(id).and_then(|body| body.parent)
    }

    /// Case-insensitive lookup by catalog id or display name.
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.iter()
            .find(|(_, body)| body.key.eq_ignore_ascii_case(name) || body.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    /// Advance every enabled body to wall time `now`.
    ///
    /// While paused all body clocks are suspended so that resuming never
    /// produces a jump. A body whose update fails keeps its previous local
    /// offset and is reported; its siblings still update.
    pub fn update(&mut self, now: f64, clock: &SimulationClock, config: &SimulationConfig) -> TickReport {
        let mut report = TickReport::default();
        if clock.paused {
            self.suspend_clocks();
            return report;
        }

        for index in 0..self.bodies.len() {
            if !self.bodies[index].enabled {
                continue;
            }
            let id = self.id_at(index);
            let parent_world = self.bodies[index]
                .parent
                .map(|parent| self.bodies[parent.index as usize].world_position)
                .unwrap_or(DVec3::ZERO);
            let star = self.star;

            let body = &mut self.bodies[index];
            match body.step(now, clock, config.spin_acceleration) {
                Ok(StepOutcome::Primed) => {}
                Ok(StepOutcome::Moved { converged }) => {
                    report.moved += 1;
                    if !converged {
                        report.non_converged += 1;
                        self.diagnostics.kepler_non_convergence += 1;
                        if !body.warned {
                            warn!("Kepler solve for {} hit the iteration cap", body.name);
                            body.warned = true;
                        }
                    }
                    if body.visibility.show_trail {
                        body.trail.push(parent_world + body.local_position, config.trail_max_points);
                    }
                }
                Err(err) => {
                    self.diagnostics.update_failures += 1;
                    if !body.warned {
                        warn!("{}; keeping previous position", err);
                        body.warned = true;
                    }
                    report.failures.push((id, err));
                }
            }

            body.world_position = parent_world + body.local_position;
            if body.kind == BodyKind::Planet {
                body.temperature = Some(engine::temperature(
                    body.current_distance,
                    star.temperature,
                    star.radius_solar,
                    engine::DEFAULT_ALBEDO,
                ));
            }
        }
        report
    }

    /// Next update only records wall time.
    pub fn suspend_clocks(&mut self) {
        for body in &mut self.bodies {
            body.clock.suspend();
        }
    }

    pub fn advance_labels(&mut self, wall_delta: f64) {
        for body in self.iter_mut() {
            body.label.advance(wall_delta);
        }
    }

    pub fn restart_labels(&mut self) {
        for body in self.iter_mut() {
            body.label.restart();
        }
    }

    pub fn set_show_orbits(&mut self, show: bool) {
        for body in &mut self.bodies {
            body.visibility.show_orbit = show && body.kind != BodyKind::Star;
        }
    }

    pub fn set_show_labels(&mut self, show: bool) {
        for body in &mut self.bodies {
            body.visibility.show_label = show;
        }
    }

    pub fn set_show_trails(&mut self, show: bool) {
        for body in &mut self.bodies {
            body.visibility.show_trail = show && body.kind != BodyKind::Star;
            if !show {
                body.trail.clear();
            }
        }
    }

    pub fn transform(&self, id: BodyId) -> Option<BodyTransform> {
        self.get(id).map(|body| BodyTransform {
            translation: body.world_position,
            rotation: body.orientation(),
            scale: body.display_radius,
        })
    }

    /// Orbit polyline placed around the parent's current world position.
    pub fn orbit_line_world(&self, id: BodyId) -> Option<Vec<DVec3>> {
        let body = self.get(id)?;
        let origin = body
            .parent
            .and_then(|parent| self.get(parent))
            .map(|parent| parent.world_position)
            .unwrap_or(DVec3::ZERO);
        Some(body.orbit_line.iter().map(|p| origin + *p).collect())
    }
}

/// Phase in `[0, 2pi)` from a body id (FNV-1a), stable across rebuilds so moons keep their starting angles.
fn hash_phase(key: &str) -> f64 {
    let mut hash: u32 = 2166136261;
    for b in key.as_bytes() {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    (hash as f64 / (u32::MAX as f64 + 1.0)) * TAU
}
