//! Per-body state: elements, clock, motion model and display flags.

use bevy::math::{DQuat, DVec3};
use serde::Serialize;
use std::collections::VecDeque;
use std::f64::consts::TAU;
use thiserror::Error;

use crate::orbital::engine::{self, KeplerOrbit};
use crate::orbital::{OrbitalElements, SimulationClock};
use crate::selection::label::LabelFade;

/// Generational handle into a [`BodyHierarchy`](super::BodyHierarchy).
///
/// Handles from an earlier build never resolve after a rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BodyId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl BodyId {
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BodyUpdateError {
    #[error("{body}: orbit produced a non-finite position")]
    NonFinitePosition { body: String },
    #[error("{body}: spin produced a non-finite angle")]
    NonFiniteRotation { body: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClockState {
    Uninitialized,
    Running { last_tick: f64 },
}

/// Independent simulation clock carried by every body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyClock {
    accumulated_time: f64,
    state: ClockState,
}

impl Default for BodyClock {
    fn default() -> Self {
        Self {
            accumulated_time: 0.0,
            state: ClockState::Uninitialized,
        }
    }
}

impl BodyClock {
    pub fn accumulated_time(&self) -> f64 {
        self.accumulated_time
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Advance to wall time `now` and return the scaled step.
    ///
    /// The first call after creation or [`suspend`](Self::suspend) only records
    /// `now` and returns None. Wall time going backwards yields a zero step.
    pub fn advance(&mut self, now: f64, time_scale: f64) -> Option<f64> {
        match self.state {
            ClockState::Uninitialized => {
                self.state = ClockState::Running { last_tick: now };
                None
            }
            ClockState::Running { last_tick } => {
                let delta = (now - last_tick).max(0.0) * time_scale;
                self.accumulated_time += delta;
                self.state = ClockState::Running { last_tick: now };
                Some(delta)
            }
        }
    }

    /// Forget the last tick so the next advance starts fresh.
    pub fn suspend(&mut self) {
        self.state = ClockState::Uninitialized;
    }
}

/// How a body's local offset from its parent evolves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    /// Root star, pinned to the origin.
    Fixed,
    /// Full Kepler solve against accumulated time.
    Kepler(KeplerOrbit),
    /// Uniform circular motion in a tilted frame around the parent.
    Circular {
        /// Scene units
        distance: f64,
        /// Radians per wall second at time scale 1, signed by direction
        angular_speed: f64,
        angle: f64,
        frame: DQuat,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SelectionFlags {
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VisibilityFlags {
    pub show_orbit: bool,
    pub show_label: bool,
    pub show_trail: bool,
}

impl Default for VisibilityFlags {
    fn default() -> Self {
        Self {
            show_orbit: true,
            show_label: true,
            show_trail: false,
        }
    }
}

/// Bounded history of world positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trail {
    points: VecDeque<DVec3>,
}

impl Trail {
    pub fn push(&mut self, position: DVec3, max_points: usize) {
        self.points.push_back(position);
        while self.points.len() > max_points {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.points.iter().copied()
    }
}

/// Result of a successful [`Body::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// First tick after creation or resume; nothing moved.
    Primed,
    Moved { converged: bool },
}

#[derive(Clone, Debug)]
pub struct Body {
    /// Catalog id
    pub key: String,
    pub name: String,
    pub kind: BodyKind,
    pub elements: OrbitalElements,
    /// Earth radii
    pub size: f64,
    /// Earth masses; the catalog has none for moons
    pub mass: Option<f64>,
    /// Scene units
    pub display_radius: f64,
    pub parent: Option<BodyId>,
    pub children: Vec<BodyId>,
    pub clock: BodyClock,
    pub motion: Motion,
    /// Offset from the parent's world position, scene units
    pub local_position: DVec3,
    pub world_position: DVec3,
    /// Spin about the body's tilted Y axis, radians
    pub rotation_angle: f64,
    /// Distance from the parent. AU for planets, catalog units for moons.
    pub current_distance: f64,
    /// Kelvin, planets only
    pub temperature: Option<f64>,
    /// Closed polyline relative to the parent's world position
    pub orbit_line: Vec<DVec3>,
    pub selection: SelectionFlags,
    pub visibility: VisibilityFlags,
    pub trail: Trail,
    pub label: LabelFade,
    /// False for moons hidden by display options
    pub enabled: bool,
    pub color: String,
    pub asset: Option<String>,
    pub(crate) warned: bool,
}

impl Body {
    pub fn new(key: &str, name: &str, kind: BodyKind, elements: OrbitalElements) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            kind,
            elements,
            size: 1.0,
            mass: None,
            display_radius: 1.0,
            parent: None,
            children: Vec::new(),
            clock: BodyClock::default(),
            motion: Motion::Fixed,
            local_position: DVec3::ZERO,
            world_position: DVec3::ZERO,
            rotation_angle: 0.0,
            current_distance: 0.0,
            temperature: None,
            orbit_line: Vec::new(),
            selection: SelectionFlags::default(),
            visibility: VisibilityFlags::default(),
            trail: Trail::default(),
            label: LabelFade::default(),
            enabled: true,
            color: "#ffffff".to_string(),
            asset: None,
            warned: false,
        }
    }

    /// Recompute the local offset for wall time `now`.
    ///
    /// On error the previous local position and rotation are kept.
    pub fn step(
        &mut self,
        now: f64,
        clock: &SimulationClock,
        spin_acceleration: f64,
    ) -> Result<StepOutcome, BodyUpdateError> {
        let time_scale = clock.time_scale();
        let Some(scaled_delta) = self.clock.advance(now, time_scale) else {
            return Ok(StepOutcome::Primed);
        };

        let mut converged = true;
        let mut distance = None;
        let (local, angle) = match self.motion {
            Motion::Fixed => (DVec3::ZERO, self.spun_angle(time_scale, spin_acceleration)),
            Motion::Kepler(orbit) => {
                let sample = engine::position(&orbit, self.clock.accumulated_time());
                converged = sample.converged;
                distance = Some(sample.radius / engine::AU_TO_SCENE);
                (
                    sample.position,
                    self.spun_angle(time_scale, spin_acceleration),
                )
            }
            Motion::Circular {
                distance: radius,
                angular_speed,
                angle,
                frame,
            } => {
                let next = (angle + angular_speed * scaled_delta).rem_euclid(TAU);
                let planar = DVec3::new(radius * next.cos(), 0.0, radius * next.sin());
                // Tidally locked
                (frame * planar, next)
            }
        };

        if !local.is_finite() {
            return Err(BodyUpdateError::NonFinitePosition {
                body: self.name.clone(),
            });
        }
        if !angle.is_finite() {
            return Err(BodyUpdateError::NonFiniteRotation {
                body: self.name.clone(),
            });
        }
        if let Motion::Circular { angle: stored, .. } = &mut self.motion {
            *stored = angle;
        }
        if let Some(distance) = distance {
            self.current_distance = distance;
        }
        self.local_position = local;
        self.rotation_angle = angle;
        Ok(StepOutcome::Moved { converged })
    }

    fn spun_angle(&self, time_scale: f64, spin_acceleration: f64) -> f64 {
        let period_secs = self.elements.rotation_period.abs() * 3600.0;
        if period_secs == 0.0 {
            return self.rotation_angle;
        }
        let rate = TAU / period_secs;
        (self.rotation_angle
            + rate * self.elements.spin_direction() * time_scale * spin_acceleration)
            .rem_euclid(TAU)
    }

    /// Rotation applied to the body's mesh: tilt frame, then spin about Y.
    pub fn orientation(&self) -> DQuat {
        let tilt = match self.motion {
            Motion::Circular { frame, .. } => frame,
            _ => engine::axial_tilt_rotation(self.elements.axial_tilt),
        };
        tilt * DQuat::from_rotation_y(self.rotation_angle)
    }

    pub fn is_selected(&self) -> bool {
        self.selection.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn kepler_body() -> Body {
        let elements = OrbitalElements {
            semi_major_axis: 1.0,
            eccentricity: 0.017,
            rotation_period: 24.0,
            ..Default::default()
        };
        let mut body = Body::new("earth", "Earth", BodyKind::Planet, elements);
        body.motion = Motion::Kepler(KeplerOrbit {
            semi_major_axis: 20.0,
            eccentricity: 0.017,
            inclination: 0.0,
            start_angle: 0.0,
            mean_motion: -TAU,
        });
        body
    }

    #[test]
    fn test_clock_first_advance_only_records() {
        let mut clock = BodyClock::default();
        assert_eq!(clock.advance(100.0, 1.0), None);
        assert_eq!(clock.accumulated_time(), 0.0);
        assert_eq!(clock.state(), ClockState::Running { last_tick: 100.0 });
        assert_eq!(clock.advance(102.0, 0.5), Some(1.0));
        assert_eq!(clock.accumulated_time(), 1.0);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut clock = BodyClock::default();
        clock.advance(10.0, 1.0);
        clock.advance(12.0, 1.0);
        assert_eq!(clock.advance(5.0, 1.0), Some(0.0));
        assert_eq!(clock.accumulated_time(), 2.0);
    }

    #[test]
    fn test_clock_suspend_skips_gap() {
        let mut clock = BodyClock::default();
        clock.advance(0.0, 1.0);
        clock.advance(1.0, 1.0);
        clock.suspend();
        assert_eq!(clock.advance(1_000.0, 1.0), None);
        assert_eq!(clock.advance(1_001.0, 1.0), Some(1.0));
        assert_eq!(clock.accumulated_time(), 2.0);
    }

    #[test]
    fn test_step_primes_then_moves() {
        let mut body = kepler_body();
        let clock = SimulationClock::new(1.0);
        assert_eq!(body.step(5.0, &clock, 1.0), Ok(StepOutcome::Primed));
        assert_eq!(body.local_position, DVec3::ZERO);

        let outcome = body.step(5.25, &clock, 1.0).unwrap();
        assert_eq!(outcome, StepOutcome::Moved { converged: true });
        // A quarter of a year at -2pi per year, so roughly on the -Z axis
        assert!(body.local_position.z < -19.0, "{:?}", body.local_position);
        assert!((body.current_distance - body.local_position.length() / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_spin_follows_period_sign() {
        let mut body = kepler_body();
        body.elements.rotation_period = -24.0;
        let clock = SimulationClock::new(1.0);
        body.step(0.0, &clock, 3600.0).unwrap();
        body.step(0.1, &clock, 3600.0).unwrap();
        // One tick advances 2pi / 24 backwards
        let expected = (-TAU / 24.0).rem_euclid(TAU);
        assert!((body.rotation_angle - expected).abs() < 1e-12);
    }

    #[test]
    fn test_spin_scales_with_time_scale() {
        let spin_acceleration = SimulationConfig::default().spin_acceleration;
        let mut body = kepler_body();
        let clock = SimulationClock::new(0.25);
        body.step(0.0, &clock, spin_acceleration).unwrap();
        body.step(0.1, &clock, spin_acceleration).unwrap();

        let expected = TAU / (24.0 * 3600.0) * 0.25 * spin_acceleration;
        assert!(expected < TAU);
        assert!((body.rotation_angle - expected).abs() < 1e-12);

        // Same wall interval at full speed spins four times as far
        let mut fast = kepler_body();
        let full = SimulationClock::new(1.0);
        fast.step(0.0, &full, spin_acceleration).unwrap();
        fast.step(0.1, &full, spin_acceleration).unwrap();
        let expected_fast = (4.0 * expected).rem_euclid(TAU);
        assert!((fast.rotation_angle - expected_fast).abs() < 1e-9);
    }

    #[test]
    fn test_circular_step_is_tidally_locked() {
        let mut body = Body::new("moon", "Moon", BodyKind::Moon, OrbitalElements::default());
        body.motion = Motion::Circular {
            distance: 2.0,
            angular_speed: 1.0,
            angle: 0.0,
            frame: DQuat::IDENTITY,
        };
        let clock = SimulationClock::new(0.5);
        body.step(0.0, &clock, 1.0).unwrap();
        body.step(1.0, &clock, 1.0).unwrap();
        assert!((body.rotation_angle - 0.5).abs() < 1e-12);
        assert!((body.local_position.x - 2.0 * 0.5f64.cos()).abs() < 1e-12);
        assert!((body.local_position.z - 2.0 * 0.5f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_step_keeps_previous_position() {
        let mut body = Body::new("bad", "Bad", BodyKind::Moon, OrbitalElements::default());
        body.local_position = DVec3::X;
        body.motion = Motion::Circular {
            distance: f64::NAN,
            angular_speed: 1.0,
            angle: 0.0,
            frame: DQuat::IDENTITY,
        };
        let clock = SimulationClock::new(1.0);
        body.step(0.0, &clock, 1.0).unwrap();
        let err = body.step(1.0, &clock, 1.0).unwrap_err();
        assert!(matches!(err, BodyUpdateError::NonFinitePosition { .. }));
        assert_eq!(body.local_position, DVec3::X);
    }

    #[test]
    fn test_trail_is_bounded() {
        let mut trail = Trail::default();
        for i in 0..10 {
            trail.push(DVec3::splat(i as f64), 4);
        }
        assert_eq!(trail.len(), 4);
        assert_eq!(trail.points().next(), Some(DVec3::splat(6.0)));
        trail.clear();
        assert!(trail.is_empty());
    }
}
