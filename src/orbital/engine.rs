//! Analytic two-body orbit functions.
//!
//! Bodies never perturb each other: every position is a closed-form function
//! of elapsed simulation time. Orbits lie in the XZ plane with the focus at the
//! origin; inclination rotates the plane about the X axis.

use bevy::math::{DQuat, DVec3};
use std::f64::consts::TAU;

use crate::orbital::kepler::solve_kepler;

/// Scene units per astronomical unit for planetary orbits.
pub const AU_TO_SCENE: f64 = 20.0;
/// Simulation time units per Earth day for moon periods.
pub const DAYS_TO_SIM_TIME: f64 = 0.001;
/// Solar constant at 1 AU, W/m^2.
pub const SOLAR_CONSTANT: f64 = 1361.0;
/// Stefan-Boltzmann constant, W/m^2/K^4.
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;
pub const SUN_TEMPERATURE_K: f64 = 5778.0;
pub const DEFAULT_ALBEDO: f64 = 0.3;
/// Earth's surface escape velocity, km/s.
pub const EARTH_ESCAPE_VELOCITY: f64 = 11.2;
pub const DEFAULT_ORBIT_SEGMENTS: usize = 128;

/// Elements already in scene units with a signed angular rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerOrbit {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Degrees
    pub inclination: f64,
    /// Radians
    pub start_angle: f64,
    /// Radians per simulation time unit; the sign selects orbital direction.
    pub mean_motion: f64,
}

/// Output of [`position`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitSample {
    pub position: DVec3,
    /// Distance from the focus in the same units as `semi_major_axis`.
    pub radius: f64,
    pub true_anomaly: f64,
    /// False when the Kepler solve hit its iteration cap.
    pub converged: bool,
}

/// Angular rate from Kepler's third law, `2pi / sqrt(a^3 / M)`.
///
/// `semi_major_axis` in AU, `central_mass` in solar masses. One simulation time
/// unit is one year for `a = 1, M = 1`.
pub fn orbital_speed(semi_major_axis: f64, central_mass: f64) -> f64 {
    let period = (semi_major_axis.powi(3) / central_mass).sqrt();
    TAU / period
}

/// Orbital period in simulation time units for a signed angular rate.
pub fn orbital_period(mean_motion: f64) -> f64 {
    TAU / mean_motion.abs()
}

/// Rotation that tilts the reference plane by `degrees` about the X axis.
pub fn inclination_rotation(degrees: f64) -> DQuat {
    DQuat::from_rotation_x(degrees.to_radians())
}

/// Rotation that tilts a body's equatorial frame by `degrees` about the Z axis.
pub fn axial_tilt_rotation(degrees: f64) -> DQuat {
    DQuat::from_rotation_z(degrees.to_radians())
}

fn incline(point: DVec3, inclination: f64) -> DVec3 {
    if inclination != 0.0 {
        inclination_rotation(inclination) * point
    } else {
        point
    }
}

/// Position on the orbit after `t` simulation time units.
pub fn position(orbit: &KeplerOrbit, t: f64) -> OrbitSample {
    let e = orbit.eccentricity;
    let mean_anomaly = (orbit.mean_motion * t + orbit.start_angle).rem_euclid(TAU);
    let solution = solve_kepler(mean_anomaly, e);
    let ecc_anom = solution.eccentric_anomaly;

    let true_anomaly = 2.0
        * ((1.0 + e).sqrt() * (ecc_anom / 2.0).sin())
            .atan2((1.0 - e).sqrt() * (ecc_anom / 2.0).cos());
    let radius = orbit.semi_major_axis * (1.0 - e * ecc_anom.cos());

    let planar = DVec3::new(radius * true_anomaly.cos(), 0.0, radius * true_anomaly.sin());

    OrbitSample {
        position: incline(planar, orbit.inclination),
        radius,
        true_anomaly,
        converged: solution.converged,
    }
}

/// Closed polyline of `segments + 1` points sampled uniformly in true anomaly.
///
/// The shape is exact but the spacing is not time-uniform. The last point is
/// a copy of the first.
pub fn orbit_line_points(
    semi_major_axis: f64,
    eccentricity: f64,
    inclination: f64,
    segments: usize,
) -> Vec<DVec3> {
    let segments = segments.max(3);
    let semi_latus = semi_major_axis * (1.0 - eccentricity * eccentricity);
    let mut points = Vec::with_capacity(segments + 1);

    for i in 0..segments {
        let theta = i as f64 / segments as f64 * TAU;
        let r = semi_latus / (1.0 + eccentricity * theta.cos());
        let planar = DVec3::new(r * theta.cos(), 0.0, r * theta.sin());
        points.push(incline(planar, inclination));
    }
    points.push(points[0]);
    points
}

/// Closed circle of `segments + 1` points in the local XZ plane.
pub fn circle_points(radius: f64, segments: usize) -> Vec<DVec3> {
    orbit_line_points(radius, 0.0, 0.0, segments)
}

/// Equilibrium blackbody temperature in Kelvin.
///
/// Flux is `1361 R^2 / d^2`. The star temperature is carried for callers
/// but does not enter the flux.
pub fn temperature(distance_au: f64, _star_temperature_k: f64, star_radius: f64, albedo: f64) -> f64 {
    let flux = SOLAR_CONSTANT * star_radius * star_radius / (distance_au * distance_au);
    let effective_flux = flux * (1.0 - albedo) / 4.0;
    (effective_flux / STEFAN_BOLTZMANN).powf(0.25)
}

/// Sun-like defaults for [`temperature`].
pub fn solar_temperature(distance_au: f64) -> f64 {
    temperature(distance_au, SUN_TEMPERATURE_K, 1.0, DEFAULT_ALBEDO)
}

/// Inclusive band `[0.95 sqrt(M), 1.37 sqrt(M)]` AU.
pub fn habitable_zone(distance_au: f64, star_mass: f64) -> bool {
    let root = star_mass.sqrt();
    let inner = 0.95 * root;
    let outer = 1.37 * root;
    (inner..=outer).contains(&distance_au)
}

/// Surface escape velocity in km/s for mass and radius relative to Earth.
pub fn escape_velocity(mass: f64, radius: f64) -> f64 {
    EARTH_ESCAPE_VELOCITY * (mass / radius).sqrt()
}

pub fn au_to_scene(au: f64) -> f64 {
    au * AU_TO_SCENE
}

pub fn days_to_sim_time(days: f64) -> f64 {
    days * DAYS_TO_SIM_TIME
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn earth_like() -> KeplerOrbit {
        KeplerOrbit {
            semi_major_axis: 1.0,
            eccentricity: 0.017,
            inclination: 0.0,
            start_angle: 0.0,
            mean_motion: orbital_speed(1.0, 1.0),
        }
    }

    #[test]
    fn test_orbital_speed_one_au() {
        assert!((orbital_speed(1.0, 1.0) - TAU).abs() < 1e-12);
        // Four times the mass halves the period
        assert!((orbital_speed(1.0, 4.0) - 2.0 * TAU).abs() < 1e-12);
    }

    #[test]
    fn test_position_at_zero_is_periapsis() {
        for e in [0.0, 0.017, 0.094, 0.206] {
            let orbit = KeplerOrbit {
                semi_major_axis: 2.5,
                eccentricity: e,
                ..earth_like()
            };
            let sample = position(&orbit, 0.0);
            assert!((sample.position.length() - 2.5 * (1.0 - e)).abs() < 1e-12);
            assert!((sample.position.x - 2.5 * (1.0 - e)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_position_is_periodic() {
        let orbit = KeplerOrbit {
            semi_major_axis: 5.2,
            eccentricity: 0.049,
            inclination: 1.3,
            start_angle: 0.4,
            mean_motion: -orbital_speed(5.2, 1.0),
        };
        let period = orbital_period(orbit.mean_motion);
        let start = position(&orbit, 0.0).position;
        let end = position(&orbit, period).position;
        assert!(start.distance(end) < 1e-9, "drift {}", start.distance(end));
    }

    #[test]
    fn test_position_matches_independent_solve() {
        let orbit = earth_like();
        // Mean anomaly pi/2 after a quarter year
        let t = FRAC_PI_2 / orbit.mean_motion;
        let sample = position(&orbit, t);

        // Fixed-point iteration E = M + e sin E, independent of Newton.
        let (m, e) = (FRAC_PI_2, 0.017);
        let mut ecc = m;
        for _ in 0..200 {
            ecc = m + e * ecc.sin();
        }
        let x = ecc.cos() - e;
        let z = (1.0 - e * e).sqrt() * ecc.sin();
        let expected = DVec3::new(x, 0.0, z);

        assert!(sample.converged);
        assert!(
            sample.position.distance(expected) < 1e-6,
            "got {:?}, expected {:?}",
            sample.position,
            expected
        );
    }

    #[test]
    fn test_inclination_lifts_out_of_plane() {
        let orbit = KeplerOrbit {
            inclination: 90.0,
            start_angle: FRAC_PI_2,
            eccentricity: 0.0,
            ..earth_like()
        };
        let p = position(&orbit, 0.0).position;
        // Planar point (0, 0, 1) rotated 90 degrees about X lands on -Y
        assert!(p.z.abs() < 1e-12);
        assert!((p.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orbit_line_closed_and_bounded() {
        let (a, e) = (20.0, 0.206);
        let points = orbit_line_points(a, e, 7.0, DEFAULT_ORBIT_SEGMENTS);
        assert_eq!(points.len(), DEFAULT_ORBIT_SEGMENTS + 1);
        assert_eq!(points.first(), points.last());
        for p in &points {
            let r = p.length();
            assert!(r >= a * (1.0 - e) - 1e-9 && r <= a * (1.0 + e) + 1e-9);
        }
    }

    #[test]
    fn test_circle_points_radius() {
        let points = circle_points(0.77, 64);
        assert_eq!(points.len(), 65);
        assert!(points.iter().all(|p| (p.length() - 0.77).abs() < 1e-12));
        assert!(points.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn test_temperature_earth_baseline() {
        let t = temperature(1.0, 5778.0, 1.0, 0.3);
        assert!((254.0..=255.0).contains(&t), "got {t}");
        assert!((solar_temperature(1.0) - t).abs() < 1e-12);
    }

    #[test]
    fn test_temperature_flux_ignores_star_temperature() {
        assert_eq!(temperature(1.0, 3000.0, 1.0, 0.3), temperature(1.0, 5778.0, 1.0, 0.3));
        // Radius still scales the flux: T grows as sqrt(R)
        let big = temperature(1.0, 5778.0, 4.0, 0.3);
        assert!((big / solar_temperature(1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_inverse_square_root() {
        // T scales as d^-1/2
        let t1 = solar_temperature(1.0);
        let t4 = solar_temperature(4.0);
        assert!((t1 / t4 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_habitable_zone_edges() {
        assert!(habitable_zone(1.0, 1.0));
        assert!(habitable_zone(0.95, 1.0));
        assert!(habitable_zone(1.37, 1.0));
        assert!(!habitable_zone(0.723, 1.0));
        assert!(!habitable_zone(1.524, 1.0));
        // Heavier star pushes the band out
        assert!(habitable_zone(2.0, 4.0));
        assert!(!habitable_zone(1.0, 4.0));
    }

    #[test]
    fn test_escape_velocity() {
        assert!((escape_velocity(1.0, 1.0) - 11.2).abs() < 1e-12);
        let jupiter = escape_velocity(317.8, 11.21);
        assert!((jupiter - 59.63).abs() < 0.1, "got {jupiter}");
    }

    #[test]
    fn test_unit_helpers() {
        assert_eq!(au_to_scene(1.5), 30.0);
        assert!((days_to_sim_time(27.32) - 0.02732).abs() < 1e-12);
        assert!((orbital_period(-PI) - 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_position_radius_within_apsides(
            t in -50.0f64..50.0,
            e in 0.0f64..0.3,
            a in 0.1f64..40.0,
        ) {
            let orbit = KeplerOrbit {
                semi_major_axis: a,
                eccentricity: e,
                inclination: 3.0,
                start_angle: 0.0,
                mean_motion: orbital_speed(a, 1.0),
            };
            let sample = position(&orbit, t);
            let r = sample.position.length();
            prop_assert!(r >= a * (1.0 - e) - 1e-9);
            prop_assert!(r <= a * (1.0 + e) + 1e-9);
            prop_assert!((r - sample.radius).abs() < 1e-9);
        }
    }
}
