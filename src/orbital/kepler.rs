//! Newton-Raphson solver for Kepler's equation `E - e sin E = M`.

/// Step size below which the iteration is considered converged.
pub const KEPLER_TOLERANCE: f64 = 1e-8;

/// Iteration cap. Catalog eccentricities stay well below 0.25, where Newton
/// seeded at `M` converges in three or four steps.
pub const KEPLER_MAX_ITERATIONS: u32 = 10;

/// Result of a single Kepler solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly in radians (best iterate when not converged).
    pub eccentric_anomaly: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Solve Kepler's equation for the eccentric anomaly.
///
/// `mean_anomaly` may be any real value; `eccentricity` must lie in `[0, 1)`.
/// Reaching the iteration cap is not an error: the last iterate is returned
/// with `converged == false` so the caller can count it.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let mut e_anom = mean_anomaly;

    for i in 0..KEPLER_MAX_ITERATIONS {
        let f = e_anom - eccentricity * e_anom.sin() - mean_anomaly;
        let df = 1.0 - eccentricity * e_anom.cos();
        let delta = f / df;
        e_anom -= delta;

        if delta.abs() < KEPLER_TOLERANCE {
            return KeplerSolution {
                eccentric_anomaly: e_anom,
                iterations: i + 1,
                converged: true,
            };
        }
    }

    KeplerSolution {
        eccentric_anomaly: e_anom,
        iterations: KEPLER_MAX_ITERATIONS,
        converged: false,
    }
}

/// Residual `|E - e sin E - M|` of a candidate solution.
pub fn kepler_residual(eccentric_anomaly: f64, eccentricity: f64, mean_anomaly: f64) -> f64 {
    (eccentric_anomaly - eccentricity * eccentric_anomaly.sin() - mean_anomaly).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_circular_orbit_is_identity() {
        for m in [0.0, 0.5, PI, 5.0] {
            let sol = solve_kepler(m, 0.0);
            assert!(sol.converged);
            assert!((sol.eccentric_anomaly - m).abs() < 1e-12);
        }
    }

    #[test]
    fn test_known_value() {
        // M = pi/2 with e = 0.017: residual must vanish to solver precision
        let m = PI / 2.0;
        let sol = solve_kepler(m, 0.017);
        assert!(sol.converged);
        assert!(kepler_residual(sol.eccentric_anomaly, 0.017, m) < 1e-10);
        assert!(sol.eccentric_anomaly > m, "E leads M in the first half orbit");
    }

    #[test]
    fn test_periapsis_and_apoapsis_are_fixed_points() {
        for e in [0.1, 0.2, 0.24] {
            assert!(solve_kepler(0.0, e).eccentric_anomaly.abs() < 1e-12);
            assert!((solve_kepler(PI, e).eccentric_anomaly - PI).abs() < 1e-12);
        }
    }

    #[test]
    fn test_negative_mean_anomaly() {
        let sol = solve_kepler(-1.0, 0.2);
        assert!(sol.converged);
        assert!(kepler_residual(sol.eccentric_anomaly, 0.2, -1.0) < 1e-8);
    }

    #[test]
    fn test_high_eccentricity_returns_best_iterate() {
        // Newton seeded at M struggles near e -> 1; it must still return a finite value.
        let sol = solve_kepler(0.01, 0.999_999);
        assert!(sol.eccentric_anomaly.is_finite());
        assert!(sol.iterations <= KEPLER_MAX_ITERATIONS);
    }

    proptest! {
        #[test]
        fn prop_residual_small_for_catalog_eccentricities(
            m in 0.0f64..TAU,
            e in 0.0f64..=0.3,
        ) {
            let sol = solve_kepler(m, e);
            prop_assert!(kepler_residual(sol.eccentric_anomaly, e, m) < 1e-6);
        }
    }
}
