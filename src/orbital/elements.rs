//! Orbital elements as carried by every non-root body.

use serde::{Deserialize, Serialize};

/// Classical elements in the units the catalog uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// AU, strictly positive
    pub semi_major_axis: f64,
    /// `[0, 1)`
    pub eccentricity: f64,
    /// Degrees
    pub inclination: f64,
    /// Radians
    pub start_angle: f64,
    /// Degrees
    pub axial_tilt: f64,
    /// Hours; a negative value encodes retrograde spin
    pub rotation_period: f64,
}

impl Default for OrbitalElements {
    fn default() -> Self {
        Self {
            semi_major_axis: 1.0,
            eccentricity: 0.0,
            inclination: 0.0,
            start_angle: 0.0,
            axial_tilt: 0.0,
            rotation_period: 24.0,
        }
    }
}

impl OrbitalElements {
    /// Closest approach to the focus, in AU.
    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Farthest distance from the focus, in AU.
    pub fn apoapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// +1 for prograde spin, -1 for retrograde.
    pub fn spin_direction(&self) -> f64 {
        if self.rotation_period < 0.0 { -1.0 } else { 1.0 }
    }

    pub fn is_bound_ellipse(&self) -> bool {
        self.semi_major_axis.is_finite()
            && self.semi_major_axis > 0.0
            && (0.0..1.0).contains(&self.eccentricity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apsides() {
        let el = OrbitalElements {
            semi_major_axis: 1.524,
            eccentricity: 0.094,
            ..Default::default()
        };
        assert!((el.periapsis() - 1.380744).abs() < 1e-9);
        assert!((el.apoapsis() - 1.667256).abs() < 1e-9);
    }

    #[test]
    fn test_bound_ellipse_rejects_bad_values() {
        let mut el = OrbitalElements::default();
        assert!(el.is_bound_ellipse());
        el.eccentricity = 1.0;
        assert!(!el.is_bound_ellipse());
        el.eccentricity = 0.1;
        el.semi_major_axis = -2.0;
        assert!(!el.is_bound_ellipse());
    }

    #[test]
    fn test_spin_direction_from_sign() {
        let venus = OrbitalElements {
            rotation_period: -5832.5,
            ..Default::default()
        };
        assert_eq!(venus.spin_direction(), -1.0);
        assert_eq!(OrbitalElements::default().spin_direction(), 1.0);
    }
}
