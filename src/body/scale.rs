//! Catalog units to scene units.
//!
//! True proportions would make every planet invisible next to its orbit, so
//! sizes and moon distances go through these readable display mappings.

use crate::body::catalog::{DistanceUnit, MoonEntry, MoonSystemLayout};
use crate::config::DisplayOptions;

pub const PLANET_SIZE_FACTOR: f64 = 0.1;
pub const PLANET_REALISTIC_SIZE_FACTOR: f64 = 0.05;
pub const PLANET_MIN_DISPLAY: f64 = 0.05;
pub const PLANET_MAX_DISPLAY: f64 = 1.0;
pub const MOON_SIZE_FACTOR: f64 = 0.175;
pub const MOON_MIN_DISPLAY: f64 = 0.0025;
/// Scene units per AU of moon distance
pub const MOON_AU_TO_SCENE: f64 = 400.0;
/// Moons never sit inside this multiple of the planet radius.
pub const MOON_CLEARANCE: f64 = 1.1;

/// Planet radius in scene units.
pub fn planet_display_radius(size: f64, options: &DisplayOptions) -> f64 {
    if options.realistic_scale {
        size * PLANET_REALISTIC_SIZE_FACTOR * options.scale
    } else {
        ((size * PLANET_SIZE_FACTOR).max(PLANET_MIN_DISPLAY) * options.scale).min(PLANET_MAX_DISPLAY)
    }
}

/// Moon radius in scene units, relative to its planet's display radius.
pub fn moon_display_radius(size: f64, planet_display: f64, layout: &MoonSystemLayout) -> f64 {
    (size * planet_display * MOON_SIZE_FACTOR).max(MOON_MIN_DISPLAY) * layout.size_factor
}

/// Orbit radius in scene units, clamped clear of the planet surface.
pub fn moon_display_distance(
    moon: &MoonEntry,
    planet_display: f64,
    moon_display: f64,
    layout: &MoonSystemLayout,
) -> f64 {
    let raw = match layout.distance_unit {
        DistanceUnit::Au => {
            moon.distance * MOON_AU_TO_SCENE * layout.spacing * moon.spacing.unwrap_or(1.0)
        }
        DistanceUnit::PlanetRadii => moon.distance * planet_display,
    };
    raw.max(planet_display * MOON_CLEARANCE + moon_display)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moon(distance: f64, spacing: Option<f64>) -> MoonEntry {
        MoonEntry {
            id: "m".to_string(),
            name: "M".to_string(),
            size: 0.27,
            distance,
            orbital_period: 27.3,
            ecliptic_inclination: None,
            spacing,
            color: "#aaaaaa".to_string(),
            asset: None,
        }
    }

    #[test]
    fn test_planet_radius_readable_default() {
        let options = DisplayOptions::default();
        assert!((planet_display_radius(1.0, &options) - 0.1).abs() < 1e-12);
        // Small bodies get a floor, giants a ceiling
        assert_eq!(planet_display_radius(0.1, &options), PLANET_MIN_DISPLAY);
        assert_eq!(planet_display_radius(11.2, &options), PLANET_MAX_DISPLAY);
    }

    #[test]
    fn test_planet_radius_realistic_has_no_clamp() {
        let options = DisplayOptions {
            realistic_scale: true,
            ..Default::default()
        };
        assert!((planet_display_radius(11.2, &options) - 0.56).abs() < 1e-12);
        assert!((planet_display_radius(0.383, &options) - 0.01915).abs() < 1e-12);
    }

    #[test]
    fn test_moon_radius_floor_and_factor() {
        let layout = MoonSystemLayout::default();
        assert!((moon_display_radius(0.27, 0.1, &layout) - 0.004725).abs() < 1e-12);
        assert_eq!(moon_display_radius(0.001, 0.1, &layout), MOON_MIN_DISPLAY);
        let small = MoonSystemLayout {
            size_factor: 0.5,
            ..Default::default()
        };
        assert!((moon_display_radius(0.001, 0.1, &small) - 0.00125).abs() < 1e-12);
    }

    #[test]
    fn test_moon_distance_units() {
        let au = MoonSystemLayout {
            spacing: 0.75,
            ..Default::default()
        };
        let d = moon_display_distance(&moon(0.00257, None), 0.1, 0.0047, &au);
        assert!((d - 0.771).abs() < 1e-9);

        let spaced = moon_display_distance(&moon(0.00257, Some(2.0)), 0.1, 0.0047, &au);
        assert!((spaced - 1.542).abs() < 1e-9);

        let radii = MoonSystemLayout {
            distance_unit: DistanceUnit::PlanetRadii,
            ..Default::default()
        };
        assert!((moon_display_distance(&moon(20.0, None), 0.9, 0.01, &radii) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_moon_distance_clears_planet() {
        let layout = MoonSystemLayout::default();
        let d = moon_display_distance(&moon(0.00001, None), 0.5, 0.02, &layout);
        assert!((d - 0.57).abs() < 1e-12);
    }
}
