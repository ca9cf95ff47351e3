//! Static body catalog
//!
//! The built-in catalog is embedded JSON describing the star, its planets and
//! their moons. A `catalog.json` in the config directory replaces it when it
//! parses and validates. Validation happens before any body is constructed,
//! so bad parameters surface once at startup and never during a tick.

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::CATALOG_FILE_NAME;
use crate::orbital::OrbitalElements;

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// One rejected catalog parameter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidParameter {
    #[error("{body}: semi-major axis must be positive, got {value}")]
    SemiMajorAxis { body: String, value: f64 },
    #[error("{body}: eccentricity must lie in [0, 1), got {value}")]
    Eccentricity { body: String, value: f64 },
    #[error("{body}: rotation period must be non-zero, got {value}")]
    RotationPeriod { body: String, value: f64 },
    #[error("{body}: orbital period must be non-zero, got {value}")]
    OrbitalPeriod { body: String, value: f64 },
    #[error("{body}: moon distance must be positive, got {value}")]
    MoonDistance { body: String, value: f64 },
    #[error("{body}: {field} must be positive, got {value}")]
    NonPositive {
        body: String,
        field: &'static str,
        value: f64,
    },
    #[error("duplicate body id `{0}`")]
    DuplicateId(String),
    #[error("catalog has no planets")]
    NoPlanets,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog rejected ({} problems): {}", .0.len(), join_problems(.0))]
    Invalid(Vec<InvalidParameter>),
}

fn join_problems(problems: &[InvalidParameter]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarEntry {
    pub id: String,
    pub name: String,
    /// Earth radii
    pub size: f64,
    /// Earth masses
    pub mass: f64,
    /// Central mass for Kepler's third law, in solar masses
    pub mass_solar: f64,
    pub radius_solar: f64,
    /// Effective temperature, Kelvin
    pub temperature: f64,
    /// Scene units
    pub display_radius: f64,
    /// Hours
    pub rotation_period: f64,
    pub color: String,
    #[serde(default)]
    pub asset: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Moon distances are AU and get multiplied by the moon distance scale
    #[default]
    Au,
    /// Moon distances are multiples of the planet's display radius
    PlanetRadii,
}

/// How a planet's moons are laid out around it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonSystemLayout {
    pub distance_unit: DistanceUnit,
    /// Extra spacing factor for every moon of this planet
    pub spacing: f64,
    /// Extra size factor for every moon of this planet
    pub size_factor: f64,
}

impl Default for MoonSystemLayout {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::Au,
            spacing: 1.0,
            size_factor: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoonEntry {
    pub id: String,
    pub name: String,
    /// Earth radii
    pub size: f64,
    /// AU or planet radii depending on the parent's layout
    pub distance: f64,
    /// Earth days; negative for retrograde orbits
    pub orbital_period: f64,
    /// Orbit in the system's reference plane tilted by this many degrees
    /// instead of the planet's equatorial plane.
    #[serde(default)]
    pub ecliptic_inclination: Option<f64>,
    /// Per-moon spacing factor on top of the system spacing
    #[serde(default)]
    pub spacing: Option<f64>,
    pub color: String,
    #[serde(default)]
    pub asset: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetEntry {
    pub id: String,
    pub name: String,
    /// Earth radii
    pub size: f64,
    /// Earth masses
    pub mass: f64,
    /// AU
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Degrees
    pub inclination: f64,
    /// Degrees
    pub axial_tilt: f64,
    /// Earth days
    pub orbital_period: f64,
    /// Hours; negative for retrograde spin
    pub rotation_period: f64,
    #[serde(default)]
    pub start_angle: f64,
    #[serde(default)]
    pub temperature: Option<TemperatureRange>,
    pub color: String,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub has_atmosphere: bool,
    #[serde(default)]
    pub has_rings: bool,
    #[serde(default)]
    pub moon_system: MoonSystemLayout,
    #[serde(default)]
    pub moons: Vec<MoonEntry>,
}

impl PlanetEntry {
    pub fn elements(&self) -> OrbitalElements {
        OrbitalElements {
            semi_major_axis: self.semi_major_axis,
            eccentricity: self.eccentricity,
            inclination: self.inclination,
            start_angle: self.start_angle,
            axial_tilt: self.axial_tilt,
            rotation_period: self.rotation_period,
        }
    }
}

/// Validated catalog. Construct through [`Catalog::parse`] or
/// [`Catalog::builtin`] so that every instance has passed validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub star: StarEntry,
    pub planets: Vec<PlanetEntry>,
}

impl Catalog {
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate().map_err(CatalogError::Invalid)?;
        Ok(catalog)
    }

    /// The embedded solar system.
    pub fn builtin() -> Self {
        match Self::parse(BUILTIN_CATALOG) {
            Ok(catalog) => catalog,
            // The embedded file is covered by tests; reaching this is a build defect.
            Err(err) => panic!("built-in catalog is invalid: {err}"),
        }
    }

    /// Read `catalog.json` from `dir`. Returns Ok(None) if the file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(CATALOG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let catalog =
            Self::parse(&contents).with_context(|| format!("rejected {}", path.display()))?;
        Ok(Some(catalog))
    }

    /// Override from `dir` when present and valid, otherwise the built-in catalog.
    pub fn load_or_builtin(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::builtin();
        };
        match Self::load_from_dir(dir) {
            Ok(Some(catalog)) => {
                info!(
                    "Using catalog override with {} planets from {}",
                    catalog.planets.len(),
                    dir.display()
                );
                catalog
            }
            Ok(None) => Self::builtin(),
            Err(err) => {
                warn!("{:#}; using built-in catalog", err);
                Self::builtin()
            }
        }
    }

    /// Collect every invalid parameter in one pass.
    pub fn validate(&self) -> Result<(), Vec<InvalidParameter>> {
        let mut problems = Vec::new();
        let mut ids = HashSet::new();

        let star = &self.star;
        ids.insert(star.id.as_str());
        for (field, value) in [
            ("mass_solar", star.mass_solar),
            ("radius_solar", star.radius_solar),
            ("display_radius", star.display_radius),
            ("temperature", star.temperature),
        ] {
            check_positive(&mut problems, &star.id, field, value);
        }

        if self.planets.is_empty() {
            problems.push(InvalidParameter::NoPlanets);
        }

        for planet in &self.planets {
            if !ids.insert(planet.id.as_str()) {
                problems.push(InvalidParameter::DuplicateId(planet.id.clone()));
            }
            if !(planet.semi_major_axis.is_finite() && planet.semi_major_axis > 0.0) {
                problems.push(InvalidParameter::SemiMajorAxis {
                    body: planet.id.clone(),
                    value: planet.semi_major_axis,
                });
            }
            if !(0.0..1.0).contains(&planet.eccentricity) {
                problems.push(InvalidParameter::Eccentricity {
                    body: planet.id.clone(),
                    value: planet.eccentricity,
                });
            }
            if !planet.rotation_period.is_finite() || planet.rotation_period == 0.0 {
                problems.push(InvalidParameter::RotationPeriod {
                    body: planet.id.clone(),
                    value: planet.rotation_period,
                });
            }
            check_positive(&mut problems, &planet.id, "size", planet.size);
            check_positive(&mut problems, &planet.id, "mass", planet.mass);
            check_positive(
                &mut problems,
                &planet.id,
                "moon spacing",
                planet.moon_system.spacing,
            );
            check_positive(
                &mut problems,
                &planet.id,
                "moon size factor",
                planet.moon_system.size_factor,
            );

            for moon in &planet.moons {
                if !ids.insert(moon.id.as_str()) {
                    problems.push(InvalidParameter::DuplicateId(moon.id.clone()));
                }
                if !moon.orbital_period.is_finite() || moon.orbital_period == 0.0 {
                    problems.push(InvalidParameter::OrbitalPeriod {
                        body: moon.id.clone(),
                        value: moon.orbital_period,
                    });
                }
                if !(moon.distance.is_finite() && moon.distance > 0.0) {
                    problems.push(InvalidParameter::MoonDistance {
                        body: moon.id.clone(),
                        value: moon.distance,
                    });
                }
                check_positive(&mut problems, &moon.id, "size", moon.size);
                if let Some(spacing) = moon.spacing {
                    check_positive(&mut problems, &moon.id, "spacing", spacing);
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    pub fn planet(&self, id: &str) -> Option<&PlanetEntry> {
        self.planets.iter().find(|p| p.id == id)
    }

    pub fn moon_count(&self) -> usize {
        self.planets.iter().map(|p| p.moons.len()).sum()
    }
}

fn check_positive(
    problems: &mut Vec<InvalidParameter>,
    body: &str,
    field: &'static str,
    value: f64,
) {
    if !(value.is_finite() && value > 0.0) {
        problems.push(InvalidParameter::NonPositive {
            body: body.to_string(),
            field,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.star.id, "sun");
        assert_eq!(catalog.planets.len(), 8);
        assert_eq!(catalog.moon_count(), 16);
        assert!(catalog.planets.iter().all(|p| p.eccentricity < 0.25));
    }

    #[test]
    fn test_builtin_retrograde_markers() {
        let catalog = Catalog::builtin();
        assert!(catalog.planet("venus").unwrap().rotation_period < 0.0);
        assert!(catalog.planet("uranus").unwrap().rotation_period < 0.0);
        let triton = &catalog.planet("neptune").unwrap().moons[0];
        assert!(triton.orbital_period < 0.0);
        let moon = &catalog.planet("earth").unwrap().moons[0];
        assert_eq!(moon.ecliptic_inclination, Some(5.1));
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut catalog = Catalog::builtin();
        catalog.planets[0].semi_major_axis = -1.0;
        catalog.planets[1].eccentricity = 1.0;
        catalog.planets[2].id = "mercury".to_string();

        let problems = catalog.validate().unwrap_err();
        assert!(problems.contains(&InvalidParameter::SemiMajorAxis {
            body: "mercury".to_string(),
            value: -1.0
        }));
        assert!(problems.contains(&InvalidParameter::Eccentricity {
            body: "venus".to_string(),
            value: 1.0
        }));
        assert!(problems.contains(&InvalidParameter::DuplicateId("mercury".to_string())));
    }

    #[test]
    fn test_parse_rejects_invalid_catalog() {
        let mut catalog = Catalog::builtin();
        catalog.planets[3].moons[0].orbital_period = 0.0;
        let json = serde_json::to_string(&catalog).unwrap();
        match Catalog::parse(&json) {
            Err(CatalogError::Invalid(problems)) => {
                assert_eq!(problems.len(), 1);
                assert!(problems[0].to_string().contains("phobos"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            Catalog::parse("{ \"star\": 3 }"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.planets.clear();
        assert_eq!(
            catalog.validate().unwrap_err(),
            vec![InvalidParameter::NoPlanets]
        );
    }

    #[test]
    fn test_load_or_builtin_falls_back_on_bad_override() {
        let dir = std::env::temp_dir().join(format!(
            "orrery-catalog-bad-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CATALOG_FILE_NAME), "[]").unwrap();

        let catalog = Catalog::load_or_builtin(Some(&dir));
        assert_eq!(catalog, Catalog::builtin());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_override() {
        let dir = std::env::temp_dir().join(format!(
            "orrery-catalog-good-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let mut catalog = Catalog::builtin();
        catalog.planets.truncate(3);
        fs::write(
            dir.join(CATALOG_FILE_NAME),
            serde_json::to_string_pretty(&catalog).unwrap(),
        )
        .unwrap();

        let loaded = Catalog::load_from_dir(&dir).unwrap().unwrap();
        assert_eq!(loaded.planets.len(), 3);
        let _ = fs::remove_dir_all(&dir);
    }
}
