//! Display-panel snapshots of body state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::body::catalog::{Catalog, TemperatureRange};
use crate::body::hierarchy::BodyHierarchy;
use crate::body::model::{BodyId, BodyKind};
use crate::orbital::engine;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoonSummary {
    pub name: String,
    /// Catalog units of the parent's moon layout
    pub distance: f64,
    /// Earth days, negative for retrograde
    pub orbital_period: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecliptic_inclination: Option<f64>,
}

/// Union of star, planet and moon fields. Fields that do not apply to a
/// kind are None.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BodyInfo {
    pub id: String,
    pub name: String,
    pub kind: BodyKind,
    /// Earth radii
    pub size: f64,
    /// Earth masses
    pub mass: Option<f64>,
    /// Semi-major axis in AU for planets, catalog distance for moons
    pub distance: Option<f64>,
    pub current_distance: Option<f64>,
    pub periapsis: Option<f64>,
    pub apoapsis: Option<f64>,
    pub eccentricity: f64,
    /// Degrees
    pub inclination: f64,
    /// Degrees
    pub axial_tilt: Option<f64>,
    pub orbital_period_days: Option<f64>,
    pub rotation_period_hours: Option<f64>,
    /// Kelvin. Catalog average when known, equilibrium estimate otherwise.
    pub temperature: Option<f64>,
    pub temperature_range: Option<TemperatureRange>,
    pub has_atmosphere: bool,
    pub has_rings: bool,
    pub habitable: Option<bool>,
    /// km/s
    pub escape_velocity: Option<f64>,
    pub parent: Option<String>,
    pub moons: Vec<MoonSummary>,
    pub color: String,
    pub asset: Option<String>,
}

impl BodyInfo {
    /// Assemble the info for `id`, or None if the handle is stale.
    pub fn collect(hierarchy: &BodyHierarchy, catalog: &Catalog, id: BodyId) -> Option<Self> {
        let body = hierarchy.get(id)?;
        let parent = body.parent.and_then(|p| hierarchy.get(p));
        let star = hierarchy.star();

        let mut info = BodyInfo {
            id: body.key.clone(),
            name: body.name.clone(),
            kind: body.kind,
            size: body.size,
            mass: body.mass,
            distance: None,
            current_distance: None,
            periapsis: None,
            apoapsis: None,
            eccentricity: body.elements.eccentricity,
            inclination: body.elements.inclination,
            axial_tilt: None,
            orbital_period_days: None,
            rotation_period_hours: Some(body.elements.rotation_period),
            temperature: body.temperature,
            temperature_range: None,
            has_atmosphere: false,
            has_rings: false,
            habitable: None,
            escape_velocity: None,
            parent: parent.map(|p| p.name.clone()),
            moons: Vec::new(),
            color: body.color.clone(),
            asset: body.asset.clone(),
        };

        match body.kind {
            BodyKind::Star => {}
            BodyKind::Planet => {
                let entry = catalog.planet(&body.key)?;
                info.distance = Some(body.elements.semi_major_axis);
                info.current_distance = Some(body.current_distance);
                info.periapsis = Some(body.elements.periapsis());
                info.apoapsis = Some(body.elements.apoapsis());
                info.axial_tilt = Some(body.elements.axial_tilt);
                info.orbital_period_days = Some(entry.orbital_period);
                if let Some(range) = entry.temperature {
                    info.temperature = Some(range.average);
                    info.temperature_range = Some(range);
                }
                info.has_atmosphere = entry.has_atmosphere;
                info.has_rings = entry.has_rings;
                info.habitable = Some(engine::habitable_zone(
                    body.elements.semi_major_axis,
                    star.mass_solar,
                ));
                info.escape_velocity = Some(engine::escape_velocity(entry.mass, entry.size));
                info.moons = hierarchy
                    .children(id)
                    .into_iter()
                    .filter_map(|child| hierarchy.get(child))
                    .filter_map(|moon| entry.moons.iter().find(|m| m.id == moon.key))
                    .map(|moon| MoonSummary {
                        name: moon.name.clone(),
                        distance: moon.distance,
                        orbital_period: moon.orbital_period,
                        ecliptic_inclination: moon.ecliptic_inclination,
                    })
                    .collect();
            }
            BodyKind::Moon => {
                let planet = parent?;
                let entry = catalog
                    .planet(&planet.key)?
                    .moons
                    .iter()
                    .find(|m| m.id == body.key)?;
                info.distance = Some(entry.distance);
                info.current_distance = Some(entry.distance);
                info.axial_tilt = Some(body.elements.axial_tilt);
                info.orbital_period_days = Some(entry.orbital_period);
                // Moons share their planet's distance from the star
                info.temperature = Some(engine::temperature(
                    planet.current_distance,
                    star.temperature,
                    star.radius_solar,
                    engine::DEFAULT_ALBEDO,
                ));
            }
        }
        Some(info)
    }
}

/// Point-in-time view of every enabled body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub captured_at: DateTime<Utc>,
    pub generation: u32,
    pub time_scale: f64,
    pub paused: bool,
    pub selected: Option<String>,
    pub following: Option<String>,
    pub bodies: Vec<BodyInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayOptions, SimulationConfig};

    fn hierarchy() -> (BodyHierarchy, Catalog) {
        let catalog = Catalog::builtin();
        let hierarchy = BodyHierarchy::build(
            &catalog,
            DisplayOptions::default(),
            &SimulationConfig::default(),
        );
        (hierarchy, catalog)
    }

    #[test]
    fn test_planet_info() {
        let (hierarchy, catalog) = hierarchy();
        let earth = hierarchy.find("earth").unwrap();
        let info = BodyInfo::collect(&hierarchy, &catalog, earth).unwrap();
        assert_eq!(info.kind, BodyKind::Planet);
        assert_eq!(info.habitable, Some(true));
        assert!((info.escape_velocity.unwrap() - 11.2).abs() < 1e-9);
        assert_eq!(info.moons.len(), 1);
        assert_eq!(info.moons[0].name, "Moon");
        assert_eq!(info.parent.as_deref(), Some("Sun"));
        assert!(info.periapsis.unwrap() < info.apoapsis.unwrap());
        assert!(info.temperature_range.is_some());
    }

    #[test]
    fn test_moon_info_uses_parent_distance() {
        let (hierarchy, catalog) = hierarchy();
        let titan = hierarchy.find("titan").unwrap();
        let info = BodyInfo::collect(&hierarchy, &catalog, titan).unwrap();
        assert_eq!(info.kind, BodyKind::Moon);
        assert_eq!(info.parent.as_deref(), Some("Saturn"));
        assert_eq!(info.mass, None);
        assert_eq!(info.habitable, None);
        let t = info.temperature.unwrap();
        assert!(t > 60.0 && t < 110.0, "got {t}");
    }

    #[test]
    fn test_star_info() {
        let (hierarchy, catalog) = hierarchy();
        let info = BodyInfo::collect(&hierarchy, &catalog, hierarchy.root()).unwrap();
        assert_eq!(info.kind, BodyKind::Star);
        assert_eq!(info.temperature, Some(5778.0));
        assert!(info.distance.is_none());
        assert!(info.parent.is_none());
    }

    #[test]
    fn test_info_serializes_kind_tag() {
        let (hierarchy, catalog) = hierarchy();
        let mars = hierarchy.find("mars").unwrap();
        let info = BodyInfo::collect(&hierarchy, &catalog, mars).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["kind"], "planet");
        assert_eq!(json["moons"].as_array().unwrap().len(), 2);
    }
}
