//! Simulation context
//!
//! One object owns the clock, the body hierarchy, the selection controller,
//! the catalog and the settings. The render driver calls [`Simulation::tick`]
//! once per frame; input arrives as [`SimulationCommand`] messages applied
//! between ticks. Nothing here is global, so several simulations can run
//! side by side in tests.

use bevy::math::DVec3;
use bevy::prelude::*;
use chrono::Utc;

use crate::body::{BodyHierarchy, BodyId, BodyInfo, Catalog, SystemSnapshot, TickReport};
use crate::config::{DisplayOptions, SimulationConfig};
use crate::orbital::SimulationClock;
use crate::selection::label;
use crate::selection::{CameraRig, CameraUpdate, SelectionController};

/// Discrete input events from the viewer.
#[derive(Message, Clone, Debug, PartialEq)]
pub enum SimulationCommand {
    SelectBody(BodyId),
    SelectMoon { moon: BodyId, parent: BodyId },
    /// Select by catalog id or display name
    SelectNamed(String),
    Deselect,
    Follow(BodyId),
    /// Follow whatever is selected without reframing
    FollowSelected,
    StopFollowing,
    SetTimeScale(f64),
    /// Multiply the current time scale
    ScaleTime(f64),
    TogglePause,
    SetShowOrbits(bool),
    SetShowLabels(bool),
    SetShowTrails(bool),
    ToggleOrbits,
    ToggleLabels,
    ToggleTrails,
    Rebuild(DisplayOptions),
    ToggleRealisticScale,
    ResetCamera,
    Hover(Option<BodyId>),
}

/// Global visibility toggles, reapplied after every rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewToggles {
    pub orbits: bool,
    pub labels: bool,
    pub trails: bool,
}

impl Default for ViewToggles {
    fn default() -> Self {
        Self {
            orbits: true,
            labels: true,
            trails: false,
        }
    }
}

/// Result of one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutcome {
    pub report: TickReport,
    pub camera: CameraUpdate,
}

#[derive(Resource, Debug)]
pub struct Simulation {
    pub clock: SimulationClock,
    hierarchy: BodyHierarchy,
    controller: SelectionController,
    catalog: Catalog,
    config: SimulationConfig,
    toggles: ViewToggles,
    last_wall: Option<f64>,
}

impl Simulation {
    pub fn new(catalog: Catalog, config: SimulationConfig) -> Self {
        let hierarchy = BodyHierarchy::build(&catalog, config.display, &config);
        let controller =
            SelectionController::new(config.default_min_camera_distance, config.max_camera_distance);
        let mut simulation = Self {
            clock: SimulationClock::new(config.initial_time_scale),
            hierarchy,
            controller,
            catalog,
            config,
            toggles: ViewToggles::default(),
            last_wall: None,
        };
        simulation.apply_toggles();
        simulation
    }

    /// Settings and catalog from the platform config directory.
    pub fn load() -> Self {
        let config = SimulationConfig::load_or_default();
        let dir = SimulationConfig::config_dir();
        let catalog = Catalog::load_or_builtin(dir.as_deref());
        info!(
            "Catalog: {} with {} planets and {} moons",
            catalog.star.name,
            catalog.planets.len(),
            catalog.moon_count()
        );
        Self::new(catalog, config)
    }

    pub fn hierarchy(&self) -> &BodyHierarchy {
        &self.hierarchy
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn toggles(&self) -> ViewToggles {
        self.toggles
    }

    /// Advance everything to wall time `now` (seconds) and move the camera
    /// rig with the followed body.
    pub fn tick(&mut self, now: f64, rig: &mut CameraRig) -> TickOutcome {
        let wall_delta = self
            .last_wall
            .map(|last| (now - last).max(0.0))
            .unwrap_or(0.0);
        self.last_wall = Some(now);

        let report = self.hierarchy.update(now, &self.clock, &self.config);
        self.hierarchy.advance_labels(wall_delta);
        let camera = self
            .controller
            .camera_tick(&self.hierarchy, rig, self.clock.paused);
        TickOutcome { report, camera }
    }

    /// Apply one input event. Returns false when it changed nothing.
    pub fn apply(&mut self, command: SimulationCommand, rig: &mut CameraRig) -> bool {
        match command {
            SimulationCommand::SelectBody(id) => self.controller.select(&mut self.hierarchy, id, rig),
            SimulationCommand::SelectMoon { moon, parent } => {
                self.controller
                    .select_moon(&mut self.hierarchy, moon, parent, rig)
            }
            SimulationCommand::SelectNamed(name) => match self.hierarchy.find(&name) {
                Some(id) => self.controller.select(&mut self.hierarchy, id, rig),
                None => {
                    debug!("select: no body named {}", name);
                    false
                }
            },
            SimulationCommand::Deselect => {
                self.controller.deselect(&mut self.hierarchy);
                true
            }
            SimulationCommand::Follow(id) => self.controller.follow(&mut self.hierarchy, id, rig),
            SimulationCommand::FollowSelected => match self.controller.selection().body() {
                Some(id) => self.controller.follow(&mut self.hierarchy, id, rig),
                None => false,
            },
            SimulationCommand::StopFollowing => {
                self.controller.stop_following();
                true
            }
            SimulationCommand::SetTimeScale(scale) => {
                self.clock.set_time_scale(scale);
                info!("Time scale {:.3}", self.clock.time_scale());
                true
            }
            SimulationCommand::ScaleTime(factor) => {
                let scale = self.clock.time_scale() * factor;
                self.clock.set_time_scale(scale);
                info!("Time scale {:.3}", self.clock.time_scale());
                true
            }
            SimulationCommand::TogglePause => {
                let paused = self.clock.toggle_pause();
                info!("Simulation {}", if paused { "paused" } else { "resumed" });
                true
            }
            SimulationCommand::SetShowOrbits(show) => {
                self.toggles.orbits = show;
                self.hierarchy.set_show_orbits(show);
                true
            }
            SimulationCommand::SetShowLabels(show) => {
                self.toggles.labels = show;
                self.hierarchy.set_show_labels(show);
                true
            }
            SimulationCommand::SetShowTrails(show) => {
                self.toggles.trails = show;
                self.hierarchy.set_show_trails(show);
                true
            }
            SimulationCommand::ToggleOrbits => {
                self.apply(SimulationCommand::SetShowOrbits(!self.toggles.orbits), rig)
            }
            SimulationCommand::ToggleLabels => {
                self.apply(SimulationCommand::SetShowLabels(!self.toggles.labels), rig)
            }
            SimulationCommand::ToggleTrails => {
                self.apply(SimulationCommand::SetShowTrails(!self.toggles.trails), rig)
            }
            SimulationCommand::Rebuild(options) => {
                self.rebuild(options);
                true
            }
            SimulationCommand::ToggleRealisticScale => {
                let mut options = *self.hierarchy.options();
                options.realistic_scale = !options.realistic_scale;
                self.rebuild(options);
                true
            }
            SimulationCommand::ResetCamera => {
                self.controller.stop_following();
                *rig = CameraRig::default();
                true
            }
            SimulationCommand::Hover(id) => {
                self.controller.hover(&mut self.hierarchy, id);
                true
            }
        }
    }

    /// Replace the hierarchy wholesale. Selection and follow state refer to
    /// the old generation and are dropped with it.
    pub fn rebuild(&mut self, options: DisplayOptions) {
        self.hierarchy.rebuild(&self.catalog, options, &self.config);
        self.controller.reset();
        self.apply_toggles();
    }

    fn apply_toggles(&mut self) {
        self.hierarchy.set_show_orbits(self.toggles.orbits);
        self.hierarchy.set_show_labels(self.toggles.labels);
        self.hierarchy.set_show_trails(self.toggles.trails);
    }

    /// Label opacity for a body seen from `camera_position`.
    pub fn label_opacity(&self, id: BodyId, camera_position: DVec3) -> f64 {
        let Some(body) = self.hierarchy.get(id) else {
            return 0.0;
        };
        if !body.visibility.show_label {
            return 0.0;
        }
        let distance = camera_position.distance(body.world_position);
        label::distance_fade(distance)
            * body.label.opacity(
                self.config.label_transition_delay_secs,
                self.config.label_fade_secs,
            )
    }

    pub fn info(&self, id: BodyId) -> Option<BodyInfo> {
        BodyInfo::collect(&self.hierarchy, &self.catalog, id)
    }

    pub fn selected_info(&self) -> Option<BodyInfo> {
        self.controller
            .selection()
            .body()
            .and_then(|id| self.info(id))
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        let name_of = |id: Option<BodyId>| {
            id.and_then(|id| self.hierarchy.get(id))
                .map(|body| body.name.clone())
        };
        SystemSnapshot {
            captured_at: Utc::now(),
            generation: self.hierarchy.generation(),
            time_scale: self.clock.time_scale(),
            paused: self.clock.paused,
            selected: name_of(self.controller.selection().body()),
            following: name_of(self.controller.following()),
            bodies: self
                .hierarchy
                .iter()
                .filter_map(|(id, _)| self.info(id))
                .collect(),
        }
    }
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Simulation::load())
            .add_message::<SimulationCommand>();
    }
}
