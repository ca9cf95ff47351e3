//! Selection and camera-follow state machine.
//!
//! Every transition is a plain state mutation. Handles that no longer
//! resolve (stale after a rebuild, or hidden moons) turn the call into a
//! logged no-op.

use bevy::math::DVec3;
use bevy::prelude::*;

use crate::body::{BodyHierarchy, BodyId, BodyKind};

/// Closest the camera may get to these bodies while following them.
const MIN_DISTANCE_OVERRIDES: &[(&str, f64)] = &[
    ("mercury", 0.25),
    ("venus", 0.35),
    ("earth", 0.35),
    ("mars", 0.3),
    ("moon", 0.08),
    ("phobos", 0.05),
    ("deimos", 0.05),
];
const MIN_DISTANCE_FACTOR: f64 = 1.5;
const MIN_DISTANCE_FLOOR: f64 = 0.5;
/// Framing puts the camera this many display radii from the body.
const FRAMING_RADII: f64 = 8.0;

pub const HOME_POSITION: DVec3 = DVec3::new(0.0, 5.0, 15.0);

/// Camera position and orbit target in scene units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub position: DVec3,
    pub target: DVec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: HOME_POSITION,
            target: DVec3::ZERO,
        }
    }
}

impl CameraRig {
    pub fn distance(&self) -> f64 {
        self.position.distance(self.target)
    }
}

/// Planet-level and moon-level selection are mutually exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Planet(BodyId),
    Moon {
        moon: BodyId,
        parent: BodyId,
    },
}

impl Selection {
    pub fn body(&self) -> Option<BodyId> {
        match *self {
            Selection::None => None,
            Selection::Planet(id) => Some(id),
            Selection::Moon { moon, .. } => Some(moon),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowState {
    pub target: BodyId,
    /// None until the first camera tick records it
    pub last_target_position: Option<DVec3>,
    pub min_distance: f64,
    /// Set by selection: the first tick frames the body instead of recording
    pub frame_pending: bool,
    /// Rig when following started; framing keeps its viewing direction
    pub start_rig: CameraRig,
}

/// What [`SelectionController::camera_tick`] did to the rig.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraUpdate {
    None,
    /// First tick of a plain follow; the rig is untouched.
    Recorded,
    /// Rig moved next to the body and aimed at it.
    Framed { position: DVec3, target: DVec3 },
    /// Rig translated with the body, keeping the viewing angle.
    Translated(DVec3),
}

#[derive(Clone, Debug)]
pub struct SelectionController {
    selection: Selection,
    hovered: Option<BodyId>,
    follow: Option<FollowState>,
    default_min_distance: f64,
    max_distance: f64,
}

impl SelectionController {
    pub fn new(default_min_distance: f64, max_distance: f64) -> Self {
        Self {
            selection: Selection::None,
            hovered: None,
            follow: None,
            default_min_distance,
            max_distance,
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn hovered(&self) -> Option<BodyId> {
        self.hovered
    }

    pub fn follow_state(&self) -> Option<&FollowState> {
        self.follow.as_ref()
    }

    pub fn following(&self) -> Option<BodyId> {
        self.follow.map(|f| f.target)
    }

    /// Current lower zoom limit for the camera.
    pub fn min_distance(&self) -> f64 {
        self.follow
            .map(|f| f.min_distance)
            .unwrap_or(self.default_min_distance)
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Select a body and start following it. Moons are routed to
    /// [`select_moon`](Self::select_moon) with their own parent.
    ///
    /// Returns false when nothing changed: stale handle, or the body is
    /// already selected.
    pub fn select(&mut self, hierarchy: &mut BodyHierarchy, id: BodyId, rig: &CameraRig) -> bool {
        let Some(body) = hierarchy.get(id) else {
            debug!("select: stale body handle {:?}", id);
            return false;
        };
        if body.kind == BodyKind::Moon {
            let Some(parent) = body.parent else {
                return false;
            };
            return self.select_moon(hierarchy, id, parent, rig);
        }
        if self.selection == Selection::Planet(id) {
            return false;
        }
        info!("Selected {}", body.name);
        self.clear_selection_flags(hierarchy);
        self.selection = Selection::Planet(id);
        self.mark_selected(hierarchy, id);
        self.begin_follow(hierarchy, id, rig, true);
        true
    }

    /// Select a moon, keeping its planet as framing context.
    pub fn select_moon(
        &mut self,
        hierarchy: &mut BodyHierarchy,
        moon: BodyId,
        parent: BodyId,
        rig: &CameraRig,
    ) -> bool {
        let valid = hierarchy
            .get(moon)
            .is_some_and(|body| body.kind == BodyKind::Moon && body.parent == Some(parent))
            && hierarchy.contains(parent);
        if !valid {
            debug!("select_moon: {:?} is not a live moon of {:?}", moon, parent);
            return false;
        }
        if self.selection == (Selection::Moon { moon, parent }) {
            return false;
        }
        if let Some(body) = hierarchy.get(moon) {
            info!("Selected moon {}", body.name);
        }
        self.clear_selection_flags(hierarchy);
        self.selection = Selection::Moon { moon, parent };
        self.mark_selected(hierarchy, moon);
        self.begin_follow(hierarchy, moon, rig, true);
        true
    }

    /// Clear the selection and stop following.
    pub fn deselect(&mut self, hierarchy: &mut BodyHierarchy) {
        if self.selection != Selection::None {
            info!("Selection cleared");
        }
        self.clear_selection_flags(hierarchy);
        self.selection = Selection::None;
        self.stop_following();
    }

    /// Follow a body without framing it; the next camera tick only records
    /// its position.
    pub fn follow(&mut self, hierarchy: &mut BodyHierarchy, id: BodyId, rig: &CameraRig) -> bool {
        if !hierarchy.contains(id) {
            debug!("follow: stale body handle {:?}", id);
            return false;
        }
        self.begin_follow(hierarchy, id, rig, false);
        true
    }

    pub fn stop_following(&mut self) {
        if let Some(follow) = self.follow.take() {
            debug!("Stopped following {:?}", follow.target);
        }
    }

    fn begin_follow(&mut self, hierarchy: &mut BodyHierarchy, id: BodyId, rig: &CameraRig, frame: bool) {
        let Some(body) = hierarchy.get(id) else {
            return;
        };
        let min_distance = follow_min_distance(&body.key, body.display_radius);
        info!("Following {} (min distance {:.2})", body.name, min_distance);
        self.follow = Some(FollowState {
            target: id,
            last_target_position: None,
            min_distance,
            frame_pending: frame,
            start_rig: *rig,
        });
        hierarchy.restart_labels();
    }

    /// Move the rig with the followed body. Call once per tick after the
    /// hierarchy update.
    pub fn camera_tick(&mut self, hierarchy: &BodyHierarchy, rig: &mut CameraRig, paused: bool) -> CameraUpdate {
        if paused {
            return CameraUpdate::None;
        }
        let Some(follow) = self.follow.as_mut() else {
            return CameraUpdate::None;
        };
        let Some(body) = hierarchy.get(follow.target) else {
            debug!("camera_tick: followed body is gone");
            self.follow = None;
            return CameraUpdate::None;
        };
        let current = body.world_position;

        if follow.frame_pending {
            follow.frame_pending = false;
            follow.last_target_position = Some(current);
            let direction = (follow.start_rig.position - follow.start_rig.target)
                .try_normalize()
                .unwrap_or(DVec3::Z);
            let distance = (body.display_radius * FRAMING_RADII)
                .max(follow.min_distance * 2.0)
                .min(self.max_distance);
            rig.target = current;
            rig.position = current + direction * distance;
            return CameraUpdate::Framed {
                position: rig.position,
                target: rig.target,
            };
        }

        let Some(last) = follow.last_target_position else {
            follow.last_target_position = Some(current);
            return CameraUpdate::Recorded;
        };
        let delta = current - last;
        rig.position += delta;
        rig.target += delta;
        follow.last_target_position = Some(current);
        CameraUpdate::Translated(delta)
    }

    /// Hover is exclusive like selection; None clears it.
    pub fn hover(&mut self, hierarchy: &mut BodyHierarchy, id: Option<BodyId>) {
        if let Some(previous) = self.hovered.take()
            && let Some(body) = hierarchy.get_mut(previous)
        {
            body.selection.hovered = false;
        }
        let Some(id) = id else {
            return;
        };
        if let Some(body) = hierarchy.get_mut(id) {
            body.selection.hovered = true;
            self.hovered = Some(id);
        }
    }

    /// Drop all state tied to a hierarchy generation.
    pub fn reset(&mut self) {
        self.selection = Selection::None;
        self.hovered = None;
        self.follow = None;
    }

    fn clear_selection_flags(&self, hierarchy: &mut BodyHierarchy) {
        if let Some(id) = self.selection.body()
            && let Some(body) = hierarchy.get_mut(id)
        {
            body.selection.selected = false;
        }
    }

    fn mark_selected(&self, hierarchy: &mut BodyHierarchy, id: BodyId) {
        if let Some(body) = hierarchy.get_mut(id) {
            body.selection.selected = true;
        }
    }
}

/// Named overrides for small close-orbit bodies, else a multiple of the
/// display radius with a floor.
pub fn follow_min_distance(key: &str, display_radius: f64) -> f64 {
    MIN_DISTANCE_OVERRIDES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, distance)| *distance)
        .unwrap_or_else(|| (display_radius * MIN_DISTANCE_FACTOR).max(MIN_DISTANCE_FLOOR))
}
