//! Label visibility: transition fade and camera-distance fade.

/// Labels are fully opaque up to this camera distance.
pub const LABEL_FULL_DISTANCE: f64 = 100.0;
/// Labels are hidden beyond this camera distance.
pub const LABEL_HIDE_DISTANCE: f64 = 150.0;

/// Fade-in progress for one body's label, advanced by the regular tick.
///
/// Restarting overwrites any fade already in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LabelFade {
    /// Seconds since the transition started; None when no transition is running.
    elapsed: Option<f64>,
}

impl LabelFade {
    pub fn restart(&mut self) {
        self.elapsed = Some(0.0);
    }

    pub fn advance(&mut self, wall_delta: f64) {
        if let Some(elapsed) = &mut self.elapsed {
            *elapsed += wall_delta.max(0.0);
        }
    }

    /// Zero during `delay`, then a smoothstep to one over `duration`.
    pub fn opacity(&self, delay: f64, duration: f64) -> f64 {
        let Some(elapsed) = self.elapsed else {
            return 1.0;
        };
        if elapsed < delay {
            return 0.0;
        }
        if duration <= 0.0 {
            return 1.0;
        }
        let t = ((elapsed - delay) / duration).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}

pub fn distance_fade(camera_distance: f64) -> f64 {
    if camera_distance <= LABEL_FULL_DISTANCE {
        1.0
    } else if camera_distance >= LABEL_HIDE_DISTANCE {
        0.0
    } else {
        1.0 - (camera_distance - LABEL_FULL_DISTANCE) / (LABEL_HIDE_DISTANCE - LABEL_FULL_DISTANCE)
    }
}
