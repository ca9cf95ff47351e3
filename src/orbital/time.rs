//! Global simulation clock shared by every body.

pub const MIN_TIME_SCALE: f64 = 0.001;
pub const MAX_TIME_SCALE: f64 = 1.0;

/// Time scale and pause state, read once at the start of every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationClock {
    time_scale: f64,
    pub paused: bool,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            time_scale: MAX_TIME_SCALE,
            paused: false,
        }
    }
}

impl SimulationClock {
    pub fn new(time_scale: f64) -> Self {
        let mut clock = Self::default();
        clock.set_time_scale(time_scale);
        clock
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Clamps silently into `[MIN_TIME_SCALE, MAX_TIME_SCALE]`. NaN is ignored.
    pub fn set_time_scale(&mut self, scale: f64) {
        if scale.is_nan() {
            return;
        }
        self.time_scale = scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}
