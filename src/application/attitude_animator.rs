// Smooth orientation animation decoupled from sample arrival
use crate::application::surfaces::{draw, AttitudeSurface};
use crate::domain::attitude::{AttitudeSample, AttitudeState, Rotation};
use crate::domain::error::DashboardError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Fraction of the remaining distance covered per frame
pub const SMOOTHING_FACTOR: f64 = 0.1;

pub struct AttitudeAnimator {
    state: AttitudeState,
    alpha: f64,
    surface: Option<Arc<dyn AttitudeSurface>>,
}

impl AttitudeAnimator {
    #[cfg(test)]
    pub fn new(surface: Option<Arc<dyn AttitudeSurface>>) -> Self {
        Self::with_smoothing(surface, SMOOTHING_FACTOR)
    }

    pub fn with_smoothing(surface: Option<Arc<dyn AttitudeSurface>>, alpha: f64) -> Self {
        Self {
            state: AttitudeState::default(),
            alpha,
            surface,
        }
    }

    pub fn state(&self) -> &AttitudeState {
        &self.state
    }

    /// Take a new orientation in degrees as the animation target.
    pub fn on_sample(&mut self, sample: AttitudeSample) -> Result<(), DashboardError> {
        let sample = sample.validate()?;
        self.state.target = Rotation::from_attitude(sample);
        if !self.state.animating {
            tracing::debug!("attitude animation started");
            self.state.animating = true;
        }
        Ok(())
    }

    /// Advance one frame and draw. Before the first sample the rotation stays put.
    pub fn tick(&mut self) -> Rotation {
        if self.state.animating {
            self.state.current.approach(self.state.target, self.alpha);
        }

        let current = self.state.current;
        draw(self.surface.as_ref(), "attitude", |s| s.render_rotation(current));
        current
    }
}

/// Fixed-rate frame clock. Late frames are skipped, not bunched.
pub fn frame_clock(frame_rate_hz: u32) -> Interval {
    let period = Duration::from_secs_f64(1.0 / f64::from(frame_rate_hz.max(1)));
    let mut clock = interval(period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    clock
}
