// Attitude domain models
use super::channel::MetricSample;
use super::error::DashboardError;
use serde::Serialize;

/// Orientation reading in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AttitudeSample {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl AttitudeSample {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Read the angles from an attitude history record, missing axes read as 0
    pub fn from_metric(sample: &MetricSample) -> Self {
        Self {
            roll: sample.field("roll").unwrap_or(0.0),
            pitch: sample.field("pitch").unwrap_or(0.0),
            yaw: sample.field("yaw").unwrap_or(0.0),
        }
    }

    pub fn validate(self) -> Result<Self, DashboardError> {
        if self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite() {
            Ok(self)
        } else {
            Err(DashboardError::InvalidAttitudeSample {
                roll: self.roll,
                pitch: self.pitch,
                yaw: self.yaw,
            })
        }
    }
}

/// Euler rotation in radians as the renderer consumes it.
///
/// `x` carries pitch, `y` yaw and `z` roll.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Rotation {
    pub fn from_attitude(sample: AttitudeSample) -> Self {
        Self {
            x: sample.pitch.to_radians(),
            y: sample.yaw.to_radians(),
            z: sample.roll.to_radians(),
        }
    }

    pub fn to_attitude(self) -> AttitudeSample {
        AttitudeSample {
            roll: self.z.to_degrees(),
            pitch: self.x.to_degrees(),
            yaw: self.y.to_degrees(),
        }
    }

    /// Exponential step toward `target`, each axis independently
    pub fn approach(&mut self, target: Rotation, alpha: f64) {
        self.x += (target.x - self.x) * alpha;
        self.y += (target.y - self.y) * alpha;
        self.z += (target.z - self.z) * alpha;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeState {
    pub target: Rotation,
    pub current: Rotation,
    pub animating: bool,
}
