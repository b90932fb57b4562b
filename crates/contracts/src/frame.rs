//! Frame - engine input
//!
//! One synchronized IMU sample with an optional GPS fix, plus the platform
//! capabilities report supplied by the acquisition layer.

use serde::{Deserialize, Serialize};

/// One synchronized sample.
///
/// Timestamps are epoch milliseconds. Frames are never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Epoch milliseconds, non-decreasing across a session once sorted
    pub timestamp: i64,

    /// Acceleration including gravity (m/s²)
    pub acc_g: Vector3,

    /// Acceleration excluding gravity (m/s²)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lin_acc: Option<Vector3>,

    /// Angular rate (rad/s), each axis independently nullable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gyro_rate: Option<GyroRate>,

    /// Latest GPS fix attached to this sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsFix>,
}

impl Frame {
    /// Frame carrying only gravity-inclusive acceleration.
    pub fn new(timestamp: i64, acc_g: Vector3) -> Self {
        Self {
            timestamp,
            acc_g,
            lin_acc: None,
            gyro_rate: None,
            gps: None,
        }
    }

    pub fn with_lin_acc(mut self, lin_acc: Vector3) -> Self {
        self.lin_acc = Some(lin_acc);
        self
    }

    pub fn with_gyro(mut self, gyro: GyroRate) -> Self {
        self.gyro_rate = Some(gyro);
        self
    }

    pub fn with_gps(mut self, gps: GpsFix) -> Self {
        self.gps = Some(gps);
        self
    }

    /// Whether the frame carries at least one gyro axis.
    pub fn has_gyro(&self) -> bool {
        self.gyro_rate.map(|g| g.has_any_axis()).unwrap_or(false)
    }
}

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Angular rate with nullable axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GyroRate {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl GyroRate {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    pub fn has_any_axis(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }

    /// Norm over the present axes; `None` when every axis is null.
    pub fn magnitude(&self) -> Option<f64> {
        if !self.has_any_axis() {
            return None;
        }
        let sum: f64 = [self.x, self.y, self.z]
            .iter()
            .flatten()
            .map(|v| v * v)
            .sum();
        Some(sum.sqrt())
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}

/// GPS fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Horizontal accuracy (meters)
    pub accuracy: f64,

    /// Ground speed (m/s)
    #[serde(default)]
    pub speed: Option<f64>,

    /// Heading (degrees)
    #[serde(default)]
    pub heading: Option<f64>,

    /// Fix time, epoch milliseconds
    pub timestamp: i64,
}

/// Capabilities report from the acquisition layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesReport {
    #[serde(default)]
    pub motion: SensorCapability,

    #[serde(default)]
    pub gps: SensorCapability,

    /// Sampling rate the platform was asked for, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_imu_hz: Option<f64>,
}

/// Support status of a single sensing API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorCapability {
    /// The platform exposes the API
    pub supported: bool,

    /// Data was actually observed during the probe
    pub observed: bool,
}

impl SensorCapability {
    pub fn usable(&self) -> bool {
        self.supported && self.observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_camel_case_fields() {
        let json = r#"{
            "timestamp": 1000,
            "accG": {"x": 0.0, "y": 0.0, "z": 9.81},
            "linAcc": {"x": 0.1, "y": 0.0, "z": 0.0},
            "gyroRate": {"x": 0.01, "y": null, "z": 0.02},
            "gps": {"latitude": 1.0, "longitude": 2.0, "accuracy": 5.0, "speed": null, "timestamp": 900}
        }"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, 1000);
        assert!(frame.lin_acc.is_some());
        assert_eq!(frame.gyro_rate.unwrap().y, None);
        assert_eq!(frame.gps.unwrap().speed, None);
    }

    #[test]
    fn test_optional_fields_default_to_none() {
        let json = r#"{"timestamp": 5, "accG": {"x": 1.0, "y": 2.0, "z": 2.0}}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert!(frame.lin_acc.is_none());
        assert!(frame.gyro_rate.is_none());
        assert!(frame.gps.is_none());
        assert!((frame.acc_g.magnitude() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_gyro_magnitude_partial_axes() {
        let gyro = GyroRate {
            x: Some(3.0),
            y: None,
            z: Some(4.0),
        };
        assert!((gyro.magnitude().unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(GyroRate::default().magnitude(), None);
    }
}
