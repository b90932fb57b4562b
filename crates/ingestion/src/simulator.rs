//! Synthetic ride generator
//!
//! Produces deterministic frame streams for tests and demos. Vibration is
//! a sum of sinusoids, so the same ride always yields the same frames.

use std::f64::consts::PI;

use contracts::{CapabilitiesReport, Frame, GpsFix, GyroRate, SensorCapability, Vector3};
use tracing::debug;

const GRAVITY: f64 = 9.81;
const METERS_PER_DEGREE: f64 = 111_320.0;

/// One stretch of a ride
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RidePhase {
    /// Road vibration at vehicle speed
    Moving { duration_sec: f64, speed_mps: f64 },
    /// Stationary, near-silent IMU
    Static { duration_sec: f64 },
    /// Gentle vibration at low speed
    SlowMoving { duration_sec: f64, speed_mps: f64 },
    /// Strong gait periodicity at walking pace
    Walking { duration_sec: f64, speed_mps: f64 },
}

impl RidePhase {
    pub fn duration_sec(&self) -> f64 {
        match *self {
            RidePhase::Moving { duration_sec, .. }
            | RidePhase::Static { duration_sec }
            | RidePhase::SlowMoving { duration_sec, .. }
            | RidePhase::Walking { duration_sec, .. } => duration_sec,
        }
    }

    pub fn speed_mps(&self) -> f64 {
        match *self {
            RidePhase::Static { .. } => 0.0,
            RidePhase::Moving { speed_mps, .. }
            | RidePhase::SlowMoving { speed_mps, .. }
            | RidePhase::Walking { speed_mps, .. } => speed_mps,
        }
    }

    /// Linear acceleration and angular rate at `t` seconds
    fn vibration(&self, t: f64) -> (Vector3, GyroRate) {
        let wave = |amp: f64, hz: f64, phase: f64| amp * (2.0 * PI * hz * t + phase).sin();
        match self {
            RidePhase::Moving { .. } => (
                Vector3::new(
                    wave(0.3, 3.1, 0.0),
                    wave(0.2, 5.3, 1.0),
                    wave(0.15, 1.7, 2.0),
                ),
                GyroRate::new(wave(0.1, 0.9, 0.0), wave(0.05, 2.3, 0.5), wave(0.08, 0.4, 1.0)),
            ),
            RidePhase::Static { .. } => (
                Vector3::new(wave(0.02, 7.0, 0.0), wave(0.01, 11.0, 1.0), 0.0),
                GyroRate::new(wave(0.005, 3.0, 0.0), 0.0, 0.0),
            ),
            RidePhase::SlowMoving { .. } => (
                Vector3::new(wave(0.2, 2.1, 0.0), wave(0.1, 3.7, 1.0), wave(0.08, 1.3, 2.0)),
                GyroRate::new(wave(0.05, 0.7, 0.0), wave(0.03, 1.9, 0.5), 0.0),
            ),
            RidePhase::Walking { .. } => (
                Vector3::new(wave(1.5, 2.0, 0.0), wave(0.8, 1.0, 1.0), wave(2.5, 2.0, 0.3)),
                GyroRate::new(wave(1.0, 1.0, 0.0), wave(0.6, 2.0, 0.5), wave(0.4, 1.0, 1.0)),
            ),
        }
    }
}

/// Short acceleration burst added on the x axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spike {
    /// Seconds since ride start
    pub at_sec: f64,
    /// Added acceleration (m/s²)
    pub magnitude: f64,
    /// Consecutive frames affected
    pub samples: usize,
}

/// Simulator settings
#[derive(Debug, Clone, PartialEq)]
pub struct RideSimulatorConfig {
    pub imu_hz: f64,
    pub gps_hz: f64,
    pub start_timestamp_ms: i64,
    pub gps_accuracy_m: f64,
    pub origin_latitude: f64,
    pub origin_longitude: f64,
}

impl Default for RideSimulatorConfig {
    fn default() -> Self {
        Self {
            imu_hz: 25.0,
            gps_hz: 1.0,
            start_timestamp_ms: 1_700_000_000_000,
            gps_accuracy_m: 5.0,
            origin_latitude: 48.137,
            origin_longitude: 11.575,
        }
    }
}

/// Deterministic synthetic ride
#[derive(Debug, Clone, PartialEq)]
pub struct RideSimulator {
    config: RideSimulatorConfig,
    phases: Vec<RidePhase>,
    spikes: Vec<Spike>,
}

impl RideSimulator {
    pub fn new(config: RideSimulatorConfig) -> Self {
        Self {
            config,
            phases: Vec::new(),
            spikes: Vec::new(),
        }
    }

    /// 300 s at 25 Hz: moving, static, slow, then moving with two impacts
    pub fn reference_ride() -> Self {
        Self::new(RideSimulatorConfig::default())
            .phase(RidePhase::Moving {
                duration_sec: 60.0,
                speed_mps: 10.0,
            })
            .phase(RidePhase::Static { duration_sec: 60.0 })
            .phase(RidePhase::SlowMoving {
                duration_sec: 60.0,
                speed_mps: 1.5,
            })
            .phase(RidePhase::Moving {
                duration_sec: 120.0,
                speed_mps: 10.0,
            })
            .spike(Spike {
                at_sec: 222.0,
                magnitude: 15.0,
                samples: 2,
            })
            .spike(Spike {
                at_sec: 262.0,
                magnitude: 15.0,
                samples: 2,
            })
    }

    pub fn phase(mut self, phase: RidePhase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn spike(mut self, spike: Spike) -> Self {
        self.spikes.push(spike);
        self
    }

    pub fn config(&self) -> &RideSimulatorConfig {
        &self.config
    }

    pub fn phases(&self) -> &[RidePhase] {
        &self.phases
    }

    pub fn duration_sec(&self) -> f64 {
        self.phases.iter().map(RidePhase::duration_sec).sum()
    }

    /// Capabilities a device recording this ride would report
    pub fn capabilities(&self) -> CapabilitiesReport {
        let usable = SensorCapability {
            supported: true,
            observed: true,
        };
        CapabilitiesReport {
            motion: usable,
            gps: usable,
            expected_imu_hz: Some(self.config.imu_hz),
        }
    }

    fn phase_at(&self, t: f64) -> Option<&RidePhase> {
        let mut end = 0.0;
        for phase in &self.phases {
            end += phase.duration_sec();
            if t < end {
                return Some(phase);
            }
        }
        None
    }

    /// Extra x acceleration at frame `index`
    fn spike_at(&self, index: usize) -> f64 {
        self.spikes
            .iter()
            .filter(|s| {
                let first = (s.at_sec * self.config.imu_hz).round() as usize;
                index >= first && index < first + s.samples
            })
            .map(|s| s.magnitude)
            .sum()
    }

    /// Generate every frame; each carries the latest GPS fix
    pub fn generate(&self) -> Vec<Frame> {
        let cfg = &self.config;
        if cfg.imu_hz <= 0.0 {
            return Vec::new();
        }
        let dt_ms = (1000.0 / cfg.imu_hz).round() as i64;
        let gps_period_ms = if cfg.gps_hz > 0.0 {
            Some((1000.0 / cfg.gps_hz).round() as i64)
        } else {
            None
        };

        let mut frames = Vec::new();
        let mut distance_m = 0.0;
        let mut fix: Option<GpsFix> = None;

        for index in 0.. {
            let offset_ms = index as i64 * dt_ms;
            let t = offset_ms as f64 / 1000.0;
            let Some(phase) = self.phase_at(t) else {
                break;
            };
            let speed = phase.speed_mps();

            if let Some(period) = gps_period_ms {
                let fix_offset = offset_ms / period * period;
                if fix.is_none_or(|f| f.timestamp != cfg.start_timestamp_ms + fix_offset) {
                    fix = Some(GpsFix {
                        latitude: cfg.origin_latitude + distance_m / METERS_PER_DEGREE,
                        longitude: cfg.origin_longitude,
                        accuracy: cfg.gps_accuracy_m,
                        speed: Some(speed),
                        heading: (speed > 0.0).then_some(0.0),
                        timestamp: cfg.start_timestamp_ms + fix_offset,
                    });
                }
            }

            let (mut lin_acc, gyro) = phase.vibration(t);
            lin_acc.x += self.spike_at(index);
            let acc_g = Vector3::new(lin_acc.x, lin_acc.y, lin_acc.z + GRAVITY);

            let mut frame = Frame::new(cfg.start_timestamp_ms + offset_ms, acc_g)
                .with_lin_acc(lin_acc)
                .with_gyro(gyro);
            frame.gps = fix;
            frames.push(frame);

            distance_m += speed * dt_ms as f64 / 1000.0;
        }

        debug!(
            frames = frames.len(),
            duration_sec = self.duration_sec(),
            spikes = self.spikes.len(),
            "synthetic ride generated"
        );
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_ride_shape() {
        let sim = RideSimulator::reference_ride();
        assert_eq!(sim.duration_sec(), 300.0);
        let frames = sim.generate();
        assert_eq!(frames.len(), 7500);
        assert_eq!(frames[1].timestamp - frames[0].timestamp, 40);
        assert!(frames.iter().all(|f| f.gps.is_some() && f.lin_acc.is_some()));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let sim = RideSimulator::reference_ride();
        assert_eq!(sim.generate(), sim.generate());
    }

    #[test]
    fn test_gps_fix_follows_phase_speed() {
        let frames = RideSimulator::reference_ride().generate();
        let speed_at = |sec: usize| frames[sec * 25].gps.and_then(|g| g.speed);
        assert_eq!(speed_at(10), Some(10.0));
        assert_eq!(speed_at(90), Some(0.0));
        assert_eq!(speed_at(150), Some(1.5));
        assert_eq!(speed_at(250), Some(10.0));

        let first = frames[0].gps.unwrap();
        let later = frames[30 * 25].gps.unwrap();
        assert!(later.latitude > first.latitude);
        assert_eq!(later.timestamp - first.timestamp, 30_000);
    }

    #[test]
    fn test_fix_repeats_until_next_period() {
        let frames = RideSimulator::reference_ride().generate();
        assert_eq!(frames[0].gps, frames[24].gps);
        assert_ne!(frames[24].gps, frames[25].gps);
    }

    #[test]
    fn test_spikes_land_on_expected_frames() {
        let frames = RideSimulator::reference_ride().generate();
        let idx = 222 * 25;
        assert!(frames[idx].lin_acc.unwrap().x > 14.0);
        assert!(frames[idx + 1].lin_acc.unwrap().x > 14.0);
        assert!(frames[idx + 2].lin_acc.unwrap().x < 1.0);
        assert!(frames[idx - 1].lin_acc.unwrap().x < 1.0);
    }

    #[test]
    fn test_empty_simulator_generates_nothing() {
        let sim = RideSimulator::new(RideSimulatorConfig::default());
        assert!(sim.generate().is_empty());
        assert_eq!(sim.capabilities().expected_imu_hz, Some(25.0));
    }
}
