use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Round to three decimal places, mapping absent or non-finite input to `None`.
///
/// Idempotent: rounding an already-rounded value is a no-op.
pub fn round3(value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some((v * 1000.0).round() / 1000.0),
        _ => None,
    }
}

/// Where the magnetic heading was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingSource {
    /// Platform-native compass heading field.
    Webkit,
    /// Absolute alpha angle fallback.
    Alpha,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelAxes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GyroAxes {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagReading {
    pub heading: Option<f64>,
    pub source: Option<HeadingSource>,
}

/// Latest rounded reading of all tracked sensor axes plus a timestamp.
///
/// One long-lived instance per session, overwritten field-by-field by the most
/// recent hardware event of each kind. Every numeric field is either a finite
/// number rounded to three decimal places or `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub accel: AccelAxes,
    pub gyro: GyroAxes,
    pub mag: MagReading,
    pub ts: Option<i64>,
}

/// Raw motion event as delivered by a sensor source. Values may be absent or
/// non-finite; the snapshot transforms sanitize them.
#[derive(Debug, Clone, Default)]
pub struct MotionSample {
    pub accel_x: Option<f64>,
    pub accel_y: Option<f64>,
    pub accel_z: Option<f64>,
    pub rate_alpha: Option<f64>,
    pub rate_beta: Option<f64>,
    pub rate_gamma: Option<f64>,
}

/// Raw orientation event as delivered by a sensor source.
#[derive(Debug, Clone, Default)]
pub struct OrientationSample {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    /// Platform-native compass heading, when the platform provides one.
    pub compass_heading: Option<f64>,
    /// Whether the angles are absolute (earth-referenced) rather than relative.
    pub absolute: bool,
}

impl SensorSnapshot {
    /// Overwrite the acceleration and rotation-rate axes from a motion event.
    pub fn apply_motion(&mut self, sample: &MotionSample, ts_millis: i64) {
        self.accel.x = round3(sample.accel_x);
        self.accel.y = round3(sample.accel_y);
        self.accel.z = round3(sample.accel_z);

        self.gyro.alpha = round3(sample.rate_alpha);
        self.gyro.beta = round3(sample.rate_beta);
        self.gyro.gamma = round3(sample.rate_gamma);

        self.ts = Some(ts_millis);
    }

    /// Overwrite the magnetic heading from an orientation event.
    ///
    /// Selection rule: prefer the platform compass heading when present and
    /// numeric; otherwise fall back to the alpha angle only when the event is
    /// marked absolute; otherwise heading and source are both cleared.
    pub fn apply_orientation(&mut self, sample: &OrientationSample, ts_millis: i64) {
        if sample.compass_heading.map_or(false, |h| !h.is_nan()) {
            self.mag.heading = round3(sample.compass_heading);
            self.mag.source = Some(HeadingSource::Webkit);
        } else if sample.absolute && sample.alpha.is_some() {
            self.mag.heading = round3(sample.alpha);
            self.mag.source = Some(HeadingSource::Alpha);
        } else {
            self.mag.heading = None;
            self.mag.source = None;
        }

        self.ts = Some(ts_millis);
    }
}

/// Shared handle to the session's single snapshot instance. Written only by
/// the sensor listener task; readers take a whole-struct clone under the lock.
pub type SharedSnapshot = Arc<RwLock<SensorSnapshot>>;

/// Create the session's snapshot instance.
pub fn shared_snapshot() -> SharedSnapshot {
    Arc::new(RwLock::new(SensorSnapshot::default()))
}
