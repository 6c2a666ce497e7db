use super::{SensorEvent, SensorSource};
use crate::error::Result;
use crate::snapshot::{MotionSample, OrientationSample};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Synthetic motion/orientation source for hosts without real sensor
/// hardware: a gentle wobble on the acceleration axes while the device
/// slowly spins through the compass.
pub struct SimulatedSensorSource {
    rate_hz: u32,
}

impl SimulatedSensorSource {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.max(1),
        }
    }
}

#[async_trait]
impl SensorSource for SimulatedSensorSource {
    async fn subscribe(&self) -> Result<mpsc::Receiver<SensorEvent>> {
        let (tx, rx) = mpsc::channel(64);
        let period = Duration::from_secs_f64(1.0 / f64::from(self.rate_hz));

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            let mut phase: f64 = 0.0;

            loop {
                timer.tick().await;
                phase += period.as_secs_f64();

                let motion = MotionSample {
                    accel_x: Some(0.4 * (phase * 2.1).sin()),
                    accel_y: Some(0.4 * (phase * 1.7).cos()),
                    accel_z: Some(9.81 + 0.05 * (phase * 3.3).sin()),
                    rate_alpha: Some(12.0 * (phase * 0.9).cos()),
                    rate_beta: Some(8.0 * (phase * 1.3).sin()),
                    rate_gamma: Some(5.0 * (phase * 0.5).cos()),
                };
                if tx.send(SensorEvent::Motion(motion)).await.is_err() {
                    break;
                }

                let heading = (phase * 20.0) % 360.0;
                let orientation = OrientationSample {
                    alpha: Some(heading),
                    beta: Some(2.0 * (phase * 0.7).sin()),
                    gamma: Some(1.5 * (phase * 1.1).cos()),
                    compass_heading: Some(heading),
                    absolute: true,
                };
                if tx.send(SensorEvent::Orientation(orientation)).await.is_err() {
                    break;
                }
            }

            debug!("Simulated sensor stream closed");
        });

        Ok(rx)
    }
}
