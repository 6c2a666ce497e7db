pub mod mock;


use crate::error::Result;
use crate::snapshot::{MotionSample, OrientationSample, SharedSnapshot};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Raw event from one of the two hardware sources.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    Motion(MotionSample),
    Orientation(OrientationSample),
}

/// Provider of raw motion/orientation events.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Open the event stream. The subscription ends when the receiver is
    /// dropped.
    async fn subscribe(&self) -> Result<mpsc::Receiver<SensorEvent>>;
}

/// Subscribes/unsubscribes the raw event callbacks, writing each event into
/// the shared snapshot via the pure transforms.
///
/// Callers must not start a running listener again without an intervening
/// `stop()`; the capture mode invariant enforces this.
pub struct SensorListener {
    source: Arc<dyn SensorSource>,
    model: SharedSnapshot,
    task: Option<JoinHandle<()>>,
}

impl SensorListener {
    pub fn new(source: Arc<dyn SensorSource>, model: SharedSnapshot) -> Self {
        Self {
            source,
            model,
            task: None,
        }
    }

    /// Subscribe to the raw event sources and start updating the snapshot.
    pub async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Sensor listener is already subscribed");
            return Ok(());
        }

        let mut events = self.source.subscribe().await?;
        let model = Arc::clone(&self.model);

        self.task = Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let ts_millis = Utc::now().timestamp_millis();
                let mut snapshot = model.write();
                match event {
                    SensorEvent::Motion(sample) => snapshot.apply_motion(&sample, ts_millis),
                    SensorEvent::Orientation(sample) => {
                        snapshot.apply_orientation(&sample, ts_millis)
                    }
                }
            }
            debug!("Sensor event stream ended");
        }));

        debug!("Sensor listeners subscribed");
        Ok(())
    }

    /// Unsubscribe both event sources; safe when not subscribed.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Sensor listeners unsubscribed");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for SensorListener {
    fn drop(&mut self) {
        self.stop();
    }
}
