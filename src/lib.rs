pub mod app;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod events;
pub mod permission;
pub mod scheduler;
pub mod sensors;
pub mod snapshot;
pub mod transport;
pub mod view;

#[cfg(feature = "console")]
pub mod keyboard_input;

pub use app::MotioncastApp;
pub use crate::config::MotioncastConfig;
pub use controller::{CaptureController, CaptureMode, ControllerSettings, SessionKind};
pub use countdown::{Countdown, CountdownTick};
pub use error::{MotioncastError, Result};
pub use events::{EventBus, MotioncastEvent};
pub use permission::{
    AutoGrantPrompt, CapabilityPrompt, PermissionDecision, PermissionGate, SensorCapability,
};
pub use scheduler::CadenceScheduler;
pub use sensors::mock::SimulatedSensorSource;
pub use sensors::{SensorEvent, SensorListener, SensorSource};
pub use snapshot::{
    round3, shared_snapshot, HeadingSource, MotionSample, OrientationSample, SensorSnapshot,
    SharedSnapshot,
};
pub use transport::envelope::{ControlAction, OutboundMessage, SampleMode};
pub use transport::{ConnectionState, TransportSession};
pub use view::{
    CueSink, LogKind, LogSink, SilentCueSink, StatusView, ToneSpec, TracingLogSink,
    TracingStatusView,
};

#[cfg(feature = "console")]
pub use keyboard_input::KeyboardControl;
