
use crate::countdown::Countdown;
use crate::events::{EventBus, MotioncastEvent};
use crate::permission::{PermissionDecision, PermissionGate};
use crate::scheduler::CadenceScheduler;
use crate::sensors::SensorListener;
use crate::snapshot::SharedSnapshot;
use crate::transport::envelope::{ControlAction, OutboundMessage, SampleMode};
use crate::transport::TransportSession;
use crate::view::{CueSink, ToneSpec};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Capture modes of the top-level state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    Idle,
    Streaming,
    CountdownPending,
    Recording,
}

/// Which session flavor a toggle requests. Only consulted when leaving Idle;
/// a toggle in any active mode ends that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Stream,
    Record,
}

/// Tunables the controller takes from configuration.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub cadence_interval: Duration,
    pub countdown_seconds: u32,
    pub cue_volume: f32,
}

struct ControllerParts {
    mode: CaptureMode,
    listener: SensorListener,
    scheduler: CadenceScheduler,
    countdown: Countdown,
}

struct ControllerShared {
    parts: Mutex<ControllerParts>,
    /// Critical-section guard: set for the whole duration of a toggle,
    /// including the asynchronous permission request.
    toggle_in_flight: AtomicBool,
    transport: TransportSession,
    permissions: PermissionGate,
    model: SharedSnapshot,
    events: EventBus,
    cue: Arc<dyn CueSink>,
    settings: ControllerSettings,
}

/// Top-level state machine composing permission, sensors, transport, cadence
/// and countdown per user intent.
///
/// Invariants: the sensor listener is subscribed iff the mode is Streaming or
/// Recording; the cadence scheduler is armed iff the mode is Streaming or
/// Recording; the countdown is active iff the mode is CountdownPending.
#[derive(Clone)]
pub struct CaptureController {
    shared: Arc<ControllerShared>,
}

impl CaptureController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: TransportSession,
        permissions: PermissionGate,
        listener: SensorListener,
        model: SharedSnapshot,
        events: EventBus,
        cue: Arc<dyn CueSink>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            shared: Arc::new(ControllerShared {
                parts: Mutex::new(ControllerParts {
                    mode: CaptureMode::Idle,
                    listener,
                    scheduler: CadenceScheduler::new(),
                    countdown: Countdown::new(),
                }),
                toggle_in_flight: AtomicBool::new(false),
                transport,
                permissions,
                model,
                events,
                cue,
                settings,
            }),
        }
    }

    pub async fn mode(&self) -> CaptureMode {
        self.shared.parts.lock().await.mode
    }

    pub async fn is_listening(&self) -> bool {
        self.shared.parts.lock().await.listener.is_subscribed()
    }

    /// Process a single toggle intent. A toggle arriving while another is
    /// mid-flight is rejected as a no-op.
    pub async fn toggle(&self, kind: SessionKind) {
        if self.shared.toggle_in_flight.swap(true, Ordering::SeqCst) {
            debug!("Toggle ignored: previous toggle still in flight");
            return;
        }

        {
            let mut parts = self.shared.parts.lock().await;
            match parts.mode {
                CaptureMode::Idle => match kind {
                    SessionKind::Stream => self.enter_streaming(&mut parts).await,
                    SessionKind::Record => self.enter_countdown(&mut parts),
                },
                CaptureMode::Streaming => self.leave_streaming(&mut parts),
                CaptureMode::CountdownPending => self.cancel_countdown(&mut parts),
                CaptureMode::Recording => self.leave_recording(&mut parts),
            }
        }

        self.shared.toggle_in_flight.store(false, Ordering::SeqCst);
    }

    async fn enter_streaming(&self, parts: &mut ControllerParts) {
        match self.shared.permissions.request().await {
            PermissionDecision::Granted => {}
            PermissionDecision::Denied { reason } => {
                warn!("Cannot start streaming: {}", reason);
                let _ = self
                    .shared
                    .events
                    .publish(MotioncastEvent::PermissionDenied { reason });
                return;
            }
        }

        if let Err(e) = parts.listener.start().await {
            warn!("Cannot start streaming: {}", e);
            return;
        }

        // streaming entry is allowed to initiate the connection
        self.shared.transport.set_intent(true);
        if !self.shared.transport.is_connected() {
            self.shared.transport.connect();
        }
        self.shared.transport.send(&OutboundMessage::ping());

        self.arm_sampler(parts, SampleMode::Stream);
        self.set_mode(parts, CaptureMode::Streaming);
    }

    fn leave_streaming(&self, parts: &mut ControllerParts) {
        parts.scheduler.disarm();
        parts.listener.stop();
        // deliberate stop: the socket stays open, but a later close finds the
        // intent idle and schedules nothing
        self.shared.transport.set_intent(false);
        self.set_mode(parts, CaptureMode::Idle);
    }

    fn enter_countdown(&self, parts: &mut ControllerParts) {
        // record mode never initiates its own connection
        if !self.shared.transport.is_connected() {
            warn!("Cannot start recording: collector not connected");
            let _ = self.shared.events.publish(MotioncastEvent::SendDropped {
                reason: "record refused: not connected".to_string(),
            });
            return;
        }

        self.shared.transport.set_intent(true);
        // the bracket opens strictly before the first tick
        self.shared
            .transport
            .send(&OutboundMessage::control(ControlAction::GestureStart));
        self.set_mode(parts, CaptureMode::CountdownPending);

        let events = self.shared.events.clone();
        let cue = Arc::clone(&self.shared.cue);
        let volume = self.shared.settings.cue_volume;
        let controller = self.clone();
        parts.countdown.start(
            self.shared.settings.countdown_seconds,
            move |tick| {
                cue.play(volume, &ToneSpec::for_tick(tick));
                let _ = events.publish(MotioncastEvent::CountdownTick { tick });
            },
            move || {
                tokio::spawn(async move { controller.finish_countdown().await });
            },
        );
    }

    /// Countdown completion: open the recording window.
    async fn finish_countdown(&self) {
        let mut parts = self.shared.parts.lock().await;
        if parts.mode != CaptureMode::CountdownPending {
            debug!("Stale countdown completion ignored");
            return;
        }

        if !self.shared.transport.is_connected() {
            self.shared.transport.connect();
        }

        if let Err(e) = parts.listener.start().await {
            // a refusal discovered after the countdown: close the bracket
            warn!("Recording aborted: {}", e);
            self.shared
                .transport
                .send(&OutboundMessage::control(ControlAction::GestureEnd));
            self.shared.transport.set_intent(false);
            self.set_mode(&mut parts, CaptureMode::Idle);
            return;
        }

        self.arm_sampler(&mut parts, SampleMode::Record);
        self.set_mode(&mut parts, CaptureMode::Recording);
    }

    /// Leaving CountdownPending early: clear every pending tick and close the
    /// bracket before returning to Idle.
    fn cancel_countdown(&self, parts: &mut ControllerParts) {
        parts.countdown.cancel();
        self.shared
            .transport
            .send(&OutboundMessage::control(ControlAction::GestureEnd));
        self.shared.transport.set_intent(false);
        self.set_mode(parts, CaptureMode::Idle);
    }

    fn leave_recording(&self, parts: &mut ControllerParts) {
        self.shared
            .transport
            .send(&OutboundMessage::control(ControlAction::GestureEnd));
        parts.scheduler.disarm();
        parts.listener.stop();
        self.shared.transport.set_intent(false);
        self.set_mode(parts, CaptureMode::Idle);
    }

    fn arm_sampler(&self, parts: &mut ControllerParts, mode: SampleMode) {
        let transport = self.shared.transport.clone();
        let model = Arc::clone(&self.shared.model);
        parts
            .scheduler
            .arm(self.shared.settings.cadence_interval, move || {
                // field-consistent copy taken at send time
                let data = model.read().clone();
                transport.send(&OutboundMessage::sample(mode, data));
            });
    }

    fn set_mode(&self, parts: &mut ControllerParts, mode: CaptureMode) {
        parts.mode = mode;
        let _ = self
            .shared
            .events
            .publish(MotioncastEvent::ModeChanged { mode });
    }
}
