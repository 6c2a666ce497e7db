use crate::config::MotioncastConfig;
use crate::controller::{CaptureController, CaptureMode, ControllerSettings, SessionKind};
use crate::error::Result;
use crate::events::{EventBus, MotioncastEvent};
use crate::permission::{AutoGrantPrompt, PermissionGate};
use crate::sensors::mock::SimulatedSensorSource;
use crate::sensors::SensorListener;
use crate::snapshot::shared_snapshot;
use crate::transport::envelope::OutboundMessage;
use crate::transport::{ConnectionState, TransportSession};
use crate::view::{LogKind, LogSink, SilentCueSink, StatusView, TracingLogSink, TracingStatusView};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[cfg(feature = "console")]
use crate::keyboard_input::KeyboardControl;

/// Application coordinator: wires the capture components together, forwards
/// observations to the presentation collaborators and runs the intent loop
/// until shutdown.
pub struct MotioncastApp {
    config: MotioncastConfig,
    events: EventBus,
    transport: TransportSession,
    controller: CaptureController,
    log_sink: Arc<dyn LogSink>,
    status_view: Arc<dyn StatusView>,
    keyboard_enabled: bool,
    #[cfg(feature = "console")]
    keyboard: Option<KeyboardControl>,
}

impl MotioncastApp {
    pub fn new(config: MotioncastConfig) -> Self {
        let events = EventBus::new(config.system.event_bus_capacity);

        let transport = TransportSession::new(
            config.collector.endpoint_url(),
            Duration::from_millis(config.collector.reconnect_delay_ms),
            events.clone(),
        );

        let model = shared_snapshot();
        let source = Arc::new(SimulatedSensorSource::new(config.sensors.simulated_rate_hz));
        let listener = SensorListener::new(source, Arc::clone(&model));

        let controller = CaptureController::new(
            transport.clone(),
            PermissionGate::new(Arc::new(AutoGrantPrompt)),
            listener,
            model,
            events.clone(),
            Arc::new(SilentCueSink),
            ControllerSettings {
                cadence_interval: Duration::from_millis(config.cadence.interval_ms),
                countdown_seconds: config.countdown.duration_seconds,
                cue_volume: config.countdown.cue_volume,
            },
        );

        #[cfg(feature = "console")]
        let keyboard = Some(KeyboardControl::new(events.clone()));

        Self {
            config,
            events,
            transport,
            controller,
            log_sink: Arc::new(TracingLogSink),
            status_view: Arc::new(TracingStatusView),
            keyboard_enabled: true,
            #[cfg(feature = "console")]
            keyboard,
        }
    }

    /// Enable or disable the terminal keyboard control.
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    pub fn transport(&self) -> &TransportSession {
        &self.transport
    }

    /// Run until a shutdown request or signal arrives.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Motioncast client starting; collector {}",
            self.config.collector.endpoint_url()
        );

        let mut events = self.events.subscribe();

        // the transport opens at startup, before any toggle
        self.transport.connect();

        #[cfg(feature = "console")]
        if self.keyboard_enabled {
            if let Some(keyboard) = &self.keyboard {
                keyboard.start();
            }
        }

        self.spawn_signal_handlers();

        loop {
            match events.recv().await {
                Ok(event) => {
                    if self.handle_event(event).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event loop lagged behind by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Dispatch one event; returns true when the app should exit.
    async fn handle_event(&self, event: MotioncastEvent) -> bool {
        match event {
            MotioncastEvent::ToggleRequested { kind } => {
                // spawned so that a second key press mid-toggle reaches the
                // controller's re-entrancy guard instead of queueing
                let controller = self.controller.clone();
                tokio::spawn(async move { controller.toggle(kind).await });
            }
            MotioncastEvent::PingRequested => {
                self.transport.send(&OutboundMessage::ping());
            }
            MotioncastEvent::ShutdownRequested { .. } => return true,
            MotioncastEvent::ConnectionStateChanged { state, detail } => {
                self.status_view
                    .set(&detail, state == ConnectionState::Connected);
            }
            MotioncastEvent::MessageReceived { text } => {
                self.log_sink.append(LogKind::Inbound, &text);
            }
            MotioncastEvent::MessageSent { summary } => {
                self.log_sink.append(LogKind::Outbound, &summary);
            }
            MotioncastEvent::SendDropped { reason } => {
                self.log_sink
                    .append(LogKind::System, &format!("Message dropped: {}", reason));
            }
            MotioncastEvent::PermissionDenied { reason } => {
                self.log_sink.append(
                    LogKind::System,
                    &format!("Cannot start capture: {}", reason),
                );
            }
            MotioncastEvent::ModeChanged { mode } => {
                self.log_sink
                    .append(LogKind::System, &format!("Capture mode: {:?}", mode));
            }
            MotioncastEvent::CountdownTick { tick } => {
                self.log_sink.append(
                    LogKind::System,
                    &MotioncastEvent::CountdownTick { tick }.description(),
                );
            }
        }
        false
    }

    fn spawn_signal_handlers(&self) {
        let events = self.events.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = events.publish(MotioncastEvent::ShutdownRequested {
                    reason: "SIGINT".to_string(),
                });
            }
        });

        #[cfg(unix)]
        {
            let events = self.events.clone();
            tokio::spawn(async move {
                let mut sigterm = match tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate(),
                ) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if sigterm.recv().await.is_some() {
                    let _ = events.publish(MotioncastEvent::ShutdownRequested {
                        reason: "SIGTERM".to_string(),
                    });
                }
            });
        }
    }

    async fn shutdown(&self) {
        info!("Motioncast client shutting down");

        // end any active capture mode so the bracket closes cleanly
        if self.controller.mode().await != CaptureMode::Idle {
            self.controller.toggle(SessionKind::Stream).await;
        }

        #[cfg(feature = "console")]
        if self.keyboard_enabled {
            if let Some(keyboard) = &self.keyboard {
                keyboard.stop().await;
            }
        }

        info!("Motioncast client shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_builds_from_default_config() {
        let app = MotioncastApp::new(MotioncastConfig::default());
        assert_eq!(app.controller().mode().await, CaptureMode::Idle);
        assert_eq!(app.transport().state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_toggle_while_countdown_pending_shuts_down_cleanly() {
        let mut app = MotioncastApp::new(MotioncastConfig::default());
        app.set_keyboard_enabled(false);
        // no collector is listening; a record toggle is refused and the
        // shutdown path has nothing to unwind
        app.controller().toggle(SessionKind::Record).await;
        assert_eq!(app.controller().mode().await, CaptureMode::Idle);
        app.shutdown().await;
    }
}
