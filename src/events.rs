use crate::controller::{CaptureMode, SessionKind};
use crate::countdown::CountdownTick;
use crate::error::EventBusError;
use crate::transport::ConnectionState;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Observations and intents flowing between the capture components and the
/// presentation collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MotioncastEvent {
    /// Transport connection state transition
    ConnectionStateChanged {
        state: ConnectionState,
        detail: String,
    },
    /// Opaque text frame received from the collector
    MessageReceived { text: String },
    /// Outbound frame handed to the socket writer
    MessageSent { summary: String },
    /// Outbound message dropped before transmission
    SendDropped { reason: String },
    /// Sensor permission refused
    PermissionDenied { reason: String },
    /// Capture mode transition
    ModeChanged { mode: CaptureMode },
    /// Countdown tick fired
    CountdownTick { tick: CountdownTick },
    /// User toggle intent from the control surface
    ToggleRequested { kind: SessionKind },
    /// Manual liveness probe requested
    PingRequested,
    /// System shutdown requested
    ShutdownRequested { reason: String },
}

impl MotioncastEvent {
    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            MotioncastEvent::ConnectionStateChanged { .. } => "connection_state_changed",
            MotioncastEvent::MessageReceived { .. } => "message_received",
            MotioncastEvent::MessageSent { .. } => "message_sent",
            MotioncastEvent::SendDropped { .. } => "send_dropped",
            MotioncastEvent::PermissionDenied { .. } => "permission_denied",
            MotioncastEvent::ModeChanged { .. } => "mode_changed",
            MotioncastEvent::CountdownTick { .. } => "countdown_tick",
            MotioncastEvent::ToggleRequested { .. } => "toggle_requested",
            MotioncastEvent::PingRequested => "ping_requested",
            MotioncastEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            MotioncastEvent::ConnectionStateChanged { state, detail } => {
                format!("Connection {:?}: {}", state, detail)
            }
            MotioncastEvent::MessageReceived { text } => format!("← {}", text),
            MotioncastEvent::MessageSent { summary } => format!("→ {}", summary),
            MotioncastEvent::SendDropped { reason } => format!("Message dropped: {}", reason),
            MotioncastEvent::PermissionDenied { reason } => {
                format!("Sensor permission denied: {}", reason)
            }
            MotioncastEvent::ModeChanged { mode } => format!("Capture mode: {:?}", mode),
            MotioncastEvent::CountdownTick { tick } => match tick {
                CountdownTick::Remaining(n) => format!("Countdown: {}", n),
                CountdownTick::Go => "Countdown: go".to_string(),
            },
            MotioncastEvent::ToggleRequested { kind } => format!("Toggle requested: {:?}", kind),
            MotioncastEvent::PingRequested => "Ping requested".to_string(),
            MotioncastEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }
}

/// Event bus for component coordination using broadcast channels.
///
/// Publishing is synchronous so that timer ticks and the transport send path
/// can emit observations without an await point.
pub struct EventBus {
    sender: broadcast::Sender<MotioncastEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<MotioncastEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: MotioncastEvent) -> Result<usize, EventBusError> {
        match &event {
            MotioncastEvent::ConnectionStateChanged { state, detail } => {
                info!("Connection {:?}: {}", state, detail);
            }
            MotioncastEvent::PermissionDenied { reason } => {
                warn!("Sensor permission denied: {}", reason);
            }
            MotioncastEvent::ShutdownRequested { reason } => {
                info!("Shutdown requested: {}", reason);
            }
            other => {
                debug!("Event: {}", other.description());
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let subscriber_count = event_bus
            .publish(MotioncastEvent::MessageReceived {
                text: "pong".to_string(),
            })
            .unwrap();
        assert_eq!(subscriber_count, 1);

        let received = receiver.recv().await.unwrap();
        match received {
            MotioncastEvent::MessageReceived { text } => assert_eq!(text, "pong"),
            _ => panic!("Unexpected event type"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish(MotioncastEvent::PingRequested).unwrap();

        let _ = timeout(Duration::from_millis(100), receiver1.recv())
            .await
            .unwrap()
            .unwrap();
        let _ = timeout(Duration::from_millis(100), receiver2.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_publish_without_subscribers_is_an_error() {
        let event_bus = EventBus::new(10);
        assert!(event_bus.publish(MotioncastEvent::PingRequested).is_err());
        assert!(!event_bus.has_subscribers());
    }

    #[test]
    fn test_event_properties() {
        let event = MotioncastEvent::SendDropped {
            reason: "not connected".to_string(),
        };
        assert_eq!(event.event_type(), "send_dropped");
        assert!(event.description().contains("not connected"));
    }
}
