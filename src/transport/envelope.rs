use crate::snapshot::SensorSnapshot;
use serde::{Deserialize, Serialize};

/// Mode tag attached to periodic samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    Stream,
    Record,
}

impl SampleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleMode::Stream => "stream",
            SampleMode::Record => "record",
        }
    }
}

/// Recording window bracketing actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    GestureStart,
    GestureEnd,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::GestureStart => "gesture_start",
            ControlAction::GestureEnd => "gesture_end",
        }
    }
}

/// Outbound JSON envelope, transmitted as a UTF-8 text frame. Constructed on
/// demand, never retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Liveness probe: `{"type":"message","message":"ping"}`
    #[serde(rename = "message")]
    Ping { message: String },
    /// Periodic sensor sample
    #[serde(rename = "sensorSnapshot")]
    SensorSample {
        mode: SampleMode,
        data: SensorSnapshot,
    },
    /// Recording window bracketing
    #[serde(rename = "control")]
    Control { action: ControlAction },
}

impl OutboundMessage {
    pub fn ping() -> Self {
        Self::Ping {
            message: "ping".to_string(),
        }
    }

    pub fn sample(mode: SampleMode, data: SensorSnapshot) -> Self {
        Self::SensorSample { mode, data }
    }

    pub fn control(action: ControlAction) -> Self {
        Self::Control { action }
    }

    /// Short human-readable tag for log lines.
    pub fn summary(&self) -> String {
        match self {
            OutboundMessage::Ping { .. } => "ping".to_string(),
            OutboundMessage::SensorSample { mode, .. } => {
                format!("sensorSnapshot ({})", mode.as_str())
            }
            OutboundMessage::Control { action } => format!("control {}", action.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_wire_shape() {
        let json = serde_json::to_string(&OutboundMessage::ping()).unwrap();
        assert_eq!(json, r#"{"type":"message","message":"ping"}"#);
    }

    #[test]
    fn test_control_wire_shape() {
        let start = serde_json::to_string(&OutboundMessage::control(ControlAction::GestureStart))
            .unwrap();
        assert_eq!(start, r#"{"type":"control","action":"gesture_start"}"#);

        let end =
            serde_json::to_string(&OutboundMessage::control(ControlAction::GestureEnd)).unwrap();
        assert_eq!(end, r#"{"type":"control","action":"gesture_end"}"#);
    }

    #[test]
    fn test_sample_wire_shape() {
        let message = OutboundMessage::sample(SampleMode::Record, SensorSnapshot::default());
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.starts_with(r#"{"type":"sensorSnapshot","mode":"record","data":{"accel""#));
    }

    #[test]
    fn test_summaries() {
        assert_eq!(OutboundMessage::ping().summary(), "ping");
        assert_eq!(
            OutboundMessage::sample(SampleMode::Stream, SensorSnapshot::default()).summary(),
            "sensorSnapshot (stream)"
        );
        assert_eq!(
            OutboundMessage::control(ControlAction::GestureEnd).summary(),
            "control gesture_end"
        );
    }
}
