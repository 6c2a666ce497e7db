use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotioncastError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl MotioncastError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Socket-level failures. Handled inside the transport session, which degrades
/// to "disconnected, will retry" rather than surfacing these as fatal.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connect failed: {details}")]
    Connect { details: String },

    #[error("Socket error: {details}")]
    Socket { details: String },
}

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Sensor source unavailable: {details}")]
    SourceUnavailable { details: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, MotioncastError>;
