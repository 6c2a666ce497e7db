use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MotioncastConfig {
    pub collector: CollectorConfig,
    pub cadence: CadenceConfig,
    pub countdown: CountdownConfig,
    pub sensors: SensorConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollectorConfig {
    /// Collector host (host or host:port)
    #[serde(default = "default_collector_host")]
    pub host: String,

    /// Use the secure socket scheme (wss), mirroring a secure deployment
    #[serde(default = "default_collector_secure")]
    pub secure: bool,

    /// Well-known WebSocket path on the collector
    #[serde(default = "default_collector_path")]
    pub path: String,

    /// Delay before the single reconnect attempt scheduled after an
    /// unexpected close, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl CollectorConfig {
    /// Socket endpoint derived from the configured scheme/host and path.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, self.path)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CadenceConfig {
    /// Snapshot emission interval in milliseconds (100 ms = 10 Hz)
    #[serde(default = "default_cadence_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CountdownConfig {
    /// Seconds counted down before a gesture recording window opens
    #[serde(default = "default_countdown_seconds")]
    pub duration_seconds: u32,

    /// Loudness handed to the audible cue collaborator (0.0 - 1.0)
    #[serde(default = "default_cue_volume")]
    pub cue_volume: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SensorConfig {
    /// Event rate of the simulated sensor source, in Hz
    #[serde(default = "default_simulated_rate_hz")]
    pub simulated_rate_hz: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl MotioncastConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("motioncast.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("collector.host", default_collector_host())?
            .set_default("collector.secure", default_collector_secure())?
            .set_default("collector.path", default_collector_path())?
            .set_default(
                "collector.reconnect_delay_ms",
                default_reconnect_delay_ms() as i64,
            )?
            .set_default("cadence.interval_ms", default_cadence_interval_ms() as i64)?
            .set_default(
                "countdown.duration_seconds",
                default_countdown_seconds() as i64,
            )?
            .set_default("countdown.cue_volume", default_cue_volume() as f64)?
            .set_default(
                "sensors.simulated_rate_hz",
                default_simulated_rate_hz() as i64,
            )?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with MOTIONCAST_ prefix
            .add_source(Environment::with_prefix("MOTIONCAST").separator("_"))
            .build()?;

        let config: MotioncastConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector.host.is_empty() {
            return Err(ConfigError::Message(
                "Collector host must not be empty".to_string(),
            ));
        }

        if !self.collector.path.starts_with('/') {
            return Err(ConfigError::Message(
                "Collector path must start with '/'".to_string(),
            ));
        }

        if self.cadence.interval_ms == 0 {
            return Err(ConfigError::Message(
                "Cadence interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.countdown.duration_seconds == 0 {
            return Err(ConfigError::Message(
                "Countdown duration_seconds must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.countdown.cue_volume) {
            return Err(ConfigError::Message(
                "Countdown cue_volume must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.sensors.simulated_rate_hz == 0 {
            return Err(ConfigError::Message(
                "Sensor simulated_rate_hz must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for MotioncastConfig {
    fn default() -> Self {
        Self {
            collector: CollectorConfig {
                host: default_collector_host(),
                secure: default_collector_secure(),
                path: default_collector_path(),
                reconnect_delay_ms: default_reconnect_delay_ms(),
            },
            cadence: CadenceConfig {
                interval_ms: default_cadence_interval_ms(),
            },
            countdown: CountdownConfig {
                duration_seconds: default_countdown_seconds(),
                cue_volume: default_cue_volume(),
            },
            sensors: SensorConfig {
                simulated_rate_hz: default_simulated_rate_hz(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_collector_host() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_collector_secure() -> bool {
    false
}
fn default_collector_path() -> String {
    "/ws".to_string()
}
fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_cadence_interval_ms() -> u64 {
    100
} // 10 Hz

fn default_countdown_seconds() -> u32 {
    3
}
fn default_cue_volume() -> f32 {
    0.6
}

fn default_simulated_rate_hz() -> u32 {
    60
}

fn default_event_bus_capacity() -> usize {
    100
}
