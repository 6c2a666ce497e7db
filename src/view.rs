use crate::countdown::CountdownTick;
use tracing::{debug, info};

/// Category of a log line presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Inbound,
    Outbound,
    System,
}

/// Presentation sink for protocol traffic and system notices.
pub trait LogSink: Send + Sync {
    fn append(&self, kind: LogKind, text: &str);
}

/// Connection status indicator.
pub trait StatusView: Send + Sync {
    fn set(&self, connection_text: &str, ok: bool);
}

/// Tone descriptor handed to the audible cue collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_ms: u64,
}

impl ToneSpec {
    /// Short beep for each remaining second, longer and higher for "go".
    pub fn for_tick(tick: CountdownTick) -> Self {
        match tick {
            CountdownTick::Remaining(_) => Self {
                frequency_hz: 880.0,
                duration_ms: 120,
            },
            CountdownTick::Go => Self {
                frequency_hz: 1320.0,
                duration_ms: 350,
            },
        }
    }
}

/// Audible cue collaborator. Fire-and-forget: implementations handle their own
/// failures locally and never surface them to the caller.
pub trait CueSink: Send + Sync {
    fn play(&self, loudness: f32, tone: &ToneSpec);
}

/// Log sink writing through the tracing subscriber.
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn append(&self, kind: LogKind, text: &str) {
        match kind {
            LogKind::Inbound => info!("← {}", text),
            LogKind::Outbound => info!("→ {}", text),
            LogKind::System => info!("{}", text),
        }
    }
}

/// Status view writing through the tracing subscriber.
pub struct TracingStatusView;

impl StatusView for TracingStatusView {
    fn set(&self, connection_text: &str, ok: bool) {
        info!(
            "Connection status: {} ({})",
            connection_text,
            if ok { "ok" } else { "down" }
        );
    }
}

/// Cue sink for hosts without audio output: logs the cue and moves on.
pub struct SilentCueSink;

impl CueSink for SilentCueSink {
    fn play(&self, loudness: f32, tone: &ToneSpec) {
        debug!(
            "Cue: {:.0} Hz for {} ms at loudness {:.2}",
            tone.frequency_hz, tone.duration_ms, loudness
        );
    }
}
