use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Sensor capabilities that may require an explicit platform grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCapability {
    Motion,
    Orientation,
}

impl SensorCapability {
    pub fn label(&self) -> &'static str {
        match self {
            SensorCapability::Motion => "motion",
            SensorCapability::Orientation => "orientation",
        }
    }
}

/// Outcome of a permission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied { reason: String },
}

impl PermissionDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionDecision::Granted)
    }
}

/// Platform hook for an explicit capability-request step.
#[async_trait]
pub trait CapabilityPrompt: Send + Sync {
    async fn request_capability(&self, capability: SensorCapability) -> PermissionDecision;
}

/// Prompt for platforms without an explicit request step: grants immediately.
pub struct AutoGrantPrompt;

#[async_trait]
impl CapabilityPrompt for AutoGrantPrompt {
    async fn request_capability(&self, capability: SensorCapability) -> PermissionDecision {
        debug!("No explicit permission step for {} access", capability.label());
        PermissionDecision::Granted
    }
}

/// Requests motion and orientation access, once per session attempt.
///
/// Capabilities are requested in sequence; the first refusal aborts with its
/// reason attached. Once granted, later requests return immediately without
/// re-prompting.
pub struct PermissionGate {
    prompt: Arc<dyn CapabilityPrompt>,
    granted: Mutex<bool>,
}

impl PermissionGate {
    pub fn new(prompt: Arc<dyn CapabilityPrompt>) -> Self {
        Self {
            prompt,
            granted: Mutex::new(false),
        }
    }

    /// Request access to both sensor capabilities.
    pub async fn request(&self) -> PermissionDecision {
        let mut granted = self.granted.lock().await;
        if *granted {
            return PermissionDecision::Granted;
        }

        for capability in [SensorCapability::Motion, SensorCapability::Orientation] {
            match self.prompt.request_capability(capability).await {
                PermissionDecision::Granted => {
                    debug!("{} access granted", capability.label());
                }
                PermissionDecision::Denied { reason } => {
                    warn!("{} access denied: {}", capability.label(), reason);
                    return PermissionDecision::Denied { reason };
                }
            }
        }

        *granted = true;
        info!("Sensor permissions granted");
        PermissionDecision::Granted
    }
}
