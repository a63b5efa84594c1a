//! Capabilities the generic layer consumes from its collaborators.
//!
//! A concrete platform supplies the wake/wait primitive of the processing
//! context and may hook the system and device stages of the pipeline.
//! Device-layer subsystems (connectivity, provisioning, time sync) observe
//! every event through [`DeviceLayerComponent`]. The security subsystem
//! reports completed sessions through the callback installed with
//! [`SecurityManager::set_session_established_callback`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::PlatformError;
use crate::events::{AuthMode, Event, SessionCompletionRecord};

pub trait Platform: Send + Sync {
    /// Wakes the processing context if it is idle.
    fn notify_processing_context(&self);

    /// Blocks the processing context until notified or until `timeout`
    /// elapses.
    fn wait_for_notification(&self, timeout: Duration);

    /// Called once when the stack is initialized.
    fn init(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    /// Called once when the stack shuts down.
    fn shutdown(&self) {}

    /// First pipeline stage: system layer (I/O readiness, timers).
    fn dispatch_to_system_layer(&self, _event: &Event) {}

    /// Platform hook of the second pipeline stage, run after every
    /// registered [`DeviceLayerComponent`].
    fn dispatch_to_device_layer(&self, _event: &Event) {}
}

/// Device-layer subsystem reacting to platform events.
pub trait DeviceLayerComponent: Send + Sync {
    fn name(&self) -> &str;

    fn on_platform_event(&self, event: &Event);
}

pub type SessionEstablishedCallback = Arc<dyn Fn(SessionCompletionRecord) + Send + Sync>;

/// The security subsystem as seen by the device layer.
pub trait SecurityManager: Send + Sync {
    fn set_session_established_callback(&self, callback: SessionEstablishedCallback);

    /// Authentication mode of an established session key, if known.
    fn session_auth_mode(&self, _session_key_id: u16, _peer_node_id: u64) -> Option<AuthMode> {
        None
    }
}
