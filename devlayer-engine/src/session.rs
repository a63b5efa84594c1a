//! Adapter between the security subsystem's session-established callback
//! and the event queue.
//!
//! The bridge never dispatches directly: it posts a
//! [`Event::SessionEstablished`] like any other producer, so application
//! handlers see session notifications in queue order.

use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use devlayer_core::events::{AuthMode, Event, SessionCompletionRecord, SessionEstablished};
use devlayer_core::platform::{SecurityManager, SessionEstablishedCallback};
use devlayer_core::Result;

use crate::manager::{ManagerInner, PlatformManager};

/// Builds the session-established event for `record`.
pub fn session_established_event(record: &SessionCompletionRecord, auth_mode: AuthMode) -> Event {
    Event::SessionEstablished(SessionEstablished::new(
        record.peer_node_id,
        record.session_key_id,
        record.encryption_type,
        auth_mode,
    ))
}

/// Holds only weak references: the security manager keeps the bridge alive
/// through its callback, and the bridge must not keep the stack alive.
pub struct SessionCompletionBridge {
    manager: Weak<ManagerInner>,
    security: Weak<dyn SecurityManager>,
}

impl SessionCompletionBridge {
    pub(crate) fn new(manager: Weak<ManagerInner>, security: &Arc<dyn SecurityManager>) -> Self {
        Self {
            manager,
            security: Arc::downgrade(security),
        }
    }

    /// Translates `record` and posts it to the processing context. Once the
    /// stack is gone the record is discarded.
    pub fn on_session_established(&self, record: SessionCompletionRecord) -> Result<()> {
        let Some(inner) = self.manager.upgrade() else {
            debug!(peer_node_id = record.peer_node_id, "Stack released, dropping session notification");
            return Ok(());
        };

        let auth_mode = self
            .security
            .upgrade()
            .and_then(|security| security.session_auth_mode(record.session_key_id, record.peer_node_id))
            .unwrap_or_default();

        debug!(
            peer_node_id = record.peer_node_id,
            session_key_id = record.session_key_id,
            ?auth_mode,
            "Session established"
        );
        PlatformManager::from_inner(inner).post_event(session_established_event(&record, auth_mode))
    }

    /// Wraps the bridge in the callback shape the security subsystem expects.
    /// Posting failures are logged; the security subsystem has no way to act
    /// on them.
    pub fn into_callback(self) -> SessionEstablishedCallback {
        Arc::new(move |record: SessionCompletionRecord| {
            if let Err(err) = self.on_session_established(record) {
                warn!(peer_node_id = record.peer_node_id, "Failed to post session established event: {err}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devlayer_core::events::SecurityManagerRef;

    #[test]
    fn record_maps_onto_event_fields() {
        let record = SessionCompletionRecord {
            security_manager: SecurityManagerRef(1),
            connection: None,
            request_state: None,
            session_key_id: 0x2001,
            peer_node_id: 0x18B4_3000_0000_00AA,
            encryption_type: 1,
        };

        match session_established_event(&record, AuthMode::PasePairingCode) {
            Event::SessionEstablished(session) => {
                assert_eq!(session.peer_node_id, 0x18B4_3000_0000_00AA);
                assert_eq!(session.session_key_id, 0x2001);
                assert_eq!(session.encryption_type, 1);
                assert_eq!(session.auth_mode, AuthMode::PasePairingCode);
                assert!(session.is_commissioner);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
