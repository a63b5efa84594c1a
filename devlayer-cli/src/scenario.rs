//! Scenario files: an ordered list of steps fed into the stack by `replay`.
//!
//! ```yaml
//! name: commissioning
//! steps:
//!   - step: event
//!     event: { type: wifi_connectivity_change, result: established }
//!   - step: work
//!     label: refresh-service-config
//!   - step: session_established
//!     auth_mode: pase_pairing_code
//!     record: { security_manager: 1, session_key_id: 2, peer_node_id: 42, encryption_type: 1 }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use parking_lot::Mutex;
use serde::Deserialize;

use devlayer_core::events::{AuthMode, Event, SessionCompletionRecord};
use devlayer_core::platform::{SecurityManager, SessionEstablishedCallback};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    Event {
        event: Event,
    },
    Work {
        label: String,
    },
    SessionEstablished {
        record: SessionCompletionRecord,
        #[serde(default)]
        auth_mode: AuthMode,
    },
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Stands in for the security subsystem: holds the installed callback and
/// answers auth-mode lookups for the sessions the scenario completes.
#[derive(Default)]
pub struct ScenarioSecurity {
    callback: Mutex<Option<SessionEstablishedCallback>>,
    auth_modes: Mutex<HashMap<(u16, u64), AuthMode>>,
}

impl ScenarioSecurity {
    /// Reports a completed session the way a security manager would.
    /// Returns false when no callback has been installed yet.
    pub fn complete_session(&self, record: SessionCompletionRecord, auth_mode: AuthMode) -> bool {
        self.auth_modes
            .lock()
            .insert((record.session_key_id, record.peer_node_id), auth_mode);

        let callback = self.callback.lock().clone();
        match callback {
            Some(callback) => {
                callback(record);
                true
            }
            None => false,
        }
    }
}

impl SecurityManager for ScenarioSecurity {
    fn set_session_established_callback(&self, callback: SessionEstablishedCallback) {
        *self.callback.lock() = Some(callback);
    }

    fn session_auth_mode(&self, session_key_id: u16, peer_node_id: u64) -> Option<AuthMode> {
        self.auth_modes.lock().get(&(session_key_id, peer_node_id)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devlayer_core::events::ConnectivityChange;

    const SCENARIO: &str = r#"
name: commissioning
steps:
  - step: event
    event: { type: wifi_connectivity_change, result: established }
  - step: work
    label: refresh
  - step: session_established
    auth_mode: pase_pairing_code
    record:
      security_manager: 1
      session_key_id: 2
      peer_node_id: 42
      encryption_type: 1
"#;

    #[test]
    fn parses_every_step_kind() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("commissioning"));
        assert_eq!(scenario.steps.len(), 3);

        assert!(matches!(
            scenario.steps[0],
            ScenarioStep::Event {
                event: Event::WifiConnectivityChange {
                    result: ConnectivityChange::Established
                }
            }
        ));
        assert!(matches!(&scenario.steps[1], ScenarioStep::Work { label } if label == "refresh"));
        match &scenario.steps[2] {
            ScenarioStep::SessionEstablished { record, auth_mode } => {
                assert_eq!(record.peer_node_id, 42);
                assert_eq!(record.connection, None);
                assert_eq!(*auth_mode, AuthMode::PasePairingCode);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn bundled_scenario_parses() {
        let scenario = Scenario::parse(include_str!("../../scenarios/commissioning.yaml")).unwrap();
        assert_eq!(scenario.steps.len(), 7);
    }

    #[test]
    fn unknown_step_is_rejected() {
        assert!(Scenario::parse("steps:\n  - step: reboot\n").is_err());
    }

    #[test]
    fn session_without_callback_is_not_delivered() {
        let security = ScenarioSecurity::default();
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let ScenarioStep::SessionEstablished { record, auth_mode } = scenario.steps[2] else {
            panic!("expected session step");
        };

        assert!(!security.complete_session(record, auth_mode));
        assert_eq!(
            security.session_auth_mode(record.session_key_id, record.peer_node_id),
            Some(AuthMode::PasePairingCode)
        );
    }
}
