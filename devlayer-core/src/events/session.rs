//! Session-established payload and the record handed over by the security
//! subsystem when a secure session comes up.

use serde::{Deserialize, Serialize};

/// Opaque handle to the security manager that completed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityManagerRef(pub u64);

/// Opaque handle to the connection the session was negotiated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRef(pub u64);

/// Opaque request state passed through by the security subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestState(pub u64);

/// How the peer authenticated when the session key was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    NotSpecified,
    CaseAccessToken,
    CaseDevice,
    CaseServiceEndpoint,
    PasePairingCode,
    TakeIdentificationKey,
}

/// Payload of [`Event::SessionEstablished`](super::Event::SessionEstablished).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEstablished {
    pub peer_node_id: u64,
    pub session_key_id: u16,
    pub encryption_type: u8,
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Set when the peer used the device pairing code, i.e. it is presumed to
    /// be commissioning the device.
    #[serde(default)]
    pub is_commissioner: bool,
}

impl SessionEstablished {
    pub fn new(peer_node_id: u64, session_key_id: u16, encryption_type: u8, auth_mode: AuthMode) -> Self {
        Self {
            peer_node_id,
            session_key_id,
            encryption_type,
            auth_mode,
            is_commissioner: auth_mode == AuthMode::PasePairingCode,
        }
    }
}

/// Arguments of the security subsystem's session-established callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCompletionRecord {
    pub security_manager: SecurityManagerRef,
    #[serde(default)]
    pub connection: Option<ConnectionRef>,
    #[serde(default)]
    pub request_state: Option<RequestState>,
    pub session_key_id: u16,
    pub peer_node_id: u64,
    pub encryption_type: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_code_sessions_mark_the_commissioner() {
        let session = SessionEstablished::new(0x18B4_3000_0000_0001, 42, 1, AuthMode::PasePairingCode);
        assert!(session.is_commissioner);

        let session = SessionEstablished::new(0x18B4_3000_0000_0001, 42, 1, AuthMode::CaseDevice);
        assert!(!session.is_commissioner);
    }
}
