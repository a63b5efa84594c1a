//! ## devlayer-core::events
//! **Device events and the bounded queue feeding the processing context**
//!
//! Every event carries a 16-bit [`EventType`]. The type space is split into
//! ranges: public events are delivered to application handlers, internal
//! events only ever reach the system and device layers. Each range has a
//! platform-specific sub-range that concrete platforms use for their own
//! event types.
//!
//! ### Key Submodules:
//! - `bus`: bounded MPSC queue of events and work items
//! - `session`: session-established payload and the security callback record

pub mod bus;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bus::{EventQueue, QueueEntry};
pub use session::{
    AuthMode, ConnectionRef, RequestState, SecurityManagerRef, SessionCompletionRecord,
    SessionEstablished,
};

/// Partition of the event type space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRange {
    Public,
    PublicPlatformSpecific,
    Internal,
    InternalPlatformSpecific,
}

/// Discriminator of an [`Event`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(u16);

impl EventType {
    pub const RANGE_PUBLIC: u16 = 0x0000;
    pub const RANGE_PUBLIC_PLATFORM_SPECIFIC: u16 = 0x1000;
    pub const RANGE_INTERNAL: u16 = 0x8000;
    pub const RANGE_INTERNAL_PLATFORM_SPECIFIC: u16 = 0x9000;

    pub const WIFI_CONNECTIVITY_CHANGE: Self = Self(Self::RANGE_PUBLIC);
    pub const THREAD_CONNECTIVITY_CHANGE: Self = Self(Self::RANGE_PUBLIC + 1);
    pub const INTERNET_CONNECTIVITY_CHANGE: Self = Self(Self::RANGE_PUBLIC + 2);
    pub const SERVICE_CONNECTIVITY_CHANGE: Self = Self(Self::RANGE_PUBLIC + 3);
    pub const FABRIC_MEMBERSHIP_CHANGE: Self = Self(Self::RANGE_PUBLIC + 4);
    pub const SERVICE_PROVISIONING_CHANGE: Self = Self(Self::RANGE_PUBLIC + 5);
    pub const TIME_SYNC_CHANGE: Self = Self(Self::RANGE_PUBLIC + 6);
    pub const SESSION_ESTABLISHED: Self = Self(Self::RANGE_PUBLIC + 7);

    pub const NO_OP: Self = Self(Self::RANGE_INTERNAL);
    pub const SYSTEM_LAYER: Self = Self(Self::RANGE_INTERNAL + 1);

    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    pub fn range(self) -> EventRange {
        match self.0 {
            0x0000..=0x0FFF => EventRange::Public,
            0x1000..=0x7FFF => EventRange::PublicPlatformSpecific,
            0x8000..=0x8FFF => EventRange::Internal,
            _ => EventRange::InternalPlatformSpecific,
        }
    }

    /// Internal events are never delivered to application handlers.
    #[inline]
    pub fn is_internal(self) -> bool {
        self.0 >= Self::RANGE_INTERNAL
    }

    #[inline]
    pub fn is_platform_specific(self) -> bool {
        matches!(
            self.range(),
            EventRange::PublicPlatformSpecific | EventRange::InternalPlatformSpecific
        )
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({:#06x})", self.0)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Outcome of a connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityChange {
    Established,
    Lost,
    NoChange,
}

/// Tagged device event routed through the dispatch pipeline.
///
/// Events are plain values: the pipeline borrows one for the duration of a
/// single dispatch and never retains it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Internal event with no payload, used to wake the processing context.
    NoOp,
    /// Internal event addressed to the system layer (timers, I/O readiness).
    SystemLayer { target: u64, kind: u16, argument: u64 },
    WifiConnectivityChange { result: ConnectivityChange },
    ThreadConnectivityChange { result: ConnectivityChange },
    InternetConnectivityChange {
        ipv4: ConnectivityChange,
        ipv6: ConnectivityChange,
    },
    ServiceConnectivityChange { overall: ConnectivityChange },
    FabricMembershipChange { is_member_of_fabric: bool },
    ServiceProvisioningChange {
        is_service_provisioned: bool,
        service_config_updated: bool,
    },
    TimeSyncChange { is_time_synchronized: bool },
    SessionEstablished(SessionEstablished),
    /// Event defined by a concrete platform. The type code must lie in one
    /// of the platform-specific ranges.
    Platform { event_type: EventType, data: u64 },
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::NoOp => EventType::NO_OP,
            Event::SystemLayer { .. } => EventType::SYSTEM_LAYER,
            Event::WifiConnectivityChange { .. } => EventType::WIFI_CONNECTIVITY_CHANGE,
            Event::ThreadConnectivityChange { .. } => EventType::THREAD_CONNECTIVITY_CHANGE,
            Event::InternetConnectivityChange { .. } => EventType::INTERNET_CONNECTIVITY_CHANGE,
            Event::ServiceConnectivityChange { .. } => EventType::SERVICE_CONNECTIVITY_CHANGE,
            Event::FabricMembershipChange { .. } => EventType::FABRIC_MEMBERSHIP_CHANGE,
            Event::ServiceProvisioningChange { .. } => EventType::SERVICE_PROVISIONING_CHANGE,
            Event::TimeSyncChange { .. } => EventType::TIME_SYNC_CHANGE,
            Event::SessionEstablished(_) => EventType::SESSION_ESTABLISHED,
            Event::Platform { event_type, .. } => *event_type,
        }
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        self.event_type().is_internal()
    }
}
