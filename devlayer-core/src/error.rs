use std::fmt;

use thiserror::Error;

/// Bounded resources owned by the device layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The application event handler registry.
    HandlerRegistry,
    /// The queue feeding the processing context.
    EventQueue,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::HandlerRegistry => f.write_str("event handler registry"),
            Resource::EventQueue => f.write_str("event queue"),
        }
    }
}

/// Lifecycle state of the stack, reported by [`DeviceLayerError::InvalidState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
    Uninitialized,
    Running,
    Shutdown,
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackState::Uninitialized => f.write_str("uninitialized"),
            StackState::Running => f.write_str("running"),
            StackState::Shutdown => f.write_str("shut down"),
        }
    }
}

/// Failure reported by a concrete platform implementation.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Platform initialization failed: {0}")]
    Init(String),

    #[error("Failed to spawn event loop thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Event loop thread panicked")]
    EventLoopPanicked,
}

#[derive(Debug, Error)]
pub enum DeviceLayerError {
    #[error("{resource} capacity exhausted")]
    ResourceExhausted { resource: Resource },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Stack is {actual}, expected {expected}")]
    InvalidState {
        expected: StackState,
        actual: StackState,
    },

    #[error("Event loop is already running")]
    EventLoopRunning,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl DeviceLayerError {
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, DeviceLayerError::ResourceExhausted { .. })
    }
}

pub type Result<T, E = DeviceLayerError> = std::result::Result<T, E>;
