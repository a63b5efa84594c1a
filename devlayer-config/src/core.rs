//! Core system configuration parameters.
//!
//! Manages the properties of the dispatch core:
//! - Event queue sizing
//! - Handler registry sizing
//! - Event loop thread behaviour

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Core system configuration parameters.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CoreConfig {
    /// Queue feeding the processing context.
    #[serde(default)]
    #[validate(nested)]
    pub event_queue: EventQueueConfig,

    /// Application event handler registry.
    #[serde(default)]
    #[validate(nested)]
    pub registry: RegistryConfig,

    /// Event loop driving the processing context.
    #[serde(default)]
    #[validate(nested)]
    pub event_loop: EventLoopConfig,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct EventQueueConfig {
    /// Maximum number of pending events and work items.
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, max = 65536))]
    pub capacity: usize,
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RegistryConfig {
    /// Maximum number of application event handlers.
    #[serde(default = "default_max_handlers")]
    #[validate(range(min = 1, max = 4096))]
    pub max_handlers: usize,
}

fn default_max_handlers() -> usize {
    32
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_handlers: default_max_handlers(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct EventLoopConfig {
    /// How long an idle processing context waits before rechecking the
    /// queue, in milliseconds.
    #[serde(default = "default_idle_wait_ms")]
    #[validate(range(min = 1, max = 60000))]
    pub idle_wait_ms: u64,

    /// Name of the event loop thread (Linux limits names to 15 bytes).
    #[serde(default = "default_thread_name")]
    #[validate(length(min = 1, max = 15))]
    pub thread_name: String,
}

fn default_idle_wait_ms() -> u64 {
    100
}

fn default_thread_name() -> String {
    "devlayer-loop".into()
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            idle_wait_ms: default_idle_wait_ms(),
            thread_name: default_thread_name(),
        }
    }
}
