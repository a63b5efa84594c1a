//! # devlayer-core
//!
//! Foundation layer of the device platform abstraction: the event model,
//! the application handler registry, deferred work items and the bounded
//! queue that feeds the single processing context.
//!
//! ### Key Submodules:
//! - `events`: tagged device events, session payloads and the MPSC queue
//! - `registry`: insertion-ordered application handler list
//! - `work`: one-shot deferred work
//! - `platform`: capabilities supplied by concrete platforms and the
//!   security subsystem
//! - `stats`: dispatch counters

pub mod error;
pub mod events;
pub mod platform;
pub mod registry;
pub mod stats;
pub mod work;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::platform::*;
    pub use crate::registry::*;
    pub use crate::stats::*;
    pub use crate::work::*;
}

pub use error::{DeviceLayerError, PlatformError, Result};
