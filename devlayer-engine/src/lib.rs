pub mod dispatcher;
pub mod event_loop;
pub mod host;
pub mod manager;
pub mod observer;
pub mod session;

// Re-export the manager surface so applications can simply do:
pub use dispatcher::EventDispatcher;
pub use event_loop::EventLoopHandle;
pub use host::HostPlatform;
pub use manager::{PlatformManager, PlatformManagerBuilder, StackLockGuard};
pub use observer::DispatchObserver;
pub use session::{session_established_event, SessionCompletionBridge};
