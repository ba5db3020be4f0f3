//! Viewport resize synchronization and host-bound lifecycles.
//!
//! # Invariants
//! - On every resize the size record is written first, then the camera aspect
//!   and projection, then the render target's size and clamped pixel density.
//! - A resize sync is attached at most once; detach is terminal and never fails.
//! - A control panel owned by a lifecycle is disposed exactly once.
//!
//! Everything here is single-threaded: handles are `Rc<RefCell<_>>` and events
//! are dispatched serially on the host thread.

pub mod config;
pub mod lifecycle;
pub mod panel;
pub mod resize;
pub mod window;

pub use config::{ConfigError, SyncConfig};
pub use lifecycle::{HostComponent, HostState, Lifecycle, bind_control_panel, bind_resize_sync};
pub use panel::{ControlPanel, ControlPanelLifecycle};
pub use resize::{SyncState, ViewportResizeSync};
pub use window::{HeadlessWindow, ResizeHandler, ResizeListeners, WindowEventSource};
