//! Host component lifecycle: the attach/detach signals a UI framework emits
//! around a component's life, and the helpers that bind the viewport
//! utilities to them.

use crate::config::SyncConfig;
use crate::panel::{ControlPanel, ControlPanelLifecycle};
use crate::resize::ViewportResizeSync;
use crate::window::WindowEventSource;
use std::cell::RefCell;
use std::rc::Rc;
use viewport_common::{SharedViewportSize, ViewportError};
use viewport_render::{OutputTarget, ProjectionCamera};

/// Something that follows a host component's attach and detach signals.
pub trait Lifecycle {
    /// The host was attached. Fires once, before any event handling.
    fn on_attach(&mut self) -> Result<(), ViewportError>;

    /// The host is going away. Fires once and must not fail.
    fn on_detach(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Created,
    Mounted,
    Unmounted,
}

/// Minimal host component: collects lifecycle hooks during setup and fires
/// them on mount and unmount.
pub struct HostComponent {
    name: String,
    state: HostState,
    hooks: Vec<Rc<RefCell<dyn Lifecycle>>>,
}

impl HostComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: HostState::Created,
            hooks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Add a hook.
    ///
    /// Hooks added after mount are not attached but are still detached on
    /// unmount. A hook added to an unmounted host is detached immediately.
    pub fn register(&mut self, hook: Rc<RefCell<dyn Lifecycle>>) {
        match self.state {
            HostState::Created => {}
            HostState::Mounted => {
                tracing::warn!(host = %self.name, "hook registered after mount will not be attached");
            }
            HostState::Unmounted => {
                match hook.try_borrow_mut() {
                    Ok(mut hook) => hook.on_detach(),
                    Err(_) => tracing::warn!(
                        host = %self.name,
                        "skipping busy hook registered after unmount"
                    ),
                }
                return;
            }
        }
        self.hooks.push(hook);
    }

    /// Fire `on_attach` on every hook in registration order.
    ///
    /// Only the first call does anything. The first hook error stops the walk
    /// and is returned; hooks already attached stay attached until unmount.
    pub fn mount(&mut self) -> Result<(), ViewportError> {
        if self.state != HostState::Created {
            return Ok(());
        }
        self.state = HostState::Mounted;
        tracing::info!(host = %self.name, hooks = self.hooks.len(), "mounting");

        for hook in &self.hooks {
            hook.try_borrow_mut()
                .map_err(|_| ViewportError::HandleBusy("lifecycle hook"))?
                .on_attach()?;
        }
        Ok(())
    }

    /// Fire `on_detach` on every hook in reverse registration order.
    ///
    /// Never fails. A hook that is borrowed elsewhere at this moment is skipped;
    /// it still cleans up when dropped.
    pub fn unmount(&mut self) {
        if self.state == HostState::Unmounted {
            return;
        }
        self.state = HostState::Unmounted;
        tracing::info!(host = %self.name, "unmounting");

        for hook in self.hooks.drain(..).rev() {
            match hook.try_borrow_mut() {
                Ok(mut hook) => hook.on_detach(),
                Err(_) => tracing::warn!(host = %self.name, "skipping busy hook on unmount"),
            }
        }
    }
}

impl Drop for HostComponent {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Build a [`ViewportResizeSync`] bound to `host`: it attaches when the host
/// mounts and detaches when it unmounts.
pub fn bind_resize_sync<W, C, R>(
    host: &mut HostComponent,
    window: Rc<W>,
    size: SharedViewportSize,
    camera: Rc<RefCell<C>>,
    renderer: Rc<RefCell<R>>,
    config: SyncConfig,
) -> Rc<RefCell<ViewportResizeSync<W, C, R>>>
where
    W: WindowEventSource + 'static,
    C: ProjectionCamera + 'static,
    R: OutputTarget + 'static,
{
    let sync = Rc::new(RefCell::new(ViewportResizeSync::with_config(
        window, size, camera, renderer, config,
    )));
    host.register(sync.clone());
    sync
}

/// Acquire a control panel now and dispose it when `host` unmounts.
///
/// A failing `factory` registers nothing and its error is returned as is.
pub fn bind_control_panel<P, E, F>(
    host: &mut HostComponent,
    factory: F,
) -> Result<Rc<RefCell<ControlPanelLifecycle<P>>>, E>
where
    P: ControlPanel + 'static,
    F: FnOnce() -> Result<P, E>,
{
    let panel = Rc::new(RefCell::new(ControlPanelLifecycle::acquire(factory)?));
    host.register(panel.clone());
    Ok(panel)
}
