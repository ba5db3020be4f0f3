use crate::lifecycle::Lifecycle;
use viewport_common::ViewportError;

/// A floating parameter-tuning panel. Everything beyond disposal belongs to
/// the concrete panel type.
pub trait ControlPanel {
    fn dispose(&mut self);
}

/// Sole owner of a control panel for the life of a host component.
///
/// The panel is disposed exactly once: on detach, on an explicit `dispose`, or
/// when the lifecycle is dropped, whichever comes first.
pub struct ControlPanelLifecycle<P: ControlPanel> {
    panel: Option<P>,
}

impl<P: ControlPanel> ControlPanelLifecycle<P> {
    /// Take ownership of an already-built panel.
    pub fn new(panel: P) -> Self {
        Self { panel: Some(panel) }
    }

    /// Build the panel right away. Factory errors go straight back to the caller.
    pub fn acquire<E>(factory: impl FnOnce() -> Result<P, E>) -> Result<Self, E> {
        let panel = factory()?;
        tracing::info!("control panel acquired");
        Ok(Self::new(panel))
    }

    /// The panel, until it is disposed.
    pub fn panel(&self) -> Option<&P> {
        self.panel.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut P> {
        self.panel.as_mut()
    }

    pub fn is_disposed(&self) -> bool {
        self.panel.is_none()
    }

    pub fn dispose(&mut self) {
        if let Some(mut panel) = self.panel.take() {
            panel.dispose();
            tracing::info!("control panel disposed");
        }
    }
}

impl<P: ControlPanel> Lifecycle for ControlPanelLifecycle<P> {
    fn on_attach(&mut self) -> Result<(), ViewportError> {
        Ok(())
    }

    fn on_detach(&mut self) {
        self.dispose();
    }
}

impl<P: ControlPanel> Drop for ControlPanelLifecycle<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
