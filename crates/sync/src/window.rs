use std::cell::{Cell, RefCell};
use std::rc::Rc;
use viewport_common::ViewportError;

/// Callback run on every window resize. Identity is the `Rc` allocation.
pub type ResizeHandler = Rc<dyn Fn() -> Result<(), ViewportError>>;

/// The parts of a host window the resize pipeline reads and subscribes to.
pub trait WindowEventSource {
    /// Register `handler` for resize events. Registering the same handler twice
    /// keeps a single registration.
    fn add_resize_listener(&self, handler: ResizeHandler);

    /// Remove the exact `handler` registration. Unknown handlers are ignored.
    fn remove_resize_listener(&self, handler: &ResizeHandler);

    /// Current inner (client area) width and height in logical units.
    fn inner_size(&self) -> (f64, f64);

    /// Physical pixels per logical unit on the display hosting the window.
    fn device_pixel_ratio(&self) -> f64;
}

fn same_handler(a: &ResizeHandler, b: &ResizeHandler) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Ordered set of resize handlers with identity-based removal.
#[derive(Default)]
pub struct ResizeListeners {
    handlers: RefCell<Vec<ResizeHandler>>,
}

impl ResizeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handler: ResizeHandler) {
        let mut handlers = self.handlers.borrow_mut();
        if !handlers.iter().any(|h| same_handler(h, &handler)) {
            handlers.push(handler);
        }
    }

    pub fn remove(&self, handler: &ResizeHandler) {
        self.handlers
            .borrow_mut()
            .retain(|h| !same_handler(h, handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every handler registered at the time of the call, in registration order.
    ///
    /// A handler removed by an earlier one during the same dispatch is
    /// skipped. The first error stops dispatch and is returned to the caller.
    pub fn dispatch(&self) -> Result<(), ViewportError> {
        let snapshot: Vec<ResizeHandler> = self.handlers.borrow().clone();
        for handler in snapshot {
            let live = self
                .handlers
                .borrow()
                .iter()
                .any(|h| same_handler(h, &handler));
            if live {
                handler()?;
            }
        }
        Ok(())
    }
}

/// Window source with no real window behind it.
///
/// Metrics are set directly; `resize_to` behaves like the user dragging the
/// window border. Used by the CLI replay and by tests.
pub struct HeadlessWindow {
    size: Cell<(f64, f64)>,
    pixel_ratio: Cell<f64>,
    listeners: ResizeListeners,
}

impl HeadlessWindow {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            size: Cell::new((width, height)),
            pixel_ratio: Cell::new(pixel_ratio),
            listeners: ResizeListeners::new(),
        }
    }

    /// Change the inner size and fire a resize event.
    pub fn resize_to(&self, width: f64, height: f64) -> Result<(), ViewportError> {
        self.size.set((width, height));
        self.listeners.dispatch()
    }

    /// Change the device pixel ratio without firing anything.
    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.pixel_ratio.set(ratio);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

impl WindowEventSource for HeadlessWindow {
    fn add_resize_listener(&self, handler: ResizeHandler) {
        self.listeners.add(handler);
    }

    fn remove_resize_listener(&self, handler: &ResizeHandler) {
        self.listeners.remove(handler);
    }

    fn inner_size(&self) -> (f64, f64) {
        self.size.get()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio.get()
    }
}
