use std::cell::Cell;
use viewport_common::ViewportError;
use viewport_sync::{ResizeHandler, ResizeListeners, WindowEventSource};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Window event source fed from winit events.
///
/// Metrics are cached from the last `refresh`; inner size is reported in
/// logical units, the scale factor as the device pixel ratio.
pub struct WinitWindowSource {
    size: Cell<(f64, f64)>,
    scale_factor: Cell<f64>,
    listeners: ResizeListeners,
}

impl WinitWindowSource {
    pub fn new(window: &Window) -> Self {
        let source = Self {
            size: Cell::new((0.0, 0.0)),
            scale_factor: Cell::new(1.0),
            listeners: ResizeListeners::new(),
        };
        source.refresh(window);
        source
    }

    /// Re-read size and scale factor from the window.
    pub fn refresh(&self, window: &Window) {
        let scale = window.scale_factor();
        self.size.set(logical_size(window.inner_size(), scale));
        self.scale_factor.set(scale);
    }

    /// Run the registered resize handlers.
    pub fn notify(&self) -> Result<(), ViewportError> {
        self.listeners.dispatch()
    }
}

/// Convert a physical window size to logical units at `scale`.
fn logical_size(physical: PhysicalSize<u32>, scale: f64) -> (f64, f64) {
    let logical = physical.to_logical::<f64>(scale);
    (logical.width, logical.height)
}

impl WindowEventSource for WinitWindowSource {
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
        self.scale_factor.get()
    }
}
