use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Highest device pixel ratio forwarded to a render target by default.
pub const DEFAULT_MAX_PIXEL_RATIO: f64 = 2.0;

/// Logical dimensions of the viewport, in window units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// A size record shared between the caller and whoever keeps it current.
pub type SharedViewportSize = Rc<RefCell<ViewportSize>>;

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Wrap the record for shared, in-place mutation.
    pub fn shared(self) -> SharedViewportSize {
        Rc::new(RefCell::new(self))
    }

    /// Width over height. No guard for zero height: the result is then inf or NaN.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Cap `ratio` at `max`. Values below the ceiling pass through untouched.
pub fn clamp_pixel_ratio(ratio: f64, max: f64) -> f64 {
    ratio.min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_plain_division() {
        let size = ViewportSize::new(1920.0, 1080.0);
        assert_eq!(size.aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn aspect_zero_height_is_not_finite() {
        assert!(ViewportSize::new(800.0, 0.0).aspect().is_infinite());
        assert!(ViewportSize::new(0.0, 0.0).aspect().is_nan());
    }

    #[test]
    fn clamp_has_only_an_upper_bound() {
        let got: Vec<f64> = [0.5, 1.0, 2.0, 3.0, 5.0]
            .iter()
            .map(|r| clamp_pixel_ratio(*r, DEFAULT_MAX_PIXEL_RATIO))
            .collect();
        assert_eq!(got, vec![0.5, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn shared_record_mutates_in_place() {
        let size = ViewportSize::default().shared();
        let other = size.clone();
        other.borrow_mut().width = 10.0;
        assert_eq!(size.borrow().width, 10.0);
    }
}
