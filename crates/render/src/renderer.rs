use viewport_common::ViewportError;

/// A camera whose projection depends on the viewport aspect ratio.
pub trait ProjectionCamera {
    /// Current aspect ratio (width / height).
    fn aspect(&self) -> f64;

    /// Store a new aspect ratio. The projection is stale until recomputed.
    fn set_aspect(&mut self, aspect: f64);

    /// Rebuild the projection from the current parameters.
    fn recompute_projection(&mut self);
}

/// Something that draws into a window-sized output: a swapchain, a canvas.
///
/// Both setters may fail in a real backend; the error is left to the caller.
pub trait OutputTarget {
    /// Resize the output to `width` x `height` logical units.
    fn set_output_size(&mut self, width: f64, height: f64) -> Result<(), ViewportError>;

    /// Set how many physical pixels back one logical unit.
    fn set_pixel_density(&mut self, ratio: f64) -> Result<(), ViewportError>;
}

/// One call received by a [`DebugTextTarget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetCall {
    OutputSize { width: f64, height: f64 },
    PixelDensity(f64),
}

/// Output target that keeps a log of what it was asked to do.
///
/// Useful for CLI output, logging, and testing the resize pipeline without a GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugTextTarget {
    width: f64,
    height: f64,
    pixel_density: f64,
    calls: Vec<TargetCall>,
}

impl Default for DebugTextTarget {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_density: 1.0,
            calls: Vec::new(),
        }
    }
}

impl DebugTextTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn pixel_density(&self) -> f64 {
        self.pixel_density
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> &[TargetCall] {
        &self.calls
    }

    /// Physical pixel dimensions the output would occupy.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_density).round().max(1.0) as u32,
            (self.height * self.pixel_density).round().max(1.0) as u32,
        )
    }

    /// Human-readable one-line description of the target state.
    pub fn describe(&self) -> String {
        let (pw, ph) = self.physical_size();
        format!(
            "Output: {:.0}x{:.0} @{:.2} ({pw}x{ph} px, {} calls)",
            self.width,
            self.height,
            self.pixel_density,
            self.calls.len()
        )
    }
}

impl OutputTarget for DebugTextTarget {
    fn set_output_size(&mut self, width: f64, height: f64) -> Result<(), ViewportError> {
        self.width = width;
        self.height = height;
        self.calls.push(TargetCall::OutputSize { width, height });
        Ok(())
    }

    fn set_pixel_density(&mut self, ratio: f64) -> Result<(), ViewportError> {
        self.pixel_density = ratio;
        self.calls.push(TargetCall::PixelDensity(ratio));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_target_starts_empty() {
        let target = DebugTextTarget::new();
        assert!(target.calls().is_empty());
        assert_eq!(target.pixel_density(), 1.0);
        assert!(target.describe().contains("0 calls"));
    }

    #[test]
    fn debug_target_records_calls_in_order() {
        let mut target = DebugTextTarget::new();
        target.set_output_size(1920.0, 1080.0).unwrap();
        target.set_pixel_density(2.0).unwrap();

        assert_eq!(
            target.calls(),
            &[
                TargetCall::OutputSize {
                    width: 1920.0,
                    height: 1080.0
                },
                TargetCall::PixelDensity(2.0),
            ]
        );
        assert_eq!(target.physical_size(), (3840, 2160));
        assert!(target.describe().contains("1920x1080 @2.00"));
    }

    #[test]
    fn physical_size_never_collapses_to_zero() {
        let mut target = DebugTextTarget::new();
        target.set_output_size(0.0, 0.0).unwrap();
        assert_eq!(target.physical_size(), (1, 1));
    }
}
