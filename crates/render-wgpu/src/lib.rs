//! wgpu render target for the viewport.
//!
//! Draws a grid floor seen through a `PerspectiveCamera` into a window surface
//! whose pixel size follows the logical output size times the pixel density.
//!
//! # Invariants
//! - The surface and depth buffer are never configured below 1x1.
//! - Output size and pixel density only change through `OutputTarget`.

mod shaders;
mod surface;

pub use surface::{SurfaceTarget, physical_extent};
