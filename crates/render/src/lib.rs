//! Rendering capabilities the viewport core coordinates with.
//!
//! # Invariants
//! - The core never constructs or destroys a camera or a target; it only
//!   drives them through these traits.
//! - A camera's projection reflects its aspect only after `recompute_projection`.
//!
//! `DebugTextTarget` records what it was told instead of drawing, which makes
//! it the target of choice for the CLI and for tests. The wgpu backend lives in
//! `viewport-render-wgpu`.

mod camera;
mod renderer;

pub use camera::PerspectiveCamera;
pub use renderer::{DebugTextTarget, OutputTarget, ProjectionCamera, TargetCall};
