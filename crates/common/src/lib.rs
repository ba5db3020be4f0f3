//! Shared types for the viewport workspace.
//!
//! # Invariants
//! - `ViewportSize` is owned by the caller and only mutated in place.
//! - Pixel density handed to a render target never exceeds the configured ceiling.

mod error;
mod types;

pub use error::ViewportError;
pub use types::{DEFAULT_MAX_PIXEL_RATIO, SharedViewportSize, ViewportSize, clamp_pixel_ratio};
