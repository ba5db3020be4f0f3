//! Developer Tooling: runtime parameter tuning.
//!
//! # Invariants
//! - A disposed panel draws nothing and holds no bindings.

mod tweak;

pub use tweak::{Binding, TweakPanel};
