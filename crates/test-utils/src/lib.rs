//! Shared test utilities for the shape-tiles workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Record fixtures in the stored document layout
//! - Instrumented document stores that capture or fail requests
//! - A telemetry sink that keeps every forwarded metric
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod sink;
pub mod stores;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use sink::RecordingSink;
pub use stores::{FailingStore, RecordingStore};

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of `[x, y]` positions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_position_approx_eq;
///
/// assert_position_approx_eq!([1.0001, 2.0001], [1.0, 2.0], 0.001);
/// ```
#[macro_export]
macro_rules! assert_position_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: [f64; 2] = $left;
        let right: [f64; 2] = $right;
        $crate::assert_approx_eq!(left[0], right[0], $epsilon);
        $crate::assert_approx_eq!(left[1], right[1], $epsilon);
    }};
}
