//! Shared value types: transforms, axis-angle rotations, colours.

mod types;

pub use types::{AxisAngle, Rgba, Transform};
