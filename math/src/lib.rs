//! # twamm-math
//!
//! Wide-integer fixed-point arithmetic and the closed-form per-segment
//! solver used by the TWAMM pool core's Execute-Virtual-Orders engine.
//! This crate has no knowledge of pools, orders, or blocks — it is pure
//! numerics and could be vendored into an unrelated project.

pub mod constants;
pub mod continuous;
pub mod error;
pub mod mul_div;
pub mod wide;

pub use constants::scale_for_decimals;
pub use continuous::{one_sided_sells_token0, one_sided_sells_token1, two_sided_segment, SegmentOutcome};
pub use error::{MathError, MathResult};
pub use mul_div::{mul_div, mul_div_ceil, mul_div_floor, Rounding};
pub use wide::{Wide256, Wide512};
