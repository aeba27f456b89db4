//! # Mathematical Functions
//!
//! Checked arithmetic, sqrt-price conversions and liquidity math.

pub mod liquidity_math;
pub mod safe_math;
pub mod sqrt_price;

pub use liquidity_math::*;
pub use safe_math::*;
pub use sqrt_price::*;
