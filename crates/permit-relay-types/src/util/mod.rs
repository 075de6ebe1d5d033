//! Utility types.
//!
//! - [`decimal_amount`] - Human-readable token amount parsing and scaling to base units

pub mod decimal_amount;

pub use decimal_amount::*;
