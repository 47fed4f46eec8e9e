//! Common types used across the application.

pub mod id;
pub mod period;

pub use id::*;
pub use period::{Period, PeriodParseError};
