//! Test utilities for the zerobridge crates.
//!
//! - [`fixtures`]: canonical byte fixtures in managed and native form
//! - [`holder`]: a native-side holder that round-trips arrays across the boundary
//! - [`lib_dirs`]: scratch directories laid out like native library search paths

pub mod fixtures;
pub mod holder;
pub mod lib_dirs;
