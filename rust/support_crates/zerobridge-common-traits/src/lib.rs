//! Traits and definitions shared by the zerobridge support crates.
//!
//! # Modules
//!
//! - [`memory_owner`]: Traits for types that own (or facade) a contiguous region of
//!   raw bytes with a stable address

pub mod memory_owner;
