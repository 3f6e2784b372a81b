//! Raw native memory primitives: allocate, free, and byte-level access on an
//! absolute address.
//!
//! This is the only crate that touches unmanaged memory directly. Everything above it
//! (unsafe arrays, direct arrays) goes through [`NativeMemory`].

pub mod native;
pub mod stats;

mod registry;

#[cfg_attr(any(unix, windows), path = "sys_libc.rs")]
#[cfg_attr(not(any(unix, windows)), path = "sys_fallback.rs")]
mod sys;

pub use native::{Availability, NativeMemory, allocate, free, native_memory, read_byte, write_byte};
pub use stats::AllocatorStats;
