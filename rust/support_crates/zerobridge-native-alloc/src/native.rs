//! Process-wide access to the native memory primitive.
//!
//! The primitive is probed exactly once, on first use, and the outcome is cached as
//! [`Availability`]. When the primitive is unavailable the failure is logged once at
//! initialization, and every later allocate/free degrades to a logged no-op so that
//! managed-only paths keep working.
//!
//! # Preconditions
//!
//! Nothing here synchronizes access to an allocation. Callers must not let two
//! mutators touch the same block concurrently without their own locking.

use std::sync::OnceLock;

use crate::{registry, stats, sys};

/// Outcome of the one-time probe of the native memory primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// Capability-checked handle to the native memory primitive.
#[derive(Debug)]
pub struct NativeMemory {
    availability: Availability,
}

/// Returns the process-wide native memory handle, probing the primitive on first call.
pub fn native_memory() -> &'static NativeMemory {
    static NATIVE: OnceLock<NativeMemory> = OnceLock::new();
    NATIVE.get_or_init(NativeMemory::initialize)
}

impl NativeMemory {
    /// Probes the platform primitive and caches the result.
    fn initialize() -> NativeMemory {
        match sys::probe() {
            Ok(()) => NativeMemory {
                availability: Availability::Available,
            },
            Err(e) => {
                log::error!("native memory primitive is unavailable: {e}");
                NativeMemory {
                    availability: Availability::Unavailable,
                }
            }
        }
    }

    /// Creates a handle that behaves as if the primitive could not be initialized.
    ///
    /// Every allocation returns `0` and every free is a logged no-op.
    pub fn unavailable() -> NativeMemory {
        NativeMemory {
            availability: Availability::Unavailable,
        }
    }

    #[inline]
    pub fn availability(&self) -> Availability {
        self.availability
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Allocates `size` bytes of native memory and returns the block address.
    ///
    /// Returns `0` on failure: when the primitive is unavailable, when `size` cannot be
    /// represented on this platform, or when the heap is exhausted. Never panics.
    /// A zero-byte request yields a valid, non-zero address that must still be freed.
    pub fn allocate(&self, size: u64) -> u64 {
        if !self.is_available() {
            log::warn!("native memory unavailable; allocation of {size} bytes refused");
            return 0;
        }
        let Ok(len) = usize::try_from(size) else {
            return 0;
        };
        if len > isize::MAX as usize {
            return 0;
        }
        let ptr = sys::allocate(len);
        if ptr.is_null() {
            return 0;
        }
        let address = ptr as usize as u64;
        registry::insert(address, size);
        stats::record_allocation(size);
        address
    }

    /// Frees a block previously returned by [`NativeMemory::allocate`].
    ///
    /// Freeing `0` is a no-op.
    ///
    /// # Safety
    ///
    /// A non-zero `address` must have been returned by `allocate` and not yet freed.
    /// Debug builds verify this and panic on an unknown or already freed address.
    pub unsafe fn free(&self, address: u64) {
        if address == 0 {
            return;
        }
        if !self.is_available() {
            log::warn!("native memory unavailable; memory will leak: {address:#x}");
            return;
        }
        registry::remove(address);
        unsafe { sys::free(address as usize as *mut u8) };
        stats::record_free();
    }

    /// Reads one byte at an absolute address.
    ///
    /// # Safety
    ///
    /// `address` must lie within a live allocation. Debug builds assert this.
    #[inline]
    pub unsafe fn read_byte(&self, address: u64) -> u8 {
        debug_assert!(self.is_available(), "native memory unavailable");
        debug_assert!(
            registry::contains_byte(address),
            "read of {address:#x} outside any live native allocation"
        );
        unsafe { std::ptr::read(address as usize as *const u8) }
    }

    /// Writes one byte at an absolute address.
    ///
    /// # Safety
    ///
    /// `address` must lie within a live allocation. Debug builds assert this.
    #[inline]
    pub unsafe fn write_byte(&self, address: u64, value: u8) {
        debug_assert!(self.is_available(), "native memory unavailable");
        debug_assert!(
            registry::contains_byte(address),
            "write of {address:#x} outside any live native allocation"
        );
        unsafe { std::ptr::write(address as usize as *mut u8, value) }
    }
}

/// Allocates through the process-wide handle. See [`NativeMemory::allocate`].
#[inline]
pub fn allocate(size: u64) -> u64 {
    native_memory().allocate(size)
}

/// Frees through the process-wide handle. See [`NativeMemory::free`].
///
/// # Safety
///
/// Same contract as [`NativeMemory::free`].
#[inline]
pub unsafe fn free(address: u64) {
    unsafe { native_memory().free(address) }
}

/// Reads through the process-wide handle. See [`NativeMemory::read_byte`].
///
/// # Safety
///
/// Same contract as [`NativeMemory::read_byte`].
#[inline]
pub unsafe fn read_byte(address: u64) -> u8 {
    unsafe { native_memory().read_byte(address) }
}

/// Writes through the process-wide handle. See [`NativeMemory::write_byte`].
///
/// # Safety
///
/// Same contract as [`NativeMemory::write_byte`].
#[inline]
pub unsafe fn write_byte(address: u64, value: u8) {
    unsafe { native_memory().write_byte(address, value) }
}
