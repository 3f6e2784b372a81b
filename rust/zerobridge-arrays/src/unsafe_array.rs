//! `UnsafeArray`: an owned, fixed-size buffer of native memory.

use zerobridge_common_traits::memory_owner::{MemoryOwner, MemoryRegion};
use zerobridge_native_alloc as native;

/// A fixed-size byte buffer allocated from native memory, identified by its absolute
/// address and length.
///
/// No runtime tracks the lifetime of this memory: it is freed only by [`release`].
/// Dropping an `UnsafeArray` without releasing it leaks the block; wrap it in a
/// [`DirectArray`](crate::DirectArray) to get release-on-drop.
///
/// Allocation failure is silent: the array comes back with `address == 0` and
/// `len() == 0`, and callers use [`is_empty`] as the failure signal.
///
/// Index preconditions (`index < len()`, array not empty) are checked with debug
/// assertions only.
///
/// [`release`]: UnsafeArray::release
/// [`is_empty`]: UnsafeArray::is_empty
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an UnsafeArray leaks its memory unless released"]
pub struct UnsafeArray {
    address: u64,
    length: u64,
}

impl UnsafeArray {
    /// An array with no allocation.
    pub const fn null() -> UnsafeArray {
        UnsafeArray {
            address: 0,
            length: 0,
        }
    }

    /// Allocates `size` bytes of native memory.
    ///
    /// On failure returns an array with `len() == 0` regardless of `size`.
    pub fn allocate(size: u64) -> UnsafeArray {
        let address = native::allocate(size);
        UnsafeArray {
            address,
            length: if address != 0 { size } else { 0 },
        }
    }

    /// Allocates an array holding a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> UnsafeArray {
        let array = UnsafeArray::allocate(data.len() as u64);
        if array.len() == data.len() as u64 && !data.is_empty() {
            unsafe {
                std::ptr::copy_nonoverlapping(data.as_ptr(), array.as_mut_ptr(), data.len());
            }
        }
        array
    }

    /// Reassembles an array from the parts returned by [`UnsafeArray::into_raw_parts`].
    ///
    /// # Safety
    ///
    /// `address` must come from the native allocator with at least `length` bytes,
    /// must not have been freed, and no other `UnsafeArray` may own it.
    pub unsafe fn from_raw_parts(address: u64, length: u64) -> UnsafeArray {
        UnsafeArray { address, length }
    }

    /// Gives up ownership and returns `(address, length)`.
    pub fn into_raw_parts(self) -> (u64, u64) {
        (self.address, self.length)
    }

    #[inline]
    pub fn address(&self) -> u64 {
        self.address
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.length
    }

    /// True iff the array holds zero bytes; this includes failed allocations and
    /// released arrays.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True iff the array still holds a native block (possibly zero-length).
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.address != 0
    }

    /// Reads the byte at `index`.
    #[inline]
    pub fn get(&self, index: u64) -> u8 {
        debug_assert!(!self.is_empty(), "Empty array");
        debug_assert!(
            index < self.length,
            "Index {index} out of bounds (size: {})",
            self.length
        );
        unsafe { native::read_byte(self.address + index) }
    }

    /// Writes `value` at `index`.
    #[inline]
    pub fn put(&mut self, index: u64, value: u8) {
        debug_assert!(!self.is_empty(), "Empty array");
        debug_assert!(
            index < self.length,
            "Index {index} out of bounds (size: {})",
            self.length
        );
        unsafe { native::write_byte(self.address + index, value) }
    }

    /// Frees the native block. The array is empty afterwards; a second call is a no-op.
    pub fn release(&mut self) {
        if self.address != 0 {
            unsafe { native::free(self.address) };
        }
        self.address = 0;
        self.length = 0;
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&self) -> *mut u8 {
        self.address as usize as *mut u8
    }
}

impl Default for UnsafeArray {
    fn default() -> Self {
        Self::null()
    }
}

unsafe impl MemoryOwner for UnsafeArray {
    fn memory(&self) -> MemoryRegion {
        if self.address == 0 {
            return MemoryRegion::NULL;
        }
        MemoryRegion {
            ptr: self.as_mut_ptr(),
            len: self.length as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use zerobridge_native_alloc::AllocatorStats;

    use super::*;

    #[test]
    fn test_allocate_get_put() {
        let mut a = UnsafeArray::allocate(8);
        assert!(!a.is_empty());
        assert!(a.is_allocated());
        assert_eq!(a.len(), 8);
        for i in 0..8 {
            a.put(i, (i * 2) as u8);
        }
        for i in 0..8 {
            assert_eq!(a.get(i), (i * 2) as u8);
        }
        a.release();
        assert!(a.is_empty());
        assert!(!a.is_allocated());
    }

    #[test]
    fn test_allocate_zero() {
        let mut a = UnsafeArray::allocate(0);
        assert!(a.is_empty());
        assert!(a.is_allocated(), "zero-length arrays still own a block");
        a.release();
    }

    #[test]
    fn test_failed_allocation_is_empty() {
        let a = UnsafeArray::allocate(u64::MAX);
        assert!(a.is_empty());
        assert!(!a.is_allocated());
        assert_eq!(a, UnsafeArray::null());
    }

    #[test]
    fn test_copy_from_slice() {
        let mut a = UnsafeArray::copy_from_slice(b"native");
        assert_eq!(a.len(), 6);
        assert_eq!(a.get(0), b'n');
        assert_eq!(a.get(5), b'e');
        a.release();
    }

    #[test]
    fn test_release_twice_frees_once() {
        let before = AllocatorStats::current_thread();
        let mut a = UnsafeArray::allocate(4);
        a.release();
        a.release();
        let delta = AllocatorStats::current_thread().since(&before);
        assert_eq!(delta.allocations, 1);
        assert_eq!(delta.frees, 1);
    }

    #[test]
    fn test_raw_parts_roundtrip() {
        let mut a = UnsafeArray::allocate(3);
        a.put(2, 9);
        let (address, length) = a.into_raw_parts();
        let mut b = unsafe { UnsafeArray::from_raw_parts(address, length) };
        assert_eq!(b.get(2), 9);
        b.release();
    }

    #[test]
    fn test_memory_region() {
        let mut a = UnsafeArray::allocate(5);
        let region = a.memory();
        assert_eq!(region.address(), a.address());
        assert_eq!(region.len, 5);
        a.release();
        assert!(a.memory().is_null());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_at_length_panics_in_debug() {
        let a = UnsafeArray::allocate(4);
        let _ = a.get(4);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_put_at_length_panics_in_debug() {
        let mut a = UnsafeArray::allocate(4);
        a.put(4, 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "Empty array")]
    fn test_get_on_empty_panics_in_debug() {
        let a = UnsafeArray::null();
        let _ = a.get(0);
    }
}
