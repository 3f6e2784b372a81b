//! `MemoryOwner`: A trait for types that expose a stable, native-addressable byte region.

/// A trait for types that hold a contiguous byte region whose address does not move
/// for as long as the holder is alive.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - The region returned by `memory()` stays valid (and is not relocated) for the
///   entire lifetime of the holder, or until the holder is explicitly released.
/// - The reported length is accurate.
/// - A zero `ptr` is only ever reported together with a zero `len`.
pub unsafe trait MemoryOwner {
    /// Returns information about the held memory region.
    fn memory(&self) -> MemoryRegion;
}

/// Represents a raw, stable byte region that may be handed across the runtime
/// boundary by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Pointer to the start of the region.
    pub ptr: *mut u8,
    /// Length of the region in bytes.
    pub len: usize,
}

impl MemoryRegion {
    /// A region with no backing memory.
    pub const NULL: MemoryRegion = MemoryRegion {
        ptr: std::ptr::null_mut(),
        len: 0,
    };

    /// Returns the region start as an integer address, `0` for a null region.
    #[inline]
    pub fn address(&self) -> u64 {
        self.ptr as usize as u64
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Returns the region as a byte slice.
    ///
    /// # Safety
    ///
    /// The caller must guarantee the region is live and not concurrently mutated
    /// for the lifetime `'a`.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Returns the region as a mutable byte slice.
    ///
    /// # Safety
    ///
    /// The caller must guarantee the region is live and exclusively accessed
    /// for the lifetime `'a`.
    #[inline]
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [u8] {
        if self.ptr.is_null() || self.len == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}
