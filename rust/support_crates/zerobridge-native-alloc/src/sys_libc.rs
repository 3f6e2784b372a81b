//! Native memory backed by the C runtime heap (`malloc` / `free`).

/// Verifies that the C heap can hand out and take back a minimal block.
pub fn probe() -> std::io::Result<()> {
    let ptr = unsafe { libc::malloc(1) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "malloc(1) returned null",
        ));
    }
    unsafe { libc::free(ptr) };
    Ok(())
}

/// Allocates `size` bytes from the C heap. Returns null on failure.
///
/// A zero-byte request still produces a unique, freeable address.
pub fn allocate(size: usize) -> *mut u8 {
    unsafe { libc::malloc(size.max(1)) as *mut u8 }
}

/// Returns a block obtained from [`allocate`] to the C heap.
///
/// # Safety
///
/// `ptr` must have been returned by [`allocate`] and not yet freed.
pub unsafe fn free(ptr: *mut u8) {
    unsafe { libc::free(ptr as *mut libc::c_void) }
}
