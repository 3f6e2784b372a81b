//! Hosts without a C heap: the native-unsafe path is reported unavailable and every
//! allocation fails.

pub fn probe() -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no native heap on this target",
    ))
}

pub fn allocate(_size: usize) -> *mut u8 {
    std::ptr::null_mut()
}

/// # Safety
///
/// Never called with a non-null pointer, since [`allocate`] never succeeds.
pub unsafe fn free(_ptr: *mut u8) {}
