//! C ABI entry points for native code that cannot link against Rust types.
//!
//! Native callers hold arrays as [`RawHandle`]s. Handles returned by
//! [`zb_allocate_unsafe`] own their memory and must be passed to [`zb_release`]
//! exactly once.

use crate::{
    direct_array::DirectArray,
    transfer::{Endpoint, Side},
    view::RawHandle,
};

/// Allocates `size` bytes of native memory and returns an owned handle.
///
/// Returns [`RawHandle::NULL`] on failure.
#[unsafe(no_mangle)]
pub extern "C" fn zb_allocate_unsafe(size: u64) -> RawHandle {
    let mut endpoint = Endpoint::with_array(Side::Native, DirectArray::allocate_unsafe(size));
    endpoint.export().unwrap_or(RawHandle::NULL)
}

/// Releases the memory behind an owned handle. Borrowed and null handles are ignored.
///
/// # Safety
///
/// `handle` must come from this library and must not be released twice.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zb_release(handle: RawHandle) {
    if handle.is_null() {
        return;
    }
    let mut endpoint = Endpoint::new(Side::Native);
    unsafe { endpoint.import(handle) };
    endpoint.release();
}

/// Copies up to `len` bytes starting at `start` into `dst`. Returns the count copied.
///
/// # Safety
///
/// `handle` must describe live memory, and `dst` must be valid for `len` bytes of
/// writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zb_read(handle: RawHandle, start: u64, dst: *mut u8, len: u64) -> u64 {
    if dst.is_null() || len == 0 {
        return 0;
    }
    let view = unsafe { DirectArray::wrap_foreign(handle.address, handle.length) };
    let dst = unsafe { std::slice::from_raw_parts_mut(dst, len as usize) };
    view.read_at(start, dst) as u64
}

/// Copies up to `len` bytes from `src` into the array at `start`. Returns the count
/// copied.
///
/// # Safety
///
/// `handle` must describe live memory, and `src` must be valid for `len` bytes of
/// reads.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zb_write(handle: RawHandle, start: u64, src: *const u8, len: u64) -> u64 {
    if src.is_null() || len == 0 {
        return 0;
    }
    let mut view = unsafe { DirectArray::wrap_foreign(handle.address, handle.length) };
    let src = unsafe { std::slice::from_raw_parts(src, len as usize) };
    view.write_at(start, src) as u64
}
