//! A native-side holder for one [`DirectArray`], driven from the managed side.

use zerobridge_arrays::{ByteBuffer, DirectArray, DirectBuffer, Endpoint, Side};

/// Holds one array on the native side of the boundary.
///
/// The managed side creates a holder, hands it arrays with [`wrap`](Self::wrap),
/// asks it to [`write`](Self::write) or [`check`](Self::check) contents, and moves
/// the array back out with [`take_array`](Self::take_array).
#[derive(Debug)]
pub struct NativeArrayHolder {
    endpoint: Endpoint,
    // Storage exposed through facade buffers; must outlive any array over it.
    native_buf: Vec<u8>,
}

impl NativeArrayHolder {
    /// A holder with no array.
    pub fn create() -> NativeArrayHolder {
        NativeArrayHolder {
            endpoint: Endpoint::new(Side::Native),
            native_buf: Vec::new(),
        }
    }

    /// A holder owning a fresh managed direct buffer of `size` bytes.
    pub fn allocate_direct(size: u64) -> anyhow::Result<NativeArrayHolder> {
        let mut holder = NativeArrayHolder::create();
        let da = DirectArray::allocate_managed_direct(size);
        anyhow::ensure!(da.has_array(), "failed to create a direct buffer");
        anyhow::ensure!(da.len() == size, "allocated direct buffer has wrong size");
        holder.wrap(da);
        Ok(holder)
    }

    /// A holder whose array is a managed direct buffer over the holder's own native
    /// storage of `size` bytes.
    pub fn allocate_facade(size: usize) -> anyhow::Result<NativeArrayHolder> {
        let mut holder = NativeArrayHolder::create();
        holder.native_buf.resize(size, 0);
        let buffer = unsafe {
            DirectBuffer::facade(holder.native_buf.as_mut_ptr(), holder.native_buf.len())
        }
        .ok_or_else(|| anyhow::anyhow!("failed to create a facade buffer"))?;
        let da = DirectArray::wrap_managed_direct(&ByteBuffer::Direct(buffer));
        anyhow::ensure!(da.has_array(), "failed to wrap the facade buffer");
        anyhow::ensure!(da.len() == size as u64, "facade buffer has wrong size");
        holder.wrap(da);
        Ok(holder)
    }

    /// True iff `da` carries no array.
    pub fn check_null_direct_array(da: &DirectArray) -> bool {
        !da.has_array()
    }

    /// Takes ownership of `da`, replacing the held array.
    pub fn wrap(&mut self, da: DirectArray) -> bool {
        self.endpoint.adopt(da)
    }

    /// Overwrites the held array with `contents`, which must match its size.
    pub fn write(&mut self, contents: &[u8]) -> bool {
        match self.endpoint.write(contents) {
            Ok(()) => true,
            Err(e) => {
                log::error!("holder write failed: {e}");
                false
            }
        }
    }

    /// True iff the held array matches `expected` byte for byte.
    pub fn check(&self, expected: &[u8]) -> bool {
        if !self.endpoint.has_array() {
            log::error!("holder does not have a buffer");
            return false;
        }
        self.endpoint.check(expected)
    }

    /// Moves the held array out.
    pub fn take_array(&mut self) -> DirectArray {
        self.endpoint.take()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The holder's own native storage (backing for facade arrays).
    pub fn native_buf(&self) -> &[u8] {
        &self.native_buf
    }
}

/// Checks `holder`'s contents against `expected` on both sides: in place on the
/// native side, then on the managed side after temporarily moving the array out,
/// and finally moves the array back in.
pub fn check_arrays(holder: &mut NativeArrayHolder, expected: &[u8]) -> anyhow::Result<()> {
    anyhow::ensure!(holder.check(expected), "native-side contents differ");

    let da = holder.take_array();
    let managed_view = match da.as_direct_buffer() {
        Some(buffer) => buffer.to_vec(),
        None => da.to_vec(),
    };
    anyhow::ensure!(
        managed_view == expected,
        "managed-side contents differ: {managed_view:?} != {expected:?}"
    );

    anyhow::ensure!(holder.wrap(da), "failed to restore the array");
    Ok(())
}
