//! Canonical byte fixtures.

use zerobridge_arrays::ByteBuffer;

/// Eight bytes spelling `deadbeef`, one nibble per byte.
pub const K_FIXTURE: [u8; 8] = [0x0d, 0x0e, 0x0a, 0x0d, 0x0b, 0x0e, 0x0e, 0x0f];

/// A fresh heap copy of [`K_FIXTURE`].
pub fn heap_fixture() -> Vec<u8> {
    K_FIXTURE.to_vec()
}

/// A managed direct buffer holding [`K_FIXTURE`].
pub fn direct_fixture() -> anyhow::Result<ByteBuffer> {
    let buffer = ByteBuffer::allocate_direct(K_FIXTURE.len() as u64)
        .ok_or_else(|| anyhow::anyhow!("direct buffer allocation failed"))?;
    buffer.write_at(0, &K_FIXTURE);
    Ok(buffer)
}

/// `base` with bytes `0..=step` bumped by one, for repeated-write scenarios.
pub fn bumped(base: &[u8], step: usize) -> Vec<u8> {
    let mut out = base.to_vec();
    for b in out.iter_mut().take(step + 1) {
        *b = b.wrapping_add(1);
    }
    out
}
